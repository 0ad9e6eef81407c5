/// Volume Table of Contents

use crate::error::{AtrError, Result};
use crate::format::constants::*;
use crate::image::SectorDevice;
use crate::io::ByteSource;

/// Most VTOC sectors a MyDOS volume can place below sector 360
pub const MAX_VTOC_SECTORS: u16 = 8;

/// Decoded VTOC header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vtoc {
    /// DOS code byte
    pub code: u8,
    /// Usable sectors on the volume
    pub total_sectors: u16,
    /// Free sectors on the volume
    pub unused_sectors: u16,
    /// Lowest sector of the VTOC region
    pub first_vtoc: u16,
}

impl Vtoc {
    /// Decode the first five bytes of the VTOC sector
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(AtrError::corrupt(format!(
                "VTOC sector holds only {} bytes",
                data.len()
            )));
        }

        let code = data[0];
        let total_sectors = u16::from_le_bytes([data[1], data[2]]);
        let unused_sectors = u16::from_le_bytes([data[3], data[4]]);

        // MyDOS grows the VTOC downward from 360 by 2 * code - 3 sectors
        let num = match code {
            0 | 2 => 1,
            _ => 2 * code as i32 - 3,
        };
        if num < 1 || num > MAX_VTOC_SECTORS as i32 {
            return Err(AtrError::corrupt(format!(
                "VTOC code {} implies {} VTOC sectors",
                code, num
            )));
        }

        Ok(Self {
            code,
            total_sectors,
            unused_sectors,
            first_vtoc: VTOC_SECTOR - num as u16 + 1,
        })
    }

    /// Read the VTOC from a device
    ///
    /// Enhanced density volumes keep the free count for sectors above 720 in a
    /// second VTOC, which is folded into `unused_sectors`.
    pub fn read<S: ByteSource>(device: &SectorDevice<S>) -> Result<Self> {
        let mut vtoc = Self::parse(&device.read_sector(VTOC_SECTOR)?)?;

        let layout = device.layout();
        if layout.main_sector_size == SECTOR_SIZE_SD && layout.image_byte_size == ED_IMAGE_SIZE {
            let vtoc2 = device.read_sector(VTOC2_SECTOR)?;
            let extra_free =
                u16::from_le_bytes([vtoc2[VTOC2_FREE_OFFSET], vtoc2[VTOC2_FREE_OFFSET + 1]]);
            log::debug!("second VTOC reports {} extra free sectors", extra_free);
            vtoc.unused_sectors = vtoc.unused_sectors.saturating_add(extra_free);
        }

        log::debug!(
            "VTOC code {}: {} sectors, {} free, first VTOC sector {}",
            vtoc.code,
            vtoc.total_sectors,
            vtoc.unused_sectors,
            vtoc.first_vtoc
        );
        Ok(vtoc)
    }

    /// Number of sectors in the VTOC region
    pub fn num_vtoc(&self) -> u16 {
        VTOC_SECTOR - self.first_vtoc + 1
    }

    /// First sector after the VTOC and directory
    pub fn first_data_after_vtoc(&self) -> u16 {
        FIRST_DATA_AFTER_VTOC
    }

    /// Check if the VTOC extends below sector 360
    pub fn is_extended(&self) -> bool {
        self.first_vtoc < VTOC_SECTOR
    }
}
