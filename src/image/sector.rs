/// Sector addressing and the sectored block device

use crate::error::{AtrError, Result};
use crate::format::constants::BOOT_SECTOR_SIZE;
use crate::format::Header;
use crate::io::ByteSource;
use std::cell::RefCell;

/// Maps 1-based sector numbers to byte ranges of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    /// Offset of sector 1 in the source
    pub header_offset: u64,
    /// Size of the leading boot sectors
    pub initial_sector_size: u16,
    /// Number of leading sectors stored at `initial_sector_size`
    pub num_initial_sectors: u16,
    /// Size of every other sector
    pub main_sector_size: u16,
    /// Bytes of sector data after the header
    pub image_byte_size: u64,
}

impl SectorLayout {
    /// Create a layout from a parsed header
    pub fn from_header(header: &Header) -> Self {
        Self {
            header_offset: header.header_offset,
            initial_sector_size: BOOT_SECTOR_SIZE,
            num_initial_sectors: header.boot_sectors,
            main_sector_size: header.sector_size,
            image_byte_size: header.image_byte_size,
        }
    }

    /// Number of addressable sectors
    pub fn sector_count(&self) -> u16 {
        let initial_bytes = self.num_initial_sectors as u64 * self.initial_sector_size as u64;
        let count = self.image_byte_size.saturating_sub(initial_bytes)
            / self.main_sector_size as u64
            + self.num_initial_sectors as u64;
        count.min(u16::MAX as u64) as u16
    }

    /// Check if a sector number addresses the device
    pub fn is_valid(&self, sector: u16) -> bool {
        sector >= 1 && sector <= self.sector_count()
    }

    /// Size in bytes of the given sector
    pub fn sector_size(&self, sector: u16) -> usize {
        if sector <= self.num_initial_sectors {
            self.initial_sector_size as usize
        } else {
            self.main_sector_size as usize
        }
    }

    /// Absolute byte offset and length of a sector
    pub fn position(&self, sector: u16) -> Result<(u64, usize)> {
        if !self.is_valid(sector) {
            return Err(AtrError::SectorOutOfRange {
                sector,
                max: self.sector_count(),
            });
        }

        let n = sector as u64;
        let initial = self.num_initial_sectors as u64;
        let relative = if n <= initial {
            (n - 1) * self.initial_sector_size as u64
        } else {
            initial * self.initial_sector_size as u64
                + (n - 1 - initial) * self.main_sector_size as u64
        };

        let size = self.sector_size(sector);
        if relative + size as u64 > self.image_byte_size {
            return Err(AtrError::ShortRead {
                sector,
                offset: self.header_offset + relative,
                wanted: size,
            });
        }

        Ok((self.header_offset + relative, size))
    }
}

/// Sectored block device over a byte source
///
/// The source is held in a `RefCell` so reads only need a shared reference;
/// a device is therefore confined to one thread.
#[derive(Debug)]
pub struct SectorDevice<S> {
    layout: SectorLayout,
    source: RefCell<S>,
}

impl<S: ByteSource> SectorDevice<S> {
    /// Create a device over a source
    pub fn new(source: S, layout: SectorLayout) -> Self {
        Self {
            layout,
            source: RefCell::new(source),
        }
    }

    /// Get the sector layout
    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    /// Number of addressable sectors
    pub fn sector_count(&self) -> u16 {
        self.layout.sector_count()
    }

    /// Read a single sector
    pub fn read_sector(&self, sector: u16) -> Result<Vec<u8>> {
        let (offset, size) = self.layout.position(sector)?;
        let mut data = vec![0u8; size];

        log::trace!("reading sector {} ({} bytes at {})", sector, size, offset);
        self.source
            .borrow_mut()
            .read_at(offset, &mut data)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => AtrError::ShortRead {
                    sector,
                    offset,
                    wanted: size,
                },
                _ => AtrError::Io(e),
            })?;

        Ok(data)
    }

    /// Read an inclusive run of sectors into one buffer
    pub fn read_sectors(&self, start: u16, end: u16) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        for sector in start..=end {
            data.extend_from_slice(&self.read_sector(sector)?);
        }
        Ok(data)
    }

    /// Release the underlying source
    pub fn into_inner(self) -> S {
        self.source.into_inner()
    }
}
