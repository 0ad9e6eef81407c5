/// ATR header parsing and XFD size inference

use crate::error::{AtrError, Result};
use crate::format::constants::*;
use crate::format::{detect_format, Geometry, ImageFormat};
use crate::image::SectorLayout;

/// Options controlling how an image is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Reject ATR images whose declared size differs from the data present
    pub strict_size: bool,
    /// Number of leading 128-byte sectors; `None` infers it from the geometry
    pub boot_sectors: Option<u16>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            strict_size: true,
            boot_sectors: None,
        }
    }
}

impl OpenOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the ATR size must match the data present
    pub fn strict_size(mut self, strict_size: bool) -> Self {
        self.strict_size = strict_size;
        self
    }

    /// Force the number of 128-byte boot sectors
    pub fn boot_sectors(mut self, boot_sectors: u16) -> Self {
        self.boot_sectors = Some(boot_sectors);
        self
    }
}

/// Parsed image container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Container format
    pub format: ImageFormat,
    /// Bytes of sector data, excluding any header
    pub image_byte_size: u64,
    /// Size of sectors after the boot sectors (128 or 256)
    pub sector_size: u16,
    /// Offset of the first sector in the source
    pub header_offset: u64,
    /// Number of leading sectors stored at 128 bytes
    pub boot_sectors: u16,
    /// ATR CRC field (recorded, never verified)
    pub crc: u32,
    /// ATR unused field
    pub unused: u32,
    /// ATR flags byte
    pub flags: u8,
}

impl Header {
    /// Parse a header from the first bytes of a source of `total_len` bytes
    ///
    /// `prefix` holds up to the first 16 bytes of the source.
    pub fn parse(prefix: &[u8], total_len: u64, options: &OpenOptions) -> Result<Self> {
        match detect_format(prefix) {
            ImageFormat::Atr => Self::parse_atr(prefix, total_len, options),
            ImageFormat::Xfd => Self::infer_xfd(total_len, options),
        }
    }

    fn parse_atr(prefix: &[u8], total_len: u64, options: &OpenOptions) -> Result<Self> {
        if prefix.len() < ATR_HEADER_SIZE || total_len < ATR_HEADER_SIZE as u64 {
            return Err(AtrError::invalid_header(format!(
                "ATR header truncated to {} bytes",
                prefix.len()
            )));
        }

        let word = |offset: usize| u16::from_le_bytes([prefix[offset], prefix[offset + 1]]);
        let long = |offset: usize| {
            u32::from_le_bytes([
                prefix[offset],
                prefix[offset + 1],
                prefix[offset + 2],
                prefix[offset + 3],
            ])
        };

        let size_low = word(ATR_SIZE_LOW_OFFSET) as u64;
        let sector_size = word(ATR_SECTOR_SIZE_OFFSET);
        let size_high = prefix[ATR_SIZE_HIGH_OFFSET] as u64;

        if sector_size != SECTOR_SIZE_SD && sector_size != SECTOR_SIZE_DD {
            return Err(AtrError::invalid_header(format!(
                "unsupported sector size {}",
                sector_size
            )));
        }

        let declared = ((size_high << 16) + size_low) * ATR_PARAGRAPH_SIZE;
        let actual = total_len - ATR_HEADER_SIZE as u64;

        let image_byte_size = if declared == actual {
            declared
        } else if options.strict_size {
            return Err(AtrError::HeaderMismatch { declared, actual });
        } else {
            log::warn!(
                "ATR header declares {} bytes but {} are present; using {}",
                declared,
                actual,
                declared.min(actual)
            );
            declared.min(actual)
        };

        let boot_sectors = match options.boot_sectors {
            Some(n) => n,
            None => infer_boot_sectors(image_byte_size, sector_size),
        };

        let header = Self {
            format: ImageFormat::Atr,
            image_byte_size,
            sector_size,
            header_offset: ATR_HEADER_SIZE as u64,
            boot_sectors,
            crc: long(ATR_CRC_OFFSET),
            unused: long(ATR_UNUSED_OFFSET),
            flags: prefix[ATR_FLAGS_OFFSET],
        };
        header.check_boot_sectors()?;

        log::debug!("identified {}", header);
        Ok(header)
    }

    fn infer_xfd(total_len: u64, options: &OpenOptions) -> Result<Self> {
        let geometry =
            Geometry::from_image_size(total_len).ok_or(AtrError::UnknownImageSize(total_len))?;

        let header = Self {
            format: ImageFormat::Xfd,
            image_byte_size: total_len,
            sector_size: geometry.sector_size,
            header_offset: 0,
            boot_sectors: options.boot_sectors.unwrap_or(geometry.boot_sectors),
            crc: 0,
            unused: 0,
            flags: 0,
        };
        header.check_boot_sectors()?;

        log::debug!("identified {}", header);
        Ok(header)
    }

    fn check_boot_sectors(&self) -> Result<()> {
        if self.boot_sectors as u64 * BOOT_SECTOR_SIZE as u64 > self.image_byte_size {
            return Err(AtrError::invalid_header(format!(
                "{} boot sectors do not fit in {} bytes",
                self.boot_sectors, self.image_byte_size
            )));
        }
        Ok(())
    }

    /// Number of addressable sectors
    pub fn sector_count(&self) -> u16 {
        SectorLayout::from_header(self).sector_count()
    }

    /// Total bytes the source should hold
    pub fn total_size(&self) -> u64 {
        self.header_offset + self.image_byte_size
    }
}

/// Double density images whose length leaves half a sector over store
/// their boot sectors at 128 bytes
fn infer_boot_sectors(image_byte_size: u64, sector_size: u16) -> u16 {
    if sector_size == SECTOR_SIZE_DD
        && image_byte_size % SECTOR_SIZE_DD as u64 == BOOT_SECTOR_SIZE as u64
    {
        DD_BOOT_SECTORS
    } else {
        Geometry::from_image_size(image_byte_size)
            .filter(|g| g.sector_size == sector_size)
            .map(|g| g.boot_sectors)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.format {
            ImageFormat::Atr => write!(
                f,
                "ATR Disk Image (size={} ({}x{}B), crc={} flags={} unused={})",
                self.image_byte_size,
                self.sector_count(),
                self.sector_size,
                self.crc,
                self.flags,
                self.unused
            ),
            ImageFormat::Xfd => write!(
                f,
                "XFD Disk Image (size={} ({}x{}B))",
                self.image_byte_size,
                self.sector_count(),
                self.sector_size
            ),
        }
    }
}
