/// ATR/XFD container formats and disk geometries

/// Format constants
pub mod constants;
/// ATR header parsing
pub mod header;

pub use constants::*;
pub use header::{Header, OpenOptions};

use crate::image::SectorLayout;

/// Container format of a disk image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// ATR image with a 16-byte header
    Atr,
    /// Raw XFD sector dump
    Xfd,
}

impl ImageFormat {
    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Atr => "ATR",
            ImageFormat::Xfd => "XFD",
        }
    }

    /// Number of bytes preceding the sector data
    pub fn header_offset(&self) -> u64 {
        match self {
            ImageFormat::Atr => ATR_HEADER_SIZE as u64,
            ImageFormat::Xfd => 0,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the container format from the first bytes of an image
pub fn detect_format(magic: &[u8]) -> ImageFormat {
    if magic.len() >= 2 && u16::from_le_bytes([magic[0], magic[1]]) == ATR_MAGIC {
        ImageFormat::Atr
    } else {
        ImageFormat::Xfd
    }
}

/// Known Atari disk geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Bytes of sector data
    pub image_size: u64,
    /// Size of all sectors after the boot sectors
    pub sector_size: u16,
    /// Leading sectors stored at 128 bytes
    pub boot_sectors: u16,
}

impl Geometry {
    /// Single density (90K)
    pub const SINGLE: Geometry = Geometry {
        image_size: SD_IMAGE_SIZE,
        sector_size: SECTOR_SIZE_SD,
        boot_sectors: 0,
    };

    /// Enhanced density (130K)
    pub const ENHANCED: Geometry = Geometry {
        image_size: ED_IMAGE_SIZE,
        sector_size: SECTOR_SIZE_SD,
        boot_sectors: 0,
    };

    /// Double density with short boot sectors (180K)
    pub const DOUBLE_SHORT_BOOT: Geometry = Geometry {
        image_size: DD_SHORT_BOOT_IMAGE_SIZE,
        sector_size: SECTOR_SIZE_DD,
        boot_sectors: DD_BOOT_SECTORS,
    };

    /// Double density with full size boot sectors (180K)
    pub const DOUBLE: Geometry = Geometry {
        image_size: DD_IMAGE_SIZE,
        sector_size: SECTOR_SIZE_DD,
        boot_sectors: 0,
    };

    /// All geometries recognised from image length alone
    pub const KNOWN: [Geometry; 4] = [
        Geometry::SINGLE,
        Geometry::ENHANCED,
        Geometry::DOUBLE_SHORT_BOOT,
        Geometry::DOUBLE,
    ];

    /// Look up a geometry by its image size in bytes
    pub fn from_image_size(size: u64) -> Option<Geometry> {
        Geometry::KNOWN.iter().copied().find(|g| g.image_size == size)
    }

    /// Number of sectors on the disk
    pub fn sector_count(&self) -> u16 {
        SectorLayout {
            header_offset: 0,
            initial_sector_size: BOOT_SECTOR_SIZE,
            num_initial_sectors: self.boot_sectors,
            main_sector_size: self.sector_size,
            image_byte_size: self.image_size,
        }
        .sector_count()
    }
}
