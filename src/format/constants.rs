/// ATR format magic bytes and constants

/// ATR signature (bytes 0x96 0x02, little endian)
pub const ATR_MAGIC: u16 = 0x0296;

/// Size of the ATR header
pub const ATR_HEADER_SIZE: usize = 16;

/// ATR sizes are stored in 16-byte paragraphs
pub const ATR_PARAGRAPH_SIZE: u64 = 16;

/// Offset of the magic word in the ATR header
pub const ATR_MAGIC_OFFSET: usize = 0;

/// Offset of the low word of the paragraph count
pub const ATR_SIZE_LOW_OFFSET: usize = 2;

/// Offset of the sector size word
pub const ATR_SECTOR_SIZE_OFFSET: usize = 4;

/// Offset of the high byte of the paragraph count
pub const ATR_SIZE_HIGH_OFFSET: usize = 6;

/// Offset of the CRC field
pub const ATR_CRC_OFFSET: usize = 7;

/// Offset of the unused field
pub const ATR_UNUSED_OFFSET: usize = 11;

/// Offset of the flags byte
pub const ATR_FLAGS_OFFSET: usize = 15;

/// Single density sector size
pub const SECTOR_SIZE_SD: u16 = 128;

/// Double density sector size
pub const SECTOR_SIZE_DD: u16 = 256;

/// Size of the boot sectors, regardless of density
pub const BOOT_SECTOR_SIZE: u16 = 128;

/// Number of boot sectors kept at 128 bytes on double density images
pub const DD_BOOT_SECTORS: u16 = 3;

/// Single density image: 720 x 128
pub const SD_IMAGE_SIZE: u64 = 92_160;

/// Enhanced density image: 1040 x 128
pub const ED_IMAGE_SIZE: u64 = 133_120;

/// Double density image with short boot sectors: 3 x 128 + 717 x 256
pub const DD_SHORT_BOOT_IMAGE_SIZE: u64 = 183_936;

/// Double density image: 720 x 256
pub const DD_IMAGE_SIZE: u64 = 184_320;

/// Main VTOC sector
pub const VTOC_SECTOR: u16 = 360;

/// Second VTOC on enhanced density disks
pub const VTOC2_SECTOR: u16 = 1024;

/// Offset of the extra free sector count in the second VTOC
pub const VTOC2_FREE_OFFSET: usize = 122;

/// First directory sector
pub const DIRECTORY_FIRST_SECTOR: u16 = 361;

/// Last directory sector
pub const DIRECTORY_LAST_SECTOR: u16 = 368;

/// First sector after the directory
pub const FIRST_DATA_AFTER_VTOC: u16 = 369;

/// Size of a directory entry
pub const DIR_ENTRY_SIZE: usize = 16;

/// Bytes of each directory sector holding entries
pub const DIR_SECTOR_BYTES: usize = 128;

/// Entries per directory sector
pub const DIR_ENTRIES_PER_SECTOR: usize = DIR_SECTOR_BYTES / DIR_ENTRY_SIZE;

/// Maximum number of directory entries
pub const MAX_DIR_ENTRIES: usize = 64;

/// Bytes at the end of each file sector holding link information
pub const SECTOR_TRAILER_SIZE: usize = 3;

/// Sector links are 10 bits wide
pub const SECTOR_LINK_MASK: u16 = 0x03FF;
