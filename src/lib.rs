/*!
# atrmanager

A Rust library for reading Atari 8-bit ATR and XFD disk images with Atari DOS 2
and MyDOS filesystem support.

## Features

- ATR (16-byte header) and headerless XFD images
- Single, enhanced and double density geometries, including double density
  images with 128-byte boot sectors
- Atari DOS 2 linked sector chains and MyDOS contiguous files
- Directory diagnostics that keep the rest of a damaged disk readable
- Binary load (XEX) segment parsing
- Read-only: images are never modified

## Quick Start

```rust,no_run
use atrmanager::{AtrImage, xex};

// Open an existing ATR file
let image = AtrImage::open_path("disk.atr")?;
println!("{}", image);

// List the directory
for entry in image.entries() {
    println!("{}", entry);
}

// Read a file
let contents = image.read_file_by_name("AUTORUN.SYS")?;

// Split it into load segments
for segment in xex::parse_segments(&contents)? {
    println!("{}", segment);
}
# Ok::<(), atrmanager::AtrError>(())
```

## Modules

- `format`: ATR header parsing, geometries and constants
- `image`: sector addressing and the `AtrImage` entry point
- `filesystem`: VTOC, directory and file reading (DOS 2, MyDOS)
- `xex`: binary load file segments
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// Filesystem structures (VTOC, directory, file chains)
pub mod filesystem;
/// ATR/XFD container formats and constants
pub mod format;
/// Disk image and sector device
pub mod image;
/// Byte sources images are read from
pub mod io;
/// Binary load (XEX) file segments
pub mod xex;

// Re-export common types
pub use error::{AtrError, ReadError, Result};
pub use filesystem::{
    Diagnostic, Dialect, DirEntry, DirFlags, Directory, FileReader, FileSector, SectorTrailer,
    Vtoc,
};
pub use format::{Geometry, Header, ImageFormat, OpenOptions};
pub use image::{AtrImage, SectorDevice, SectorLayout, Summary};
pub use io::ByteSource;
pub use xex::{Segment, SegmentKind};
