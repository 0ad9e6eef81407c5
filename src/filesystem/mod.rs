/// Atari DOS 2 and MyDOS filesystem structures

/// Directory entries and flags
pub mod dirent;
/// Directory scanning
pub mod directory;
/// Sector chain reader
pub mod reader;
/// Volume Table of Contents
pub mod vtoc;

pub use directory::{Diagnostic, Directory};
pub use dirent::{Dialect, DirEntry, DirFlags};
pub use reader::{FileReader, FileSector, SectorTrailer};
pub use vtoc::Vtoc;
