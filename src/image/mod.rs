/// ATR/XFD image structures

/// Sector addressing and block device
pub mod sector;

pub use sector::{SectorDevice, SectorLayout};

use crate::error::{AtrError, ReadError, Result};
use crate::filesystem::{Diagnostic, DirEntry, Directory, FileReader, Vtoc};
use crate::format::constants::ATR_HEADER_SIZE;
use crate::format::{Header, OpenOptions};
use crate::io::{read_prefix, ByteSource};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Volume totals derived from the VTOC and directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Addressable sectors on the device
    pub device_sectors: u16,
    /// Usable sectors recorded in the VTOC
    pub total_sectors: u16,
    /// Free sectors recorded in the VTOC
    pub unused_sectors: u16,
    /// Number of in-use directory entries
    pub file_count: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} usable sectors ({} free), {} files",
            self.total_sectors, self.unused_sectors, self.file_count
        )
    }
}

/// Read-only view of an Atari DOS 2 or MyDOS disk image
///
/// Opening parses the header, VTOC and directory up front. Files are read on
/// demand; nothing is ever written back to the source.
#[derive(Debug)]
pub struct AtrImage<S> {
    header: Header,
    device: SectorDevice<S>,
    vtoc: Vtoc,
    directory: Directory,
}

impl AtrImage<File> {
    /// Open an ATR or XFD file from disk
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(file)
    }
}

impl AtrImage<Cursor<Vec<u8>>> {
    /// Open an image held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open(Cursor::new(data))
    }
}

impl<S: ByteSource> AtrImage<S> {
    /// Open an image from a byte source with default options
    pub fn open(source: S) -> Result<Self> {
        Self::open_with(source, OpenOptions::default())
    }

    /// Open an image from a byte source
    pub fn open_with(mut source: S, options: OpenOptions) -> Result<Self> {
        let total_len = source.byte_len()?;
        let prefix = read_prefix(&mut source, ATR_HEADER_SIZE)?;
        let header = Header::parse(&prefix, total_len, &options)?;

        let device = SectorDevice::new(source, SectorLayout::from_header(&header));
        let vtoc = Vtoc::read(&device)?;
        let directory = Directory::read(&device)?;

        log::debug!(
            "opened {}: {} entries, {} diagnostics",
            header,
            directory.entries().len(),
            directory.diagnostics().len()
        );

        Ok(Self {
            header,
            device,
            vtoc,
            directory,
        })
    }

    /// Get the container header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Get the sector layout
    pub fn layout(&self) -> &SectorLayout {
        self.device.layout()
    }

    /// Get the VTOC
    pub fn vtoc(&self) -> &Vtoc {
        &self.vtoc
    }

    /// In-use directory entries in on-disk order
    pub fn entries(&self) -> &[DirEntry] {
        self.directory.entries()
    }

    /// Problems found with individual directory entries
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.directory.diagnostics()
    }

    /// Check if every directory entry passed its checks
    pub fn all_sane(&self) -> bool {
        self.directory.all_sane()
    }

    /// Find an entry by its canonical filename (case sensitive)
    pub fn find(&self, name: &str) -> Option<&DirEntry> {
        self.entries().iter().find(|e| e.filename() == name)
    }

    /// Read a raw sector
    pub fn read_sector(&self, sector: u16) -> Result<Vec<u8>> {
        self.device.read_sector(sector)
    }

    /// Stream a file sector by sector
    pub fn file_reader(&self, entry: &DirEntry) -> Result<FileReader<'_, S>> {
        if let Some(reason) = entry.issue() {
            return Err(AtrError::InvalidDirEntry {
                file_num: entry.file_num,
                reason: reason.to_string(),
            });
        }
        Ok(FileReader::new(&self.device, entry, &self.vtoc))
    }

    /// Read a file's contents
    ///
    /// Stops at the first error, reporting how many bytes had been read.
    pub fn read_file(&self, entry: &DirEntry) -> std::result::Result<Vec<u8>, ReadError> {
        let reader = self
            .file_reader(entry)
            .map_err(|e| ReadError::new(0, e))?;

        let capacity = entry.num_sectors as usize * self.header.sector_size as usize;
        let mut data = Vec::with_capacity(capacity);
        for sector in reader {
            match sector {
                Ok(sector) => data.extend_from_slice(&sector.data),
                Err(e) => return Err(ReadError::new(data.len(), e)),
            }
        }

        log::debug!("read {} bytes from {}", data.len(), entry.filename());
        Ok(data)
    }

    /// Read a file by its canonical filename
    pub fn read_file_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find(name)
            .ok_or_else(|| AtrError::FileNotFound(name.to_string()))?;
        Ok(self.read_file(entry)?)
    }

    /// Volume totals
    pub fn summary(&self) -> Summary {
        Summary {
            device_sectors: self.device.sector_count(),
            total_sectors: self.vtoc.total_sectors,
            unused_sectors: self.vtoc.unused_sectors,
            file_count: self.entries().len(),
        }
    }

    /// Directory listing, one line per file after the image description
    pub fn listing(&self) -> String {
        let mut lines = vec![self.to_string()];
        lines.extend(self.entries().iter().map(|e| e.to_string()));
        lines.join("\n")
    }

    /// Release the underlying source
    pub fn into_inner(self) -> S {
        self.device.into_inner()
    }
}

impl<S: ByteSource> std::fmt::Display for AtrImage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.all_sane() {
            write!(f, "{} Atari DOS Format: {}", self.header, self.summary())
        } else {
            write!(
                f,
                "{} Atari DOS Format: {} bad directory entries; possible boot disk?",
                self.header,
                self.diagnostics().len()
            )
        }
    }
}
