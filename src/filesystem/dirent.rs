/// Atari DOS 2 / MyDOS directory entries
///
/// Each entry is 16 bytes:
/// - flag byte
/// - sector count (LE)
/// - starting sector (LE)
/// - 8 byte name and 3 byte extension, space padded

use crate::error::{AtrError, Result};
use crate::format::constants::DIR_ENTRY_SIZE;
use std::fmt;

/// Directory entry flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirFlags(pub u8);

impl DirFlags {
    /// File opened for output - Bit 0
    pub const OPENED_OUTPUT: u8 = 0x01;

    /// Created by DOS 2 - Bit 1
    pub const DOS2: u8 = 0x02;

    /// MyDOS contiguous file - Bit 2
    pub const MYDOS: u8 = 0x04;

    /// MyDOS subdirectory - Bit 4
    pub const DIRECTORY: u8 = 0x10;

    /// Locked (read-only) - Bit 5
    pub const LOCKED: u8 = 0x20;

    /// Entry in use - Bit 6
    pub const IN_USE: u8 = 0x40;

    /// Entry deleted - Bit 7
    pub const DELETED: u8 = 0x80;

    /// Create flags from a raw byte
    #[inline]
    pub fn new(value: u8) -> Self {
        DirFlags(value)
    }

    /// Check if opened for output bit is set
    #[inline]
    pub fn opened_output(&self) -> bool {
        (self.0 & Self::OPENED_OUTPUT) != 0
    }

    /// Check if DOS 2 bit is set
    #[inline]
    pub fn dos2(&self) -> bool {
        (self.0 & Self::DOS2) != 0
    }

    /// Check if MyDOS bit is set
    #[inline]
    pub fn mydos(&self) -> bool {
        (self.0 & Self::MYDOS) != 0
    }

    /// Check if directory bit is set
    #[inline]
    pub fn is_dir(&self) -> bool {
        (self.0 & Self::DIRECTORY) != 0
    }

    /// Check if locked bit is set
    #[inline]
    pub fn locked(&self) -> bool {
        (self.0 & Self::LOCKED) != 0
    }

    /// Check if in use bit is set
    #[inline]
    pub fn in_use(&self) -> bool {
        (self.0 & Self::IN_USE) != 0
    }

    /// Check if deleted bit is set
    #[inline]
    pub fn deleted(&self) -> bool {
        (self.0 & Self::DELETED) != 0
    }

    /// Check if this flag byte ends the directory
    #[inline]
    pub fn is_end_of_directory(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DirFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.opened_output() {
            flags.push("OUT");
        }
        if self.dos2() {
            flags.push("DOS2");
        }
        if self.mydos() {
            flags.push("MYDOS");
        }
        if self.is_dir() {
            flags.push("DIR");
        }
        if self.in_use() {
            flags.push("IN_USE");
        }
        if self.deleted() {
            flags.push("DEL");
        }
        if self.locked() {
            flags.push("LOCK");
        }
        write!(f, "flags=[{}]", flags.join(", "))
    }
}

/// Filesystem dialect deciding how sector links are followed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Linked sectors with file number and byte count trailers
    Dos2,
    /// Contiguous sector runs counted down from the directory
    MyDos,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Dos2 => write!(f, "DOS 2"),
            Dialect::MyDos => write!(f, "MyDOS"),
        }
    }
}

/// Parsed directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Directory slot (0-63), also stamped into DOS 2 sector trailers
    pub file_num: u8,
    /// Flag byte
    pub flags: DirFlags,
    /// Number of sectors in the file
    pub num_sectors: u16,
    /// First sector of the file
    pub starting_sector: u16,
    /// Raw space padded name
    pub name: [u8; 8],
    /// Raw space padded extension
    pub ext: [u8; 3],
    issue: Option<String>,
}

impl DirEntry {
    /// Parse a directory entry from 16 bytes
    pub fn parse(file_num: u8, data: &[u8]) -> Result<Self> {
        if data.len() < DIR_ENTRY_SIZE {
            return Err(AtrError::corrupt(format!(
                "directory entry #{} truncated to {} bytes",
                file_num,
                data.len()
            )));
        }

        let mut name = [0u8; 8];
        let mut ext = [0u8; 3];
        name.copy_from_slice(&data[5..13]);
        ext.copy_from_slice(&data[13..16]);

        Ok(Self {
            file_num,
            flags: DirFlags::new(data[0]),
            num_sectors: u16::from_le_bytes([data[1], data[2]]),
            starting_sector: u16::from_le_bytes([data[3], data[4]]),
            name,
            ext,
            issue: None,
        })
    }

    /// Dialect used to read this file
    pub fn dialect(&self) -> Dialect {
        if self.flags.mydos() {
            Dialect::MyDos
        } else {
            Dialect::Dos2
        }
    }

    /// Name with trailing spaces removed
    pub fn basename(&self) -> String {
        latin1(strip_padding(&self.name))
    }

    /// Extension with trailing spaces removed
    pub fn extension(&self) -> String {
        latin1(strip_padding(&self.ext))
    }

    /// Canonical filename, `NAME.EXT` or `NAME` when there is no extension
    pub fn filename(&self) -> String {
        let ext = self.extension();
        if ext.is_empty() {
            self.basename()
        } else {
            format!("{}.{}", self.basename(), ext)
        }
    }

    /// Check if the flag byte marks the entry in use
    pub fn is_in_use(&self) -> bool {
        self.flags.in_use()
    }

    /// Check if the entry is locked
    pub fn is_locked(&self) -> bool {
        self.flags.locked()
    }

    /// Six character flag summary (`o2mud*`)
    pub fn summary(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            if self.flags.opened_output() { 'o' } else { '.' },
            if self.flags.dos2() { '2' } else { '.' },
            if self.flags.mydos() { 'm' } else { '.' },
            if self.flags.in_use() { 'u' } else { '.' },
            if self.flags.deleted() { 'd' } else { '.' },
            if self.flags.locked() { '*' } else { ' ' },
        )
    }

    /// Check the record itself for impossible contents
    pub fn validate(&self) -> Result<()> {
        if self.flags.in_use() && self.flags.deleted() {
            return Err(AtrError::corrupt(format!(
                "entry #{} is both in use and deleted (flag 0x{:02X})",
                self.file_num, self.flags.0
            )));
        }

        let printable = |b: &u8| (0x20..0x7F).contains(b);
        if !strip_padding(&self.name).iter().all(printable)
            || !strip_padding(&self.ext).iter().all(printable)
        {
            return Err(AtrError::corrupt(format!(
                "entry #{} has a non-printable filename",
                self.file_num
            )));
        }

        Ok(())
    }

    /// Check if the entry passed the directory checks
    pub fn is_sane(&self) -> bool {
        self.issue.is_none()
    }

    /// Why the entry failed the directory checks
    pub fn issue(&self) -> Option<&str> {
        self.issue.as_deref()
    }

    pub(crate) fn set_issue(&mut self, issue: String) {
        self.issue = Some(issue);
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File #{:<2} ({}) {:03} {:<8}{:<3}  {:03}",
            self.file_num,
            self.summary(),
            self.starting_sector,
            self.basename(),
            self.extension(),
            self.num_sectors
        )
    }
}

fn strip_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &bytes[..end]
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
