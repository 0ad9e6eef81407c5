/// Sector chain reader for DOS 2 and MyDOS files
///
/// DOS 2 sectors end with a three byte trailer:
/// - byte 0: file number << 2 | high bits of the next sector
/// - byte 1: low byte of the next sector
/// - byte 2: number of data bytes in this sector
///
/// MyDOS files are contiguous runs counted down from the directory's sector
/// count, stepping over the VTOC region.

use crate::error::{AtrError, Result};
use crate::filesystem::{Dialect, DirEntry, Vtoc};
use crate::format::constants::{SECTOR_LINK_MASK, SECTOR_TRAILER_SIZE};
use crate::image::SectorDevice;
use crate::io::ByteSource;
use std::collections::HashSet;

/// Decoded DOS 2 sector trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorTrailer {
    /// File number stamped into the sector
    pub file_num: u8,
    /// Next sector in the chain, 0 at end of file
    pub next_sector: u16,
    /// Data bytes at the start of the sector
    pub byte_count: u8,
}

impl SectorTrailer {
    /// Decode the last three bytes of a sector
    pub fn decode(sector: &[u8]) -> Option<Self> {
        if sector.len() < SECTOR_TRAILER_SIZE {
            return None;
        }
        let t = &sector[sector.len() - SECTOR_TRAILER_SIZE..];
        Some(Self {
            file_num: t[0] >> 2,
            next_sector: (((t[0] as u16) << 8) | t[1] as u16) & SECTOR_LINK_MASK,
            byte_count: t[2],
        })
    }
}

/// One sector's worth of file payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSector {
    /// Sector the payload came from
    pub sector: u16,
    /// Payload bytes
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Fresh,
    Reading { cursor: u16, remaining: u16 },
    Done,
}

/// Reads the sectors of one file in order
///
/// Yields one `FileSector` per sector. After an error the reader is finished.
/// Dropping it part way through is fine; it holds no resources of its own.
pub struct FileReader<'a, S> {
    device: &'a SectorDevice<S>,
    file_num: u8,
    dialect: Dialect,
    starting_sector: u16,
    num_sectors: u16,
    first_vtoc: u16,
    first_data_after_vtoc: u16,
    limit: u16,
    state: ReadState,
    sectors_read: u16,
    bytes_read: usize,
    visited: HashSet<u16>,
}

impl<'a, S: ByteSource> FileReader<'a, S> {
    /// Create a reader for a directory entry
    ///
    /// No file may span more sectors than the VTOC declares usable; a blank
    /// VTOC falls back to the size of the device.
    pub fn new(device: &'a SectorDevice<S>, entry: &DirEntry, vtoc: &Vtoc) -> Self {
        let limit = if vtoc.total_sectors > 0 {
            vtoc.total_sectors
        } else {
            device.sector_count()
        };

        Self {
            device,
            file_num: entry.file_num,
            dialect: entry.dialect(),
            starting_sector: entry.starting_sector,
            num_sectors: entry.num_sectors,
            first_vtoc: vtoc.first_vtoc,
            first_data_after_vtoc: vtoc.first_data_after_vtoc(),
            limit,
            state: ReadState::Fresh,
            sectors_read: 0,
            bytes_read: 0,
            visited: HashSet::new(),
        }
    }

    /// Number of sectors emitted so far
    pub fn sectors_read(&self) -> u16 {
        self.sectors_read
    }

    /// Number of payload bytes emitted so far
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Check if the reader has finished
    pub fn is_done(&self) -> bool {
        self.state == ReadState::Done
    }

    fn read_next(&mut self) -> Result<Option<FileSector>> {
        let (cursor, remaining) = match self.state {
            ReadState::Done => return Ok(None),
            ReadState::Fresh if self.num_sectors == 0 => {
                self.state = ReadState::Done;
                return Ok(None);
            }
            ReadState::Fresh => (self.starting_sector, self.num_sectors),
            ReadState::Reading { cursor, remaining } => (cursor, remaining),
        };

        if self.sectors_read >= self.limit {
            return Err(AtrError::FileTooLong { limit: self.limit });
        }

        let (data, next) = match self.dialect {
            Dialect::Dos2 => self.read_dos2(cursor)?,
            Dialect::MyDos => self.read_mydos(cursor, remaining)?,
        };

        self.sectors_read += 1;
        self.bytes_read += data.len();
        self.state = next;

        Ok(Some(FileSector {
            sector: cursor,
            data,
        }))
    }

    fn read_dos2(&mut self, cursor: u16) -> Result<(Vec<u8>, ReadState)> {
        if self.visited.contains(&cursor) {
            return Err(AtrError::SectorLoop { sector: cursor });
        }
        if self.sectors_read >= self.num_sectors {
            return Err(AtrError::SectorCountExceeded {
                file_num: self.file_num,
                expected: self.num_sectors,
                sector: cursor,
            });
        }

        let mut raw = self.device.read_sector(cursor)?;
        let trailer = match SectorTrailer::decode(&raw) {
            Some(trailer) => trailer,
            None => {
                let (offset, _) = self.device.layout().position(cursor)?;
                return Err(AtrError::ShortRead {
                    sector: cursor,
                    offset,
                    wanted: SECTOR_TRAILER_SIZE,
                });
            }
        };

        if trailer.file_num != self.file_num {
            return Err(AtrError::FileNumberMismatch {
                expected: self.file_num,
                found: trailer.file_num,
            });
        }

        let max = raw.len() - SECTOR_TRAILER_SIZE;
        if trailer.byte_count as usize > max {
            return Err(AtrError::BadByteCount {
                sector: cursor,
                count: trailer.byte_count,
                max,
            });
        }

        log::trace!(
            "file #{} sector {}: {} bytes, next {}",
            self.file_num,
            cursor,
            trailer.byte_count,
            trailer.next_sector
        );

        self.visited.insert(cursor);
        raw.truncate(trailer.byte_count as usize);

        let next = match trailer.next_sector {
            0 => ReadState::Done,
            sector => ReadState::Reading {
                cursor: sector,
                remaining: 0,
            },
        };
        Ok((raw, next))
    }

    fn read_mydos(&mut self, cursor: u16, remaining: u16) -> Result<(Vec<u8>, ReadState)> {
        // The whole sector is payload; MyDOS byte counts are not trusted
        let raw = self.device.read_sector(cursor)?;

        let remaining = remaining - 1;
        let next = if remaining == 0 {
            ReadState::Done
        } else {
            let mut sector = cursor.checked_add(1).ok_or(AtrError::SectorOutOfRange {
                sector: cursor,
                max: self.device.sector_count(),
            })?;
            if sector == self.first_vtoc {
                sector = self.first_data_after_vtoc;
            }
            ReadState::Reading {
                cursor: sector,
                remaining,
            }
        };

        log::trace!(
            "file #{} sector {}: {} sectors left",
            self.file_num,
            cursor,
            remaining
        );
        Ok((raw, next))
    }
}

impl<S: ByteSource> Iterator for FileReader<'_, S> {
    type Item = Result<FileSector>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(sector)) => Some(Ok(sector)),
            Ok(None) => None,
            Err(e) => {
                self.state = ReadState::Done;
                Some(Err(e))
            }
        }
    }
}
