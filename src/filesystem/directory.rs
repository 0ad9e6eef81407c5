/// Directory scanning for sectors 361-368

use crate::error::{AtrError, Result};
use crate::filesystem::DirEntry;
use crate::format::constants::*;
use crate::image::{SectorDevice, SectorLayout};
use crate::io::ByteSource;

/// Problem found with a single directory entry
///
/// Diagnostics do not stop the scan; the rest of the directory stays readable.
#[derive(Debug)]
pub struct Diagnostic {
    /// Directory slot of the entry
    pub file_num: u8,
    /// What was wrong with it
    pub error: AtrError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry #{}: {}", self.file_num, self.error)
    }
}

/// In-use directory entries plus any diagnostics raised while scanning
#[derive(Debug, Default)]
pub struct Directory {
    entries: Vec<DirEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl Directory {
    /// Read and scan the directory sectors of a device
    pub fn read<S: ByteSource>(device: &SectorDevice<S>) -> Result<Self> {
        let raw = device.read_sectors(DIRECTORY_FIRST_SECTOR, DIRECTORY_LAST_SECTOR)?;
        let sector_size = device.layout().sector_size(DIRECTORY_FIRST_SECTOR);

        // Only the first 128 bytes of each directory sector hold entries
        let mut records = Vec::with_capacity(MAX_DIR_ENTRIES * DIR_ENTRY_SIZE);
        for data in raw.chunks(sector_size) {
            records.extend_from_slice(&data[..data.len().min(DIR_SECTOR_BYTES)]);
        }

        Self::scan(&records, device.layout())
    }

    /// Scan raw directory records
    ///
    /// Stops at the first entry whose flag byte is zero. Entries not marked in
    /// use are skipped.
    pub fn scan(records: &[u8], layout: &SectorLayout) -> Result<Self> {
        let mut directory = Directory::default();

        for (index, chunk) in records
            .chunks_exact(DIR_ENTRY_SIZE)
            .take(MAX_DIR_ENTRIES)
            .enumerate()
        {
            let mut entry = DirEntry::parse(index as u8, chunk)?;

            if entry.flags.is_end_of_directory() {
                log::debug!("end of directory at entry #{}", index);
                break;
            }
            if !entry.is_in_use() {
                continue;
            }

            let problem = entry
                .validate()
                .err()
                .or_else(|| check_bounds(&entry, layout).err());

            if let Some(error) = problem {
                log::warn!("directory entry #{}: {}", entry.file_num, error);
                entry.set_issue(error.to_string());
                directory.diagnostics.push(Diagnostic {
                    file_num: entry.file_num,
                    error,
                });
            }

            log::trace!("{}", entry);
            directory.entries.push(entry);
        }

        Ok(directory)
    }

    /// In-use entries in on-disk order
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Problems found while scanning
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Check if every entry passed its checks
    pub fn all_sane(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Entries must start on the device and cannot be larger than it
fn check_bounds(entry: &DirEntry, layout: &SectorLayout) -> Result<()> {
    if !layout.is_valid(entry.starting_sector) {
        return Err(AtrError::InvalidDirEntry {
            file_num: entry.file_num,
            reason: format!("starting sector {} is not on the disk", entry.starting_sector),
        });
    }
    if entry.num_sectors > layout.sector_count() {
        return Err(AtrError::InvalidDirEntry {
            file_num: entry.file_num,
            reason: format!(
                "{} sectors is more than the disk holds",
                entry.num_sectors
            ),
        });
    }
    Ok(())
}
