/// Atari DOS binary load (XEX) files
///
/// A binary load file is a run of segments, each a little-endian start and end
/// address followed by the bytes to load there. A `$FFFF` marker opens the file
/// and may be repeated before any later segment.

use crate::error::{AtrError, Result};

/// Marker word that opens a binary load file
pub const XEX_MARKER: u16 = 0xFFFF;

/// Load address of the run vector
pub const RUN_ADDRESS_VECTOR: u16 = 0x02E0;

/// Load address of the init vector
pub const INIT_ADDRESS_VECTOR: u16 = 0x02E2;

/// What a segment loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Ordinary memory contents
    Data,
    /// Sets the address DOS jumps to once loading finishes
    RunAddress,
    /// Sets an address DOS calls as soon as the segment is loaded
    InitAddress,
}

/// One load segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// First address loaded
    pub start: u16,
    /// Last address loaded (inclusive)
    pub end: u16,
    /// Offset of the segment body within the file
    pub data_offset: usize,
    /// Segment body; shorter than declared when the file is truncated
    pub data: Vec<u8>,
    /// Set when the segment could not be read in full
    pub issue: Option<String>,
}

impl Segment {
    /// Classify the segment by its load address
    pub fn kind(&self) -> SegmentKind {
        match self.start {
            RUN_ADDRESS_VECTOR => SegmentKind::RunAddress,
            INIT_ADDRESS_VECTOR => SegmentKind::InitAddress,
            _ => SegmentKind::Data,
        }
    }

    /// Number of bytes the header declares
    pub fn declared_len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    /// Check if the segment body was read in full
    pub fn is_complete(&self) -> bool {
        self.issue.is_none()
    }

    /// Vector stored by a run or init segment
    pub fn vector(&self) -> Option<u16> {
        if self.kind() == SegmentKind::Data || self.data.len() < 2 {
            return None;
        }
        Some(u16::from_le_bytes([self.data[0], self.data[1]]))
    }

    /// Address stored by a run segment
    pub fn run_address(&self) -> Option<u16> {
        match self.kind() {
            SegmentKind::RunAddress => self.vector(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "${:04X}-${:04X} ({} bytes @ ${:04X})",
            self.start,
            self.end,
            self.data.len(),
            self.data_offset
        )?;
        if let Some(issue) = &self.issue {
            write!(f, " {}", issue)?;
        }
        Ok(())
    }
}

/// Split a binary load file into segments
///
/// Truncation ends the list with a segment carrying an issue instead of
/// failing. A file that does not open with `$FFFF`, or a segment whose end
/// precedes its start, is rejected.
pub fn parse_segments(bytes: &[u8]) -> Result<Vec<Segment>> {
    if bytes.len() < 2 {
        return Err(AtrError::invalid_executable(format!(
            "{} bytes is too short for a binary load file",
            bytes.len()
        )));
    }

    let mut segments = Vec::new();
    let mut pos = 0;
    let mut first = true;

    while pos < bytes.len() {
        // A lone trailing byte cannot even hold a start address
        if pos + 1 >= bytes.len() {
            segments.push(short_header(bytes, pos));
            break;
        }

        let word = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
        if word == XEX_MARKER {
            pos += 2;
            first = false;
            continue;
        }
        if first {
            return Err(AtrError::invalid_executable(format!(
                "file starts with ${:04X} instead of ${:04X}",
                word, XEX_MARKER
            )));
        }

        if bytes.len() - pos < 4 {
            segments.push(short_header(bytes, pos));
            break;
        }

        let start = word;
        let end = u16::from_le_bytes([bytes[pos + 2], bytes[pos + 3]]);
        if end < start {
            return Err(AtrError::invalid_executable(format!(
                "segment at offset {} ends at ${:04X} before its start ${:04X}",
                pos, end, start
            )));
        }

        let count = (end - start) as usize + 1;
        let body = pos + 4;
        let available = (bytes.len() - body).min(count);
        let mut segment = Segment {
            start,
            end,
            data_offset: body,
            data: bytes[body..body + available].to_vec(),
            issue: None,
        };

        if available < count {
            log::warn!(
                "segment ${:04X}-${:04X} truncated: {} of {} bytes",
                start,
                end,
                available,
                count
            );
            segment.issue = Some("Incomplete Data".to_string());
            segments.push(segment);
            break;
        }

        log::trace!("{}", segment);
        segments.push(segment);
        pos = body + count;
    }

    Ok(segments)
}

/// Leftover bytes too few to hold a segment header
fn short_header(bytes: &[u8], pos: usize) -> Segment {
    Segment {
        start: 0,
        end: 0,
        data_offset: pos,
        data: bytes[pos..].to_vec(),
        issue: Some("Short Segment Header".to_string()),
    }
}

/// Address DOS jumps to after loading, taken from the last run segment
pub fn run_address(segments: &[Segment]) -> Option<u16> {
    segments.iter().rev().find_map(Segment::run_address)
}
