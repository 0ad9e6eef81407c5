use thiserror::Error;

/// Result type alias for ATR operations
pub type Result<T> = std::result::Result<T, AtrError>;

/// Errors that can occur when working with ATR/XFD images
#[derive(Debug, Error)]
pub enum AtrError {
    /// I/O error occurred while reading the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ATR header present but unusable
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// ATR declared payload size disagrees with the source length
    #[error("Header mismatch: header declares {declared} bytes, image holds {actual}")]
    HeaderMismatch {
        /// Size encoded in the ATR header
        declared: u64,
        /// Bytes actually present after the header
        actual: u64,
    },

    /// Headerless image whose length matches no known geometry
    #[error("Unknown image size: {0} bytes")]
    UnknownImageSize(u64),

    /// Sector number outside the device
    #[error("Sector {sector} out of range (max: {max})")]
    SectorOutOfRange {
        /// Requested sector
        sector: u16,
        /// Highest valid sector number
        max: u16,
    },

    /// Sector byte range runs past the end of the image
    #[error("Short read of sector {sector}: wanted {wanted} bytes at offset {offset}")]
    ShortRead {
        /// Requested sector
        sector: u16,
        /// Absolute byte offset of the sector
        offset: u64,
        /// Sector length in bytes
        wanted: usize,
    },

    /// VTOC or directory contents are logically impossible
    #[error("Directory corrupt: {0}")]
    DirectoryCorrupt(String),

    /// Directory entry failed its sanity check and cannot be read
    #[error("Invalid directory entry #{file_num}: {reason}")]
    InvalidDirEntry {
        /// Directory slot of the entry
        file_num: u8,
        /// Why the entry was rejected
        reason: String,
    },

    /// DOS 2 sector trailer belongs to another file (Atari DOS error 164)
    #[error("File number mismatch (error 164): expected {expected}, found {found}")]
    FileNumberMismatch {
        /// File number of the directory entry
        expected: u8,
        /// File number decoded from the sector trailer
        found: u8,
    },

    /// Sector chain is longer than the volume allows
    #[error("File too long: more than {limit} sectors")]
    FileTooLong {
        /// Maximum number of sectors a file may span
        limit: u16,
    },

    /// DOS 2 sector chain runs past the sector count recorded in the directory
    #[error(
        "Sector chain for file #{file_num} continues at sector {sector} past its {expected} sectors"
    )]
    SectorCountExceeded {
        /// Directory slot of the entry
        file_num: u8,
        /// Sector count recorded in the directory
        expected: u16,
        /// Sector the chain tried to continue at
        sector: u16,
    },

    /// Sector trailer claims more payload than the sector can hold
    #[error("Sector {sector} claims {count} data bytes (max: {max})")]
    BadByteCount {
        /// Sector holding the trailer
        sector: u16,
        /// Byte count found in the trailer
        count: u8,
        /// Payload capacity of the sector
        max: usize,
    },

    /// Sector link points back at a sector already read
    #[error("Bad sector link: attempting to reread sector {sector}")]
    SectorLoop {
        /// Sector that would be read twice
        sector: u16,
    },

    /// File not found in the directory
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Data is not an Atari DOS binary load file
    #[error("Invalid executable: {0}")]
    InvalidExecutable(String),
}

impl AtrError {
    /// Create an invalid header error
    pub fn invalid_header<S: Into<String>>(message: S) -> Self {
        AtrError::InvalidHeader(message.into())
    }

    /// Create a directory corruption error
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        AtrError::DirectoryCorrupt(message.into())
    }

    /// Create an invalid executable error
    pub fn invalid_executable<S: Into<String>>(message: S) -> Self {
        AtrError::InvalidExecutable(message.into())
    }
}

/// Failure part way through reading a file
///
/// Carries the number of payload bytes that had been produced before the
/// error so callers can report how far the read got.
#[derive(Debug, Error)]
#[error("{source} (after {bytes_read} bytes)")]
pub struct ReadError {
    /// Payload bytes successfully read before the failure
    pub bytes_read: usize,
    /// Underlying error
    #[source]
    pub source: AtrError,
}

impl ReadError {
    /// Wrap an error with the number of bytes read so far
    pub fn new(bytes_read: usize, source: AtrError) -> Self {
        Self { bytes_read, source }
    }
}

impl From<ReadError> for AtrError {
    fn from(err: ReadError) -> Self {
        err.source
    }
}
