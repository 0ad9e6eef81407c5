/// Random-access byte sources for disk images

use std::io::{Read, Seek, SeekFrom};

/// Random-access reader over the raw bytes of an image
///
/// Every read positions the source itself, so the seek and read pair must not
/// be interleaved with another user of the same source.
pub trait ByteSource {
    /// Total length of the source in bytes
    fn byte_len(&mut self) -> std::io::Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`
    ///
    /// Fails with `UnexpectedEof` rather than returning a short buffer.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()>;
}

impl<T: Read + Seek> ByteSource for T {
    fn byte_len(&mut self) -> std::io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }
}

/// Read up to `len` bytes from the start of a source
pub fn read_prefix<S: ByteSource>(source: &mut S, len: usize) -> std::io::Result<Vec<u8>> {
    let total = source.byte_len()?;
    let mut prefix = vec![0u8; (len as u64).min(total) as usize];
    source.read_at(0, &mut prefix)?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cursor_source() {
        let mut source = Cursor::new((0u8..32).collect::<Vec<u8>>());
        assert_eq!(source.byte_len().unwrap(), 32);

        let mut buf = [0u8; 4];
        source.read_at(10, &mut buf).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);

        // Reads reposition regardless of previous cursor
        source.read_at(0, &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[test]
    fn test_read_past_end() {
        let mut source = Cursor::new(vec![0u8; 8]);
        let mut buf = [0u8; 4];
        let err = source.read_at(6, &mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_prefix_short_source() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        assert_eq!(read_prefix(&mut source, 16).unwrap(), vec![1, 2, 3]);

        let mut source = Cursor::new(vec![7u8; 64]);
        assert_eq!(read_prefix(&mut source, 16).unwrap().len(), 16);
    }
}
