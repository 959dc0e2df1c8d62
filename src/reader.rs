//! Reader trait and the in-memory implementation used for module images.

use crate::{Error, Result};

/// Trait for reading little-endian values out of a module image.
///
/// Header parsing is written against this trait so it does not care whether
/// the bytes come from a file buffer or a fuzzer input.
pub trait Reader {
    /// Read bytes at the given offset into the buffer.
    /// Returns the number of bytes actually read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Read exact number of bytes at offset, returning error if not enough data.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = self.read_at(offset, buf)?;
        if n < buf.len() {
            return Err(Error::buffer_too_small(buf.len(), n));
        }
        Ok(())
    }

    /// Read a u32 at the given offset (little-endian).
    fn read_u32_at(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// Reader implementation for byte slices (in-memory data).
#[derive(Debug, Clone, Copy)]
pub struct SliceReader<'a> {
    data: &'a [u8],
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Borrow `len` bytes at `offset` without copying.
    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or(Error::buffer_too_small(len, 0))?;
        self.data.get(offset..end).ok_or_else(|| {
            Error::buffer_too_small(len, self.data.len().saturating_sub(offset))
        })
    }
}

impl Reader for SliceReader<'_> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let offset = match usize::try_from(offset) {
            Ok(o) if o < self.data.len() => o,
            _ => return Ok(0),
        };
        let available = self.data.len() - offset;
        let to_read = buf.len().min(available);
        buf[..to_read].copy_from_slice(&self.data[offset..offset + to_read]);
        Ok(to_read)
    }
}
