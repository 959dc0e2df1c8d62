//! DOS header: the only part we need is the pointer to the PE header.

use crate::reader::Reader;
use crate::{Error, Result};

/// DOS "MZ" signature.
pub const DOS_SIGNATURE: u16 = 0x5A4D; // "MZ"

/// Offset of `e_lfanew` inside IMAGE_DOS_HEADER.
const E_LFANEW_OFFSET: usize = 60;

/// The two IMAGE_DOS_HEADER fields the extractor reads.
///
/// Everything between the magic and `e_lfanew` belongs to the real-mode
/// stub and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosHeader {
    /// Magic number ("MZ" = 0x5A4D).
    pub e_magic: u16,
    /// File address of new exe header (PE header offset).
    pub e_lfanew: u32,
}

impl DosHeader {
    /// Size of the DOS header in bytes.
    pub const SIZE: usize = 64;

    /// Parse a DOS header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        let e_magic = u16::from_le_bytes([data[0], data[1]]);
        if e_magic != DOS_SIGNATURE {
            return Err(Error::InvalidDosSignature);
        }

        let o = E_LFANEW_OFFSET;
        Ok(Self {
            e_magic,
            e_lfanew: u32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]),
        })
    }

    /// Parse a DOS header from a Reader at the given offset.
    pub fn read_from<R: Reader>(reader: &R, offset: u64) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact_at(offset, &mut buf)?;
        Self::parse(&buf)
    }
}
