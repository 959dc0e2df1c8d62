//! Optional Header parsing, reduced to what locating resources requires.

use crate::data_dir::{DataDirectory, RESOURCE_DIRECTORY_INDEX};
use crate::reader::Reader;
use crate::{Error, Result};

/// PE32 magic number.
pub const PE32_MAGIC: u16 = 0x10B;
/// PE32+ (64-bit) magic number.
pub const PE32PLUS_MAGIC: u16 = 0x20B;

/// Fixed part of the PE32 optional header, before the data directories.
const PE32_BASE_SIZE: usize = 96;
/// Fixed part of the PE32+ optional header, before the data directories.
const PE32PLUS_BASE_SIZE: usize = 112;

/// Optional header fields used by the extractor.
///
/// Both PE32 and PE32+ images are accepted; they only differ in where the
/// data directory array starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalHeader {
    /// PE32_MAGIC or PE32PLUS_MAGIC.
    pub magic: u16,
    /// Declared number of data directories.
    pub number_of_rva_and_sizes: u32,
    /// Data directories actually present in the header.
    pub data_directories: Vec<DataDirectory>,
}

impl OptionalHeader {
    /// Parse from a byte slice holding exactly `size_of_optional_header` bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::buffer_too_small(2, data.len()));
        }

        let magic = u16::from_le_bytes([data[0], data[1]]);
        let base = match magic {
            PE32_MAGIC => PE32_BASE_SIZE,
            PE32PLUS_MAGIC => PE32PLUS_BASE_SIZE,
            other => return Err(Error::InvalidOptionalHeaderMagic(other)),
        };

        if data.len() < base {
            return Err(Error::buffer_too_small(base, data.len()));
        }

        let number_of_rva_and_sizes =
            u32::from_le_bytes([data[base - 4], data[base - 3], data[base - 2], data[base - 1]]);

        // Linkers occasionally declare more directories than fit; only trust
        // what is physically inside the header.
        let fit = (data.len() - base) / DataDirectory::SIZE;
        let count = (number_of_rva_and_sizes as usize).min(fit);

        let mut data_directories = Vec::with_capacity(count);
        for i in 0..count {
            let offset = base + i * DataDirectory::SIZE;
            data_directories.push(DataDirectory::parse(&data[offset..])?);
        }

        Ok(Self {
            magic,
            number_of_rva_and_sizes,
            data_directories,
        })
    }

    /// Parse an optional header of `size` bytes from a Reader.
    pub fn read_from<R: Reader>(reader: &R, offset: u64, size: usize) -> Result<Self> {
        let mut buf = vec![0u8; size];
        reader.read_exact_at(offset, &mut buf)?;
        Self::parse(&buf)
    }

    /// Check if this is PE32+ (64-bit).
    pub fn is_pe32plus(&self) -> bool {
        self.magic == PE32PLUS_MAGIC
    }

    /// The resource table directory, if the image declares a non-empty one.
    pub fn resource_directory(&self) -> Option<DataDirectory> {
        self.data_directories
            .get(RESOURCE_DIRECTORY_INDEX)
            .copied()
            .filter(|dir| !dir.is_empty())
    }
}
