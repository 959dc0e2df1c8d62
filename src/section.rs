//! Section Header structures and RVA mapping.

use crate::reader::Reader;
use crate::{Error, Result};

/// Section Header (IMAGE_SECTION_HEADER).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionHeader {
    /// Section name (8-byte null-padded ASCII).
    pub name: [u8; 8],
    /// Virtual size of the section.
    pub virtual_size: u32,
    /// RVA of the section.
    pub virtual_address: u32,
    /// Size of raw data on disk.
    pub size_of_raw_data: u32,
    /// File offset to raw data.
    pub pointer_to_raw_data: u32,
    /// Section characteristics.
    pub characteristics: u32,
}

impl SectionHeader {
    /// Size of a section header in bytes.
    pub const SIZE: usize = 40;

    /// Parse a section header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        let mut name = [0u8; 8];
        name.copy_from_slice(&data[0..8]);

        Ok(Self {
            name,
            virtual_size: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            virtual_address: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            size_of_raw_data: u32::from_le_bytes([data[16], data[17], data[18], data[19]]),
            pointer_to_raw_data: u32::from_le_bytes([data[20], data[21], data[22], data[23]]),
            characteristics: u32::from_le_bytes([data[36], data[37], data[38], data[39]]),
        })
    }

    /// Get the section name as a string (trimmed of null bytes).
    pub fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        std::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    /// Whether `rva` falls inside this section's virtual range.
    pub fn contains_rva(&self, rva: u32) -> bool {
        let size = self.virtual_size.max(self.size_of_raw_data);
        rva >= self.virtual_address && (rva - self.virtual_address) < size
    }

    /// Parse a section header from a Reader at the given offset.
    pub fn read_from<R: Reader>(reader: &R, offset: u64) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact_at(offset, &mut buf)?;
        Self::parse(&buf)
    }

    /// Read multiple section headers from a Reader.
    pub fn read_sections<R: Reader>(reader: &R, offset: u64, count: usize) -> Result<Vec<Self>> {
        let mut sections = Vec::with_capacity(count);
        for i in 0..count {
            let section_offset = offset + (i * Self::SIZE) as u64;
            sections.push(Self::read_from(reader, section_offset)?);
        }
        Ok(sections)
    }
}

/// Convert an RVA to a file offset using the section table.
///
/// Bytes past `size_of_raw_data` are zero-fill in memory and have no file
/// backing, so an RVA landing there maps to nothing.
pub fn rva_to_file_offset(sections: &[SectionHeader], rva: u32) -> Option<usize> {
    let section = sections.iter().find(|s| s.contains_rva(rva))?;
    let offset_in_section = rva - section.virtual_address;
    if offset_in_section >= section.size_of_raw_data {
        return None;
    }
    Some(section.pointer_to_raw_data as usize + offset_in_section as usize)
}
