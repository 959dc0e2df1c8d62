//! COFF File Header structures and parsing.

use crate::reader::Reader;
use crate::{Error, Result};

/// PE signature "PE\0\0".
pub const PE_SIGNATURE: u32 = 0x00004550;

/// COFF characteristics bits the extractor reports on.
pub mod characteristics {
    /// File is executable.
    pub const EXECUTABLE_IMAGE: u16 = 0x0002;
    /// File is a DLL.
    pub const DLL: u16 = 0x2000;
}

/// COFF File Header (IMAGE_FILE_HEADER).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoffHeader {
    /// Target machine type.
    pub machine: u16,
    /// Number of sections.
    pub number_of_sections: u16,
    /// Timestamp (seconds since epoch).
    pub time_date_stamp: u32,
    /// Size of optional header.
    pub size_of_optional_header: u16,
    /// Characteristics flags.
    pub characteristics: u16,
}

impl CoffHeader {
    /// Size of the COFF header in bytes.
    pub const SIZE: usize = 20;

    /// Parse a COFF header from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            machine: u16::from_le_bytes([data[0], data[1]]),
            number_of_sections: u16::from_le_bytes([data[2], data[3]]),
            time_date_stamp: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            size_of_optional_header: u16::from_le_bytes([data[16], data[17]]),
            characteristics: u16::from_le_bytes([data[18], data[19]]),
        })
    }

    /// Check if the file is a DLL.
    pub fn is_dll(&self) -> bool {
        self.characteristics & characteristics::DLL != 0
    }

    /// Parse a COFF header from a Reader at the given offset.
    pub fn read_from<R: Reader>(reader: &R, offset: u64) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact_at(offset, &mut buf)?;
        Self::parse(&buf)
    }
}

/// Verify PE signature at the given offset.
pub fn verify_pe_signature<R: Reader>(reader: &R, offset: u64) -> Result<()> {
    let sig = reader.read_u32_at(offset)?;
    if sig != PE_SIGNATURE {
        return Err(Error::invalid_pe_signature());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SliceReader;

    #[test]
    fn test_coff_header_parse() {
        let mut buf = [0u8; 20];
        buf[0..2].copy_from_slice(&0x8664u16.to_le_bytes());
        buf[2..4].copy_from_slice(&3u16.to_le_bytes());
        buf[16..18].copy_from_slice(&240u16.to_le_bytes());
        let flags = characteristics::EXECUTABLE_IMAGE | characteristics::DLL;
        buf[18..20].copy_from_slice(&flags.to_le_bytes());

        let header = CoffHeader::parse(&buf).unwrap();
        assert_eq!(header.machine, 0x8664);
        assert_eq!(header.number_of_sections, 3);
        assert_eq!(header.size_of_optional_header, 240);
        assert!(header.is_dll());
    }

    #[test]
    fn test_coff_header_too_small() {
        assert!(matches!(
            CoffHeader::parse(&[0u8; 10]),
            Err(Error::BufferTooSmall {
                expected: 20,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_verify_pe_signature() {
        let data = *b"xxPE\0\0";
        let reader = SliceReader::new(&data);
        assert!(verify_pe_signature(&reader, 2).is_ok());
        assert!(matches!(
            verify_pe_signature(&reader, 0),
            Err(Error::InvalidPeSignature)
        ));
    }
}
