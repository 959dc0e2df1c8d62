//! Error types for module parsing and icon extraction.

use std::io;

/// Result type alias for exeicon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening a module or rebuilding its icon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied an unusable argument (empty path, bad encoding).
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    /// I/O error while reading a module or querying a process.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The process could not be opened or its image path could not be read.
    #[error("Process {pid} unavailable")]
    ProcessUnavailable { pid: u32 },
    /// The operation has no implementation on this host.
    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),
    /// Invalid DOS signature (expected "MZ").
    #[error("Invalid DOS signature (expected 'MZ')")]
    InvalidDosSignature,
    /// Invalid PE signature (expected "PE\0\0").
    #[error("Invalid PE signature (expected 'PE\\0\\0')")]
    InvalidPeSignature,
    /// Invalid optional header magic.
    #[error("Invalid optional header magic: {0:#06x}")]
    InvalidOptionalHeaderMagic(u16),
    /// Buffer too small to contain expected data.
    #[error("Buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
    /// Invalid RVA (could not read at address).
    #[error("Invalid RVA: {0:#x}")]
    InvalidRva(u32),
    /// The module has no resource directory at all.
    #[error("Module has no resource directory")]
    NoResourceDirectory,
    /// The module has no group icon resource.
    #[error("Module has no group icon resource")]
    DescriptorAbsent,
    /// A group icon was found but none of its images could be used.
    #[error("Group icon references no usable images")]
    NoUsableImages,
    /// The output buffer could not be allocated.
    #[error("Could not allocate {0} bytes for the icon container")]
    AllocationFailed(usize),
    /// A size or offset does not fit the fixed-width ICO fields.
    #[error("Icon container too large ({0} bytes)")]
    ContainerTooLarge(usize),
}

impl Error {
    /// Create a BufferTooSmall error.
    pub fn buffer_too_small(expected: usize, actual: usize) -> Self {
        Error::BufferTooSmall { expected, actual }
    }

    /// Create an InvalidRva error.
    pub fn invalid_rva(rva: u32) -> Self {
        Error::InvalidRva(rva)
    }

    /// Create an InvalidPeSignature error.
    pub fn invalid_pe_signature() -> Self {
        Error::InvalidPeSignature
    }

    /// True when the module was read fine but simply carries no usable icon.
    ///
    /// Callers use this to tell "no icon" apart from system failures.
    pub fn is_no_icon(&self) -> bool {
        matches!(
            self,
            Error::NoResourceDirectory | Error::DescriptorAbsent | Error::NoUsableImages
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_icon_classification() {
        assert!(Error::DescriptorAbsent.is_no_icon());
        assert!(Error::NoUsableImages.is_no_icon());
        assert!(Error::NoResourceDirectory.is_no_icon());
        assert!(!Error::InvalidDosSignature.is_no_icon());
        assert!(!Error::AllocationFailed(16).is_no_icon());
        assert!(!Error::from(io::Error::from(io::ErrorKind::NotFound)).is_no_icon());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::buffer_too_small(20, 6).to_string(),
            "Buffer too small: expected 20 bytes, got 6"
        );
        assert_eq!(Error::invalid_rva(0x3000).to_string(), "Invalid RVA: 0x3000");
    }
}
