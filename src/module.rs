//! Opened PE modules.
//!
//! A [`Module`] owns the complete image bytes of an executable or DLL plus
//! the parsed headers needed to reach its resources. Opening never executes
//! anything; the file is read once and parsed in memory. Everything borrowed
//! from a module (resource bytes, enumerations) is tied to its lifetime, and
//! dropping the module releases the image.

use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::coff::{verify_pe_signature, CoffHeader};
use crate::dos::DosHeader;
use crate::optional::OptionalHeader;
use crate::reader::SliceReader;
use crate::resource::{ResourceDirectory, ResourceId, ResourceStore, ResourceType};
use crate::section::{rva_to_file_offset, SectionHeader};
use crate::{Error, Result};

/// Borrowed view of an image that resolves RVAs to file bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    reader: SliceReader<'a>,
    sections: &'a [SectionHeader],
}

impl<'a> ImageView<'a> {
    pub fn new(data: &'a [u8], sections: &'a [SectionHeader]) -> Self {
        Self {
            reader: SliceReader::new(data),
            sections,
        }
    }

    /// Read data at an RVA.
    pub fn read_at_rva(&self, rva: u32, len: usize) -> Option<&'a [u8]> {
        let offset = rva_to_file_offset(self.sections, rva)?;
        self.reader.slice_at(offset, len).ok()
    }
}

/// A PE image opened for resource access.
#[derive(Debug)]
pub struct Module {
    /// COFF file header.
    pub coff_header: CoffHeader,
    /// Optional header (PE32 or PE32+).
    pub optional_header: OptionalHeader,
    /// Section headers.
    pub sections: Vec<SectionHeader>,
    path: Option<PathBuf>,
    data: Vec<u8>,
}

impl Module {
    /// Open a module from disk, read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut module = Self::from_vec(data)?;
        debug!(
            "Opened module {} ({} bytes, {} sections)",
            path.display(),
            module.data.len(),
            module.sections.len()
        );
        module.path = Some(path.to_path_buf());
        Ok(module)
    }

    /// Create from owned image bytes.
    pub fn from_vec(data: Vec<u8>) -> Result<Self> {
        let reader = SliceReader::new(&data);

        let dos_header = DosHeader::read_from(&reader, 0)?;
        let pe_offset = dos_header.e_lfanew as u64;
        verify_pe_signature(&reader, pe_offset)?;

        // COFF header follows the 4-byte PE signature
        let coff_offset = pe_offset + 4;
        let coff_header = CoffHeader::read_from(&reader, coff_offset)?;

        let optional_offset = coff_offset + CoffHeader::SIZE as u64;
        let optional_header = OptionalHeader::read_from(
            &reader,
            optional_offset,
            coff_header.size_of_optional_header as usize,
        )?;

        let sections_offset = optional_offset + coff_header.size_of_optional_header as u64;
        let sections = SectionHeader::read_sections(
            &reader,
            sections_offset,
            coff_header.number_of_sections as usize,
        )?;

        Ok(Self {
            coff_header,
            optional_header,
            sections,
            path: None,
            data,
        })
    }

    /// Parse a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::from_vec(data.to_vec())
    }

    /// Path the module was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Check if this is a 64-bit PE file.
    pub fn is_64bit(&self) -> bool {
        self.optional_header.is_pe32plus()
    }

    /// Check if this is a DLL.
    pub fn is_dll(&self) -> bool {
        self.coff_header.is_dll()
    }

    /// RVA-resolving view over the image.
    pub fn view(&self) -> ImageView<'_> {
        ImageView::new(&self.data, &self.sections)
    }

    /// The module's resource tree.
    pub fn resources(&self) -> Result<ResourceDirectory<'_>> {
        let dir = self
            .optional_header
            .resource_directory()
            .ok_or(Error::NoResourceDirectory)?;
        if let Some(section) = self
            .sections
            .iter()
            .find(|s| s.contains_rva(dir.virtual_address))
        {
            trace!("Resource directory in section {:?}", section.name_str());
        }
        ResourceDirectory::new(self.view(), dir.virtual_address)
    }
}

impl ResourceStore for Module {
    fn lookup(&self, ty: ResourceType, name: &ResourceId) -> Option<&[u8]> {
        let dir = self.resources().ok()?;
        match dir.find(ty, name) {
            Ok(found) => found,
            Err(e) => {
                warn!("Resource {} {name} unreadable: {e}", ty.name());
                None
            }
        }
    }

    fn names(&self, ty: ResourceType) -> Result<impl Iterator<Item = ResourceId> + '_> {
        self.resources()?.names(ty)
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            trace!("Closing module {}", path.display());
        }
    }
}
