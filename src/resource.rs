//! Resource directory parsing and lookup.
//!
//! The resource directory is a 3-level tree:
//! - Level 1: Resource Type (e.g., RT_ICON, RT_GROUP_ICON)
//! - Level 2: Resource Name/ID
//! - Level 3: Language ID
//!
//! Only what icon extraction needs is implemented: finding a resource by
//! type and name, and enumerating the names under a type.
//!
//! # Example
//!
//! ```no_run
//! use exeicon::{Module, ResourceId, ResourceStore, ResourceType};
//!
//! let module = Module::open("example.exe")?;
//! for name in module.names(ResourceType::GroupIcon)? {
//!     let size = module
//!         .lookup(ResourceType::GroupIcon, &name)
//!         .map_or(0, |data| data.len());
//!     println!("{name}: {size} bytes");
//! }
//! # Ok::<(), exeicon::Error>(())
//! ```

use std::fmt;

use log::warn;

use crate::module::ImageView;
use crate::{Error, Result};

/// Resource types involved in icon storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ResourceType {
    /// RT_ICON: one image of an icon.
    Icon = 3,
    /// RT_GROUP_ICON: header and directory of an icon.
    GroupIcon = 14,
}

impl ResourceType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Icon => "ICON",
            Self::GroupIcon => "GROUP_ICON",
        }
    }
}

/// Resource name/ID - can be numeric or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// Numeric ID.
    Id(u16),
    /// String name.
    Name(String),
}

impl ResourceId {
    /// Name comparison follows the loader: string names are matched
    /// without regard to ASCII case.
    pub fn matches(&self, other: &ResourceId) -> bool {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => a == b,
            (Self::Name(a), Self::Name(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Source of module resources.
///
/// `names` must be lazy: icon extraction only ever consumes the first item.
pub trait ResourceStore {
    /// Raw bytes of the resource, or `None` when absent or empty.
    fn lookup(&self, ty: ResourceType, name: &ResourceId) -> Option<&[u8]>;

    /// Names of all resources of a type, in directory order.
    ///
    /// A type with no resources gives an empty iterator. An unreadable
    /// resource tree is an error.
    fn names(&self, ty: ResourceType) -> Result<impl Iterator<Item = ResourceId> + '_>;
}

/// IMAGE_RESOURCE_DIRECTORY - 16 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceDirectoryHeader {
    /// Resource flags (reserved, usually 0).
    pub characteristics: u32,
    /// Time/date stamp.
    pub time_date_stamp: u32,
    /// Number of named entries.
    pub number_of_named_entries: u16,
    /// Number of ID entries.
    pub number_of_id_entries: u16,
}

impl ResourceDirectoryHeader {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            characteristics: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            time_date_stamp: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            number_of_named_entries: u16::from_le_bytes([data[12], data[13]]),
            number_of_id_entries: u16::from_le_bytes([data[14], data[15]]),
        })
    }

    pub fn total_entries(&self) -> usize {
        self.number_of_named_entries as usize + self.number_of_id_entries as usize
    }
}

/// IMAGE_RESOURCE_DIRECTORY_ENTRY - 8 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceDirectoryEntry {
    /// Name offset (high bit set) or ID.
    pub name_or_id: u32,
    /// Offset to data or subdirectory (high bit set = subdirectory).
    pub offset_to_data: u32,
}

impl ResourceDirectoryEntry {
    pub const SIZE: usize = 8;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            name_or_id: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            offset_to_data: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }

    /// Check if this entry has a string name (vs numeric ID).
    pub fn is_named(&self) -> bool {
        (self.name_or_id & 0x80000000) != 0
    }

    /// Get the name offset (only valid if is_named() is true).
    pub fn name_offset(&self) -> u32 {
        self.name_or_id & 0x7FFFFFFF
    }

    /// Get the ID (only valid if is_named() is false).
    pub fn id(&self) -> u16 {
        self.name_or_id as u16
    }

    /// Check if this points to a subdirectory (vs data entry).
    pub fn is_directory(&self) -> bool {
        (self.offset_to_data & 0x80000000) != 0
    }

    /// Get the offset to subdirectory or data entry.
    pub fn data_offset(&self) -> u32 {
        self.offset_to_data & 0x7FFFFFFF
    }
}

/// IMAGE_RESOURCE_DATA_ENTRY - 16 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceDataEntry {
    /// RVA of the resource data.
    pub offset_to_data: u32,
    /// Size of the resource data.
    pub size: u32,
    /// Code page.
    pub code_page: u32,
}

impl ResourceDataEntry {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            offset_to_data: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            size: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            code_page: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
        })
    }
}

/// The resource tree of a loaded module.
///
/// Nothing is parsed up front; every lookup walks the tree from the root,
/// borrowing data straight out of the module image.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDirectory<'a> {
    view: ImageView<'a>,
    root_rva: u32,
}

impl<'a> ResourceDirectory<'a> {
    /// Open the tree rooted at `root_rva`, checking the root header is readable.
    pub fn new(view: ImageView<'a>, root_rva: u32) -> Result<Self> {
        let dir = Self { view, root_rva };
        dir.directory_header(root_rva)?;
        Ok(dir)
    }

    /// Find a resource's bytes, taking the first language present.
    pub fn find(&self, ty: ResourceType, name: &ResourceId) -> Result<Option<&'a [u8]>> {
        let Some(type_entry) = self.find_entry(self.root_rva, &ResourceId::Id(ty as u16))? else {
            return Ok(None);
        };
        if !type_entry.is_directory() {
            return Ok(None);
        }

        let name_dir = self.at(type_entry.data_offset())?;
        let Some(name_entry) = self.find_entry(name_dir, name)? else {
            return Ok(None);
        };
        if !name_entry.is_directory() {
            return Ok(None);
        }

        let lang_dir = self.at(name_entry.data_offset())?;
        let lang_header = self.directory_header(lang_dir)?;
        if lang_header.total_entries() == 0 {
            return Ok(None);
        }
        let lang_entry = self.entry(lang_dir, 0)?;
        if lang_entry.is_directory() {
            return Ok(None); // Should be a data entry at this level
        }

        let data_entry_rva = self.at(lang_entry.data_offset())?;
        let raw_entry = self.read(data_entry_rva, ResourceDataEntry::SIZE)?;
        let data_entry = ResourceDataEntry::parse(raw_entry)?;
        if data_entry.size == 0 {
            return Ok(None);
        }

        self.read(data_entry.offset_to_data, data_entry.size as usize)
            .map(Some)
    }

    /// Lazily enumerate the names registered under a type.
    ///
    /// The type directory and its first entry are read up front, so a
    /// damaged tree fails here instead of looking empty.
    pub fn names(&self, ty: ResourceType) -> Result<Names<'a>> {
        let name_dir = match self.find_entry(self.root_rva, &ResourceId::Id(ty as u16))? {
            Some(entry) if entry.is_directory() => Some(self.at(entry.data_offset())?),
            _ => None,
        };
        let total = match name_dir {
            Some(rva) => self.directory_header(rva)?.total_entries(),
            None => 0,
        };
        if let (Some(rva), true) = (name_dir, total > 0) {
            self.resource_id(&self.entry(rva, 0)?)?;
        }

        Ok(Names {
            dir: *self,
            name_dir: name_dir.unwrap_or(0),
            index: 0,
            total,
        })
    }

    /// RVA of something stored at `offset` from the start of the tree.
    fn at(&self, offset: u32) -> Result<u32> {
        self.root_rva
            .checked_add(offset)
            .ok_or(Error::invalid_rva(offset))
    }

    fn read(&self, rva: u32, len: usize) -> Result<&'a [u8]> {
        self.view
            .read_at_rva(rva, len)
            .ok_or(Error::invalid_rva(rva))
    }

    fn directory_header(&self, rva: u32) -> Result<ResourceDirectoryHeader> {
        ResourceDirectoryHeader::parse(self.read(rva, ResourceDirectoryHeader::SIZE)?)
    }

    fn entry(&self, dir_rva: u32, index: usize) -> Result<ResourceDirectoryEntry> {
        let relative = ResourceDirectoryHeader::SIZE + index * ResourceDirectoryEntry::SIZE;
        let entry_rva = u32::try_from(relative)
            .ok()
            .and_then(|r| dir_rva.checked_add(r))
            .ok_or(Error::invalid_rva(dir_rva))?;
        ResourceDirectoryEntry::parse(self.read(entry_rva, ResourceDirectoryEntry::SIZE)?)
    }

    fn find_entry(
        &self,
        dir_rva: u32,
        wanted: &ResourceId,
    ) -> Result<Option<ResourceDirectoryEntry>> {
        let header = self.directory_header(dir_rva)?;
        for i in 0..header.total_entries() {
            let entry = self.entry(dir_rva, i)?;
            if self.resource_id(&entry)?.matches(wanted) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn resource_id(&self, entry: &ResourceDirectoryEntry) -> Result<ResourceId> {
        if !entry.is_named() {
            return Ok(ResourceId::Id(entry.id()));
        }

        // Resource names are length-prefixed Unicode strings
        let name_rva = self.at(entry.name_offset())?;
        let len_data = self.read(name_rva, 2)?;
        let len = u16::from_le_bytes([len_data[0], len_data[1]]) as usize;
        let name_data = self.read(name_rva.wrapping_add(2), len * 2)?;

        let chars: Vec<u16> = name_data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(ResourceId::Name(String::from_utf16_lossy(&chars)))
    }
}

impl ResourceStore for ResourceDirectory<'_> {
    fn lookup(&self, ty: ResourceType, name: &ResourceId) -> Option<&[u8]> {
        match self.find(ty, name) {
            Ok(found) => found,
            Err(e) => {
                warn!("Resource {} {name} unreadable: {e}", ty.name());
                None
            }
        }
    }

    fn names(&self, ty: ResourceType) -> Result<impl Iterator<Item = ResourceId> + '_> {
        ResourceDirectory::names(self, ty)
    }
}

/// Iterator over the names under one resource type.
///
/// Each step reads a single directory entry; dropping the iterator early
/// costs nothing further. A malformed entry ends the enumeration.
#[derive(Debug, Clone)]
pub struct Names<'a> {
    dir: ResourceDirectory<'a>,
    name_dir: u32,
    index: usize,
    total: usize,
}

impl Iterator for Names<'_> {
    type Item = ResourceId;

    fn next(&mut self) -> Option<ResourceId> {
        if self.index >= self.total {
            return None;
        }
        let result = self
            .dir
            .entry(self.name_dir, self.index)
            .and_then(|entry| self.dir.resource_id(&entry));
        match result {
            Ok(id) => {
                self.index += 1;
                Some(id)
            }
            Err(e) => {
                warn!("Stopping resource enumeration at entry {}: {e}", self.index);
                self.index = self.total;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.total - self.index))
    }
}
