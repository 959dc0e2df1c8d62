//! ICO container structures.
//!
//! An `.ico` file is a 6-byte header, `count` 16-byte directory entries and
//! then every image back to back. Inside a module the same header is stored
//! in an `RT_GROUP_ICON` resource, but each directory entry is 14 bytes and
//! ends with the `RT_ICON` resource ID of its image instead of a file offset.

use crate::{Error, Result};

/// The 8-byte signature every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Header type value for icons (cursors use 2).
pub const ICON_TYPE: u16 = 1;

/// Check whether an image payload is an embedded PNG.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// ICONDIR / GRPICONDIR header, identical on disk and in a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IconHeader {
    /// Reserved, must be 0.
    pub reserved: u16,
    /// 1 for icons.
    pub kind: u16,
    /// Number of directory entries that follow.
    pub count: u16,
}

impl IconHeader {
    pub const SIZE: usize = 6;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            reserved: u16::from_le_bytes([data[0], data[1]]),
            kind: u16::from_le_bytes([data[2], data[3]]),
            count: u16::from_le_bytes([data[4], data[5]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.reserved.to_le_bytes());
        buf[2..4].copy_from_slice(&self.kind.to_le_bytes());
        buf[4..6].copy_from_slice(&self.count.to_le_bytes());
        buf
    }
}

/// GRPICONDIRENTRY - a directory entry as stored in an `RT_GROUP_ICON`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupIconEntry {
    /// Width in pixels (0 means 256).
    pub width: u8,
    /// Height in pixels (0 means 256).
    pub height: u8,
    /// Palette size, 0 for true color.
    pub color_count: u8,
    pub reserved: u8,
    /// Color planes.
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,
    /// Recorded image size. Resource compilers truncate this for images
    /// above 64 KiB, so it is informational only.
    pub bytes_in_res: u32,
    /// `RT_ICON` resource ID holding the image.
    pub id: u16,
}

impl GroupIconEntry {
    pub const SIZE: usize = 14;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            width: data[0],
            height: data[1],
            color_count: data[2],
            reserved: data[3],
            planes: u16::from_le_bytes([data[4], data[5]]),
            bit_count: u16::from_le_bytes([data[6], data[7]]),
            bytes_in_res: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            id: u16::from_le_bytes([data[12], data[13]]),
        })
    }

    /// The on-disk entry for this image, placed at `image_offset` with the
    /// real payload length.
    pub fn to_disk_entry(&self, bytes_in_res: u32, image_offset: u32) -> IconDirEntry {
        IconDirEntry {
            width: self.width,
            height: self.height,
            color_count: self.color_count,
            reserved: self.reserved,
            planes: self.planes,
            bit_count: self.bit_count,
            bytes_in_res,
            image_offset,
        }
    }
}

/// ICONDIRENTRY - a directory entry in an `.ico` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IconDirEntry {
    pub width: u8,
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub planes: u16,
    pub bit_count: u16,
    /// Image size in bytes.
    pub bytes_in_res: u32,
    /// Offset of the image from the start of the file.
    pub image_offset: u32,
}

impl IconDirEntry {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::buffer_too_small(Self::SIZE, data.len()));
        }

        Ok(Self {
            width: data[0],
            height: data[1],
            color_count: data[2],
            reserved: data[3],
            planes: u16::from_le_bytes([data[4], data[5]]),
            bit_count: u16::from_le_bytes([data[6], data[7]]),
            bytes_in_res: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            image_offset: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.width;
        buf[1] = self.height;
        buf[2] = self.color_count;
        buf[3] = self.reserved;
        buf[4..6].copy_from_slice(&self.planes.to_le_bytes());
        buf[6..8].copy_from_slice(&self.bit_count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.bytes_in_res.to_le_bytes());
        buf[12..16].copy_from_slice(&self.image_offset.to_le_bytes());
        buf
    }
}

/// A parsed `RT_GROUP_ICON` resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupIconDirectory {
    pub header: IconHeader,
    /// Exactly `header.count` entries, in stored order.
    pub entries: Vec<GroupIconEntry>,
}

impl GroupIconDirectory {
    /// Parse the header and the `count` entries after it. Trailing bytes
    /// are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = IconHeader::parse(data)?;
        let count = header.count as usize;
        let needed = IconHeader::SIZE + count * GroupIconEntry::SIZE;
        if data.len() < needed {
            return Err(Error::buffer_too_small(needed, data.len()));
        }

        let entries = data[IconHeader::SIZE..needed]
            .chunks_exact(GroupIconEntry::SIZE)
            .map(GroupIconEntry::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { header, entries })
    }
}

/// The directory of a finished `.ico` buffer.
///
/// Used to inspect what the extractor produced; images are not decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconDirectory {
    pub header: IconHeader,
    pub entries: Vec<IconDirEntry>,
}

impl IconDirectory {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = IconHeader::parse(data)?;
        let needed = IconHeader::SIZE + header.count as usize * IconDirEntry::SIZE;
        if data.len() < needed {
            return Err(Error::buffer_too_small(needed, data.len()));
        }

        let entries = data[IconHeader::SIZE..needed]
            .chunks_exact(IconDirEntry::SIZE)
            .map(IconDirEntry::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { header, entries })
    }

    /// Borrow the payload of entry `index` out of the container bytes.
    pub fn image<'a>(&self, data: &'a [u8], index: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(index)?;
        let start = entry.image_offset as usize;
        let end = start.checked_add(entry.bytes_in_res as usize)?;
        data.get(start..end)
    }
}
