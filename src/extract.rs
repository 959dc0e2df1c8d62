//! Rebuilding an `.ico` file from a group icon and its images.
//!
//! [`extract_first_group`] is the whole pipeline for one module: take the
//! first `RT_GROUP_ICON`, resolve each entry to its `RT_ICON`, drop what is
//! missing or filtered, then lay out header, directory and images into one
//! owned buffer. It works against any [`ResourceStore`].

use log::{debug, trace};

use crate::icon::{is_png, GroupIconDirectory, GroupIconEntry, IconDirEntry, IconHeader};
use crate::resource::{ResourceId, ResourceStore, ResourceType};
use crate::{Error, Result};

/// One image resolved from a group icon entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedImage<'a> {
    /// The entry as recorded in the group icon.
    pub entry: GroupIconEntry,
    /// Image bytes, borrowed from the resource store.
    pub data: &'a [u8],
}

impl ExtractedImage<'_> {
    /// Authoritative image length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Resolve every entry of `group` through `store`, keeping stored order.
///
/// Entries whose image is missing are dropped, as are embedded PNGs unless
/// `allow_png` is set. Fails with [`Error::NoUsableImages`] when nothing is
/// left.
pub fn select_images<'a, S: ResourceStore>(
    store: &'a S,
    group: &GroupIconDirectory,
    allow_png: bool,
) -> Result<Vec<ExtractedImage<'a>>> {
    let mut images = Vec::with_capacity(group.entries.len());

    for entry in &group.entries {
        let Some(data) = store
            .lookup(ResourceType::Icon, &ResourceId::Id(entry.id))
            .filter(|data| !data.is_empty())
        else {
            debug!("Skipping icon image #{}: resource not found", entry.id);
            continue;
        };

        if !allow_png && is_png(data) {
            debug!("Skipping icon image #{}: embedded PNG", entry.id);
            continue;
        }

        if data.len() != entry.bytes_in_res as usize {
            trace!(
                "Icon image #{} records {} bytes, resource holds {}",
                entry.id,
                entry.bytes_in_res,
                data.len()
            );
        }

        images.push(ExtractedImage {
            entry: *entry,
            data,
        });
    }

    if images.is_empty() {
        return Err(Error::NoUsableImages);
    }
    Ok(images)
}

/// Serialize `images` as a complete `.ico` file.
///
/// `header` supplies the reserved and type fields; the count is replaced by
/// the number of images. Each directory entry takes its size from the image
/// bytes, never from the recorded `bytes_in_res`.
pub fn build_container(header: &IconHeader, images: &[ExtractedImage<'_>]) -> Result<Vec<u8>> {
    let directory_size = IconHeader::SIZE + images.len() * IconDirEntry::SIZE;
    let total = images
        .iter()
        .try_fold(directory_size, |acc, image| acc.checked_add(image.len()))
        .ok_or(Error::ContainerTooLarge(usize::MAX))?;

    let count = u16::try_from(images.len()).map_err(|_| Error::ContainerTooLarge(total))?;
    if u32::try_from(total).is_err() {
        return Err(Error::ContainerTooLarge(total));
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(total)
        .map_err(|_| Error::AllocationFailed(total))?;

    let out_header = IconHeader { count, ..*header };
    buf.extend_from_slice(&out_header.to_bytes());

    // Every value below is bounded by `total`, checked to fit in u32.
    let mut image_offset = directory_size as u32;
    for image in images {
        let size = image.len() as u32;
        buf.extend_from_slice(&image.entry.to_disk_entry(size, image_offset).to_bytes());
        image_offset += size;
    }

    for image in images {
        buf.extend_from_slice(image.data);
    }

    debug_assert_eq!(buf.len(), total);
    Ok(buf)
}

/// Rebuild the `.ico` file for the group icon named `name`.
pub fn extract_group<S: ResourceStore>(
    store: &S,
    name: &ResourceId,
    allow_png: bool,
) -> Result<Vec<u8>> {
    let raw = store
        .lookup(ResourceType::GroupIcon, name)
        .ok_or(Error::DescriptorAbsent)?;
    let group = GroupIconDirectory::parse(raw)?;
    trace!(
        "Group icon {name}: {} entries, type {}",
        group.entries.len(),
        group.header.kind
    );

    let images = select_images(store, &group, allow_png)?;
    let container = build_container(&group.header, &images)?;
    debug!(
        "Rebuilt icon {name}: {} of {} images, {} bytes",
        images.len(),
        group.entries.len(),
        container.len()
    );
    Ok(container)
}

/// Rebuild the module's primary icon: the first enumerated group icon.
///
/// Later group icons are never looked at, even when the first one fails.
/// Only a module without any group icon yields [`Error::DescriptorAbsent`];
/// a damaged resource tree reports its own error.
pub fn extract_first_group<S: ResourceStore>(store: &S, allow_png: bool) -> Result<Vec<u8>> {
    let name = store
        .names(ResourceType::GroupIcon)?
        .next()
        .ok_or(Error::DescriptorAbsent)?;
    extract_group(store, &name, allow_png)
}
