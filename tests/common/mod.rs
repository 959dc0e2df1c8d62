//! Synthetic PE images with resource sections, for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use exeicon::icon::PNG_SIGNATURE;
use exeicon::ResourceId;

pub const RT_ICON: u16 = 3;
pub const RT_GROUP_ICON: u16 = 14;

const LANG_EN_US: u32 = 1033;
const FILE_ALIGNMENT: usize = 0x200;
const TEXT_RVA: u32 = 0x1000;
const RSRC_RVA: u32 = 0x2000;

/// Builder for a `.rsrc` section: type, then name, then a single language.
#[derive(Debug, Default)]
pub struct ResourceTree {
    types: Vec<(u16, Vec<(ResourceId, Vec<u8>)>)>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, ty: u16, name: ResourceId, data: Vec<u8>) -> Self {
        match self.types.iter_mut().find(|(t, _)| *t == ty) {
            Some((_, entries)) => entries.push((name, data)),
            None => self.types.push((ty, vec![(name, data)])),
        }
        self
    }

    pub fn icon(self, id: u16, data: Vec<u8>) -> Self {
        self.add(RT_ICON, ResourceId::Id(id), data)
    }

    pub fn group(self, name: ResourceId, data: Vec<u8>) -> Self {
        self.add(RT_GROUP_ICON, name, data)
    }

    /// Serialize the tree as it would appear at `base_rva`.
    pub fn build(&self, base_rva: u32) -> Vec<u8> {
        // Named entries precede ID entries within a directory.
        let types: Vec<(u16, Vec<&(ResourceId, Vec<u8>)>)> = self
            .types
            .iter()
            .map(|(ty, entries)| {
                let mut sorted: Vec<_> = entries.iter().collect();
                sorted.sort_by_key(|(name, _)| matches!(name, ResourceId::Id(_)));
                (*ty, sorted)
            })
            .collect();
        let resources: Vec<&(ResourceId, Vec<u8>)> =
            types.iter().flat_map(|(_, e)| e.iter().copied()).collect();

        let mut type_dirs = Vec::with_capacity(types.len());
        let mut cursor = 16 + 8 * types.len();
        for (_, entries) in &types {
            type_dirs.push(cursor);
            cursor += 16 + 8 * entries.len();
        }
        let lang_start = cursor;
        let data_entry_start = lang_start + 24 * resources.len();
        let strings_start = data_entry_start + 16 * resources.len();

        let mut strings = Vec::new();
        let mut name_offsets = Vec::with_capacity(resources.len());
        for (name, _) in &resources {
            match name {
                ResourceId::Name(s) => {
                    name_offsets.push(Some(strings_start + strings.len()));
                    let units: Vec<u16> = s.encode_utf16().collect();
                    strings.extend_from_slice(&(units.len() as u16).to_le_bytes());
                    for unit in units {
                        strings.extend_from_slice(&unit.to_le_bytes());
                    }
                }
                ResourceId::Id(_) => name_offsets.push(None),
            }
        }

        let mut out = vec![0u8; strings_start];
        out.extend_from_slice(&strings);
        align(&mut out, 4);

        let mut blob_offsets = Vec::with_capacity(resources.len());
        for (_, data) in &resources {
            blob_offsets.push(out.len());
            out.extend_from_slice(data);
            align(&mut out, 4);
        }

        write_dir_header(&mut out, 0, 0, types.len());
        for (i, (ty, _)) in types.iter().enumerate() {
            let at = 16 + 8 * i;
            put_u32(&mut out, at, *ty as u32);
            put_u32(&mut out, at + 4, type_dirs[i] as u32 | 0x8000_0000);
        }

        let mut k = 0;
        for (t, (_, entries)) in types.iter().enumerate() {
            let named = entries
                .iter()
                .filter(|(name, _)| matches!(name, ResourceId::Name(_)))
                .count();
            write_dir_header(&mut out, type_dirs[t], named, entries.len() - named);

            for (i, (name, data)) in entries.iter().enumerate() {
                let at = type_dirs[t] + 16 + 8 * i;
                let name_field = match name {
                    ResourceId::Id(id) => *id as u32,
                    ResourceId::Name(_) => name_offsets[k].unwrap_or(0) as u32 | 0x8000_0000,
                };
                let lang_dir = lang_start + 24 * k;
                put_u32(&mut out, at, name_field);
                put_u32(&mut out, at + 4, lang_dir as u32 | 0x8000_0000);

                write_dir_header(&mut out, lang_dir, 0, 1);
                let data_entry = data_entry_start + 16 * k;
                put_u32(&mut out, lang_dir + 16, LANG_EN_US);
                put_u32(&mut out, lang_dir + 20, data_entry as u32);

                put_u32(&mut out, data_entry, base_rva + blob_offsets[k] as u32);
                put_u32(&mut out, data_entry + 4, data.len() as u32);
                k += 1;
            }
        }

        out
    }
}

/// Builder for a minimal PE image holding a code section and, optionally,
/// a resource section.
#[derive(Debug)]
pub struct PeImage {
    is_64bit: bool,
    is_dll: bool,
    resources: Option<ResourceTree>,
}

impl PeImage {
    pub fn new() -> Self {
        Self {
            is_64bit: true,
            is_dll: false,
            resources: None,
        }
    }

    pub fn pe32(mut self) -> Self {
        self.is_64bit = false;
        self
    }

    pub fn dll(mut self) -> Self {
        self.is_dll = true;
        self
    }

    pub fn resources(mut self, tree: ResourceTree) -> Self {
        self.resources = Some(tree);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let rsrc = self.resources.as_ref().map(|tree| tree.build(RSRC_RVA));
        let section_count = 1 + rsrc.is_some() as usize;

        let pe_offset = 0x80;
        let coff = pe_offset + 4;
        let optional = coff + 20;
        let (magic, base, machine) = if self.is_64bit {
            (0x20Bu16, 112, 0x8664u16)
        } else {
            (0x10B, 96, 0x14C)
        };
        let optional_size = base + 16 * 8;
        let section_table = optional + optional_size;

        let mut out = vec![0u8; FILE_ALIGNMENT];
        out[0..2].copy_from_slice(b"MZ");
        put_u32(&mut out, 60, pe_offset as u32);
        out[pe_offset..pe_offset + 4].copy_from_slice(b"PE\0\0");

        let mut characteristics = 0x0002u16;
        if self.is_dll {
            characteristics |= 0x2000;
        }
        put_u16(&mut out, coff, machine);
        put_u16(&mut out, coff + 2, section_count as u16);
        put_u16(&mut out, coff + 16, optional_size as u16);
        put_u16(&mut out, coff + 18, characteristics);

        put_u16(&mut out, optional, magic);
        put_u32(&mut out, optional + base - 4, 16);

        let text = vec![0xCCu8; 0x40];
        let text_raw = out.len();
        write_section(&mut out, section_table, b".text", TEXT_RVA, text.len(), text_raw);
        out.extend_from_slice(&text);
        align(&mut out, FILE_ALIGNMENT);

        if let Some(rsrc) = rsrc {
            let dir = optional + base + 8 * 2;
            put_u32(&mut out, dir, RSRC_RVA);
            put_u32(&mut out, dir + 4, rsrc.len() as u32);

            let rsrc_raw = out.len();
            write_section(&mut out, section_table + 40, b".rsrc", RSRC_RVA, rsrc.len(), rsrc_raw);
            out.extend_from_slice(&rsrc);
            align(&mut out, FILE_ALIGNMENT);
        }

        out
    }
}

impl Default for PeImage {
    fn default() -> Self {
        Self::new()
    }
}

fn write_section(out: &mut [u8], at: usize, name: &[u8], rva: u32, len: usize, raw: usize) {
    let raw_size = len.div_ceil(FILE_ALIGNMENT) * FILE_ALIGNMENT;
    out[at..at + name.len()].copy_from_slice(name);
    put_u32(out, at + 8, len as u32);
    put_u32(out, at + 12, rva);
    put_u32(out, at + 16, raw_size as u32);
    put_u32(out, at + 20, raw as u32);
    put_u32(out, at + 36, 0x4000_0040);
}

fn write_dir_header(out: &mut [u8], at: usize, named: usize, ids: usize) {
    put_u16(out, at + 12, named as u16);
    put_u16(out, at + 14, ids as u16);
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn align(buf: &mut Vec<u8>, to: usize) {
    let len = buf.len().div_ceil(to) * to;
    buf.resize(len, 0);
}

/// File offset of the `.rsrc` section in an image built by [`PeImage`].
pub fn rsrc_file_offset(image: &[u8]) -> usize {
    let module = exeicon::Module::from_slice(image).expect("parse built image");
    let section = module
        .sections
        .iter()
        .find(|s| s.name_str() == ".rsrc")
        .expect("image has a .rsrc section");
    section.pointer_to_raw_data as usize
}

/// RT_GROUP_ICON payload. Each entry is `(width, recorded size, image id)`.
pub fn group_icon(entries: &[(u8, u32, u16)]) -> Vec<u8> {
    let mut data = Vec::with_capacity(6 + 14 * entries.len());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (size, recorded, id) in entries {
        data.extend_from_slice(&[*size, *size, 0, 0]);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&32u16.to_le_bytes());
        data.extend_from_slice(&recorded.to_le_bytes());
        data.extend_from_slice(&id.to_le_bytes());
    }
    data
}

/// A bitmap image payload: BITMAPINFOHEADER size followed by filler.
pub fn bmp_image(len: usize, fill: u8) -> Vec<u8> {
    let mut data = vec![fill; len];
    data[..4].copy_from_slice(&40u32.to_le_bytes());
    data
}

/// A payload starting with the PNG signature.
pub fn png_image(len: usize) -> Vec<u8> {
    let mut data = vec![0x42; len];
    data[..8].copy_from_slice(&PNG_SIGNATURE);
    data
}

/// A file under the temp directory, removed on drop.
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(name: &str, contents: &[u8]) -> Self {
        let path = std::env::temp_dir().join(format!("exeicon-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("write temp file");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// A directory under the temp directory, removed with its contents on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("exeicon-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, file: &str, contents: &[u8]) {
        fs::write(self.path.join(file), contents).expect("write temp dir file");
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}
