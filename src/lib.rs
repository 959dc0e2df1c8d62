//! # exeicon
//!
//! Rebuild the `.ico` file embedded in a Windows PE executable or DLL.
//!
//! A module stores each icon split in two: an `RT_GROUP_ICON` resource with
//! the icon directory, whose entries name their images by resource ID, and
//! one `RT_ICON` resource per image. This crate joins them back into a
//! regular `.ico` container with offset-addressed entries.
//!
//! ## Features
//!
//! - **Pure Rust resource reader**: modules are parsed from their bytes, never
//!   loaded or executed, so extraction works on any host.
//! - **Corrected sizes**: directory sizes always come from the image bytes,
//!   not from the group icon's recorded values, which resource compilers
//!   truncate for images above 64 KiB.
//! - **PNG filtering**: embedded PNG images can be dropped for consumers that
//!   only handle bitmap icons.
//! - **Processes and the shell default**: look up the icon by pid or process
//!   handle, or fetch the generic application icon from the system modules.
//!
//! ## Example
//!
//! ```no_run
//! use exeicon::{icon_from_path, icon_from_pid};
//!
//! let ico = icon_from_path(r"C:\Windows\notepad.exe", true).unwrap();
//! std::fs::write("notepad.ico", ico).unwrap();
//!
//! // Bitmap images only
//! let ico = icon_from_pid(std::process::id(), false).unwrap();
//! println!("{} bytes", ico.len());
//! ```
//!
//! Anything implementing [`ResourceStore`] can be fed to
//! [`extract_first_group`] directly.

pub mod api;
pub mod coff;
pub mod data_dir;
pub mod dos;
pub mod error;
pub mod extract;
pub mod icon;
pub mod module;
pub mod optional;
pub mod process;
pub mod reader;
pub mod resource;
pub mod section;

pub use api::{
    default_exe_icon, default_exe_icon_in, icon_from_path, icon_from_path_utf16, icon_from_pid,
    icon_from_process, DEFAULT_ICON_SOURCES,
};
#[cfg(windows)]
pub use api::icon_from_process_handle;
pub use error::{Error, Result};
pub use extract::{build_container, extract_first_group, extract_group, ExtractedImage};
pub use icon::{GroupIconDirectory, GroupIconEntry, IconDirEntry, IconDirectory, IconHeader};
pub use module::Module;
pub use process::Process;
pub use reader::{Reader, SliceReader};
pub use resource::{ResourceDirectory, ResourceId, ResourceStore, ResourceType};
pub use section::SectionHeader;
