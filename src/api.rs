//! Public entry points.
//!
//! Each call opens what it needs, rebuilds one icon and releases everything
//! before returning. Nothing is cached between calls.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::extract::{extract_first_group, extract_group};
use crate::module::Module;
use crate::process::Process;
use crate::resource::ResourceId;
use crate::{Error, Result};

#[cfg(windows)]
use std::os::windows::io::BorrowedHandle;

/// Modules holding the shell's generic application icon, most preferred
/// first, each with the group icon ID to use.
pub const DEFAULT_ICON_SOURCES: [(&str, u16); 2] = [("imageres.dll", 15), ("shell32.dll", 3)];

/// Rebuild the primary icon of the executable or DLL at `path`.
///
/// The primary icon is the first group icon in resource directory order.
/// Embedded PNG images are kept only when `allow_png` is set.
pub fn icon_from_path<P: AsRef<Path>>(path: P, allow_png: bool) -> Result<Vec<u8>> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidInput("empty path"));
    }

    let module = Module::open(path)?;
    extract_first_group(&module.resources()?, allow_png)
}

/// [`icon_from_path`] for a UTF-16 encoded path.
///
/// The path ends at the first NUL unit, if there is one.
pub fn icon_from_path_utf16(path: &[u16], allow_png: bool) -> Result<Vec<u8>> {
    let end = path.iter().position(|&unit| unit == 0).unwrap_or(path.len());
    let path = &path[..end];
    if path.is_empty() {
        return Err(Error::InvalidInput("empty path"));
    }
    icon_from_path(wide_to_path(path)?, allow_png)
}

#[cfg(windows)]
fn wide_to_path(wide: &[u16]) -> Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    Ok(PathBuf::from(OsString::from_wide(wide)))
}

#[cfg(not(windows))]
fn wide_to_path(wide: &[u16]) -> Result<PathBuf> {
    String::from_utf16(wide)
        .map(PathBuf::from)
        .map_err(|_| Error::InvalidInput("path is not valid UTF-16"))
}

/// Rebuild the primary icon of the executable `process` was started from.
pub fn icon_from_process(process: &Process, allow_png: bool) -> Result<Vec<u8>> {
    let path = process.executable_path()?;
    debug!("Process {} runs {}", process.pid(), path.display());
    icon_from_path(path, allow_png)
}

/// [`icon_from_process`] for a caller-owned process handle.
#[cfg(windows)]
pub fn icon_from_process_handle(handle: BorrowedHandle<'_>, allow_png: bool) -> Result<Vec<u8>> {
    let path = crate::process::executable_path_of(handle)?;
    icon_from_path(path, allow_png)
}

/// Rebuild the primary icon of the executable running as `pid`.
pub fn icon_from_pid(pid: u32, allow_png: bool) -> Result<Vec<u8>> {
    let process = Process::open(pid)?;
    icon_from_process(&process, allow_png)
}

/// The icon the shell shows for executables without one of their own.
pub fn default_exe_icon(allow_png: bool) -> Result<Vec<u8>> {
    default_exe_icon_in(system_directory()?, allow_png)
}

/// [`default_exe_icon`], looking for the system modules in `system_dir`.
///
/// Sources are tried in [`DEFAULT_ICON_SOURCES`] order. A later source is
/// only consulted when an earlier one cannot be opened or yields no icon;
/// the last failure is returned when none succeed.
pub fn default_exe_icon_in<P: AsRef<Path>>(system_dir: P, allow_png: bool) -> Result<Vec<u8>> {
    let system_dir = system_dir.as_ref();
    let mut last_error = Error::DescriptorAbsent;

    for (file, id) in DEFAULT_ICON_SOURCES {
        let path = system_dir.join(file);
        let result = Module::open(&path).and_then(|module| {
            extract_group(&module.resources()?, &ResourceId::Id(id), allow_png)
        });
        match result {
            Ok(icon) => {
                debug!("Default icon taken from {} #{id}", path.display());
                return Ok(icon);
            }
            Err(e) => {
                warn!("No default icon in {} #{id}: {e}", path.display());
                last_error = e;
            }
        }
    }

    Err(last_error)
}

#[cfg(windows)]
fn system_directory() -> Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows_sys::Win32::System::SystemInformation::GetSystemDirectoryW;

    let mut buf = vec![0u16; 260];
    loop {
        let len = unsafe { GetSystemDirectoryW(buf.as_mut_ptr(), buf.len() as u32) } as usize;
        if len == 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }
        // On a short buffer the required size, NUL included, comes back.
        if len < buf.len() {
            buf.truncate(len);
            return Ok(PathBuf::from(OsString::from_wide(&buf)));
        }
        buf.resize(len, 0);
    }
}

#[cfg(not(windows))]
fn system_directory() -> Result<PathBuf> {
    ["SYSTEMROOT", "SystemRoot"]
        .into_iter()
        .find_map(std::env::var_os)
        .filter(|root| !root.is_empty())
        .map(|root| PathBuf::from(root).join("System32"))
        .ok_or(Error::Unsupported("no Windows system directory"))
}
