//! Running processes and the executables behind them.
//!
//! A [`Process`] is an open reference to a live process, held only long
//! enough to ask for its image path. On Windows it owns a
//! `PROCESS_QUERY_LIMITED_INFORMATION` handle that is closed on drop; on
//! Linux the path comes from `/proc/<pid>/exe`. Other hosts report
//! [`Error::Unsupported`](crate::Error::Unsupported).

use std::path::PathBuf;

use log::debug;

use crate::Result;

#[cfg(windows)]
use std::os::windows::io::{AsHandle, BorrowedHandle, OwnedHandle};

/// An opened process.
#[derive(Debug)]
pub struct Process {
    pid: u32,
    #[cfg(windows)]
    handle: OwnedHandle,
}

impl Process {
    /// Open process `pid` for querying its image path.
    pub fn open(pid: u32) -> Result<Self> {
        let process = sys::open(pid)?;
        debug!("Opened process {pid}");
        Ok(process)
    }

    /// The calling process.
    pub fn current() -> Result<Self> {
        Self::open(std::process::id())
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Full path of the executable image the process was started from.
    pub fn executable_path(&self) -> Result<PathBuf> {
        sys::executable_path(self)
    }
}

#[cfg(windows)]
impl AsHandle for Process {
    fn as_handle(&self) -> BorrowedHandle<'_> {
        self.handle.as_handle()
    }
}

/// Image path of the process behind a caller-owned handle.
///
/// The handle needs `PROCESS_QUERY_LIMITED_INFORMATION` access and is left
/// open.
#[cfg(windows)]
pub fn executable_path_of(handle: BorrowedHandle<'_>) -> Result<PathBuf> {
    sys::query_image_name(handle)
}

#[cfg(windows)]
mod sys {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use std::os::windows::io::{AsHandle, AsRawHandle, BorrowedHandle, FromRawHandle, OwnedHandle};
    use std::path::PathBuf;

    use log::debug;
    use windows_sys::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };

    use super::Process;
    use crate::{Error, Result};

    /// Longest path the wide-character APIs return.
    const MAX_LONG_PATH: usize = 32_768;

    pub(super) fn open(pid: u32) -> Result<Process> {
        let raw = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid) };
        if raw.is_null() {
            debug!(
                "OpenProcess({pid}) failed: {}",
                std::io::Error::last_os_error()
            );
            return Err(Error::ProcessUnavailable { pid });
        }
        // SAFETY: `raw` is a fresh handle owned by nobody else.
        let handle = unsafe { OwnedHandle::from_raw_handle(raw) };
        Ok(Process { pid, handle })
    }

    pub(super) fn executable_path(process: &Process) -> Result<PathBuf> {
        query_image_name(process.as_handle()).map_err(|e| {
            debug!("Image name of process {} unavailable: {e}", process.pid);
            Error::ProcessUnavailable { pid: process.pid }
        })
    }

    pub(super) fn query_image_name(handle: BorrowedHandle<'_>) -> Result<PathBuf> {
        let mut buf = vec![0u16; MAX_LONG_PATH];
        let mut len = buf.len() as u32;
        let ok = unsafe {
            QueryFullProcessImageNameW(
                handle.as_raw_handle(),
                PROCESS_NAME_WIN32,
                buf.as_mut_ptr(),
                &mut len,
            )
        };
        if ok == 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }
        buf.truncate(len as usize);
        Ok(PathBuf::from(OsString::from_wide(&buf)))
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::path::{Path, PathBuf};

    use log::debug;

    use super::Process;
    use crate::{Error, Result};

    pub(super) fn open(pid: u32) -> Result<Process> {
        if pid == 0 || !Path::new(&format!("/proc/{pid}")).is_dir() {
            return Err(Error::ProcessUnavailable { pid });
        }
        Ok(Process { pid })
    }

    pub(super) fn executable_path(process: &Process) -> Result<PathBuf> {
        let link = format!("/proc/{}/exe", process.pid);
        std::fs::read_link(&link).map_err(|e| {
            debug!("Reading {link} failed: {e}");
            Error::ProcessUnavailable { pid: process.pid }
        })
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
mod sys {
    use std::path::PathBuf;

    use super::Process;
    use crate::{Error, Result};

    pub(super) fn open(_pid: u32) -> Result<Process> {
        Err(Error::Unsupported("process queries"))
    }

    pub(super) fn executable_path(_process: &Process) -> Result<PathBuf> {
        Err(Error::Unsupported("process queries"))
    }
}
