// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Error, Result};
use mio::net::UnixListener;
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// The socket clients connect to in order to address the device.
///
/// The socket file is removed when the registration is dropped.
#[derive(Debug)]
pub struct Registration {
    listener: UnixListener,
    path: PathBuf,
}

impl Registration {
    /// Bind the socket at `path` and restrict its file mode to `mode`.
    ///
    /// A stale socket left at the path by a dead device is replaced.
    /// Fails with [`Error::Busy`] if a device is already serving the path,
    /// or [`Error::NotSocket`] if the path is occupied by anything other
    /// than a socket.
    pub fn new<P: Into<PathBuf>>(path: P, mode: u32) -> Result<Registration> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::Registration(path.clone(), e))?;
        }
        clear_stale(&path)?;
        let listener =
            UnixListener::bind(&path).map_err(|e| Error::Registration(path.clone(), e))?;
        // the file is now ours to remove
        let reg = Registration { listener, path };
        fs::set_permissions(&reg.path, Permissions::from_mode(mode))
            .map_err(|e| Error::Registration(reg.path.clone(), e))?;
        log::info!("registered {} with mode {:#o}", reg.path.display(), mode);
        Ok(reg)
    }

    /// The path of the socket file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn listener(&self) -> &UnixListener {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut UnixListener {
        &mut self.listener
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::info!("unregistered {}", self.path.display()),
            Err(e) => log::warn!("failed to remove {}: {}", self.path.display(), e),
        }
    }
}

fn clear_stale(path: &Path) -> Result<()> {
    let md = match fs::symlink_metadata(path) {
        Ok(md) => md,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::Registration(path.into(), e)),
    };
    if !md.file_type().is_socket() {
        return Err(Error::NotSocket(path.into()));
    }
    match UnixStream::connect(path) {
        Ok(_) => Err(Error::Busy(path.into())),
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            log::warn!("removing stale socket {}", path.display());
            fs::remove_file(path).map_err(|e| Error::Registration(path.into(), e))
        }
        Err(e) => Err(Error::Registration(path.into(), e)),
    }
}
