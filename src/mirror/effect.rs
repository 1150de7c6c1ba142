// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Filesystem mutation backends.
//!
//! Every change a mirror makes to its destination goes through an
//! [`Effector`]. Each method maps to exactly one system call, so each
//! mutation is individually atomic, but a run as a whole is not.

use crate::config::DirMode;

use std::{fs, io, path::Path};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::symlink as host_symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_file as host_symlink;

/// Perform filesystem mutations for a mirror.
pub trait Effector {
    /// Create a single directory, without creating missing parents.
    fn create_dir(&self, path: &Path, mode: DirMode) -> io::Result<()>;

    /// Create symbolic link at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Remove a non-directory entry, e.g., a symlink or regular file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// Effector backed by the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl Effector for HostFs {
    /// Create directory with target permission bits.
    ///
    /// The process umask still applies on top of the requested mode.
    fn create_dir(&self, path: &Path, mode: DirMode) -> io::Result<()> {
        debug!("create directory {:?} with mode {mode}", path.display());
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode.bits());
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        debug!("link {:?} -> {:?}", link.display(), target.display());
        host_symlink(target, link)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        debug!("remove {:?}", path.display());
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        debug!("remove directory {:?}", path.display());
        fs::remove_dir(path)
    }
}
