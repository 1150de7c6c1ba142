// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Source tree traversal.
//!
//! Walks a source tree and yields each entry relative to the tree root. The
//! root itself is never yielded, because the destination root is owned by
//! the caller and must never be created or removed through a mirror.
//!
//! Entries are visited in file name order. Symbolic links inside the source
//! tree are not followed; they are yielded as files so that the destination
//! gets a link to the link.

use crate::{mirror::MirrorError, path::absolutize};

use std::{
    io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Order to visit a source tree in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrder {
    /// Parent directories before their children.
    TopDown,

    /// Children before their parent directories.
    BottomUp,
}

/// Kind of source tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Single entry of a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    relative_path: PathBuf,
    kind: EntryKind,
}

impl TreeEntry {
    /// Path of entry relative to the source tree root.
    pub fn relative_path(&self) -> &Path {
        self.relative_path.as_path()
    }

    /// Kind of entry.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

/// Readable source tree.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Open source tree at target path.
    ///
    /// The root is made absolute so that links pointing into it stay valid no
    /// matter where they are created.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::SourceUnavailable`] if the root is missing,
    ///   unreadable, or not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, MirrorError> {
        let unavailable = |source| MirrorError::SourceUnavailable {
            path: root.as_ref().to_path_buf(),
            source,
        };

        let root = absolutize(root.as_ref()).map_err(unavailable)?;
        let metadata = root.metadata().map_err(unavailable)?;
        if !metadata.is_dir() {
            return Err(unavailable(io::Error::other("not a directory")));
        }

        // INVARIANT: Root must be listable, otherwise every entry is missed.
        root.read_dir().map_err(unavailable)?;

        Ok(Self { root })
    }

    /// Absolute path to root of source tree.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Walk every entry below root in target order.
    ///
    /// Entries that cannot be read are yielded as [`MirrorError::WalkFailed`]
    /// so the caller can record them and keep going.
    pub fn walk(
        &self,
        order: WalkOrder,
    ) -> impl Iterator<Item = Result<TreeEntry, MirrorError>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(order == WalkOrder::BottomUp)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(error) => {
                        let path = error.path().unwrap_or(self.root.as_path()).to_path_buf();
                        return Some(Err(MirrorError::WalkFailed {
                            path,
                            source: error,
                        }));
                    }
                };

                // INVARIANT: Walkdir yields paths rooted at the walk root.
                let relative_path = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
                let kind = if entry.file_type().is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };

                Some(Ok(TreeEntry {
                    relative_path,
                    kind,
                }))
            })
    }
}
