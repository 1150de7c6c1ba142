// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tree mirroring.
//!
//! A __mirror__ reproduces the shape of a source tree at a destination, using
//! real directories for structure and symbolic links for files. The links
//! point back into the source tree, so edits made through either side land in
//! the source of truth.
//!
//! # Convergence
//!
//! Mirrors are declarative. The caller names a [`DesiredState`], and the
//! [`Converger`] walks the source tree once, changing only what diverges from
//! that state at the destination:
//!
//! - __Present__ walks top-down. Missing directories get created before any
//!   link is placed inside of them. Any destination path that already exists
//!   in any form is treated as satisfied and left alone.
//! - __Absent__ walks bottom-up. Links get removed before their parent
//!   directories, which are then removed without recursion. A directory that
//!   still holds foreign content fails to be removed, and that failure is
//!   reported instead of deleting something the mirror never created.
//!
//! Running the same state twice is a no-op the second time.
//!
//! # Error Handling
//!
//! Failing to mutate one path never stops a run. Each failure is recorded in
//! the [`Outcome`] under the path it happened at, and the walk moves on. The
//! only fatal condition is a source tree that cannot be opened at all.
//!
//! # Dry-Run
//!
//! With a dry-run, every decision is made as usual, but nothing is mutated.
//! The outcome then describes what a real run would do.

pub mod effect;
pub mod walk;

use crate::{
    config::{DesiredState, DirMode},
    mirror::{
        effect::{Effector, HostFs},
        walk::{EntryKind, SourceTree, WalkOrder},
    },
    report::Outcome,
};

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// Input to a single mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRequest {
    /// Source tree whose files get linked.
    pub source: PathBuf,

    /// Location to project source tree onto.
    pub destination: PathBuf,

    /// State to converge destination to.
    pub state: DesiredState,

    /// Compute outcome without mutating anything.
    pub dry_run: bool,

    /// Permission bits for created directories.
    pub dir_mode: DirMode,
}

impl MirrorRequest {
    /// Construct new request for a real run with default directory mode.
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        state: DesiredState,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            state,
            dry_run: false,
            dir_mode: DirMode::default(),
        }
    }

    /// Toggle dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use target permission bits for created directories.
    pub fn with_dir_mode(mut self, dir_mode: DirMode) -> Self {
        self.dir_mode = dir_mode;
        self
    }
}

/// Converge a destination toward the state declared by a request.
///
/// All mutations go through an [`Effector`], which is [`HostFs`] unless told
/// otherwise.
#[derive(Debug, Default)]
pub struct Converger<E = HostFs>
where
    E: Effector,
{
    effector: E,
}

impl<E> Converger<E>
where
    E: Effector,
{
    /// Construct new converger with target effector.
    pub fn new(effector: E) -> Self {
        Self { effector }
    }

    /// Converge destination to the state named by request.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
    ///   opened.
    pub fn apply(&self, request: &MirrorRequest) -> Result<Outcome> {
        match request.state {
            DesiredState::Present => self.apply_present(request),
            DesiredState::Absent => self.apply_absent(request),
        }
    }

    /// Create missing directories and links at destination.
    ///
    /// Directories are created before their contents. Existing destination
    /// paths of any kind are left alone, even dangling symlinks. Only link
    /// paths are listed as affected, directory creation just flags the
    /// outcome as changed.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
    ///   opened.
    #[instrument(skip(self), level = "debug")]
    pub fn apply_present(&self, request: &MirrorRequest) -> Result<Outcome> {
        let tree = SourceTree::open(&request.source)?;
        let mut outcome = Outcome::new(DesiredState::Present, request.dry_run);
        info!(
            "mirror {:?} onto {:?}",
            tree.root().display(),
            request.destination.display()
        );

        for entry in tree.walk(WalkOrder::TopDown) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    outcome.record_error(error);
                    continue;
                }
            };

            let dest = request.destination.join(entry.relative_path());
            match entry.kind() {
                EntryKind::Directory => {
                    if dest.is_dir() {
                        continue;
                    }

                    let result = unless_dry_run(request.dry_run, || {
                        self.effector.create_dir(&dest, request.dir_mode)
                    });
                    match result {
                        Ok(()) => outcome.mark_changed(),
                        Err(source) => outcome.record_error(MirrorError::DirectoryCreateFailed {
                            path: dest,
                            source,
                        }),
                    }
                }
                EntryKind::File => {
                    if exists(&dest) {
                        continue;
                    }

                    let target = tree.root().join(entry.relative_path());
                    let result = unless_dry_run(request.dry_run, || self.effector.symlink(&target, &dest));
                    match result {
                        Ok(()) => outcome.mark_affected(dest),
                        Err(source) => outcome.record_error(MirrorError::LinkCreateFailed {
                            path: dest,
                            target,
                            source,
                        }),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Remove links and directories that mirror source tree at destination.
    ///
    /// Contents are removed before their directories. Any destination path
    /// matching a source file is removed no matter what it is. Directories
    /// are only removed when empty.
    ///
    /// # Errors
    ///
    /// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
    ///   opened.
    #[instrument(skip(self), level = "debug")]
    pub fn apply_absent(&self, request: &MirrorRequest) -> Result<Outcome> {
        let tree = SourceTree::open(&request.source)?;
        let mut outcome = Outcome::new(DesiredState::Absent, request.dry_run);
        info!(
            "tear down mirror of {:?} from {:?}",
            tree.root().display(),
            request.destination.display()
        );

        for entry in tree.walk(WalkOrder::BottomUp) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    outcome.record_error(error);
                    continue;
                }
            };

            let dest = request.destination.join(entry.relative_path());
            match entry.kind() {
                EntryKind::File => {
                    if !exists(&dest) {
                        continue;
                    }

                    let result = unless_dry_run(request.dry_run, || self.effector.remove_file(&dest));
                    match result {
                        Ok(()) => outcome.mark_affected(dest),
                        Err(source) => outcome.record_error(MirrorError::PathRemoveFailed {
                            path: dest,
                            source,
                        }),
                    }
                }
                EntryKind::Directory => {
                    if !dest.is_dir() {
                        continue;
                    }

                    let result = unless_dry_run(request.dry_run, || self.effector.remove_dir(&dest));
                    match result {
                        Ok(()) => outcome.mark_changed(),
                        Err(source) => outcome.record_error(MirrorError::DirectoryRemoveFailed {
                            path: dest,
                            source,
                        }),
                    }
                }
            }
        }

        Ok(outcome)
    }
}

/// Converge destination to state named by request through host filesystem.
///
/// # Errors
///
/// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
///   opened.
pub fn apply(request: &MirrorRequest) -> Result<Outcome> {
    Converger::<HostFs>::default().apply(request)
}

/// Create missing directories and links through host filesystem.
///
/// # Errors
///
/// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
///   opened.
pub fn apply_present(request: &MirrorRequest) -> Result<Outcome> {
    Converger::<HostFs>::default().apply_present(request)
}

/// Remove mirrored links and directories through host filesystem.
///
/// # Errors
///
/// - Return [`MirrorError::SourceUnavailable`] if source tree cannot be
///   opened.
pub fn apply_absent(request: &MirrorRequest) -> Result<Outcome> {
    Converger::<HostFs>::default().apply_absent(request)
}

// INVARIANT: Dry-runs never reach the effector.
fn unless_dry_run(dry_run: bool, mutation: impl FnOnce() -> io::Result<()>) -> io::Result<()> {
    if dry_run {
        return Ok(());
    }

    mutation()
}

// Does not follow symlinks, so dangling links count as existing.
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Mirror error types.
///
/// Everything except [`MirrorError::SourceUnavailable`] is scoped to a single
/// path and gets recorded into an [`Outcome`] instead of ending the run.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Destination directory cannot be created.
    #[error("failed to create directory: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Symbolic link cannot be created.
    #[error("failed to create symlink to {:?}: {source}", target.display())]
    LinkCreateFailed {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Symbolic link or file cannot be removed.
    #[error("failed to remove path: {source}")]
    PathRemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Destination directory cannot be removed, usually because it still has
    /// content the mirror does not own.
    #[error("failed to remove directory: {source}")]
    DirectoryRemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source tree entry cannot be read during traversal.
    #[error("failed to read source entry: {source}")]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Source tree cannot be opened.
    #[error("source tree {:?} is unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MirrorError {
    /// Path that error occured at.
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryCreateFailed { path, .. }
            | Self::LinkCreateFailed { path, .. }
            | Self::PathRemoveFailed { path, .. }
            | Self::DirectoryRemoveFailed { path, .. }
            | Self::WalkFailed { path, .. }
            | Self::SourceUnavailable { path, .. } => path.as_path(),
        }
    }

    /// Check if error ends a run instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Friendly result alias :3
pub type Result<T, E = MirrorError> = std::result::Result<T, E>;
