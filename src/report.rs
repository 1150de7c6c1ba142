// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Outcome reporting.
//!
//! A mirror run folds the result of every path it touches into an
//! [`Outcome`]. Once the run is over, the outcome is summarized into a
//! [`Summary`] that callers can serialize and use to decide how to report
//! success and change status.

use crate::{config::DesiredState, mirror::MirrorError};

use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Accumulated results of one mirror run.
///
/// # Invariants
///
/// - Affected paths are distinct.
/// - A path with an error is never also affected.
/// - Changed iff at least one mutation happened, or would have happened for
///   a dry-run.
#[derive(Debug)]
pub struct Outcome {
    state: DesiredState,
    dry_run: bool,
    affected: Vec<PathBuf>,
    errors: BTreeMap<PathBuf, MirrorError>,
    changed: bool,
}

impl Outcome {
    /// Construct new empty outcome for target state and run mode.
    pub fn new(state: DesiredState, dry_run: bool) -> Self {
        Self {
            state,
            dry_run,
            affected: Vec::new(),
            errors: BTreeMap::new(),
            changed: false,
        }
    }

    /// State the run converged toward.
    pub fn state(&self) -> DesiredState {
        self.state
    }

    /// Check if outcome describes a dry-run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Paths of links created or removed, in visiting order.
    pub fn affected(&self) -> &[PathBuf] {
        self.affected.as_slice()
    }

    /// Errors keyed by the path they occured at.
    pub fn errors(&self) -> &BTreeMap<PathBuf, MirrorError> {
        &self.errors
    }

    /// Check if destination diverged from declared state.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Check if no path failed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record mutation that does not produce an affected path.
    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Record mutation of a link path.
    ///
    /// Traversal visits each path once, so only the error side needs
    /// guarding.
    pub(crate) fn mark_affected(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.errors.contains_key(&path) {
            return;
        }

        self.affected.push(path);
        self.changed = true;
    }

    /// Record path-scoped failure.
    pub(crate) fn record_error(&mut self, error: MirrorError) {
        warn!("{:?}: {error}", error.path().display());
        self.errors.insert(error.path().to_path_buf(), error);
    }

    /// Summarize outcome.
    ///
    /// Labels affected paths according to the state and run mode the
    /// outcome was recorded under.
    pub fn summarize(&self) -> Summary {
        self.summarize_as(self.dry_run)
    }

    fn summarize_as(&self, dry_run: bool) -> Summary {
        let errors = self
            .errors
            .iter()
            .map(|(path, error)| (path.clone(), error.to_string()))
            .collect();

        Summary {
            changed: self.changed,
            success: self.errors.is_empty(),
            results: SummaryResults {
                key: ResultKey::new(self.state, dry_run),
                paths: self.affected.clone(),
                errors,
            },
        }
    }
}

/// Summarize outcome of a run, labeled for target run mode.
pub fn summarize(outcome: Outcome, dry_run: bool) -> Summary {
    outcome.summarize_as(dry_run)
}

/// Serializable summary of a mirror run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Destination diverged from declared state.
    pub changed: bool,

    /// No path failed.
    pub success: bool,

    /// Affected paths and errors.
    pub results: SummaryResults,
}

/// Affected paths and error messages of a summary.
///
/// Serializes as a map with two entries: affected paths under a
/// [`ResultKey`], and errors under "errors".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResults {
    pub key: ResultKey,
    pub paths: Vec<PathBuf>,
    pub errors: BTreeMap<PathBuf, String>,
}

impl SummaryResults {
    /// Lookup error message for a path.
    pub fn error_at(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.errors.get(path.as_ref()).map(String::as_str)
    }
}

impl Serialize for SummaryResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // INVARIANT: Paths are not required to be valid UTF-8.
        let paths = self
            .paths
            .iter()
            .map(|path| path.to_string_lossy())
            .collect::<Vec<_>>();
        let errors = self
            .errors
            .iter()
            .map(|(path, message)| (path.to_string_lossy(), message.as_str()))
            .collect::<BTreeMap<Cow<'_, str>, &str>>();

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.key.as_str(), &paths)?;
        map.serialize_entry("errors", &errors)?;
        map.end()
    }
}

/// Label for affected paths of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKey {
    CreatedSymlinks,
    ToBeCreatedSymlinks,
    DeletedSymlinks,
    ToBeDeletedSymlinks,
}

impl ResultKey {
    /// Select label by state and dry-run mode.
    pub fn new(state: DesiredState, dry_run: bool) -> Self {
        match (state, dry_run) {
            (DesiredState::Present, false) => Self::CreatedSymlinks,
            (DesiredState::Present, true) => Self::ToBeCreatedSymlinks,
            (DesiredState::Absent, false) => Self::DeletedSymlinks,
            (DesiredState::Absent, true) => Self::ToBeDeletedSymlinks,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedSymlinks => "created_symlinks",
            Self::ToBeCreatedSymlinks => "to_be_created_symlinks",
            Self::DeletedSymlinks => "deleted_symlinks",
            Self::ToBeDeletedSymlinks => "to_be_deleted_symlinks",
        }
    }
}
