// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the mirror listing file that symtree uses to
//! simplify the process of serialization and deserialization. File I/O is left
//! to the caller to figure out.

use crate::mirror::MirrorRequest;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Mirror listing layout.
///
/// A mirror listing is composed of two basic parts: settings and mirrors. The
/// settings section provides defaults shared by every mirror. The mirror
/// section lists each source tree that should be projected onto a
/// destination, along with the state it should be converged to.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MirrorListing {
    /// Settings shared by all mirrors.
    #[serde(default)]
    pub settings: MirrorSettings,

    /// Listing of mirrors to converge.
    #[serde(default, rename = "mirror")]
    pub mirrors: Vec<MirrorEntry>,
}

impl MirrorListing {
    /// Build one request per mirror entry, in listing order.
    ///
    /// Entries without their own directory mode inherit the one in
    /// [`MirrorSettings`].
    pub fn requests(&self, dry_run: bool) -> Vec<MirrorRequest> {
        self.mirrors
            .iter()
            .map(|entry| MirrorRequest {
                source: entry.source.clone(),
                destination: entry.destination.clone(),
                state: entry.state,
                dry_run,
                dir_mode: entry.dir_mode.unwrap_or(self.settings.dir_mode),
            })
            .collect()
    }
}

impl FromStr for MirrorListing {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut listing: MirrorListing =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every mirror path.
        for entry in &mut listing.mirrors {
            entry.source = expand_path(&entry.source)?;
            entry.destination = expand_path(&entry.destination)?;
        }

        Ok(listing)
    }
}

impl Display for MirrorListing {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Mirror configuration settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MirrorSettings {
    /// Permission bits for directories created at a destination.
    #[serde(default)]
    pub dir_mode: DirMode,
}

/// Single mirror listing entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MirrorEntry {
    /// Source tree whose files get linked.
    pub source: PathBuf,

    /// Location to project source tree onto.
    pub destination: PathBuf,

    /// State to converge destination to.
    #[serde(default)]
    pub state: DesiredState,

    /// Override of directory mode given in settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_mode: Option<DirMode>,
}

/// Declared target state of a mirror.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Source tree exists at destination as directories and symlinks.
    #[default]
    Present,

    /// Source tree does not exist at destination.
    Absent,
}

impl FromStr for DesiredState {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            _ => Err(ConfigError::InvalidState(data.to_string())),
        }
    }
}

impl Display for DesiredState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Present => fmt.write_str("present"),
            Self::Absent => fmt.write_str("absent"),
        }
    }
}

/// Permission bits used for directories created at a destination.
///
/// Written as an octal string in configuration, e.g., "0755". Only
/// meaningful on platforms with Unix permission bits.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct DirMode(u32);

impl DirMode {
    /// Owner read/write/execute, group and other read/execute.
    pub const DEFAULT: Self = Self(0o755);

    /// Construct new directory mode from raw permission bits.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::InvalidDirMode`] if bits exceed `0o7777`.
    pub fn new(bits: u32) -> Result<Self> {
        if bits > 0o7777 {
            return Err(ConfigError::InvalidDirMode(format!("{bits:o}")));
        }

        Ok(Self(bits))
    }

    /// Raw permission bits.
    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl Default for DirMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for DirMode {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let digits = data.strip_prefix("0o").unwrap_or(data);

        // INVARIANT: Only octal digits, since from_str_radix accepts a sign.
        if digits.is_empty() || !digits.bytes().all(|byte| matches!(byte, b'0'..=b'7')) {
            return Err(ConfigError::InvalidDirMode(data.to_string()));
        }

        let bits = u32::from_str_radix(digits, 8)
            .map_err(|_| ConfigError::InvalidDirMode(data.to_string()))?;
        Self::new(bits)
    }
}

impl TryFrom<String> for DirMode {
    type Error = ConfigError;

    fn try_from(data: String) -> Result<Self, Self::Error> {
        data.parse()
    }
}

impl From<DirMode> for String {
    fn from(mode: DirMode) -> Self {
        mode.to_string()
    }
}

impl Display for DirMode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{:04o}", self.0)
    }
}

fn expand_path(path: &std::path::Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Directory mode is not a valid octal permission set.
    #[error("invalid directory mode {0:?}, expected octal like \"0755\"")]
    InvalidDirMode(String),

    /// Desired state is neither "present" nor "absent".
    #[error("invalid state {0:?}, expected \"present\" or \"absent\"")]
    InvalidState(String),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
