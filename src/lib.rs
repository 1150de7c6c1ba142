// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mirror directory trees through symbolic links.
//!
//! symtree projects a source tree onto a destination by recreating its
//! directories and linking each of its files back to the source. The same
//! source tree can later be used to tear that projection down again. Both
//! directions are declarative and idempotent, see [`mirror`] for the details.

pub mod config;
pub mod mirror;
pub mod path;
pub mod report;

pub use config::{DesiredState, DirMode, MirrorListing};
pub use mirror::{apply, apply_absent, apply_present, Converger, MirrorError, MirrorRequest};
pub use report::{summarize, Outcome, Summary};
