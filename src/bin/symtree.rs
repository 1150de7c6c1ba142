// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use symtree::{
    config::{DesiredState, DirMode, MirrorListing},
    mirror::{apply, MirrorRequest},
    path::default_config_path,
    report::Summary,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs::read_to_string, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  symtree [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<bool> {
        match self.command {
            Command::Present(opts) => run_present(opts),
            Command::Absent(opts) => run_absent(opts),
            Command::Apply(opts) => run_apply(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Link files of source tree into destination.
    #[command(override_usage = "symtree present [options] <source> <destination>")]
    Present(PresentOptions),

    /// Remove links and directories mirroring source tree from destination.
    #[command(override_usage = "symtree absent [options] <source> <destination>")]
    Absent(AbsentOptions),

    /// Converge every mirror listed in configuration file.
    #[command(override_usage = "symtree apply [options]")]
    Apply(ApplyOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PresentOptions {
    /// Source tree whose files get linked.
    #[arg(required = true, value_name = "source")]
    pub source: PathBuf,

    /// Location to project source tree onto.
    #[arg(required = true, value_name = "destination")]
    pub destination: PathBuf,

    /// Report what would change without changing anything.
    #[arg(short, long)]
    pub check: bool,

    /// Permission bits for created directories in octal.
    #[arg(short, long, value_name = "mode", default_value_t = DirMode::DEFAULT)]
    pub dir_mode: DirMode,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AbsentOptions {
    /// Source tree whose files were linked.
    #[arg(required = true, value_name = "source")]
    pub source: PathBuf,

    /// Location source tree was projected onto.
    #[arg(required = true, value_name = "destination")]
    pub destination: PathBuf,

    /// Report what would change without changing anything.
    #[arg(short, long)]
    pub check: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Path to mirror listing instead of default location.
    #[arg(long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Report what would change without changing anything.
    #[arg(short, long)]
    pub check: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run() {
        Ok(true) => exit(0),
        Ok(false) => exit(1),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run() -> Result<bool> {
    Cli::parse().run()
}

fn run_present(opts: PresentOptions) -> Result<bool> {
    let request = MirrorRequest::new(opts.source, opts.destination, DesiredState::Present)
        .with_dry_run(opts.check)
        .with_dir_mode(opts.dir_mode);
    let summary = converge(&request)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(summary.success)
}

fn run_absent(opts: AbsentOptions) -> Result<bool> {
    let request = MirrorRequest::new(opts.source, opts.destination, DesiredState::Absent)
        .with_dry_run(opts.check);
    let summary = converge(&request)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(summary.success)
}

fn run_apply(opts: ApplyOptions) -> Result<bool> {
    let path = match opts.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let listing: MirrorListing = read_to_string(&path)
        .with_context(|| format!("failed to read mirror listing {:?}", path.display()))?
        .parse()
        .with_context(|| format!("failed to parse mirror listing {:?}", path.display()))?;

    // INVARIANT: Mirrors converged before a fatal error are still reported.
    let mut summaries = Vec::new();
    for request in listing.requests(opts.check) {
        match converge(&request) {
            Ok(summary) => summaries.push(summary),
            Err(error) => {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Err(error);
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    Ok(summaries.iter().all(|summary| summary.success))
}

fn converge(request: &MirrorRequest) -> Result<Summary> {
    let outcome = apply(request)?;
    let summary = outcome.summarize();
    info!(
        "{} {:?}: changed={} success={}",
        request.state,
        request.destination.display(),
        summary.changed,
        summary.success
    );

    Ok(summary)
}
