// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{Snapshot, TreeFixture};

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::{
    fs::{create_dir, metadata, read_link, read_to_string},
    os::unix::fs::PermissionsExt,
    path::PathBuf,
};
use symtree::{apply_present, summarize, DesiredState, DirMode};

#[test]
fn present_links_files_and_creates_directories() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt", "a/c/d.txt"])?;

    let outcome = apply_present(&fixture.request(DesiredState::Present))?;

    assert_eq!(
        outcome.affected(),
        &[fixture.dest("a/b.txt"), fixture.dest("a/c/d.txt")]
    );
    assert!(outcome.errors().is_empty());
    assert!(outcome.is_changed());

    let expect = vec![
        (PathBuf::from("a"), Snapshot::Directory),
        (
            PathBuf::from("a/b.txt"),
            Snapshot::Link(fixture.source().join("a/b.txt")),
        ),
        (PathBuf::from("a/c"), Snapshot::Directory),
        (
            PathBuf::from("a/c/d.txt"),
            Snapshot::Link(fixture.source().join("a/c/d.txt")),
        ),
    ];
    assert_eq!(fixture.destination_snapshot()?, expect);
    assert_eq!(read_to_string(fixture.dest("a/c/d.txt"))?, "contents of a/c/d.txt");

    Ok(())
}

#[test]
fn present_twice_is_unchanged_second_time() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt", "a/c/d.txt", "top"])?;
    let request = fixture.request(DesiredState::Present);

    let first = apply_present(&request)?;
    assert!(first.is_changed());

    let second = apply_present(&request)?;
    assert!(!second.is_changed());
    assert!(second.affected().is_empty());
    assert!(second.is_success());

    Ok(())
}

#[test]
fn present_skips_existing_destination_paths_of_any_kind() -> Result<()> {
    let fixture = TreeFixture::new()?
        .with_source_files(&["a/file", "a/dir", "a/link", "a/new"])?
        .with_destination_files(&["a/file"])?;
    create_dir(fixture.dest("a/dir"))?;
    std::os::unix::fs::symlink("/etc/hostname", fixture.dest("a/link"))?;

    let outcome = apply_present(&fixture.request(DesiredState::Present))?;

    assert_eq!(outcome.affected(), &[fixture.dest("a/new")]);
    assert!(outcome.is_success());
    assert_eq!(read_to_string(fixture.dest("a/file"))?, "contents of a/file");
    assert!(metadata(fixture.dest("a/dir"))?.is_dir());
    assert_eq!(read_link(fixture.dest("a/link"))?, PathBuf::from("/etc/hostname"));

    Ok(())
}

#[test]
fn present_dry_run_leaves_destination_untouched() -> Result<()> {
    let fixture = TreeFixture::new()?
        .with_source_files(&["a/b.txt", "a/c/d.txt", "e.txt"])?
        .with_destination_files(&["a/foreign.txt"])?;
    let before = fixture.destination_snapshot()?;

    let request = fixture.request(DesiredState::Present).with_dry_run(true);
    let outcome = apply_present(&request)?;

    assert_eq!(fixture.destination_snapshot()?, before);
    assert!(outcome.is_changed());
    assert_eq!(
        outcome.affected(),
        &[
            fixture.dest("a/b.txt"),
            fixture.dest("a/c/d.txt"),
            fixture.dest("e.txt")
        ]
    );

    let summary = outcome.summarize();
    assert_eq!(summary.results.key.as_str(), "to_be_created_symlinks");

    Ok(())
}

#[test]
fn present_dry_run_on_converged_tree_is_unchanged() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt"])?;
    apply_present(&fixture.request(DesiredState::Present))?;

    let request = fixture.request(DesiredState::Present).with_dry_run(true);
    let outcome = apply_present(&request)?;

    assert!(!outcome.is_changed());
    assert!(outcome.affected().is_empty());

    Ok(())
}

#[test]
fn present_reports_occupied_directory_path_and_keeps_going() -> Result<()> {
    let fixture = TreeFixture::new()?
        .with_source_files(&["a/b.txt", "z.txt"])?
        .with_destination_files(&["a"])?;

    let outcome = apply_present(&fixture.request(DesiredState::Present))?;

    let summary = summarize(outcome, false);
    assert!(!summary.success);
    assert!(summary.changed);
    assert!(summary.results.error_at(fixture.dest("a")).is_some());
    assert!(summary.results.error_at(fixture.dest("a/b.txt")).is_some());
    assert_eq!(summary.results.paths, vec![fixture.dest("z.txt")]);
    assert_eq!(read_to_string(fixture.dest("a"))?, "contents of a");

    Ok(())
}

#[test]
fn present_creates_directories_with_requested_mode() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["private/key"])?;

    let request = fixture
        .request(DesiredState::Present)
        .with_dir_mode(DirMode::new(0o700)?);
    apply_present(&request)?;

    let mode = metadata(fixture.dest("private"))?.permissions().mode() & 0o777;
    assert_eq!(mode, 0o700);

    Ok(())
}
