// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{Snapshot, TreeFixture};

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::{fs::read_to_string, path::PathBuf};
use symtree::{apply, apply_absent, apply_present, summarize, DesiredState, MirrorError};

#[test]
fn absent_removes_links_then_empty_directories() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt", "a/c/d.txt"])?;
    apply_present(&fixture.request(DesiredState::Present))?;

    let outcome = apply_absent(&fixture.request(DesiredState::Absent))?;

    assert_eq!(
        outcome.affected(),
        &[fixture.dest("a/b.txt"), fixture.dest("a/c/d.txt")]
    );
    assert!(outcome.errors().is_empty());
    assert!(outcome.is_changed());
    assert!(fixture.destination_snapshot()?.is_empty());
    assert!(fixture.source().join("a/c/d.txt").exists());

    Ok(())
}

#[test]
fn present_then_absent_restores_prior_destination() -> Result<()> {
    let fixture = TreeFixture::new()?
        .with_source_files(&["a/b.txt", "a/c/d.txt", "x/y.txt"])?
        .with_destination_files(&["keep/me.txt", "unrelated"])?;
    let before = fixture.destination_snapshot()?;

    apply(&fixture.request(DesiredState::Present))?;
    let outcome = apply(&fixture.request(DesiredState::Absent))?;

    assert!(outcome.is_success());
    assert_eq!(fixture.destination_snapshot()?, before);

    Ok(())
}

#[test]
fn absent_twice_is_unchanged_second_time() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt", "top"])?;
    apply_present(&fixture.request(DesiredState::Present))?;
    let request = fixture.request(DesiredState::Absent);

    assert!(apply_absent(&request)?.is_changed());

    let second = apply_absent(&request)?;
    assert!(!second.is_changed());
    assert!(second.affected().is_empty());
    assert!(second.is_success());

    Ok(())
}

#[test]
fn absent_protects_foreign_files() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt"])?;
    apply_present(&fixture.request(DesiredState::Present))?;
    std::fs::write(fixture.dest("a/foreign.txt"), "not from source")?;

    let outcome = apply_absent(&fixture.request(DesiredState::Absent))?;

    assert!(matches!(
        outcome.errors().get(&fixture.dest("a")),
        Some(MirrorError::DirectoryRemoveFailed { .. })
    ));
    assert_eq!(outcome.errors().len(), 1);
    assert_eq!(outcome.affected(), &[fixture.dest("a/b.txt")]);
    assert_eq!(read_to_string(fixture.dest("a/foreign.txt"))?, "not from source");

    let summary = summarize(outcome, false);
    assert!(!summary.success);
    assert!(summary.changed);

    Ok(())
}

#[test]
fn absent_dry_run_leaves_destination_untouched() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt", "a/c/d.txt"])?;
    apply_present(&fixture.request(DesiredState::Present))?;
    let before = fixture.destination_snapshot()?;

    let request = fixture.request(DesiredState::Absent).with_dry_run(true);
    let outcome = apply_absent(&request)?;

    assert_eq!(fixture.destination_snapshot()?, before);
    assert!(outcome.is_changed());
    assert_eq!(
        outcome.affected(),
        &[fixture.dest("a/b.txt"), fixture.dest("a/c/d.txt")]
    );

    let summary = outcome.summarize();
    assert_eq!(summary.results.key.as_str(), "to_be_deleted_symlinks");

    Ok(())
}

#[test]
fn absent_on_empty_destination_is_unchanged() -> Result<()> {
    let fixture = TreeFixture::new()?.with_source_files(&["a/b.txt"])?;

    let outcome = apply_absent(&fixture.request(DesiredState::Absent))?;

    assert!(!outcome.is_changed());
    assert!(outcome.is_success());

    Ok(())
}

#[test]
fn absent_only_touches_paths_from_source() -> Result<()> {
    let fixture = TreeFixture::new()?
        .with_source_files(&["a/b.txt"])?
        .with_destination_files(&["other/c.txt"])?;
    apply_present(&fixture.request(DesiredState::Present))?;

    apply_absent(&fixture.request(DesiredState::Absent))?;

    let expect = vec![
        (PathBuf::from("other"), Snapshot::Directory),
        (
            PathBuf::from("other/c.txt"),
            Snapshot::File("contents of other/c.txt".into()),
        ),
    ];
    assert_eq!(fixture.destination_snapshot()?, expect);

    Ok(())
}

#[test]
fn absent_with_missing_source_is_fatal() -> Result<()> {
    let fixture = TreeFixture::new()?;
    let mut request = fixture.request(DesiredState::Absent);
    request.source = fixture.source().join("gone");

    let result = apply_absent(&request);
    assert!(matches!(result, Err(MirrorError::SourceUnavailable { .. })));

    Ok(())
}
