//! Tests for `enem fetch`.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_fetch_defaults() {
    match parse(&["enem", "fetch", "2014:2024"]) {
        CliCommand::Fetch {
            years,
            rounds,
            delay,
            jobs,
            data_dir,
        } => {
            assert_eq!(years, "2014:2024");
            assert!(rounds.is_none());
            assert!(delay.is_none());
            assert!(jobs.is_none());
            assert!(data_dir.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_overrides() {
    match parse(&[
        "enem",
        "fetch",
        "2019,2020",
        "--rounds",
        "3",
        "--delay",
        "0",
        "--jobs",
        "2",
        "--data-dir",
        "/tmp/enem",
    ]) {
        CliCommand::Fetch {
            years,
            rounds,
            delay,
            jobs,
            data_dir,
        } => {
            assert_eq!(years, "2019,2020");
            assert_eq!(rounds, Some(3));
            assert_eq!(delay, Some(0));
            assert_eq!(jobs, Some(2));
            assert_eq!(data_dir, Some(PathBuf::from("/tmp/enem")));
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_requires_years() {
    assert!(Cli::try_parse_from(["enem", "fetch"]).is_err());
}
