//! Tests for status and the analysis commands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_status() {
    match parse(&["enem", "status"]) {
        CliCommand::Status { data_dir } => assert!(data_dir.is_none()),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_analyze() {
    match parse(&["enem", "analyze", "--year", "2020", "--uf", "pb"]) {
        CliCommand::Analyze {
            year,
            uf,
            iterations,
            seed,
            exclude_nan,
            data_dir,
        } => {
            assert_eq!(year, 2020);
            assert_eq!(uf, "pb");
            assert!(iterations.is_none());
            assert!(seed.is_none());
            assert!(!exclude_nan);
            assert!(data_dir.is_none());
        }
        _ => panic!("expected Analyze"),
    }
}

#[test]
fn cli_parse_analyze_options() {
    match parse(&[
        "enem",
        "analyze",
        "--year",
        "2019",
        "--uf",
        "SP",
        "--iterations",
        "5000",
        "--seed",
        "42",
        "--exclude-nan",
    ]) {
        CliCommand::Analyze {
            iterations,
            seed,
            exclude_nan,
            ..
        } => {
            assert_eq!(iterations, Some(5000));
            assert_eq!(seed, Some(42));
            assert!(exclude_nan);
        }
        _ => panic!("expected Analyze"),
    }
}

#[test]
fn cli_parse_analyze_rejects_bad_year() {
    assert!(Cli::try_parse_from(["enem", "analyze", "--year", "abc", "--uf", "PB"]).is_err());
}

#[test]
fn cli_parse_correlations() {
    match parse(&["enem", "correlations", "--years", "2019:2021", "--uf", "PB"]) {
        CliCommand::Correlations {
            years,
            uf,
            data_dir,
        } => {
            assert_eq!(years, "2019:2021");
            assert_eq!(uf, "PB");
            assert!(data_dir.is_none());
        }
        _ => panic!("expected Correlations"),
    }
}

#[test]
fn cli_parse_income_and_work() {
    match parse(&["enem", "income", "--year", "2021", "--uf", "pb", "--data-dir", "/srv/enem"]) {
        CliCommand::Income { year, uf, data_dir } => {
            assert_eq!(year, 2021);
            assert_eq!(uf, "pb");
            assert_eq!(data_dir, Some(std::path::PathBuf::from("/srv/enem")));
        }
        _ => panic!("expected Income"),
    }
    match parse(&["enem", "work", "--year", "2020", "--uf", "SP"]) {
        CliCommand::Work { year, uf, .. } => {
            assert_eq!(year, 2020);
            assert_eq!(uf, "SP");
        }
        _ => panic!("expected Work"),
    }
    assert!(Cli::try_parse_from(["enem", "income", "--uf", "PB"]).is_err());
}
