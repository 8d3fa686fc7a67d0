//! CLI for the ENEM microdata pipeline.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use enem_core::config;
use std::path::PathBuf;

use commands::{
    run_analyze, run_correlations, run_fetch, run_income, run_status, run_work, AnalyzeArgs,
    FetchArgs,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "enem")]
#[command(about = "Download ENEM microdata, convert it to Parquet and analyze scores by family background", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and convert the given years, retrying failures in rounds.
    Fetch {
        /// Years as a range ("2014:2024") or a list ("2019,2020,2021").
        years: String,
        /// Maximum number of rounds (overrides config).
        #[arg(long, value_name = "N")]
        rounds: Option<u32>,
        /// Seconds to wait between rounds (overrides config).
        #[arg(long, value_name = "SECS")]
        delay: Option<u64>,
        /// Years processed concurrently within a round (overrides config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Directory for the Parquet files (overrides config).
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// List converted datasets and the last batch result.
    Status {
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Bootstrap correlations between parent education and scores for one state.
    Analyze {
        /// Exam year to load.
        #[arg(long)]
        year: u16,
        /// State code, e.g. PB or SP (numeric IBGE codes also work).
        #[arg(long)]
        uf: String,
        /// Bootstrap iterations (overrides config).
        #[arg(long, value_name = "N")]
        iterations: Option<usize>,
        /// Fixed seed for reproducible intervals.
        #[arg(long)]
        seed: Option<u64>,
        /// Drop undefined resample correlations instead of propagating NaN.
        #[arg(long)]
        exclude_nan: bool,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Plain correlations between parent education and scores, one row per year.
    Correlations {
        /// Years as a range ("2019:2023") or a list ("2019,2021").
        #[arg(long)]
        years: String,
        #[arg(long)]
        uf: String,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Family income bracket (Q006) against scores for one state.
    Income {
        #[arg(long)]
        year: u16,
        #[arg(long)]
        uf: String,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Overall score by the parents' work status (Q002/Q003) for one state.
    Work {
        #[arg(long)]
        year: u16,
        #[arg(long)]
        uf: String,
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                years,
                rounds,
                delay,
                jobs,
                data_dir,
            } => {
                run_fetch(
                    &cfg,
                    FetchArgs {
                        years,
                        rounds,
                        delay,
                        jobs,
                        data_dir,
                    },
                )
                .await?
            }
            CliCommand::Status { data_dir } => {
                let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());
                run_status(&dir).await?
            }
            CliCommand::Analyze {
                year,
                uf,
                iterations,
                seed,
                exclude_nan,
                data_dir,
            } => {
                run_analyze(
                    &cfg,
                    AnalyzeArgs {
                        year,
                        uf,
                        iterations,
                        seed,
                        exclude_nan,
                        data_dir,
                    },
                )
                .await?
            }
            CliCommand::Correlations {
                years,
                uf,
                data_dir,
            } => {
                let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());
                run_correlations(&years, &uf, dir).await?
            }
            CliCommand::Income { year, uf, data_dir } => {
                let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());
                run_income(year, &uf, dir).await?
            }
            CliCommand::Work { year, uf, data_dir } => {
                let dir = data_dir.unwrap_or_else(|| cfg.data_dir.clone());
                run_work(year, &uf, dir).await?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
