//! `enem analyze` – bootstrap correlations for one year and state.

use anyhow::{bail, Context, Result};
use enem_core::analysis::{self, AreaEstimate, LevelSummary, RegionSlice, PARENT_EDUCATION};
use enem_core::config::EnemConfig;
use enem_core::dataset::ColumnarDataset;
use enem_core::stats::NanPolicy;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub year: u16,
    pub uf: String,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub exclude_nan: bool,
    pub data_dir: Option<PathBuf>,
}

pub async fn run_analyze(cfg: &EnemConfig, args: AnalyzeArgs) -> Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| cfg.data_dir.clone());
    let mut boot = cfg.bootstrap_or_default().to_config();
    if let Some(n) = args.iterations {
        boot.iterations = n;
    }
    if args.seed.is_some() {
        boot.seed = args.seed;
    }
    if args.exclude_nan {
        boot.nan_policy = NanPolicy::Exclude;
    }
    let uf = args.uf.trim().to_uppercase();
    let year = args.year;

    // Loading and resampling are CPU-bound.
    let (slice, rows, estimates, groups, levels) =
        tokio::task::spawn_blocking(move || -> Result<_> {
            let slice = load_region(&data_dir, year, &uf)?;
            let prepared = analysis::prepare_scores(&slice.table)
                .with_context(|| format!("prepare scores for {uf} {year}"))?;
            let estimates = analysis::analyze_with_bootstrap(&prepared, &boot);
            let groups =
                analysis::group_means(&prepared, analysis::OVERALL_SCORE, PARENT_EDUCATION)?;
            let levels = analysis::describe_levels(&prepared)?;
            Ok((slice, prepared.num_rows(), estimates, groups, levels))
        })
        .await??;

    println!(
        "{} {} (filtered on {}): {} participants, {} with complete answers",
        args.uf.trim().to_uppercase(),
        args.year,
        slice.column,
        slice.table.num_rows(),
        rows
    );
    print_estimates(&estimates);
    print_levels(&levels);

    println!("\nOverall score by parent education level:");
    println!("{:<8} {:>10} {:>10} {:>8}", "LEVEL", "MEAN", "STD", "COUNT");
    for g in groups {
        println!("{:<8} {:>10.2} {:>10.2} {:>8}", g.group, g.mean, g.std, g.count);
    }
    Ok(())
}

/// Loads `year` from `data_dir` and keeps the rows of state `uf`.
pub(super) fn load_region(data_dir: &Path, year: u16, uf: &str) -> Result<RegionSlice> {
    let dataset = ColumnarDataset::load(data_dir, year)?;
    match analysis::filter_region(&dataset.table, uf) {
        Some(slice) => Ok(slice),
        None => bail!("state {uf} not found in {year}"),
    }
}

fn print_levels(levels: &[LevelSummary]) {
    println!("\nParent education levels (1 = A-D, 2 = E-G):");
    for l in levels {
        println!("  level {}: {} ({:.1}%)", l.level, l.count, l.share * 100.0);
        for (area, m) in &l.area_means {
            println!("    {:<16} {:>8.1}", area, m);
        }
    }
}

fn print_estimates(estimates: &[AreaEstimate]) {
    println!("\n{:<16} {:>9} {:>9} {:>9} {:>6}", "AREA", "R", "CI LOW", "CI HIGH", "NaN");
    for e in estimates {
        match &e.result {
            Ok(r) => println!(
                "{:<16} {:>9.4} {:>9.4} {:>9.4} {:>6}",
                e.area, r.point_estimate, r.ci.0, r.ci.1, r.nan_resamples
            ),
            Err(err) => println!("{:<16} skipped: {}", e.area, err),
        }
    }
}
