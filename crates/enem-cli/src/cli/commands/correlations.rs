//! `enem correlations` – parent education vs. scores, one row per year.

use anyhow::Result;
use enem_core::analysis::{self, AreaCorrelation, OVERALL_SCORE, PARENT_EDUCATION, SCORE_COLUMNS};
use enem_core::years::YearSpec;
use std::path::PathBuf;

use super::analyze::load_region;

pub async fn run_correlations(years: &str, uf: &str, data_dir: PathBuf) -> Result<()> {
    let selection = YearSpec::parse(years)?;
    let uf = uf.trim().to_uppercase();

    let table_uf = uf.clone();
    let rows = tokio::task::spawn_blocking(move || {
        selection.years
            .iter()
            .map(|&year| {
                let corrs = load_region(&data_dir, year, &table_uf).and_then(|slice| {
                    let prepared = analysis::prepare_scores(&slice.table)?;
                    Ok(analysis::correlations(&prepared, PARENT_EDUCATION)?)
                });
                if let Err(e) = &corrs {
                    tracing::warn!(year, error = %e, "correlations unavailable");
                }
                (year, corrs.ok())
            })
            .collect::<Vec<_>>()
    })
    .await?;

    println!("Parent education vs. scores in {uf}");
    let areas: Vec<&str> = SCORE_COLUMNS.iter().copied().chain([OVERALL_SCORE]).collect();
    print!("{:<6}", "YEAR");
    for area in &areas {
        print!("{:>17}", area);
    }
    println!();
    for (year, corrs) in rows {
        print!("{:<6}", year);
        for area in &areas {
            match corrs.as_deref().and_then(|c| find(c, area)) {
                Some(r) => print!("{:>17.3}", r),
                None => print!("{:>17}", "N/A"),
            }
        }
        println!();
    }
    Ok(())
}

fn find(corrs: &[AreaCorrelation], area: &str) -> Option<f64> {
    corrs.iter().find(|c| c.area == area).map(|c| c.r)
}
