//! `enem income` – family income bracket vs. scores for one year and state.

use anyhow::Result;
use enem_core::analysis;
use std::path::PathBuf;

use super::analyze::load_region;

pub async fn run_income(year: u16, uf: &str, data_dir: PathBuf) -> Result<()> {
    let uf = uf.trim().to_uppercase();
    let region = uf.clone();
    let income = tokio::task::spawn_blocking(move || -> Result<_> {
        let slice = load_region(&data_dir, year, &region)?;
        Ok(analysis::analyze_income(&slice.table)?)
    })
    .await??;

    println!("Family income vs. scores, {uf} {year}: {} participants", income.rows);
    println!("\n{:<16} {:>9}", "AREA", "R");
    for c in &income.correlations {
        println!("{:<16} {:>9.3}", c.area, c.r);
    }
    println!("\nOverall score by income bracket (Q006):");
    println!("{:<8} {:>10} {:>10} {:>8}", "BRACKET", "MEAN", "STD", "COUNT");
    for g in &income.brackets {
        println!("{:<8} {:>10.2} {:>10.2} {:>8}", g.group, g.mean, g.std, g.count);
    }
    Ok(())
}
