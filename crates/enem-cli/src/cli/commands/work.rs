//! `enem work` – parents' work status vs. overall score for one year and state.

use anyhow::Result;
use enem_core::analysis;
use std::path::PathBuf;

use super::analyze::load_region;

pub async fn run_work(year: u16, uf: &str, data_dir: PathBuf) -> Result<()> {
    let uf = uf.trim().to_uppercase();
    let region = uf.clone();
    let stats = tokio::task::spawn_blocking(move || -> Result<_> {
        let slice = load_region(&data_dir, year, &region)?;
        Ok(analysis::analyze_work_status(&slice.table)?)
    })
    .await??;

    if stats.is_empty() {
        println!("No participant in {uf} {year} reported a known parent work status.");
        return Ok(());
    }
    for parent in stats {
        let who = if parent.column.starts_with("Q002") { "father" } else { "mother" };
        println!("\nOverall score by {who}'s work status ({}, {} rows):", parent.column, parent.rows);
        println!("{:<26} {:>10} {:>10} {:>8}", "STATUS", "MEAN", "STD", "COUNT");
        for g in parent.groups {
            println!("{:<26} {:>10.2} {:>10.2} {:>8}", g.group, g.mean, g.std, g.count);
        }
    }
    Ok(())
}
