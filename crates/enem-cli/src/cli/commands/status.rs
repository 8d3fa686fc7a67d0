//! `enem status` – converted datasets and the last batch.

use anyhow::Result;
use enem_core::dataset::ColumnarDataset;
use enem_core::scheduler::BatchReport;
use std::path::Path;

pub async fn run_status(data_dir: &Path) -> Result<()> {
    let years = ColumnarDataset::available_years(data_dir)?;
    if years.is_empty() {
        println!("No datasets in {}.", data_dir.display());
    } else {
        println!("{:<6} {:>10} {:>6}", "YEAR", "ROWS", "COLS");
        for year in years {
            match ColumnarDataset::shape(data_dir, year) {
                Ok((rows, columns)) => println!("{:<6} {:>10} {:>6}", year, rows, columns),
                Err(e) => println!("{:<6} unreadable: {:#}", year, e),
            }
        }
    }

    let report = BatchReport::default_path().and_then(|p| BatchReport::load_from_path(&p));
    match report {
        Ok(Some(r)) => {
            println!("\nLast batch ({} round(s)):", r.rounds);
            for (year, outcome) in r.outcomes() {
                println!("  {year}: {outcome}");
            }
        }
        Ok(None) => println!("\nNo batch has been run yet."),
        Err(e) => tracing::warn!("could not read last batch report: {:#}", e),
    }
    Ok(())
}
