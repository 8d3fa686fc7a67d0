//! `enem fetch` – download and convert a set of years.

use anyhow::{Context, Result};
use enem_core::config::EnemConfig;
use enem_core::control::CancelToken;
use enem_core::pipeline::EnemPipeline;
use enem_core::scheduler::{BatchReport, ProgressStats, RetryScheduler, YearOutcome};
use enem_core::years::YearSpec;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub years: String,
    pub rounds: Option<u32>,
    pub delay: Option<u64>,
    pub jobs: Option<usize>,
    pub data_dir: Option<PathBuf>,
}

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_fetch(cfg: &EnemConfig, args: FetchArgs) -> Result<()> {
    let selection = YearSpec::parse(&args.years).with_context(|| format!("invalid years: {}", args.years))?;
    for span in &selection.rejected {
        if span.start() == span.end() {
            eprintln!("warning: year {} is outside the published range, skipped", span.start());
        } else {
            eprintln!(
                "warning: years {}:{} are outside the published range, skipped",
                span.start(),
                span.end()
            );
        }
    }

    let mut retry = cfg.retry_or_default();
    if let Some(rounds) = args.rounds {
        retry.max_rounds = rounds;
    }
    if let Some(delay) = args.delay {
        retry.round_delay_secs = delay;
    }
    if let Some(jobs) = args.jobs {
        retry.concurrency = jobs;
    }
    let data_dir = args.data_dir.unwrap_or_else(|| cfg.data_dir.clone());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        while let Some(stats) = progress_rx.recv().await {
            if last_print.is_some_and(|t| t.elapsed() < PROGRESS_INTERVAL) {
                continue;
            }
            let done_mib = stats.bytes_done as f64 / 1_048_576.0;
            let total = stats
                .total_bytes
                .map(|t| format!("{:.1}", t as f64 / 1_048_576.0))
                .unwrap_or_else(|| "?".to_string());
            let pct = stats
                .fraction()
                .map(|f| format!("{:.1}%", f * 100.0))
                .unwrap_or_else(|| "?".to_string());
            let eta = stats
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            println!(
                "  {}: {:.1} / {} MiB ({})  {:.2} MiB/s  ETA {}",
                stats.year,
                done_mib,
                total,
                pct,
                stats.bytes_per_sec() / 1_048_576.0,
                eta
            );
            last_print = Some(Instant::now());
        }
    });

    let cancel = CancelToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the current step...");
            on_ctrl_c.cancel();
        }
    });

    let pipeline = EnemPipeline::from_config(cfg)
        .with_data_dir(data_dir.clone())
        .with_progress(progress_tx);
    let scheduler = RetryScheduler::new(pipeline, retry.policy())
        .with_concurrency(retry.concurrency)
        .with_cancel(cancel);

    println!(
        "Processing {} year(s), up to {} round(s)",
        selection.years.len(),
        retry.max_rounds.max(1)
    );
    let report = scheduler.run(&selection.years).await;
    drop(scheduler);
    let _ = progress_handle.await;

    print_summary(&report);
    match BatchReport::default_path().and_then(|p| report.save_to_path(&p)) {
        Ok(()) => {}
        Err(e) => tracing::warn!("could not save batch report: {:#}", e),
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("{:<6} {:<26} {:<9} {}", "YEAR", "OUTCOME", "ATTEMPTS", "DETAIL");
    for task in &report.tasks {
        let outcome = task.outcome().to_string();
        let detail = match report.datasets.get(&task.year) {
            Some(d) => format!("{} rows x {} cols ({})", d.rows, d.columns, d.codec),
            None => task.last_error.clone().unwrap_or_default(),
        };
        println!("{:<6} {:<26} {:<9} {}", task.year, outcome, task.attempts, detail);
    }
    println!(
        "\nSucceeded: {}  Failed: {}  Cancelled: {}  (rounds: {})",
        report.count(YearOutcome::Success),
        report.count(YearOutcome::FailedAfterAllAttempts),
        report.count(YearOutcome::Cancelled),
        report.rounds
    );
}
