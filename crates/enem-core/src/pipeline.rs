//! Per-year pipeline: fetch → extract → sniff → convert.
//!
//! The scratch directory for the extracted CSV is a `tempfile::TempDir`, so
//! it is removed on every exit path, success or error.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::archive;
use crate::config::EnemConfig;
use crate::control::CancelToken;
use crate::convert::{self, ConvertOptions, ConvertReport};
use crate::fetch::{self, FetchOptions};
use crate::layout;
use crate::scheduler::{ProgressStats, YearError, YearProcessor};
use crate::sniff;

/// Minimum spacing between progress snapshots.
const PROGRESS_EVERY: Duration = Duration::from_millis(250);

pub struct EnemPipeline {
    base_url: String,
    data_dir: PathBuf,
    fetch: FetchOptions,
    convert: ConvertOptions,
    sample_bytes: usize,
    scratch_dir: Option<PathBuf>,
    progress: Option<mpsc::Sender<ProgressStats>>,
}

impl EnemPipeline {
    pub fn new(base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            data_dir: data_dir.into(),
            fetch: FetchOptions::default(),
            convert: ConvertOptions::default(),
            sample_bytes: 50_000,
            scratch_dir: None,
            progress: None,
        }
    }

    pub fn from_config(cfg: &EnemConfig) -> Self {
        let convert_cfg = cfg.convert_or_default();
        Self::new(cfg.base_url.clone(), cfg.data_dir.clone())
            .with_fetch_options(cfg.fetch_or_default().options())
            .with_convert_options(ConvertOptions {
                chunk_rows: convert_cfg.chunk_rows,
            })
            .with_sample_bytes(convert_cfg.sample_bytes)
            .with_scratch_dir(convert_cfg.scratch_dir)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_fetch_options(mut self, opts: FetchOptions) -> Self {
        self.fetch = opts;
        self
    }

    pub fn with_convert_options(mut self, opts: ConvertOptions) -> Self {
        self.convert = opts;
        self
    }

    pub fn with_sample_bytes(mut self, n: usize) -> Self {
        self.sample_bytes = n.max(1);
        self
    }

    /// Download progress is sent here with `try_send`; full channels drop snapshots.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressStats>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Parent for the per-year extraction directory; `None` uses the system temp dir.
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }
}

impl YearProcessor for EnemPipeline {
    fn process(&self, year: u16, cancel: &CancelToken) -> Result<ConvertReport, YearError> {
        cancel.check()?;
        let url = layout::archive_url(&self.base_url, year)
            .map_err(|e| YearError::InvalidUrl(format!("{e:#}")))?;
        tracing::info!(year, %url, "fetching archive");

        let started = Instant::now();
        let mut last_sent: Option<Instant> = None;
        let mut on_progress = |done: u64, total: Option<u64>| {
            let Some(tx) = &self.progress else { return };
            if last_sent.is_some_and(|t| t.elapsed() < PROGRESS_EVERY) {
                return;
            }
            last_sent = Some(Instant::now());
            let _ = tx.try_send(ProgressStats {
                year,
                bytes_done: done,
                total_bytes: total,
                elapsed_secs: started.elapsed().as_secs_f64(),
            });
        };
        let raw = fetch::fetch(&url, &self.fetch, cancel, &mut on_progress)?;

        let prefix = format!("enem-{year}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let work = match &self.scratch_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };
        let extracted = archive::extract(raw, work.path())?;
        tracing::debug!(year, entry = %extracted.entry_name, bytes = extracted.declared_size, "extracted");

        let sample = sniff::read_sample(&extracted.path, self.sample_bytes)?;
        let format = sniff::sniff(&sample);
        tracing::info!(
            year,
            delimiter = %char::from(format.delimiter),
            has_header = format.has_header,
            "sniffed format"
        );

        let dest = layout::dataset_path(&self.data_dir, year);
        let report = convert::convert(&extracted.path, &format, &dest, &self.convert, cancel)?;
        Ok(report)
    }
}
