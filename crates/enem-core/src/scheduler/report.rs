//! Batch summary, persisted as JSON under the XDG state dir so `enem status`
//! can show the last run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::task::{YearOutcome, YearTask};

/// Shape of a dataset written during the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub codec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unix seconds when the batch ended.
    pub finished_at: u64,
    /// Rounds actually run.
    pub rounds: u32,
    pub tasks: Vec<YearTask>,
    #[serde(default)]
    pub datasets: BTreeMap<u16, DatasetInfo>,
}

impl BatchReport {
    /// Exactly one outcome per requested year.
    pub fn outcomes(&self) -> BTreeMap<u16, YearOutcome> {
        self.tasks.iter().map(|t| (t.year, t.outcome())).collect()
    }

    pub fn count(&self, outcome: YearOutcome) -> usize {
        self.tasks.iter().filter(|t| t.outcome() == outcome).count()
    }

    pub fn task(&self, year: u16) -> Option<&YearTask> {
        self.tasks.iter().find(|t| t.year == year)
    }

    /// Default location: `~/.local/state/enem/last_batch.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::logging::state_dir()?.join("last_batch.json"))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize batch report")?;
        std::fs::write(path, json)
            .with_context(|| format!("write batch report: {}", path.display()))?;
        Ok(())
    }

    /// `None` when no batch has been recorded yet.
    pub fn load_from_path(path: &Path) -> Result<Option<BatchReport>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read batch report: {}", path.display()))
            }
        };
        let report = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse batch report: {}", path.display()))?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskStatus;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("last_batch.json");
        assert!(BatchReport::load_from_path(&path).unwrap().is_none());

        let mut ok = YearTask::new(2020);
        ok.status = TaskStatus::Succeeded;
        ok.attempts = 1;
        let mut bad = YearTask::new(2021);
        bad.status = TaskStatus::Failed;
        bad.attempts = 3;
        bad.last_error = Some("HTTP 404".into());
        let mut datasets = BTreeMap::new();
        datasets.insert(
            2020,
            DatasetInfo {
                path: PathBuf::from("dados_enem/microdados_enem_2020.parquet"),
                rows: 10,
                columns: 4,
                codec: "arrow-parquet".into(),
            },
        );
        let report = BatchReport {
            finished_at: 1_700_000_000,
            rounds: 3,
            tasks: vec![ok, bad],
            datasets,
        };
        report.save_to_path(&path).unwrap();

        let loaded = BatchReport::load_from_path(&path).unwrap().unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.count(YearOutcome::Success), 1);
        assert_eq!(
            loaded.outcomes().get(&2021),
            Some(&YearOutcome::FailedAfterAllAttempts)
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_batch.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(BatchReport::load_from_path(&path).is_err());
    }
}
