use std::collections::BTreeMap;

use super::{OVERALL_SCORE, PARENT_EDUCATION};
use crate::dataset::Table;
use crate::stats::{mean, std_dev, StatsError};

/// Summary of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStat {
    pub group: String,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// Mean, sample std and count of `value` per distinct `group` label, ordered
/// by label. Rows missing either cell are skipped.
pub fn group_means(table: &Table, value: &str, group: &str) -> Result<Vec<GroupStat>, StatsError> {
    let v = table
        .column(value)
        .ok_or_else(|| StatsError::MissingColumn(value.to_string()))?;
    let g = table
        .column(group)
        .ok_or_else(|| StatsError::MissingColumn(group.to_string()))?;

    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for i in 0..table.num_rows() {
        if let (Some(x), Some(label)) = (v.values.get_f64(i), g.values.get_text(i)) {
            buckets.entry(label).or_default().push(x);
        }
    }
    Ok(buckets
        .into_iter()
        .map(|(group, xs)| GroupStat {
            group,
            mean: mean(&xs),
            std: std_dev(&xs),
            count: xs.len(),
        })
        .collect())
}

/// Participants at one parent-education level of a prepared table.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub level: u8,
    pub count: usize,
    /// Fraction of all prepared rows, mixed levels included.
    pub share: f64,
    /// Mean of each score area (`NOTA_GERAL` excluded); empty when `count` is 0.
    pub area_means: Vec<(String, f64)>,
}

/// Levels 1 and 2 exactly; rows whose parents fall on different levels
/// (mean 1.5) count toward the total only.
pub fn describe_levels(prepared: &Table) -> Result<Vec<LevelSummary>, StatsError> {
    let edu = prepared
        .column(PARENT_EDUCATION)
        .ok_or_else(|| StatsError::MissingColumn(PARENT_EDUCATION.to_string()))?;
    let areas: Vec<_> = prepared
        .columns()
        .iter()
        .filter(|c| c.name != PARENT_EDUCATION && c.name != OVERALL_SCORE)
        .collect();
    let total = prepared.num_rows();

    Ok([1u8, 2]
        .into_iter()
        .map(|level| {
            let rows: Vec<usize> = (0..total)
                .filter(|&i| edu.values.get_f64(i) == Some(f64::from(level)))
                .collect();
            let area_means = if rows.is_empty() {
                Vec::new()
            } else {
                areas
                    .iter()
                    .map(|c| {
                        let xs: Vec<f64> = rows.iter().filter_map(|&i| c.values.get_f64(i)).collect();
                        (c.name.clone(), mean(&xs))
                    })
                    .collect()
            };
            LevelSummary {
                level,
                count: rows.len(),
                share: if total > 0 {
                    rows.len() as f64 / total as f64
                } else {
                    0.0
                },
                area_means,
            }
        })
        .collect())
}
