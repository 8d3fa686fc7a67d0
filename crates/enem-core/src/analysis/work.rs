//! Parents' work status (Q002 father, Q003 mother) against the overall score.

use super::{available_scores, group_means, row_scores, score_columns};
use super::{GroupStat, OVERALL_SCORE, PARENT_COLUMNS};
use crate::dataset::{Column, ColumnValues, Table};
use crate::stats::StatsError;

/// Appended to the questionnaire column name for the derived status column.
pub const WORK_STATUS_SUFFIX: &str = "_STATUS";

/// Questionnaire answer to a work-status category. `H` and blanks are unknown.
pub fn work_status(answer: &str) -> Option<&'static str> {
    match answer.trim() {
        "A" => Some("does not work"),
        "B" => Some("works at home"),
        "C" => Some("works outside, informal"),
        "D" => Some("works outside, formal"),
        "E" => Some("retired"),
        "F" => Some("unemployed"),
        "G" => Some("other"),
        _ => None,
    }
}

/// Overall score per work-status category of one parent.
#[derive(Debug, Clone)]
pub struct ParentWorkStats {
    /// Derived column, e.g. `Q002_STATUS`.
    pub column: String,
    pub rows: usize,
    pub groups: Vec<GroupStat>,
}

/// One entry per parent column present that has at least one row with a
/// known status and every score.
pub fn analyze_work_status(table: &Table) -> Result<Vec<ParentWorkStats>, StatsError> {
    let parents: Vec<&Column> = PARENT_COLUMNS
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    if parents.is_empty() {
        return Err(StatsError::MissingColumn(PARENT_COLUMNS.join("/")));
    }
    let scores = available_scores(table)?;

    let mut out = Vec::new();
    for parent in parents {
        let column = format!("{}{WORK_STATUS_SUFFIX}", parent.name);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..table.num_rows() {
            let Some(status) = parent.values.get_text(i).and_then(|s| work_status(&s)) else {
                continue;
            };
            if row_scores(&scores, i).is_none() {
                continue;
            }
            labels.push(Some(status.to_string()));
            rows.push(i);
        }
        if rows.is_empty() {
            tracing::debug!(column = %column, "no rows with a known work status");
            continue;
        }

        let mut columns = vec![Column::new(column.clone(), ColumnValues::Utf8(labels))];
        columns.extend(score_columns(&scores, &rows));
        let valid = Table::new(columns)?;
        out.push(ParentWorkStats {
            groups: group_means(&valid, OVERALL_SCORE, &column)?,
            column,
            rows: rows.len(),
        });
    }
    Ok(out)
}
