//! Family income (Q006) against scores.

use super::{available_scores, correlations, group_means, row_scores, score_columns};
use super::{AreaCorrelation, GroupStat, OVERALL_SCORE};
use crate::dataset::{Column, ColumnValues, Table};
use crate::stats::StatsError;

/// Monthly family income bracket answer.
pub const INCOME_COLUMN: &str = "Q006";
/// Numeric rank of the income bracket.
pub const INCOME_LEVEL: &str = "RENDA_NUM";

/// Bracket answer `A`..=`Q` to its rank 1..=17.
pub fn income_level(answer: &str) -> Option<f64> {
    match answer.trim().as_bytes() {
        [c @ b'A'..=b'Q'] => Some(f64::from(c - b'A' + 1)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct IncomeAnalysis {
    /// Rows with an income answer and every score.
    pub rows: usize,
    /// `corr(RENDA_NUM, area)` per score area and `NOTA_GERAL`.
    pub correlations: Vec<AreaCorrelation>,
    /// `NOTA_GERAL` per raw bracket answer.
    pub brackets: Vec<GroupStat>,
}

/// Correlates the income rank with each score area and summarizes the
/// overall score per bracket. Answers outside `A`..=`Q` still form a bracket
/// but carry no rank.
pub fn analyze_income(table: &Table) -> Result<IncomeAnalysis, StatsError> {
    let answers = table
        .column(INCOME_COLUMN)
        .ok_or_else(|| StatsError::MissingColumn(INCOME_COLUMN.to_string()))?;
    let scores = available_scores(table)?;

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut levels = Vec::new();
    for i in 0..table.num_rows() {
        let Some(label) = answers.values.get_text(i) else { continue };
        let label = label.trim().to_string();
        if label.is_empty() || row_scores(&scores, i).is_none() {
            continue;
        }
        levels.push(income_level(&label));
        labels.push(Some(label));
        rows.push(i);
    }
    if rows.is_empty() {
        return Err(StatsError::InsufficientData { rows: 0 });
    }

    let mut columns = vec![
        Column::new(INCOME_COLUMN, ColumnValues::Utf8(labels)),
        Column::float(INCOME_LEVEL, levels),
    ];
    columns.extend(score_columns(&scores, &rows));
    let valid = Table::new(columns)?;

    let correlations = correlations(&valid, INCOME_LEVEL)?
        .into_iter()
        .filter(|c| c.area != INCOME_COLUMN)
        .collect();
    let brackets = group_means(&valid, OVERALL_SCORE, INCOME_COLUMN)?;
    tracing::debug!(rows = rows.len(), brackets = brackets.len(), "income analysis");
    Ok(IncomeAnalysis {
        rows: rows.len(),
        correlations,
        brackets,
    })
}
