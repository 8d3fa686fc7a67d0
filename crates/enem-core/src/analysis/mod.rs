//! Glue between a loaded year and the estimators: region filter,
//! questionnaire predictors, score preparation and the per-state reports
//! (parent education, family income, parents' work status).

mod groups;
mod income;
mod work;

pub use groups::{describe_levels, group_means, GroupStat, LevelSummary};
pub use income::{analyze_income, income_level, IncomeAnalysis, INCOME_COLUMN, INCOME_LEVEL};
pub use work::{analyze_work_status, work_status, ParentWorkStats, WORK_STATUS_SUFFIX};

use crate::dataset::{Column, ColumnValues, Table};
use crate::stats::{bootstrap, correlate, mean, BootstrapConfig, BootstrapResult, StatsError};

pub const REGION_COLUMN: &str = "SG_UF_PROVA";
pub const PARENT_COLUMNS: [&str; 2] = ["Q002", "Q003"];
pub const PARENT_EDUCATION: &str = "EDUCACAO_PAIS";
pub const SCORE_COLUMNS: [&str; 5] = [
    "NU_NOTA_CN",
    "NU_NOTA_CH",
    "NU_NOTA_LC",
    "NU_NOTA_MT",
    "NU_NOTA_REDACAO",
];
pub const OVERALL_SCORE: &str = "NOTA_GERAL";

/// Rows of one state and the column used to select them.
#[derive(Debug, Clone)]
pub struct RegionSlice {
    pub column: String,
    pub table: Table,
}

fn cell_matches(values: &ColumnValues, i: usize, uf: &str, uf_code: Option<i64>) -> bool {
    match values {
        ColumnValues::Utf8(_) => values
            .get_text(i)
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(uf)),
        ColumnValues::Int64(v) => uf_code.is_some_and(|code| v[i] == Some(code)),
        ColumnValues::Float64(_) => {
            uf_code.is_some_and(|code| values.get_f64(i) == Some(code as f64))
        }
    }
}

fn filter_on(table: &Table, column: &Column, uf: &str) -> Table {
    let uf_code = uf.trim().parse::<i64>().ok();
    let mask: Vec<bool> = (0..table.num_rows())
        .map(|i| cell_matches(&column.values, i, uf.trim(), uf_code))
        .collect();
    table.filter_rows(&mask)
}

/// Keeps the rows of state `uf`.
///
/// Uses `SG_UF_PROVA` when present; otherwise the first column whose name
/// contains `UF` and selects at least one row (text equality, or numeric
/// state code when `uf` is a number). `None` when nothing matches.
pub fn filter_region(table: &Table, uf: &str) -> Option<RegionSlice> {
    if let Some(col) = table.column(REGION_COLUMN) {
        let slice = filter_on(table, col, uf);
        return (slice.num_rows() > 0).then(|| RegionSlice {
            column: REGION_COLUMN.to_string(),
            table: slice,
        });
    }
    table
        .columns()
        .iter()
        .filter(|c| c.name.to_ascii_uppercase().contains("UF"))
        .find_map(|c| {
            let slice = filter_on(table, c, uf);
            (slice.num_rows() > 0).then(|| RegionSlice {
                column: c.name.clone(),
                table: slice,
            })
        })
}

/// Questionnaire answer to parent-education level.
pub fn education_level(answer: &str) -> Option<f64> {
    match answer.trim() {
        "A" | "B" | "C" | "D" => Some(1.0),
        "E" | "F" | "G" => Some(2.0),
        _ => None,
    }
}

/// Mean level over the available parent answers, per row.
pub fn parent_education(table: &Table) -> Result<Vec<Option<f64>>, StatsError> {
    let cols: Vec<&Column> = PARENT_COLUMNS
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    if cols.is_empty() {
        return Err(StatsError::MissingColumn(PARENT_COLUMNS.join("/")));
    }
    Ok((0..table.num_rows())
        .map(|i| {
            let levels: Vec<f64> = cols
                .iter()
                .filter_map(|c| c.values.get_text(i))
                .filter_map(|s| education_level(&s))
                .collect();
            (!levels.is_empty()).then(|| mean(&levels))
        })
        .collect())
}

/// `EDUCACAO_PAIS`, the available score columns and `NOTA_GERAL`, keeping
/// only rows where every one of them has a value.
pub fn prepare_scores(table: &Table) -> Result<Table, StatsError> {
    let education = parent_education(table)?;
    let scores = available_scores(table)?;

    let mut out: Vec<Vec<f64>> = vec![Vec::new(); scores.len() + 2];
    for (i, edu) in education.into_iter().enumerate() {
        let Some(edu) = edu else { continue };
        let Some(row) = row_scores(&scores, i) else { continue };
        out[0].push(edu);
        let overall = mean(&row);
        for (j, v) in row.into_iter().enumerate() {
            out[j + 1].push(v);
        }
        out[scores.len() + 1].push(overall);
    }

    let mut names: Vec<&str> = vec![PARENT_EDUCATION];
    names.extend(scores.iter().map(|c| c.name.as_str()));
    names.push(OVERALL_SCORE);
    let columns = names
        .into_iter()
        .zip(out)
        .map(|(name, v)| Column::float(name, v.into_iter().map(Some).collect()))
        .collect();
    Ok(Table::new(columns)?)
}

/// Score columns present in `table`, in canonical order.
fn available_scores(table: &Table) -> Result<Vec<&Column>, StatsError> {
    let scores: Vec<&Column> = SCORE_COLUMNS
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    if scores.is_empty() {
        return Err(StatsError::MissingColumn(SCORE_COLUMNS.join("/")));
    }
    Ok(scores)
}

/// Every score of row `i`, or `None` if one is missing.
fn row_scores(scores: &[&Column], i: usize) -> Option<Vec<f64>> {
    scores.iter().map(|c| c.values.get_f64(i)).collect()
}

/// Score columns plus `NOTA_GERAL` for the rows of `table` selected by `rows`.
fn score_columns(scores: &[&Column], rows: &[usize]) -> Vec<Column> {
    let mut out: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); scores.len() + 1];
    for &i in rows {
        let Some(row) = row_scores(scores, i) else { continue };
        out[scores.len()].push(Some(mean(&row)));
        for (j, v) in row.into_iter().enumerate() {
            out[j].push(Some(v));
        }
    }
    scores
        .iter()
        .map(|c| c.name.as_str())
        .chain([OVERALL_SCORE])
        .zip(out)
        .map(|(name, v)| Column::float(name, v))
        .collect()
}

/// Pearson correlation of one score area with a predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaCorrelation {
    pub area: String,
    pub r: f64,
}

/// Plain `corr(predictor, area)` for every other column of `table`.
pub fn correlations(table: &Table, predictor: &str) -> Result<Vec<AreaCorrelation>, StatsError> {
    table
        .column_names()
        .filter(|name| *name != predictor)
        .map(|area| {
            Ok(AreaCorrelation {
                area: area.to_string(),
                r: correlate(table, predictor, area)?,
            })
        })
        .collect()
}

/// Bootstrap outcome for one score area.
#[derive(Debug, Clone)]
pub struct AreaEstimate {
    pub area: String,
    pub result: Result<BootstrapResult, StatsError>,
}

/// Bootstraps `corr(EDUCACAO_PAIS, area)` for each score area of a prepared table.
pub fn analyze_with_bootstrap(prepared: &Table, cfg: &BootstrapConfig) -> Vec<AreaEstimate> {
    prepared
        .column_names()
        .filter(|name| *name != PARENT_EDUCATION)
        .map(|area| {
            let result = bootstrap(prepared, area, PARENT_EDUCATION, cfg);
            if let Err(e) = &result {
                tracing::warn!(area, error = %e, "bootstrap skipped");
            }
            AreaEstimate {
                area: area.to_string(),
                result,
            }
        })
        .collect()
}
