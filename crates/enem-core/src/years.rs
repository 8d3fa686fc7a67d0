//! Parsing of the requested exam years (`2014:2024` or `2014,2015,2016`).

use std::ops::RangeInclusive;

use thiserror::Error;

/// First year with published microdata.
pub const MIN_YEAR: u16 = 1998;
/// Most recent year accepted.
pub const MAX_YEAR: u16 = 2024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum YearSpecError {
    #[error("invalid year range {0:?}: expected e.g. 2014:2024")]
    BadRange(String),
    #[error("invalid year list {0:?}: expected e.g. 2014,2015,2016")]
    BadList(String),
    #[error("no valid year in {0:?} (accepted: {MIN_YEAR}..={MAX_YEAR})")]
    NoValidYear(String),
}

/// Parsed year request. `rejected` holds syntactically valid spans outside
/// the accepted window; a single listed year is a one-year span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSpec {
    pub years: Vec<u16>,
    pub rejected: Vec<RangeInclusive<i64>>,
}

impl YearSpec {
    /// Parses `start:end` (inclusive) or a comma-separated list. Duplicates keep their first position.
    pub fn parse(input: &str) -> Result<Self, YearSpecError> {
        let input = input.trim();
        let (years, rejected) = if let Some((a, b)) = input.split_once(':') {
            let start: i64 = a
                .trim()
                .parse()
                .map_err(|_| YearSpecError::BadRange(input.to_string()))?;
            let end: i64 = b
                .trim()
                .parse()
                .map_err(|_| YearSpecError::BadRange(input.to_string()))?;
            split_range(start, end)
        } else {
            let raw: Vec<i64> = input
                .split(',')
                .map(|s| s.trim().parse::<i64>())
                .collect::<Result<_, _>>()
                .map_err(|_| YearSpecError::BadList(input.to_string()))?;
            split_list(raw)
        };

        for span in &rejected {
            tracing::warn!(
                first = span.start(),
                last = span.end(),
                "ignoring years outside accepted window"
            );
        }
        if years.is_empty() {
            return Err(YearSpecError::NoValidYear(input.to_string()));
        }
        Ok(Self { years, rejected })
    }
}

fn window() -> RangeInclusive<i64> {
    i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)
}

/// Clamps `start..=end` to the window without enumerating the outside parts.
fn split_range(start: i64, end: i64) -> (Vec<u16>, Vec<RangeInclusive<i64>>) {
    let (min, max) = (i64::from(MIN_YEAR), i64::from(MAX_YEAR));
    if start > end {
        return (Vec::new(), Vec::new());
    }
    let mut rejected = Vec::new();
    if start < min {
        rejected.push(start..=end.min(min - 1));
    }
    if end > max {
        rejected.push(start.max(max + 1)..=end);
    }
    let (lo, hi) = (start.max(min), end.min(max));
    let years = if lo <= hi {
        (lo..=hi).filter_map(|y| u16::try_from(y).ok()).collect()
    } else {
        Vec::new()
    };
    (years, rejected)
}

fn split_list(raw: Vec<i64>) -> (Vec<u16>, Vec<RangeInclusive<i64>>) {
    let mut years = Vec::new();
    let mut rejected = Vec::new();
    for y in raw {
        match u16::try_from(y) {
            Ok(year) if window().contains(&y) => {
                if !years.contains(&year) {
                    years.push(year);
                }
            }
            _ => rejected.push(y..=y),
        }
    }
    (years, rejected)
}
