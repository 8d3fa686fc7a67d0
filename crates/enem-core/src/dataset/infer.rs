//! Column type inference over raw text cells.
//!
//! `ColumnBuilder` types a column while its cells arrive, so the converter
//! never holds a whole file as text. A column starts untyped and is promoted
//! Int64 → Float64 → Utf8 the first time a cell does not fit.

use std::mem;

use super::{Column, ColumnValues};

pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}

#[derive(Debug)]
enum State {
    /// Only nulls so far.
    Null(usize),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

/// Incrementally typed column.
#[derive(Debug)]
pub struct ColumnBuilder {
    name: String,
    state: State,
    /// Source text of numeric cells whose canonical rendering differs, by row.
    /// Used if the column is later promoted to Utf8.
    verbatim: Vec<(usize, String)>,
}

impl ColumnBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: State::Null(0),
            verbatim: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.state {
            State::Null(n) => *n,
            State::Int64(v) => v.len(),
            State::Float64(v) => v.len(),
            State::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends one cell; `None` is a null.
    pub fn push(&mut self, cell: Option<String>) {
        let Some(text) = cell else {
            self.push_null();
            return;
        };
        let row = self.len();
        match &mut self.state {
            State::Null(n) => {
                let n = *n;
                if let Some(x) = parse_int(&text) {
                    let mut v = vec![None; n];
                    v.push(Some(x));
                    self.state = State::Int64(v);
                    self.remember(row, text);
                } else if let Some(x) = parse_float(&text) {
                    let mut v = vec![None; n];
                    v.push(Some(x));
                    self.state = State::Float64(v);
                    self.remember(row, text);
                } else {
                    let mut v = vec![None; n];
                    v.push(Some(text));
                    self.state = State::Utf8(v);
                }
            }
            State::Int64(v) => {
                if let Some(x) = parse_int(&text) {
                    v.push(Some(x));
                    self.remember(row, text);
                } else if let Some(x) = parse_float(&text) {
                    self.promote_to_float();
                    if let State::Float64(v) = &mut self.state {
                        v.push(Some(x));
                    }
                    self.remember(row, text);
                } else {
                    self.promote_to_text();
                    self.push_text(text);
                }
            }
            State::Float64(v) => {
                if let Some(x) = parse_float(&text) {
                    v.push(Some(x));
                    self.remember(row, text);
                } else {
                    self.promote_to_text();
                    self.push_text(text);
                }
            }
            State::Utf8(v) => v.push(Some(text)),
        }
    }

    pub fn finish(self) -> Column {
        let values = match self.state {
            State::Null(n) => ColumnValues::Utf8(vec![None; n]),
            State::Int64(v) => ColumnValues::Int64(v),
            State::Float64(v) => ColumnValues::Float64(v),
            State::Utf8(v) => ColumnValues::Utf8(v),
        };
        Column::new(self.name, values)
    }

    fn push_null(&mut self) {
        match &mut self.state {
            State::Null(n) => *n += 1,
            State::Int64(v) => v.push(None),
            State::Float64(v) => v.push(None),
            State::Utf8(v) => v.push(None),
        }
    }

    fn push_text(&mut self, text: String) {
        if let State::Utf8(v) = &mut self.state {
            v.push(Some(text));
        }
    }

    /// Keeps `text` for `row` when the typed value would render differently.
    fn remember(&mut self, row: usize, text: String) {
        let canonical = match &self.state {
            State::Int64(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            State::Float64(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            State::Null(_) | State::Utf8(_) => return,
        };
        if canonical.as_deref() != Some(text.as_str()) {
            self.verbatim.push((row, text));
        }
    }

    fn promote_to_float(&mut self) {
        let State::Int64(ints) = mem::replace(&mut self.state, State::Null(0)) else {
            return;
        };
        // Integers past 2^53 render differently once widened.
        let mut lossy: Vec<(usize, String)> = ints
            .iter()
            .enumerate()
            .filter_map(|(i, x)| x.map(|x| (i, x)))
            .filter(|(_, x)| (*x as f64).to_string() != x.to_string())
            .filter(|(i, _)| self.verbatim.binary_search_by_key(i, |(r, _)| *r).is_err())
            .map(|(i, x)| (i, x.to_string()))
            .collect();
        if !lossy.is_empty() {
            self.verbatim.append(&mut lossy);
            self.verbatim.sort_by_key(|(r, _)| *r);
        }
        self.state = State::Float64(ints.into_iter().map(|x| x.map(|x| x as f64)).collect());
    }

    fn promote_to_text(&mut self) {
        let mut texts: Vec<Option<String>> =
            match mem::replace(&mut self.state, State::Null(0)) {
                State::Null(n) => vec![None; n],
                State::Int64(v) => v.into_iter().map(|x| x.map(|x| x.to_string())).collect(),
                State::Float64(v) => v.into_iter().map(|x| x.map(|x| x.to_string())).collect(),
                State::Utf8(v) => v,
            };
        for (row, text) in mem::take(&mut self.verbatim) {
            if let Some(cell) = texts.get_mut(row) {
                *cell = Some(text);
            }
        }
        self.state = State::Utf8(texts);
    }
}

/// Int64 if every non-null cell is an integer, else Float64 if every non-null
/// cell is a number, else Utf8. An all-null column becomes Utf8.
pub fn infer_column(name: impl Into<String>, cells: Vec<Option<String>>) -> Column {
    let mut builder = ColumnBuilder::new(name);
    for cell in cells {
        builder.push(cell);
    }
    builder.finish()
}
