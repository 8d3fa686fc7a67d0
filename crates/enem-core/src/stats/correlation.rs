use super::StatsError;
use crate::dataset::Table;

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n - 1); NaN below two values.
pub fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (xs.len() - 1) as f64).sqrt()
}

/// Pearson correlation of paired samples.
///
/// NaN when fewer than two pairs are given or either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);
    // A rounded mean leaves a tiny nonzero spread on constant input.
    if is_constant(x) || is_constant(y) {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    // Rounding can push |r| a hair past 1.
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Values of columns `x` and `y` on the rows where both hold a number.
pub fn paired_columns(table: &Table, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>), StatsError> {
    let cx = table
        .column(x)
        .ok_or_else(|| StatsError::MissingColumn(x.to_string()))?;
    let cy = table
        .column(y)
        .ok_or_else(|| StatsError::MissingColumn(y.to_string()))?;
    let mut xs = Vec::with_capacity(table.num_rows());
    let mut ys = Vec::with_capacity(table.num_rows());
    for i in 0..table.num_rows() {
        if let (Some(a), Some(b)) = (cx.values.get_f64(i), cy.values.get_f64(i)) {
            xs.push(a);
            ys.push(b);
        }
    }
    Ok((xs, ys))
}

/// `pearson` over the complete pairs of two columns.
pub fn correlate(table: &Table, x: &str, y: &str) -> Result<f64, StatsError> {
    let (xs, ys) = paired_columns(table, x, y)?;
    Ok(pearson(&xs, &ys))
}

fn is_constant(xs: &[f64]) -> bool {
    xs.split_first()
        .is_some_and(|(first, rest)| rest.iter().all(|v| v == first))
}
