use ndarray::{array, Array1};

use super::scalar::Interpolant;
use crate::error::{RadarError, RadarResult};

// Relative tolerance when checking that the entries are equally spaced.
const SPACING_TOLERANCE: f64 = 1e-5;

/// A function of one real variable, stored as a table and linearly interpolated.
///
/// Lookup is O(1) because the entries are equally spaced: the bucket index is
/// `floor((x - first) / spacing)`. Inputs below the first entry return the `before`
/// value, inputs at or above the last entry return the `after` value.
#[derive(Clone, Debug)]
pub struct ApproxFunction<T: Interpolant> {
    // Independent variable, usually time, frequency or angle.
    // Evenly spaced, ascending, same length as values.
    entries: Array1<f64>,
    values: Array1<T>,
    spacing: f64,
    before: T,
    after: T,
}

fn check_table(entries: &Array1<f64>, num_values: usize) -> RadarResult<f64> {
    if entries.len() < 2 {
        return Err(RadarError::InvalidTable(format!(
            "need at least two entries, got {}",
            entries.len()
        )));
    }
    if entries.len() != num_values {
        return Err(RadarError::InvalidTable(format!(
            "{} entries but {} values",
            entries.len(),
            num_values
        )));
    }

    let first = entries[0];
    let last = entries[entries.len() - 1];
    if entries[1] <= first {
        return Err(RadarError::InvalidTable("entries are not ascending".into()));
    }

    let spacing = (last - first) / (entries.len() - 1) as f64;
    let uniform = entries
        .windows(2)
        .into_iter()
        .all(|w| ((w[1] - w[0]) - spacing).abs() <= SPACING_TOLERANCE * spacing);
    if !uniform {
        return Err(RadarError::InvalidTable("entries are not equally spaced".into()));
    }

    Ok(spacing)
}

impl<T: Interpolant> ApproxFunction<T> {
    /// Builds a table function. Out-of-range inputs map to the first and last value.
    pub fn new(
        entries: impl Into<Array1<f64>>,
        values: impl Into<Array1<T>>,
    ) -> RadarResult<ApproxFunction<T>> {
        let entries = entries.into();
        let values = values.into();
        let spacing = check_table(&entries, values.len())?;
        let before = values[0];
        let after = values[values.len() - 1];

        Ok(ApproxFunction {
            entries,
            values,
            spacing,
            before,
            after,
        })
    }

    /// Builds a table function with explicit values outside the table.
    pub fn with_bounds(
        entries: impl Into<Array1<f64>>,
        values: impl Into<Array1<T>>,
        before: T,
        after: T,
    ) -> RadarResult<ApproxFunction<T>> {
        let mut function = Self::new(entries, values)?;
        function.before = before;
        function.after = after;
        Ok(function)
    }

    /// A function returning `value` for every input.
    pub fn constant(value: T) -> ApproxFunction<T> {
        ApproxFunction {
            entries: array![0.],
            values: Array1::from_elem(1, value),
            spacing: 0.,
            before: value,
            after: value,
        }
    }

    pub fn evaluate(&self, x: f64) -> T {
        let len = self.values.len();
        if len == 1 {
            return self.before;
        }

        if x < self.entries[0] {
            return self.before;
        }
        if x >= self.entries[len - 1] {
            return self.after;
        }

        let bucket = ((x - self.entries[0]) / self.spacing).floor() as usize;
        let n = (bucket + 1).min(len - 1);
        let w1 = (self.entries[n] - x) / self.spacing;
        let w2 = (x - self.entries[n - 1]) / self.spacing;
        self.values[n - 1] * w1 + self.values[n] * w2
    }

    pub fn evaluate_many(&self, xs: impl IntoIterator<Item = f64>) -> Array1<T> {
        xs.into_iter().map(|x| self.evaluate(x)).collect()
    }

    pub fn entries(&self) -> &Array1<f64> {
        &self.entries
    }

    pub fn values(&self) -> &Array1<T> {
        &self.values
    }

    pub fn is_constant(&self) -> bool {
        self.values.len() == 1
    }

    pub fn before(&self) -> T {
        self.before
    }

    pub fn after(&self) -> T {
        self.after
    }
}
