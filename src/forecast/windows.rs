//! Sliding (past window, future window) pairs over the ascending history.

use crate::types::variable::Variable;
use ndarray::Array2;

/// Rows of history the model conditions on.
pub const LOOKBACK: usize = 1;

/// Flattened training matrices: one row per pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingPairs {
    /// `pairs × (lookback · 5)`
    pub features: Array2<f64>,
    /// `pairs × (horizon · 5)`
    pub targets: Array2<f64>,
}

impl TrainingPairs {
    /// Builds a pair at every row `i` where `lookback` rows precede it and `horizon`
    /// rows start at it. Rows are flattened row-major.
    pub fn build(rows: &[[f64; 5]], lookback: usize, horizon: usize) -> Self {
        let width = Variable::ALL.len();
        let starts: Vec<usize> = if rows.len() >= lookback + horizon {
            (lookback..=rows.len() - horizon).collect()
        } else {
            Vec::new()
        };

        let mut features = Array2::zeros((starts.len(), lookback * width));
        let mut targets = Array2::zeros((starts.len(), horizon * width));
        for (pair, &i) in starts.iter().enumerate() {
            let past = rows[i - lookback..i].iter().flatten();
            for (cell, value) in features.row_mut(pair).iter_mut().zip(past) {
                *cell = *value;
            }
            let future = rows[i..i + horizon].iter().flatten();
            for (cell, value) in targets.row_mut(pair).iter_mut().zip(future) {
                *cell = *value;
            }
        }

        Self { features, targets }
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The last `lookback` rows flattened, the input the forecast is predicted from.
pub fn latest_window(rows: &[[f64; 5]], lookback: usize) -> Vec<f64> {
    rows[rows.len().saturating_sub(lookback)..]
        .iter()
        .flatten()
        .copied()
        .collect()
}
