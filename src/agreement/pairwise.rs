use serde::Serialize;

use super::correlation::{lin_ccc, spearman};
use crate::scores::ScoreTable;
use crate::util::round_opt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PairwiseMetric {
    Spearman,
    Ccc,
}

impl PairwiseMetric {
    fn compute(self, x: &[f64], y: &[f64]) -> Option<f64> {
        match self {
            Self::Spearman => spearman(x, y),
            Self::Ccc => lin_ccc(x, y),
        }
    }
}

/// Symmetric rater x rater matrix with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseMatrix {
    pub raters: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl PairwiseMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|cells| cells.get(col)).copied().flatten()
    }

    /// Equal-weight mean over the defined entries above the diagonal.
    pub fn upper_mean(&self) -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0_usize;
        for row in 0..self.raters.len() {
            for col in row + 1..self.raters.len() {
                if let Some(value) = self.get(row, col) {
                    total += value;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| total / count as f64)
    }

    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            raters: self.raters.clone(),
            values: self
                .values
                .iter()
                .map(|cells| cells.iter().map(|cell| round_opt(*cell, decimals)).collect())
                .collect(),
        }
    }
}

pub fn pairwise_matrix(table: &ScoreTable, metric: PairwiseMetric) -> PairwiseMatrix {
    let raters = table.raters().to_vec();
    let columns = raters
        .iter()
        .map(|rater| table.column(rater))
        .collect::<Vec<Vec<f64>>>();

    let size = raters.len();
    let mut values = vec![vec![None; size]; size];
    for row in 0..size {
        values[row][row] = Some(1.0);
        for col in row + 1..size {
            let value = metric.compute(&columns[row], &columns[col]);
            values[row][col] = value;
            values[col][row] = value;
        }
    }

    PairwiseMatrix { raters, values }
}
