use ndarray::{Array2, Axis};

use super::anova::ratio;
use crate::scores::mean;

/// 1-based ranks; tied values share the average of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<usize>>();
    order.sort_by(|&left, &right| values[left].total_cmp(&values[right]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let shared = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = shared;
        }
        start = end + 1;
    }
    ranks
}

fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mu_x, mu_y) = (mean(x)?, mean(y)?);
    let sum = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mu_x) * (b - mu_y))
        .sum::<f64>();
    Some(sum / (x.len() - 1) as f64)
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let covariance = sample_covariance(x, y)?;
    let var_x = sample_covariance(x, x)?;
    let var_y = sample_covariance(y, y)?;
    ratio(covariance, (var_x * var_y).sqrt())
}

pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Lin's concordance correlation coefficient with sample (n - 1) moments.
pub fn lin_ccc(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || y.is_empty() {
        return None;
    }
    let covariance = sample_covariance(x, y)?;
    let var_x = sample_covariance(x, x)?;
    let var_y = sample_covariance(y, y)?;
    let bias = mean(x)? - mean(y)?;
    ratio(2.0 * covariance, var_x + var_y + bias * bias)
}

/// Kendall's coefficient of concordance over the columns (raters) of an
/// items x raters matrix. No tie correction.
pub fn kendalls_w(matrix: &Array2<f64>) -> Option<f64> {
    let (n, k) = matrix.dim();
    if n < 2 || k < 2 {
        return None;
    }

    let mut rank_sums = vec![0.0; n];
    for column in matrix.axis_iter(Axis(1)) {
        let ranks = average_ranks(&column.to_vec());
        for (sum, rank) in rank_sums.iter_mut().zip(ranks) {
            *sum += rank;
        }
    }

    let mean_rank_sum = mean(&rank_sums)?;
    let s = rank_sums
        .iter()
        .map(|sum| (sum - mean_rank_sum).powi(2))
        .sum::<f64>();
    let (n, k) = (n as f64, k as f64);
    ratio(12.0 * s, k * k * (n.powi(3) - n))
}
