//! Kneedle knee/elbow detection on a ranked score distribution.
//!
//! The input is sorted ascending and read as a curve `y(x)` with `x` the rank
//! index. Both axes are normalized to `[0, 1]` and `y` is oriented so the knee
//! for the requested polarity is a maximum of the difference curve
//! `y_norm - x_norm`, i.e. the (√2-scaled) signed distance to the chord
//! joining the first and last points. Only interior points are candidates.

use ndarray::{Array1, Array2, s};
use serde::Serialize;

pub const DEFAULT_SENSITIVITY: f64 = 1.0;
pub const DEFAULT_POLYNOMIAL_DEGREE: usize = 7;
pub const MIN_POINTS: usize = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Concave,
    Convex,
}

impl Curve {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concave => "concave",
            Self::Convex => "convex",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        }
    }
}

/// Attempt order used by [`find_threshold`]; the first polarity that yields
/// a knee wins.
pub const FALLBACK_ORDER: [(Curve, Direction); 4] = [
    (Curve::Concave, Direction::Increasing),
    (Curve::Convex, Direction::Increasing),
    (Curve::Concave, Direction::Decreasing),
    (Curve::Convex, Direction::Decreasing),
];

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Smoothing {
    None,
    /// Least-squares polynomial fit of the sorted values before detection.
    Polynomial { degree: usize },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KneeParams {
    /// How far (in mean x-steps) the difference curve must fall below a local
    /// maximum before that maximum is accepted.
    pub sensitivity: f64,
    pub smoothing: Smoothing,
}

impl Default for KneeParams {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            smoothing: Smoothing::None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Knee {
    /// Position in the ascending-sorted input.
    pub index: usize,
    /// Original (unsmoothed) value at `index`.
    pub value: f64,
    pub curve: Curve,
    pub direction: Direction,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThresholdOutcome {
    Found {
        value: f64,
        index: usize,
        curve: Curve,
        direction: Direction,
    },
    NotFound,
}

impl From<Option<Knee>> for ThresholdOutcome {
    fn from(knee: Option<Knee>) -> Self {
        match knee {
            Some(knee) => Self::Found {
                value: knee.value,
                index: knee.index,
                curve: knee.curve,
                direction: knee.direction,
            },
            None => Self::NotFound,
        }
    }
}

/// Tries every polarity in [`FALLBACK_ORDER`] and reports the first knee.
pub fn find_threshold(values: &[f64], params: &KneeParams) -> ThresholdOutcome {
    FALLBACK_ORDER
        .iter()
        .find_map(|&(curve, direction)| find_knee(values, curve, direction, params))
        .into()
}

/// Non-finite values are ignored. Returns `None` for fewer than
/// [`MIN_POINTS`] values, a flat sequence, or when no interior maximum
/// satisfies the sensitivity criterion.
pub fn find_knee(
    values: &[f64],
    curve: Curve,
    direction: Direction,
    params: &KneeParams,
) -> Option<Knee> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<f64>>();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n < MIN_POINTS {
        return None;
    }

    let fitted = match params.smoothing {
        Smoothing::None => sorted.clone(),
        Smoothing::Polynomial { degree } => polynomial_fit(&sorted, degree)?,
    };

    let x_norm = (0..n)
        .map(|index| index as f64 / (n - 1) as f64)
        .collect::<Vec<f64>>();
    let mut y_norm = normalize(&fitted)?;
    orient(&mut y_norm, curve, direction);

    let difference = y_norm
        .iter()
        .zip(&x_norm)
        .map(|(y, x)| y - x)
        .collect::<Vec<f64>>();

    let is_max = |i: usize| difference[i] >= difference[i - 1] && difference[i] >= difference[i + 1];
    let is_min = |i: usize| difference[i] <= difference[i - 1] && difference[i] <= difference[i + 1];

    let first_max = (1..n - 1).find(|&i| is_max(i))?;
    let mean_step = x_norm.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum::<f64>()
        / (n - 1) as f64;

    let mut threshold = f64::NEG_INFINITY;
    let mut threshold_index = first_max;
    for i in first_max..n - 1 {
        if is_max(i) {
            threshold = difference[i] - params.sensitivity * mean_step;
            threshold_index = i;
        }
        if is_min(i) {
            threshold = 0.0;
        }
        if difference[i + 1] < threshold {
            let index = unorient_index(threshold_index, n, curve, direction);
            return Some(Knee {
                index,
                value: sorted[index],
                curve,
                direction,
            });
        }
    }

    None
}

fn normalize(values: &[f64]) -> Option<Vec<f64>> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return None;
    }
    Some(values.iter().map(|value| (value - min) / range).collect())
}

/// Turns every polarity into the concave/increasing case.
fn orient(y_norm: &mut [f64], curve: Curve, direction: Direction) {
    let max = y_norm.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match (curve, direction) {
        (Curve::Concave, Direction::Increasing) => {}
        (Curve::Concave, Direction::Decreasing) => y_norm.reverse(),
        (Curve::Convex, Direction::Decreasing) => {
            y_norm.iter_mut().for_each(|y| *y = max - *y);
        }
        (Curve::Convex, Direction::Increasing) => {
            y_norm.iter_mut().for_each(|y| *y = max - *y);
            y_norm.reverse();
        }
    }
}

fn unorient_index(index: usize, n: usize, curve: Curve, direction: Direction) -> usize {
    match (curve, direction) {
        (Curve::Concave, Direction::Increasing) | (Curve::Convex, Direction::Decreasing) => index,
        (Curve::Concave, Direction::Decreasing) | (Curve::Convex, Direction::Increasing) => {
            n - 1 - index
        }
    }
}

/// Fitted values of a least-squares polynomial over the rank index. The index
/// is mapped onto `[-1, 1]` and the system solved by Householder QR; the
/// degree is capped at `n - 1`.
fn polynomial_fit(y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let cols = degree.min(n - 1) + 1;
    let span = (n - 1) as f64;

    let vandermonde = Array2::from_shape_fn((n, cols), |(row, col)| {
        (2.0 * row as f64 / span - 1.0).powi(col as i32)
    });
    let mut r = vandermonde.clone();
    let mut qtb = Array1::from(y.to_vec());

    for j in 0..cols {
        let column = r.slice(s![j.., j]).to_owned();
        let norm = column.dot(&column).sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if column[0] > 0.0 { -norm } else { norm };
        let mut v = column;
        v[0] -= alpha;
        let v_norm_sq = v.dot(&v);
        if v_norm_sq == 0.0 {
            continue;
        }

        for col in j..cols {
            let projection = 2.0 * v.dot(&r.slice(s![j.., col])) / v_norm_sq;
            r.slice_mut(s![j.., col]).scaled_add(-projection, &v);
        }
        let projection = 2.0 * v.dot(&qtb.slice(s![j..])) / v_norm_sq;
        qtb.slice_mut(s![j..]).scaled_add(-projection, &v);
    }

    let mut coefficients = vec![0.0; cols];
    for row in (0..cols).rev() {
        let diagonal = r[[row, row]];
        if diagonal.abs() <= f64::EPSILON {
            return None;
        }
        let tail = (row + 1..cols)
            .map(|col| r[[row, col]] * coefficients[col])
            .sum::<f64>();
        coefficients[row] = (qtb[row] - tail) / diagonal;
    }

    Some(vandermonde.dot(&Array1::from(coefficients)).to_vec())
}

#[cfg(test)]
mod tests;
