use ndarray::{Array2, Axis};
use serde::Serialize;

/// Two-way ANOVA decomposition of an N x k score matrix (items x raters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnovaComponents {
    pub n: usize,
    pub k: usize,
    pub grand_mean: Option<f64>,
    pub msr: Option<f64>,
    pub msc: Option<f64>,
    pub mse: Option<f64>,
}

pub fn anova_components(matrix: &Array2<f64>) -> AnovaComponents {
    let (n, k) = matrix.dim();
    let (Some(grand_mean), Some(row_means), Some(col_means)) = (
        matrix.mean(),
        matrix.mean_axis(Axis(1)),
        matrix.mean_axis(Axis(0)),
    ) else {
        return AnovaComponents {
            n,
            k,
            ..AnovaComponents::default()
        };
    };

    let ss_total = matrix.mapv(|value| (value - grand_mean).powi(2)).sum();
    let ss_row = k as f64 * row_means.mapv(|mean| (mean - grand_mean).powi(2)).sum();
    let ss_col = n as f64 * col_means.mapv(|mean| (mean - grand_mean).powi(2)).sum();
    let ss_error = ss_total - ss_row - ss_col;

    AnovaComponents {
        n,
        k,
        grand_mean: Some(grand_mean),
        msr: (n > 1).then(|| ss_row / (n - 1) as f64),
        msc: (k > 1).then(|| ss_col / (k - 1) as f64),
        mse: (n > 1 && k > 1).then(|| ss_error / ((n - 1) * (k - 1)) as f64),
    }
}

/// Shrout & Fleiss ICC forms. `icc2_*` are two-way random absolute
/// agreement, `icc3_*` two-way mixed consistency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IccSet {
    pub icc2_1: Option<f64>,
    pub icc2_k: Option<f64>,
    pub icc3_1: Option<f64>,
    pub icc3_k: Option<f64>,
}

pub fn icc_all(components: &AnovaComponents) -> IccSet {
    let (Some(msr), Some(msc), Some(mse)) = (components.msr, components.msc, components.mse)
    else {
        return IccSet::default();
    };
    let n = components.n as f64;
    let k = components.k as f64;

    IccSet {
        icc2_1: ratio(msr - mse, msr + (k - 1.0) * mse + k * (msc - mse) / n),
        icc2_k: ratio(msr - mse, msr + (msc - mse) / n),
        icc3_1: ratio(msr - mse, msr + (k - 1.0) * mse),
        icc3_k: ratio(msr - mse, msr),
    }
}

/// Zero or non-finite outcomes are undefined rather than infinite.
pub(super) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}
