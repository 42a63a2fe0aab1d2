//! Inter-rater agreement statistics over a consolidated [`ScoreTable`].
//!
//! Every statistic that can be numerically undefined (too few items or
//! raters, a zero denominator) is reported as `None`; siblings are computed
//! independently so one degenerate value never hides the others.

use serde::Serialize;

use crate::scores::{ScoreTable, mean, sample_std_dev};

mod anova;
mod correlation;
mod labels;
mod pairwise;

use self::anova::{anova_components, icc_all};
use self::correlation::kendalls_w;
use self::pairwise::{PairwiseMetric, pairwise_matrix};

pub use self::anova::{AnovaComponents, IccSet};
pub use self::labels::{UNDEFINED_LABEL, ccc_label, icc_label};
pub use self::pairwise::PairwiseMatrix;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementSummary {
    pub item_count: usize,
    pub raters: Vec<String>,
    pub overall_mean: Option<f64>,
    pub overall_std: Option<f64>,
    pub anova: AnovaComponents,
    pub icc: IccSet,
    pub spearman: PairwiseMatrix,
    pub ccc: PairwiseMatrix,
    pub mean_spearman: Option<f64>,
    pub mean_ccc: Option<f64>,
    pub kendalls_w: Option<f64>,
}

pub fn compute_agreement(table: &ScoreTable) -> AgreementSummary {
    let matrix = table.matrix();
    let anova = anova_components(&matrix);
    let icc = icc_all(&anova);
    let spearman = pairwise_matrix(table, PairwiseMetric::Spearman);
    let ccc = pairwise_matrix(table, PairwiseMetric::Ccc);
    let item_means = table.mean_column();

    AgreementSummary {
        item_count: table.item_count(),
        raters: table.raters().to_vec(),
        overall_mean: mean(&item_means),
        overall_std: sample_std_dev(&item_means),
        anova,
        icc,
        mean_spearman: spearman.upper_mean(),
        mean_ccc: ccc.upper_mean(),
        spearman,
        ccc,
        kendalls_w: kendalls_w(&matrix),
    }
}
