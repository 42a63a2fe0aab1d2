use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::agreement::{AgreementSummary, PairwiseMatrix, ccc_label, icc_label};
use crate::model::SourceDigest;
use crate::scores::{ItemScores, ScoreTable};
use crate::util::{round_opt, round_to};

pub const SUMMARY_DECIMALS: i32 = 4;
pub const ITEM_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct AgreementReport {
    pub metadata: ReportMetadata,
    pub summary_metrics: SummaryMetrics,
    pub pairwise: PairwiseSection,
    pub table_analysis: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub raters: Vec<String>,
    pub item_count: usize,
    pub sources: Vec<SourceDigest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub overall_mean: Option<f64>,
    pub overall_std: Option<f64>,
    pub icc2_1: Option<f64>,
    pub icc2_1_label: &'static str,
    pub icc2_k: Option<f64>,
    pub icc2_k_label: &'static str,
    pub icc3_1: Option<f64>,
    pub icc3_1_label: &'static str,
    pub icc3_k: Option<f64>,
    pub icc3_k_label: &'static str,
    pub mean_spearman: Option<f64>,
    pub mean_ccc: Option<f64>,
    pub mean_ccc_label: &'static str,
    pub kendalls_w: Option<f64>,
    pub msr: Option<f64>,
    pub msc: Option<f64>,
    pub mse: Option<f64>,
}

impl SummaryMetrics {
    /// Labels are taken from the unrounded values.
    pub fn from_summary(summary: &AgreementSummary) -> Self {
        let round = |value: Option<f64>| round_opt(value, SUMMARY_DECIMALS);
        let icc = &summary.icc;

        Self {
            overall_mean: round(summary.overall_mean),
            overall_std: round(summary.overall_std),
            icc2_1: round(icc.icc2_1),
            icc2_1_label: icc_label(icc.icc2_1),
            icc2_k: round(icc.icc2_k),
            icc2_k_label: icc_label(icc.icc2_k),
            icc3_1: round(icc.icc3_1),
            icc3_1_label: icc_label(icc.icc3_1),
            icc3_k: round(icc.icc3_k),
            icc3_k_label: icc_label(icc.icc3_k),
            mean_spearman: round(summary.mean_spearman),
            mean_ccc: round(summary.mean_ccc),
            mean_ccc_label: ccc_label(summary.mean_ccc),
            kendalls_w: round(summary.kendalls_w),
            msr: round(summary.anova.msr),
            msc: round(summary.anova.msc),
            mse: round(summary.anova.mse),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PairwiseSection {
    pub spearman: PairwiseMatrix,
    pub ccc: PairwiseMatrix,
}

pub fn build_json_report(
    table: &ScoreTable,
    summary: &AgreementSummary,
    sources: &[SourceDigest],
    generated_at: &str,
) -> AgreementReport {
    AgreementReport {
        metadata: ReportMetadata {
            generated_at: generated_at.to_string(),
            raters: table.raters().to_vec(),
            item_count: table.item_count(),
            sources: sources.to_vec(),
        },
        summary_metrics: SummaryMetrics::from_summary(summary),
        pairwise: PairwiseSection {
            spearman: summary.spearman.rounded(SUMMARY_DECIMALS),
            ccc: summary.ccc.rounded(SUMMARY_DECIMALS),
        },
        table_analysis: table
            .items()
            .iter()
            .map(|item| table_record(table.raters(), item))
            .collect(),
    }
}

/// Flat per-item record with keys `table_name`, `schema`, the cross-rater
/// `score_mean` and `score_std`, and `score_<rater>`, `justification_<rater>`,
/// `columns_<rater>` for each rater. Keys are written in sorted order.
fn table_record(raters: &[String], item: &ItemScores) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("table_name".to_string(), json!(item.item_id));
    record.insert("schema".to_string(), json!(item.group_key));

    for rater in raters {
        record.insert(format!("score_{rater}"), json!(item.scores.get(rater)));
        record.insert(
            format!("justification_{rater}"),
            json!(item.justifications.get(rater).cloned().flatten()),
        );
        record.insert(
            format!("columns_{rater}"),
            json!(item.contributing_columns.get(rater).cloned().unwrap_or_default()),
        );
    }

    record.insert(
        "score_mean".to_string(),
        json!(round_to(item.mean, ITEM_DECIMALS)),
    );
    record.insert(
        "score_std".to_string(),
        json!(round_to(item.std_dev, ITEM_DECIMALS)),
    );
    record
}
