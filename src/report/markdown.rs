use std::fmt::Write;

use crate::agreement::{AgreementSummary, UNDEFINED_LABEL, ccc_label, icc_label};
use crate::scores::{ItemScores, ScoreTable};
use crate::util::round_opt;

use super::charts::ChartFile;
use super::json::SUMMARY_DECIMALS;

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_DETAIL_N: usize = 3;

pub fn render_markdown(
    table: &ScoreTable,
    summary: &AgreementSummary,
    charts: &[ChartFile],
    generated_at: &str,
    top_n: usize,
    detail_n: usize,
) -> String {
    let raters = table.raters();
    let mut output = String::new();

    output.push_str("# Inter-rater agreement report (continuous scores)\n\n");
    let _ = writeln!(output, "**Generated:** {generated_at}  ");
    let _ = writeln!(
        output,
        "**Raters:** {}  ",
        raters
            .iter()
            .map(|rater| rater.to_uppercase())
            .collect::<Vec<String>>()
            .join(", ")
    );
    let _ = writeln!(output, "**Consolidated items:** {}\n", table.item_count());
    output.push_str("---\n\n");

    write_global_metrics(&mut output, summary);

    let ranked = table.most_disagreement(top_n);
    let _ = writeln!(
        output,
        "## 2. Highest-disagreement items (top {top_n} by standard deviation)\n"
    );
    let score_headers = raters
        .iter()
        .map(|rater| format!("Score {}", rater.to_uppercase()))
        .collect::<Vec<String>>();
    let _ = writeln!(
        output,
        "| Item | Group | Mean score | Std dev | {} |",
        score_headers.join(" | ")
    );
    let _ = writeln!(
        output,
        "|------|-------|------------|---------|{}|",
        vec!["---"; raters.len()].join("|")
    );
    if ranked.is_empty() {
        let _ = writeln!(
            output,
            "| - | No items found. | - | - | {} |",
            vec!["-"; raters.len()].join(" | ")
        );
    }
    for item in &ranked {
        let _ = writeln!(
            output,
            "| `{}` | {} | {:.2} | {:.2} | {} |",
            item.item_id,
            item.group_key.as_deref().unwrap_or("-"),
            item.mean,
            item.std_dev,
            raters
                .iter()
                .map(|rater| format_score(item, rater))
                .collect::<Vec<String>>()
                .join(" | ")
        );
    }
    output.push_str("\n---\n\n");

    let _ = writeln!(
        output,
        "## 3. Justifications (top {detail_n} by standard deviation)\n"
    );
    for item in ranked.iter().take(detail_n) {
        write_item_detail(&mut output, raters, item);
    }

    if !charts.is_empty() {
        output.push_str("## 4. Charts\n\n");
        for (position, chart) in charts.iter().enumerate() {
            let _ = writeln!(output, "### 4.{}. {}", position + 1, chart.title);
            let _ = writeln!(output, "![{}]({})\n", chart.title, chart.path.display());
        }
    }

    output
}

fn write_global_metrics(output: &mut String, summary: &AgreementSummary) {
    let icc = &summary.icc;
    let rows = [
        ("Overall mean score", summary.overall_mean, "-"),
        ("Std dev of item means", summary.overall_std, "-"),
        ("ICC(2,1)", icc.icc2_1, icc_label(icc.icc2_1)),
        ("ICC(2,k)", icc.icc2_k, icc_label(icc.icc2_k)),
        ("ICC(3,1)", icc.icc3_1, icc_label(icc.icc3_1)),
        ("ICC(3,k)", icc.icc3_k, icc_label(icc.icc3_k)),
        ("Mean Spearman (pairs)", summary.mean_spearman, "-"),
        ("Mean CCC (pairs)", summary.mean_ccc, ccc_label(summary.mean_ccc)),
        ("Kendall's W", summary.kendalls_w, "-"),
    ];

    output.push_str("## 1. Global metrics\n\n");
    output.push_str("| Metric | Value | Reading |\n");
    output.push_str("|--------|-------|---------|\n");
    for (name, value, reading) in rows {
        let _ = writeln!(
            output,
            "| **{name}** | {} | {reading} |",
            format_metric(value)
        );
    }
    output.push('\n');
    output.push_str(
        "> **Scale notes**: ICC (Koo & Li, 2016): <0.50 weak; 0.50-0.75 moderate; \
         0.75-0.90 good; >0.90 excellent.  \n",
    );
    output.push_str(
        "> CCC (McBride, 2005): <0.90 poor; 0.90-0.95 moderate; 0.95-0.99 substantial; \
         >0.99 almost perfect.\n\n",
    );
    output.push_str("---\n\n");
}

fn write_item_detail(output: &mut String, raters: &[String], item: &ItemScores) {
    let _ = writeln!(output, "### Item: `{}`\n", item.item_id);
    for rater in raters {
        let text = item
            .justifications
            .get(rater)
            .cloned()
            .flatten()
            .unwrap_or_else(|| "N/A".to_string())
            .replace('\n', " ");
        let _ = writeln!(
            output,
            "**{} (score: {}):**",
            rater.to_uppercase(),
            format_score(item, rater)
        );
        let _ = writeln!(output, "> {text}\n");
    }
    output.push_str("---\n\n");
}

fn format_metric(value: Option<f64>) -> String {
    round_opt(value, SUMMARY_DECIMALS)
        .map_or_else(|| UNDEFINED_LABEL.to_string(), |value| value.to_string())
}

fn format_score(item: &ItemScores, rater: &str) -> String {
    item.scores
        .get(rater)
        .map_or_else(|| "-".to_string(), |score| score.to_string())
}
