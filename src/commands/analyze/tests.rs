use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use super::*;
use crate::cli::DEFAULT_SOURCE_PATTERN;

fn args_for(dir: &Path) -> AnalyzeArgs {
    AnalyzeArgs {
        sources: Vec::new(),
        results_dir: dir.join("LLMS_results"),
        pattern: DEFAULT_SOURCE_PATTERN.to_string(),
        json_output: dir.join("out").join("report.json"),
        markdown_output: dir.join("out").join("report.md"),
        chart_dir: dir.join("out").join("charts"),
        no_charts: false,
        top_n: 10,
        detail_n: 3,
    }
}

fn write_rater(dir: &Path, rater: &str, scores: &[(&str, f64)]) {
    let classifications = scores
        .iter()
        .map(|(table, score)| {
            json!({
                "table_name": table,
                "schema": "public",
                "score_relevancia": score,
                "justificativa": format!("{rater} reads {table}"),
                "colunas_contribuintes": []
            })
        })
        .collect::<Vec<Value>>();
    fs::create_dir_all(dir).expect("results dir");
    fs::write(
        dir.join(format!("classification_results_{rater}.json")),
        serde_json::to_vec(&json!({ "classifications": classifications })).expect("serialize"),
    )
    .expect("write rater file");
}

#[test]
fn analyze_writes_reports_for_discovered_raters() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = args_for(dir.path());
    write_rater(
        &args.results_dir,
        "openai",
        &[("tb_a", 10.0), ("tb_b", 50.0), ("tb_c", 90.0), ("tb_only_openai", 5.0)],
    );
    write_rater(
        &args.results_dir,
        "gemini",
        &[("tb_a", 15.0), ("tb_b", 55.0), ("tb_c", 85.0)],
    );

    run(args.clone()).expect("analyze should succeed");

    let report: Value =
        serde_json::from_slice(&fs::read(&args.json_output).expect("json report")).expect("parse");
    assert_eq!(report["metadata"]["item_count"], 3);
    assert_eq!(report["metadata"]["raters"], json!(["gemini", "openai"]));
    assert_eq!(
        report["metadata"]["sources"].as_array().map(Vec::len),
        Some(2)
    );
    assert_eq!(report["table_analysis"][0]["table_name"], "tb_a");
    assert_eq!(report["table_analysis"][0]["score_mean"], 12.5);

    let markdown = fs::read_to_string(&args.markdown_output).expect("markdown report");
    assert!(markdown.contains("**Consolidated items:** 3"));
    assert!(markdown.contains("## 4. Charts"));
    assert!(args.chart_dir.join("heatmap_ccc.svg").is_file());
}

#[test]
fn analyze_skips_charts_when_disabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = args_for(dir.path());
    args.no_charts = true;
    write_rater(&args.results_dir, "a", &[("x", 1.0), ("y", 2.0)]);
    write_rater(&args.results_dir, "b", &[("x", 3.0), ("y", 1.0)]);

    run(args.clone()).expect("analyze should succeed");

    assert!(!args.chart_dir.exists());
    let markdown = fs::read_to_string(&args.markdown_output).expect("markdown report");
    assert!(!markdown.contains("## 4. Charts"));
}

#[test]
fn analyze_accepts_explicit_named_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = args_for(dir.path());
    let runs = dir.path().join("runs");
    write_rater(&runs, "first", &[("x", 10.0), ("y", 20.0)]);
    write_rater(&runs, "second", &[("x", 30.0), ("y", 25.0)]);
    args.sources = vec![
        format!("alpha={}", runs.join("classification_results_first.json").display()),
        format!("beta={}", runs.join("classification_results_second.json").display()),
    ];
    args.no_charts = true;

    run(args.clone()).expect("analyze should succeed");

    let report: Value =
        serde_json::from_slice(&fs::read(&args.json_output).expect("json report")).expect("parse");
    assert_eq!(report["metadata"]["raters"], json!(["alpha", "beta"]));
    assert_eq!(report["table_analysis"][1]["score_beta"], 25.0);
}

#[test]
fn analyze_fails_without_rater_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = args_for(dir.path());

    assert!(run(args.clone()).is_err(), "missing results dir");

    fs::create_dir_all(&args.results_dir).expect("results dir");
    fs::write(args.results_dir.join("notes.txt"), "unrelated").expect("write");
    assert!(run(args.clone()).is_err(), "no matching files");
    assert!(!args.json_output.exists());
}

#[test]
fn analyze_fails_when_only_one_source_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = args_for(dir.path());
    write_rater(&args.results_dir, "good", &[("x", 1.0), ("y", 2.0)]);
    fs::write(
        args.results_dir.join("classification_results_broken.json"),
        "{ not json",
    )
    .expect("write");

    let err = run(args.clone()).expect_err("one rater is not enough");
    assert!(err.to_string().contains("at least 2"));
    assert!(!args.json_output.exists());
}

#[test]
fn analyze_fails_when_raters_share_no_items() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = args_for(dir.path());
    write_rater(&args.results_dir, "a", &[("x", 1.0)]);
    write_rater(&args.results_dir, "b", &[("y", 2.0)]);

    let err = run(args.clone()).expect_err("empty join");
    assert_eq!(
        err.downcast_ref::<crate::consolidate::ConsolidateError>(),
        Some(&crate::consolidate::ConsolidateError::NoCommonItems)
    );
}
