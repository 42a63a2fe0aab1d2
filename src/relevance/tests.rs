use super::normalize::{normalize_name, normalize_text};
use super::score::{RelevanceAccumulator, SourceField, score_item};
use super::*;
use serde_json::json;

fn term_map() -> serde_json::Value {
    json!({
        "components": {
            "blood_pressure": {
                "name": "Blood pressure",
                "key_terms_pt": ["pressao arterial", "sistolica"],
                "measurement_fields": ["pa"]
            },
            "diet": {
                "proxy_terms": ["alimentacao"],
                "notes": ["pressao"]
            }
        }
    })
}

fn index() -> TermIndex {
    TermIndex::from_map(&term_map()).expect("term map should parse")
}

#[test]
fn normalize_text_folds_accents_and_drops_symbols() {
    assert_eq!(normalize_text("Pressão Arterial!"), "pressaoarterial");
    assert_eq!(normalize_text("Sistólica_2"), "sistolica_2");
    assert_eq!(normalize_text("ÇÃO-ñ"), "caon");
    assert_eq!(normalize_text(""), "");
}

#[test]
fn normalize_name_strips_one_prefix_and_tokenizes() {
    assert_eq!(
        normalize_name("TB_Pressao_Arterial"),
        ("pressao arterial".to_string(), vec!["pressao".to_string(), "arterial".to_string()])
    );
    assert_eq!(normalize_name("tb_co_valor").1, vec!["co", "valor"]);
    assert_eq!(normalize_name("__nu_x__").1, vec!["nu", "x"]);
    assert_eq!(normalize_name(""), (String::new(), Vec::new()));
}

#[test]
fn term_index_splits_terms_and_ignores_unweighted_categories() {
    let index = index();

    assert_eq!(index.components(), ["blood_pressure".to_string(), "diet".to_string()]);
    let pressao = index.lookup("pressao").expect("indexed");
    assert_eq!(pressao.get("blood_pressure"), Some(&1));
    assert!(pressao.get("diet").is_none(), "`notes` is not a scored category");
    assert!(index.lookup("blood").is_none(), "`name` is not a term list");
}

#[test]
fn term_map_without_components_is_rejected() {
    assert!(TermIndex::from_map(&json!({ "terms": [] })).is_err());
}

#[test]
fn score_item_threads_accumulator_through_every_source() {
    let index = index();
    let tables = parse_metadata(
        &json!([{
            "table_name": "tb_pressao_arterial",
            "columns": [
                {
                    "name": "nu_pa_sistolica",
                    "stats": { "sample_values": ["Alimentação", "alimentacao", null, 120] }
                }
            ]
        }])
        .to_string(),
    )
    .expect("metadata should parse");

    let accumulator = score_item(&index, &tables[0], RelevanceAccumulator::for_index(&index));

    // table: pressao, arterial; column: pa, sistolica; samples: alimentacao once
    assert_eq!(accumulator.raw_score, 5);
    assert_eq!(accumulator.component_scores["blood_pressure"], 4);
    assert_eq!(accumulator.component_scores["diet"], 1);

    let diet = &accumulator.occurrences["diet"];
    assert_eq!(diet.len(), 1);
    assert_eq!(diet[0].source_field, SourceField::SampleValues);
    assert_eq!(diet[0].source_name, "nu_pa_sistolica");
}

#[test]
fn precomputed_tokens_take_precedence() {
    let index = index();
    let tables = parse_metadata(
        &json!([{
            "table_name": "tb_unrelated",
            "table_name_tokens": ["sistolica"],
            "columns": [{ "column_name": "x", "column_name_tokens": ["pa"] }]
        }])
        .to_string(),
    )
    .expect("metadata should parse");

    let accumulator = score_item(&index, &tables[0], RelevanceAccumulator::default());
    assert_eq!(accumulator.raw_score, 2);
    assert_eq!(accumulator.occurrences["blood_pressure"][1].source_name, "x");
}

#[test]
fn score_metadata_normalizes_onto_percent_scale() {
    let index = index();
    let tables = parse_metadata(
        &json!([
            { "table_name": "tb_pressao_arterial" },
            { "table_name": "tb_pressao" },
            { "table_name": "tb_endereco" }
        ])
        .to_string(),
    )
    .expect("metadata should parse");

    let results = score_metadata(&index, &tables);
    let scores = results
        .iter()
        .map(|result| (result.raw_score, result.normalized_score))
        .collect::<Vec<_>>();
    assert_eq!(scores, vec![(2, 100.0), (1, 50.0), (0, 0.0)]);
    assert_eq!(results[2].component_scores["diet"], 0);
}

#[test]
fn equal_raw_scores_normalize_to_zero() {
    let index = index();
    let tables = parse_metadata(&json!([{ "table_name": "a" }, { "table_name": "b" }]).to_string())
        .expect("metadata should parse");

    let results = score_metadata(&index, &tables);
    assert!(results.iter().all(|result| result.normalized_score == 0.0));
    assert!(score_metadata(&index, &[]).is_empty());
}
