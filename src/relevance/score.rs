use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::{normalize_name, normalize_text};
use crate::util::round_to;

/// Term categories that contribute to the score and their weights.
pub const CATEGORY_WEIGHTS: [(&str, u32); 5] = [
    ("key_terms_pt", 1),
    ("proxy_terms", 1),
    ("measurement_fields", 1),
    ("treatment_indicators", 1),
    ("lab_tests_or_codes", 1),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableMetadata {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub table_name_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnMetadata {
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub column_name_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub stats: ColumnStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnStats {
    #[serde(default)]
    pub sample_values: Vec<Value>,
}

impl TableMetadata {
    fn name_tokens(&self) -> Vec<String> {
        self.table_name_tokens
            .clone()
            .unwrap_or_else(|| normalize_name(&self.table_name).1)
    }
}

impl ColumnMetadata {
    pub fn display_name(&self) -> &str {
        self.column_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("N/A")
    }

    fn name_tokens(&self) -> Vec<String> {
        self.column_name_tokens
            .clone()
            .unwrap_or_else(|| normalize_name(self.display_name()).1)
    }

    /// Normalized sample values, de-duplicated.
    fn sample_tokens(&self) -> BTreeSet<String> {
        self.stats
            .sample_values
            .iter()
            .filter_map(|value| match value {
                Value::Null => None,
                Value::String(text) => Some(normalize_text(text)),
                other => Some(normalize_text(&other.to_string())),
            })
            .filter(|token| !token.is_empty())
            .collect()
    }
}

/// `token -> component -> weight`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermIndex {
    components: Vec<String>,
    weights: BTreeMap<String, BTreeMap<String, u32>>,
}

impl TermIndex {
    /// Reads `{ "components": { id: { category: [terms] } } }`. Multi-word
    /// terms contribute each word; a token keeps its highest weight per
    /// component.
    pub fn from_map(map: &Value) -> Result<Self> {
        let Some(components) = map.get("components").and_then(Value::as_object) else {
            bail!("term map has no `components` object");
        };

        let mut index = Self::default();
        for (component, categories) in components {
            index.components.push(component.clone());
            for (category, weight) in CATEGORY_WEIGHTS {
                let Some(terms) = categories.get(category).and_then(Value::as_array) else {
                    continue;
                };
                for term in terms.iter().filter_map(Value::as_str) {
                    for token in term.split_whitespace().map(normalize_text) {
                        if token.is_empty() {
                            continue;
                        }
                        let slot = index
                            .weights
                            .entry(token)
                            .or_default()
                            .entry(component.clone())
                            .or_insert(0);
                        *slot = (*slot).max(weight);
                    }
                }
            }
        }

        Ok(index)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn lookup(&self, token: &str) -> Option<&BTreeMap<String, u32>> {
        self.weights.get(token)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceField {
    TableName,
    ColumnName,
    SampleValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub source_field: SourceField,
    pub source_name: String,
    pub token: String,
    pub weight: u32,
}

/// Running totals for one table, threaded through every scoring step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceAccumulator {
    pub raw_score: u32,
    pub component_scores: BTreeMap<String, u32>,
    pub occurrences: BTreeMap<String, Vec<Occurrence>>,
}

impl RelevanceAccumulator {
    pub fn for_index(index: &TermIndex) -> Self {
        Self {
            raw_score: 0,
            component_scores: index
                .components()
                .iter()
                .map(|component| (component.clone(), 0))
                .collect(),
            occurrences: index
                .components()
                .iter()
                .map(|component| (component.clone(), Vec::new()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRelevance {
    pub table_name: String,
    pub raw_score: u32,
    pub normalized_score: f64,
    pub component_scores: BTreeMap<String, u32>,
    pub occurrences: BTreeMap<String, Vec<Occurrence>>,
}

pub fn score_item(
    index: &TermIndex,
    table: &TableMetadata,
    accumulator: RelevanceAccumulator,
) -> RelevanceAccumulator {
    let mut accumulator = absorb_tokens(
        index,
        table.name_tokens(),
        SourceField::TableName,
        &table.table_name,
        accumulator,
    );

    for column in &table.columns {
        let name = column.display_name();
        accumulator = absorb_tokens(
            index,
            column.name_tokens(),
            SourceField::ColumnName,
            name,
            accumulator,
        );
        accumulator = absorb_tokens(
            index,
            column.sample_tokens(),
            SourceField::SampleValues,
            name,
            accumulator,
        );
    }

    accumulator
}

fn absorb_tokens(
    index: &TermIndex,
    tokens: impl IntoIterator<Item = String>,
    source_field: SourceField,
    source_name: &str,
    mut accumulator: RelevanceAccumulator,
) -> RelevanceAccumulator {
    for token in tokens {
        let Some(components) = index.lookup(&token) else {
            continue;
        };
        for (component, &weight) in components {
            *accumulator
                .component_scores
                .entry(component.clone())
                .or_insert(0) += weight;
            accumulator.raw_score += weight;
            accumulator
                .occurrences
                .entry(component.clone())
                .or_default()
                .push(Occurrence {
                    source_field,
                    source_name: source_name.to_string(),
                    token: token.clone(),
                    weight,
                });
        }
    }
    accumulator
}

/// Scores every table and min-max normalizes raw scores onto 0..100. When all
/// raw scores are equal every table gets 0.
pub fn score_metadata(index: &TermIndex, tables: &[TableMetadata]) -> Vec<TableRelevance> {
    let scored = tables
        .iter()
        .map(|table| {
            (
                table,
                score_item(index, table, RelevanceAccumulator::for_index(index)),
            )
        })
        .collect::<Vec<_>>();

    let min = scored.iter().map(|(_, acc)| acc.raw_score).min().unwrap_or(0);
    let max = scored.iter().map(|(_, acc)| acc.raw_score).max().unwrap_or(0);
    let range = f64::from(max - min);

    scored
        .into_iter()
        .map(|(table, accumulator)| {
            let normalized_score = if range == 0.0 {
                0.0
            } else {
                round_to(f64::from(accumulator.raw_score - min) / range * 100.0, 2)
            };
            TableRelevance {
                table_name: table.table_name.clone(),
                raw_score: accumulator.raw_score,
                normalized_score,
                component_scores: accumulator.component_scores,
                occurrences: accumulator.occurrences,
            }
        })
        .collect()
}

pub fn parse_metadata(raw: &str) -> Result<Vec<TableMetadata>> {
    serde_json::from_str(raw).context("metadata must be a JSON array of tables")
}
