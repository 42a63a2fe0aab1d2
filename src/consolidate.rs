use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{RaterRecord, RaterResultFile, RaterSource};
use crate::scores::{ItemScores, ScoreTable};
use crate::util::sha256_file;

pub const MIN_RATERS: usize = 2;

/// Rater names that would collide with the aggregate `score_<name>` columns
/// of the per-item report records.
pub const RESERVED_RATER_NAMES: [&str; 2] = ["mean", "std"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsolidateError {
    #[error("at least {MIN_RATERS} rater sources are required, found {found}")]
    InsufficientRaters { found: usize },

    #[error("no item was scored by every rater")]
    NoCommonItems,
}

/// A rater file to load, with the rater name already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub path: PathBuf,
}

/// Accepts `path` or `name=path`.
pub fn parse_source_arg(arg: &str) -> SourceSpec {
    if let Some((name, path)) = arg.split_once('=') {
        let name = name.trim();
        if !name.is_empty() && !name.contains(['/', '\\']) && !path.is_empty() {
            let path = PathBuf::from(path);
            return SourceSpec {
                name: unreserved_name(name.to_ascii_lowercase(), &path),
                path,
            };
        }
    }

    let path = PathBuf::from(arg);
    SourceSpec {
        name: unreserved_name(rater_name_from_path(&path), &path),
        path,
    }
}

/// Renames a reserved rater name to `<name>_rater`.
fn unreserved_name(name: String, path: &Path) -> String {
    if !RESERVED_RATER_NAMES.contains(&name.as_str()) {
        return name;
    }

    let renamed = format!("{name}_rater");
    warn!(
        rater = %name,
        renamed = %renamed,
        path = %path.display(),
        "rater name collides with an aggregate column; renamed"
    );
    renamed
}

/// Last `_`-separated segment of the file stem, lower-cased.
pub fn rater_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.rsplit('_')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(stem.as_str())
        .to_ascii_lowercase()
}

/// Files in `dir` whose name matches `pattern`. The first capture group, when
/// present, names the rater.
pub fn discover_sources(dir: &Path, pattern: &str) -> Result<Vec<SourceSpec>> {
    let pattern = Regex::new(pattern)
        .with_context(|| format!("failed to compile source pattern: {pattern}"))?;

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut specs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(captures) = pattern.captures(file_name) else {
            continue;
        };

        let name = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| rater_name_from_path(&path));
        let name = unreserved_name(name, &path);
        specs.push(SourceSpec { name, path });
    }

    specs.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(specs)
}

pub fn load_rater_source(spec: &SourceSpec) -> Result<RaterSource> {
    let raw = fs::read(&spec.path)
        .with_context(|| format!("failed to read {}", spec.path.display()))?;
    let file: RaterResultFile = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", spec.path.display()))?;
    let sha256 = sha256_file(&spec.path)?;

    let total = file.classifications.len();
    let records = file
        .classifications
        .into_iter()
        .filter_map(|entry| entry.into_record())
        .collect::<Vec<RaterRecord>>();

    if records.len() < total {
        warn!(
            rater = %spec.name,
            dropped = total - records.len(),
            "classification entries without an item id were ignored"
        );
    }

    Ok(RaterSource {
        name: spec.name.clone(),
        path: spec.path.clone(),
        sha256,
        records,
    })
}

/// Loads every source it can. Unreadable or malformed files and repeated rater
/// names are skipped with a warning.
pub fn load_rater_sources(specs: &[SourceSpec]) -> Vec<RaterSource> {
    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(specs.len());

    for spec in specs {
        if !seen.insert(spec.name.clone()) {
            warn!(
                rater = %spec.name,
                path = %spec.path.display(),
                "duplicate rater name; source skipped"
            );
            continue;
        }

        match load_rater_source(spec) {
            Ok(source) => {
                info!(
                    rater = %source.name,
                    path = %source.path.display(),
                    records = source.records.len(),
                    "loaded rater results"
                );
                sources.push(source);
            }
            Err(err) => {
                seen.remove(&spec.name);
                warn!(
                    rater = %spec.name,
                    path = %spec.path.display(),
                    error = %format!("{err:#}"),
                    "rater source skipped"
                );
            }
        }
    }

    sources
}

/// Inner join of all sources on item id. Only items with a score from every
/// rater survive.
pub fn consolidate(sources: &[RaterSource]) -> Result<ScoreTable, ConsolidateError> {
    let mut ordered = sources.iter().collect::<Vec<&RaterSource>>();
    ordered.sort_by(|left, right| {
        left.name
            .cmp(&right.name)
            .then_with(|| left.path.cmp(&right.path))
    });
    ordered.dedup_by(|later, earlier| later.name == earlier.name);

    if ordered.len() < MIN_RATERS {
        return Err(ConsolidateError::InsufficientRaters {
            found: ordered.len(),
        });
    }

    let indexed = ordered
        .iter()
        .map(|source| (source.name.as_str(), index_records(source)))
        .collect::<Vec<(&str, BTreeMap<&str, &RaterRecord>)>>();

    let (_, first_index) = &indexed[0];
    let mut items = Vec::new();

    for item_id in first_index.keys() {
        let rows = indexed
            .iter()
            .map(|(rater, index)| {
                index
                    .get(item_id)
                    .filter(|record| record.score.is_some())
                    .map(|record| (*rater, *record))
            })
            .collect::<Option<Vec<(&str, &RaterRecord)>>>();

        let Some(rows) = rows else {
            continue;
        };

        let group_key = rows
            .iter()
            .find_map(|(_, record)| record.group_key.clone());
        let mut item = ItemScores::new((*item_id).to_string(), group_key);

        for (rater, record) in rows {
            let Some(score) = record.score else {
                continue;
            };
            item.scores.insert(rater.to_string(), score);
            item.justifications
                .insert(rater.to_string(), record.justification.clone());
            item.contributing_columns
                .insert(rater.to_string(), record.contributing_columns.clone());
        }
        items.push(item);
    }

    if items.is_empty() {
        return Err(ConsolidateError::NoCommonItems);
    }

    let raters = indexed
        .iter()
        .map(|(rater, _)| (*rater).to_string())
        .collect();
    Ok(ScoreTable::new(raters, items))
}

/// First occurrence wins when an item id repeats inside one source.
fn index_records(source: &RaterSource) -> BTreeMap<&str, &RaterRecord> {
    let mut index = BTreeMap::new();
    for record in &source.records {
        if index.contains_key(record.item_id.as_str()) {
            warn!(
                rater = %source.name,
                item = %record.item_id,
                "duplicate item id; keeping first occurrence"
            );
            continue;
        }
        index.insert(record.item_id.as_str(), record);
    }
    index
}
