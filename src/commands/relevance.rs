use std::fs;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::RelevanceArgs;
use crate::relevance::{TermIndex, parse_metadata, score_metadata};
use crate::util::write_json_pretty;

pub fn run(args: RelevanceArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.metadata)
        .with_context(|| format!("failed to read {}", args.metadata.display()))?;
    let tables = parse_metadata(&raw)
        .with_context(|| format!("failed to parse {}", args.metadata.display()))?;

    let raw = fs::read(&args.term_map)
        .with_context(|| format!("failed to read {}", args.term_map.display()))?;
    let term_map: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.term_map.display()))?;
    let index = TermIndex::from_map(&term_map)
        .with_context(|| format!("invalid term map {}", args.term_map.display()))?;

    if tables.is_empty() {
        warn!(path = %args.metadata.display(), "metadata contains no tables");
    }

    let results = score_metadata(&index, &tables);
    write_json_pretty(&args.output, &results)?;

    info!(
        tables = results.len(),
        components = index.components().len(),
        output = %args.output.display(),
        "relevance scores written"
    );
    Ok(())
}
