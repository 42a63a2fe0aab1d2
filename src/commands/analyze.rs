use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::agreement::{compute_agreement, icc_label};
use crate::cli::AnalyzeArgs;
use crate::consolidate::{
    MIN_RATERS, SourceSpec, consolidate, discover_sources, load_rater_sources, parse_source_arg,
};
use crate::model::SourceDigest;
use crate::report::{build_json_report, render_markdown, write_charts};
use crate::util::{now_utc_string, write_json_pretty, write_text_file};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let specs = resolve_sources(&args)?;
    info!(count = specs.len(), "rater sources resolved");

    let sources = load_rater_sources(&specs);
    if sources.len() < MIN_RATERS {
        bail!(
            "only {} rater source(s) could be loaded; at least {MIN_RATERS} are required",
            sources.len()
        );
    }

    let table = consolidate(&sources)?;
    info!(
        raters = table.rater_count(),
        items = table.item_count(),
        "consolidated score table"
    );

    let summary = compute_agreement(&table);
    info!(
        icc2_1 = ?summary.icc.icc2_1,
        reading = icc_label(summary.icc.icc2_1),
        mean_ccc = ?summary.mean_ccc,
        kendalls_w = ?summary.kendalls_w,
        "agreement computed"
    );

    let generated_at = now_utc_string();
    let digests = sources.iter().map(SourceDigest::from).collect::<Vec<_>>();

    let report = build_json_report(&table, &summary, &digests, &generated_at);
    write_json_pretty(&args.json_output, &report)?;
    info!(path = %args.json_output.display(), "wrote json report");

    let charts = if args.no_charts {
        Vec::new()
    } else {
        write_charts(&args.chart_dir, &table, &summary)?
    };

    let markdown = render_markdown(
        &table,
        &summary,
        &charts,
        &generated_at,
        args.top_n,
        args.detail_n,
    );
    write_text_file(&args.markdown_output, &markdown)?;
    info!(path = %args.markdown_output.display(), "wrote markdown report");

    Ok(())
}

fn resolve_sources(args: &AnalyzeArgs) -> Result<Vec<SourceSpec>> {
    if !args.sources.is_empty() {
        return Ok(args
            .sources
            .iter()
            .map(|arg| parse_source_arg(arg))
            .collect());
    }

    if !args.results_dir.is_dir() {
        bail!(
            "no rater sources given and results directory {} does not exist",
            args.results_dir.display()
        );
    }

    let specs = discover_sources(&args.results_dir, &args.pattern)?;
    if specs.is_empty() {
        warn!(
            dir = %args.results_dir.display(),
            pattern = %args.pattern,
            "no rater files matched"
        );
        bail!(
            "no rater files matching {} found in {}",
            args.pattern,
            args.results_dir.display()
        );
    }

    Ok(specs)
}

#[cfg(test)]
mod tests;
