//! JSON, Markdown and SVG renderings of an agreement analysis.

mod charts;
mod json;
mod markdown;

pub use self::charts::write_charts;
pub use self::json::build_json_report;
pub use self::markdown::{DEFAULT_DETAIL_N, DEFAULT_TOP_N, render_markdown};
