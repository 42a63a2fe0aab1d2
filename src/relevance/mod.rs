//! Keyword-weighted relevance scoring of normalized table metadata.

mod normalize;
mod score;
#[cfg(test)]
mod tests;

pub use self::score::{TermIndex, parse_metadata, score_metadata};
