pub mod analyze;
pub mod relevance;
pub mod threshold;
