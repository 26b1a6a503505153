pub mod aggregate;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod logging;
pub mod sources;

pub use analyzer::{AnalyzeOptions, MediaAnalysisReport, MediaAnalyzer};
pub use config::PipelineConfig;
pub use logging::init_logging;

pub mod prelude {
    pub use super::aggregate::{Availability, IssueAggregator, IssueRanking, MediaStats};
    pub use super::analyzer::{AnalyzeOptions, MediaAnalysisReport, MediaAnalyzer};
    pub use super::config::PipelineConfig;
    pub use super::dedup::{DedupConfig, DedupMode, DedupReport, Deduplicator};
    pub use super::sources::{load_articles, MockNewsSource, SearchPeriod};
    pub use esg_core::{Article, ClassifiedArticle, Error, Result};
}
