use std::path::Path;

use esg_core::{Error, Result};
use esg_inference::classification::FunnelConfig;
use serde::{Deserialize, Serialize};

use crate::aggregate::LabelNormalization;
use crate::dedup::DedupConfig;

/// Tunables for one analyzer run. Every field falls back to its default
/// when missing from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dedup: DedupConfig,
    pub funnel: FunnelConfig,
    pub top_n: usize,
    pub label_normalization: LabelNormalization,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            funnel: FunnelConfig::default(),
            top_n: 10,
            label_normalization: LabelNormalization::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Zero every pause between oracle calls. Used by tests and offline runs.
    pub fn without_delays(mut self) -> Self {
        self.dedup.embedding_batch_delay = std::time::Duration::ZERO;
        self.funnel = self.funnel.without_delays();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.dedup.similarity_threshold, 0.85);
        assert_eq!(config.dedup.time_window, chrono::Duration::days(2));
        assert_eq!(config.funnel.two_stage_threshold, 100);
        assert_eq!(config.funnel.classification_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"top_n": 3, "dedup": {{"similarity_threshold": 0.9, "time_window": 24}}, "funnel": {{"quick_filter_delay": 0}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.dedup.similarity_threshold, 0.9);
        assert_eq!(config.dedup.time_window, chrono::Duration::hours(24));
        assert_eq!(config.dedup.embedding_batch_size, 100);
        assert_eq!(config.funnel.quick_filter_delay, Duration::ZERO);
        assert_eq!(config.funnel.quick_filter_batch_size, 50);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(PipelineConfig::load(file.path()), Err(Error::Config(_))));
        assert!(matches!(PipelineConfig::load("/definitely/not/here.json"), Err(Error::Io(_))));
    }
}
