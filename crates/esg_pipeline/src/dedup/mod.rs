//! Near-duplicate detection over article embeddings.
//!
//! Articles are embedded, bucketed into time groups, clustered within each
//! group, and every cluster is reduced to one representative that carries
//! the cluster size as its `duplicate_count`.

use std::sync::Arc;
use std::time::Duration;

use esg_core::serde_helpers::{duration_hours, duration_ms};
use esg_core::{Article, EmbeddingOracle, RepresentativeArticle};
use esg_inference::embeddings::EmbeddingGenerator;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub mod cluster;
pub mod representative;
pub mod temporal;

pub use cluster::{cluster_time_groups, ClusterStrategy};
pub use representative::{pick_representative, select_representatives};
pub use temporal::group_by_time_window;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub similarity_threshold: f64,
    #[serde(with = "duration_hours")]
    pub time_window: chrono::Duration,
    pub embedding_batch_size: usize,
    #[serde(with = "duration_ms")]
    pub embedding_batch_delay: Duration,
    pub strategy: ClusterStrategy,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            time_window: chrono::Duration::days(2),
            embedding_batch_size: 100,
            embedding_batch_delay: Duration::from_millis(300),
            strategy: ClusterStrategy::SingleSeed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DedupMode {
    Clustered,
    /// Every article passed through as its own singleton.
    Passthrough { reason: String },
    /// The caller asked for no deduplication.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupReport {
    #[serde(flatten)]
    pub mode: DedupMode,
    pub input_count: usize,
    pub embedded_count: usize,
    pub group_count: usize,
    pub cluster_count: usize,
    #[serde(skip)]
    pub representatives: Vec<RepresentativeArticle>,
}

impl DedupReport {
    fn singletons(articles: Vec<Article>, mode: DedupMode) -> Self {
        Self {
            mode,
            input_count: articles.len(),
            embedded_count: 0,
            group_count: 0,
            cluster_count: 0,
            representatives: articles.into_iter().map(RepresentativeArticle::singleton).collect(),
        }
    }

    pub fn skipped(articles: Vec<Article>) -> Self {
        Self::singletons(articles, DedupMode::Skipped)
    }

    pub fn passthrough(articles: Vec<Article>, reason: impl Into<String>) -> Self {
        Self::singletons(articles, DedupMode::Passthrough { reason: reason.into() })
    }

    pub fn output_count(&self) -> usize {
        self.representatives.len()
    }

    /// Percentage of input articles folded into other representatives.
    pub fn reduction_pct(&self) -> f64 {
        if self.input_count == 0 {
            return 0.0;
        }
        (1.0 - self.output_count() as f64 / self.input_count as f64) * 100.0
    }
}

pub struct Deduplicator {
    generator: Option<EmbeddingGenerator>,
    config: DedupConfig,
}

impl Deduplicator {
    pub fn new(oracle: Option<Arc<dyn EmbeddingOracle>>, config: DedupConfig) -> Self {
        let generator = oracle.map(|oracle| {
            EmbeddingGenerator::new(oracle, config.embedding_batch_size, config.embedding_batch_delay)
        });
        Self { generator, config }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub async fn deduplicate(&self, articles: Vec<Article>) -> DedupReport {
        if articles.is_empty() {
            return DedupReport::singletons(articles, DedupMode::Clustered);
        }

        let Some(generator) = &self.generator else {
            warn!("⚠️ No embedding oracle configured; skipping deduplication");
            return DedupReport::passthrough(articles, "embedding oracle unavailable");
        };

        let input_count = articles.len();
        info!("🔄 Deduplicating {} articles", input_count);

        let embedded = generator.embed_articles(articles).await;
        let (with_embedding, without_embedding): (Vec<_>, Vec<_>) =
            embedded.into_iter().partition(|a| a.embedding.is_some());
        let embedded_count = with_embedding.len();
        let unembedded: Vec<Article> = without_embedding.into_iter().map(|a| a.article).collect();

        if embedded_count == 0 {
            warn!("⚠️ Every embedding call failed; passing all {} articles through", input_count);
            return DedupReport::passthrough(unembedded, "every embedding call failed");
        }
        if !unembedded.is_empty() {
            warn!("⚠️ {} articles have no embedding and pass through as singletons", unembedded.len());
        }

        let groups = group_by_time_window(with_embedding, self.config.time_window);
        let group_count = groups.len();
        info!("⏱️ {} time groups (window {}h)", group_count, self.config.time_window.num_hours());

        let clusters = cluster_time_groups(groups, self.config.similarity_threshold, self.config.strategy);
        let duplicates: usize = clusters.iter().map(|c| c.size() - 1).sum();
        info!(
            "🔗 {} clusters at threshold {} ({} duplicates)",
            clusters.len(),
            self.config.similarity_threshold,
            duplicates
        );

        let representatives = select_representatives(&clusters, unembedded);
        let report = DedupReport {
            mode: DedupMode::Clustered,
            input_count,
            embedded_count,
            group_count,
            cluster_count: clusters.len(),
            representatives,
        };

        info!(
            "✅ Deduplication done: {} → {} articles ({:.1}% fewer)",
            report.input_count,
            report.output_count(),
            report.reduction_pct()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use esg_core::{Error, Oracle, Result};

    #[derive(Debug)]
    struct TitleEmbedder;

    impl Oracle for TitleEmbedder {
        fn name(&self) -> &str {
            "title"
        }
    }

    #[async_trait]
    impl EmbeddingOracle for TitleEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            match text.lines().next().unwrap_or_default() {
                t if t.starts_with("fail") => Err(Error::Inference("down".to_string())),
                t if t.starts_with("flood") => Ok(vec![1.0, 0.0]),
                _ => Ok(vec![0.0, 1.0]),
            }
        }
    }

    fn article(title: &str, day: u32) -> Article {
        Article {
            title: title.to_string(),
            snippet: String::new(),
            link: format!("https://news.example.com/{}", title),
            original_link: None,
            publish_date: Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap(),
        }
    }

    fn config() -> DedupConfig {
        DedupConfig {
            embedding_batch_delay: Duration::ZERO,
            ..DedupConfig::default()
        }
    }

    #[tokio::test]
    async fn test_deduplicate_mixes_clusters_and_unembedded() {
        let dedup = Deduplicator::new(Some(Arc::new(TitleEmbedder)), config());
        let report = dedup
            .deduplicate(vec![
                article("flood a", 10),
                article("flood b", 10),
                article("fail x", 10),
                article("other", 10),
            ])
            .await;

        assert_eq!(report.mode, DedupMode::Clustered);
        assert_eq!(report.embedded_count, 3);
        assert_eq!(report.cluster_count, 2);
        let counts: Vec<(String, usize)> = report
            .representatives
            .iter()
            .map(|r| (r.article.title.clone(), r.duplicate_count))
            .collect();
        assert_eq!(
            counts,
            vec![("flood a".to_string(), 2), ("other".to_string(), 1), ("fail x".to_string(), 1)]
        );
        assert_eq!(report.reduction_pct(), 25.0);
    }

    #[tokio::test]
    async fn test_missing_oracle_passes_through() {
        let dedup = Deduplicator::new(None, config());
        let report = dedup.deduplicate(vec![article("a", 1), article("b", 2)]).await;
        assert!(matches!(report.mode, DedupMode::Passthrough { .. }));
        assert!(report.representatives.iter().all(|r| r.duplicate_count == 1 && r.cluster_id.is_none()));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DedupConfig = serde_json::from_str(r#"{"similarity_threshold": 0.9, "strategy": "transitive"}"#).unwrap();
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.strategy, ClusterStrategy::Transitive);
        assert_eq!(config.time_window, chrono::Duration::days(2));
        assert_eq!(config.embedding_batch_size, 100);
    }
}
