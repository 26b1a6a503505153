use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use esg_core::serde_helpers::duration_ms;
use esg_core::{Analysis, ClassificationOracle, ClassifiedArticle, Error, QuickFilterOracle, RepresentativeArticle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelMode {
    /// Every article goes straight to full classification.
    SingleStage,
    /// A batched quick filter decides which articles get full classification.
    TwoStage,
}

impl fmt::Display for FunnelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleStage => f.write_str("single-stage"),
            Self::TwoStage => f.write_str("two-stage"),
        }
    }
}

impl FromStr for FunnelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "single-stage" => Ok(Self::SingleStage),
            "two" | "two-stage" => Ok(Self::TwoStage),
            other => Err(Error::Config(format!(
                "Unknown funnel mode '{}'. Expected single-stage or two-stage",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Inputs at least this large use the two-stage funnel unless a mode is forced.
    pub two_stage_threshold: usize,
    pub quick_filter_batch_size: usize,
    #[serde(with = "duration_ms")]
    pub quick_filter_delay: Duration,
    #[serde(with = "duration_ms")]
    pub classification_delay: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            two_stage_threshold: 100,
            quick_filter_batch_size: 50,
            quick_filter_delay: Duration::from_millis(300),
            classification_delay: Duration::from_millis(500),
        }
    }
}

impl FunnelConfig {
    pub fn select_mode(&self, article_count: usize) -> FunnelMode {
        if article_count >= self.two_stage_threshold {
            FunnelMode::TwoStage
        } else {
            FunnelMode::SingleStage
        }
    }

    /// Same thresholds and batch sizes, no pauses.
    pub fn without_delays(mut self) -> Self {
        self.quick_filter_delay = Duration::ZERO;
        self.classification_delay = Duration::ZERO;
        self
    }
}

/// Output of one funnel run. `articles` has exactly one entry per input
/// article, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationReport {
    pub mode: FunnelMode,
    #[serde(skip)]
    pub articles: Vec<ClassifiedArticle>,
    /// Articles handed to full classification.
    pub stage1_passed: usize,
    /// Articles rejected by the quick filter.
    pub stage1_filtered: usize,
    /// Quick-filter batches that failed and were let through whole.
    pub stage1_failed_batches: usize,
    pub classified: usize,
    pub failed: usize,
}

impl ClassificationReport {
    /// True when full classification was attempted and every attempt failed.
    pub fn classification_unavailable(&self) -> bool {
        self.stage1_passed > 0 && self.classified == 0
    }
}

pub struct ClassificationFunnel {
    classifier: Arc<dyn ClassificationOracle>,
    quick_filter: Arc<dyn QuickFilterOracle>,
    config: FunnelConfig,
}

impl fmt::Debug for ClassificationFunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationFunnel")
            .field("classifier", &"<dyn ClassificationOracle>")
            .field("quick_filter", &"<dyn QuickFilterOracle>")
            .field("config", &self.config)
            .finish()
    }
}

impl ClassificationFunnel {
    pub fn new(
        classifier: Arc<dyn ClassificationOracle>,
        quick_filter: Arc<dyn QuickFilterOracle>,
        config: FunnelConfig,
    ) -> Self {
        Self {
            classifier,
            quick_filter,
            config,
        }
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    pub async fn classify(
        &self,
        articles: Vec<RepresentativeArticle>,
        forced_mode: Option<FunnelMode>,
    ) -> ClassificationReport {
        let mode = forced_mode.unwrap_or_else(|| self.config.select_mode(articles.len()));
        info!("🤖 Classifying {} articles ({})", articles.len(), mode);

        let (keep, failed_batches) = match mode {
            FunnelMode::SingleStage => (vec![true; articles.len()], 0),
            FunnelMode::TwoStage => self.quick_filter(&articles).await,
        };

        let passed = keep.iter().filter(|k| **k).count();
        if mode == FunnelMode::TwoStage {
            info!(
                "🔎 Quick filter kept {}/{} articles ({} batches failed open)",
                passed,
                articles.len(),
                failed_batches
            );
        }

        let mut analyses: Vec<Option<Analysis>> = Vec::with_capacity(articles.len());
        let mut classified = 0;
        let mut failed = 0;
        let mut calls = 0;

        for (i, article) in articles.iter().enumerate() {
            if !keep[i] {
                analyses.push(Some(Analysis::filtered_out()));
                continue;
            }

            if calls > 0 && !self.config.classification_delay.is_zero() {
                tokio::time::sleep(self.config.classification_delay).await;
            }
            calls += 1;

            match self.classifier.classify(&article.article).await {
                Ok(analysis) => {
                    classified += 1;
                    analyses.push(Some(analysis));
                }
                Err(e) => {
                    failed += 1;
                    warn!("⚠️ Classification failed for '{}': {}", article.article.title, e);
                    analyses.push(None);
                }
            }

            if calls % 10 == 0 {
                debug!("Classified {}/{} articles", calls, passed);
            }
        }

        let articles = articles
            .into_iter()
            .zip(analyses)
            .map(|(representative, analysis)| ClassifiedArticle {
                representative,
                analysis,
            })
            .collect::<Vec<_>>();

        info!("✅ Classification done: {} analysed, {} failed, {} filtered out", classified, failed, articles.len() - passed);

        ClassificationReport {
            mode,
            stage1_passed: passed,
            stage1_filtered: articles.len() - passed,
            stage1_failed_batches: failed_batches,
            classified,
            failed,
            articles,
        }
    }

    /// Stage one. Returns a keep flag per article and the number of batches
    /// that failed open.
    async fn quick_filter(&self, articles: &[RepresentativeArticle]) -> (Vec<bool>, usize) {
        let batch_size = self.config.quick_filter_batch_size.max(1);
        let total_batches = articles.len().div_ceil(batch_size);
        let mut keep = Vec::with_capacity(articles.len());
        let mut failed_batches = 0;

        for (batch_no, batch) in articles.chunks(batch_size).enumerate() {
            if batch_no > 0 && !self.config.quick_filter_delay.is_zero() {
                tokio::time::sleep(self.config.quick_filter_delay).await;
            }

            let titles: Vec<String> = batch.iter().map(|a| a.article.title.clone()).collect();
            let mut flags = vec![false; batch.len()];

            match self.quick_filter.relevant_indices(&titles).await {
                Ok(indices) => {
                    for index in indices {
                        match index.checked_sub(1).and_then(|i| flags.get_mut(i)) {
                            Some(flag) => *flag = true,
                            None => debug!("Ignoring out-of-range quick-filter index {}", index),
                        }
                    }
                }
                Err(e) => {
                    failed_batches += 1;
                    warn!(
                        "⚠️ Quick filter batch {}/{} failed, keeping all {} articles: {}",
                        batch_no + 1,
                        total_batches,
                        batch.len(),
                        e
                    );
                    flags.iter_mut().for_each(|flag| *flag = true);
                }
            }

            debug!(
                "Quick filter batch {}/{}: {}/{} relevant",
                batch_no + 1,
                total_batches,
                flags.iter().filter(|f| **f).count(),
                batch.len()
            );
            keep.extend(flags);
        }

        (keep, failed_batches)
    }
}
