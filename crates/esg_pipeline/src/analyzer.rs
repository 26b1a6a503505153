//! End-to-end media analysis: dedup, classify, aggregate.

use esg_core::{Article, ClassifiedArticle};
use esg_inference::classification::{ClassificationFunnel, ClassificationReport, FunnelMode};
use esg_inference::OracleSet;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{
    media_scores, sort_by_relevance, Availability, IssueAggregator, IssueKeywords, IssueRanking, MediaScore, MediaStats,
};
use crate::config::PipelineConfig;
use crate::dedup::{DedupReport, Deduplicator};
use crate::logging::StageLogger;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub deduplicate: bool,
    /// Force a funnel mode instead of picking one by article count.
    pub mode: Option<FunnelMode>,
    pub top_n: Option<usize>,
    pub keyword: Option<String>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            deduplicate: true,
            mode: None,
            top_n: None,
            keyword: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAnalysisReport {
    pub run_id: Uuid,
    pub keyword: Option<String>,
    pub total_articles: usize,
    pub dedup: DedupReport,
    /// Absent when there was nothing to classify.
    pub classification: Option<ClassificationReport>,
    pub availability: Availability,
    pub stats: MediaStats,
    pub ranking: IssueRanking,
    pub media_scores: Vec<MediaScore>,
    pub articles: Vec<ClassifiedArticle>,
}

impl MediaAnalysisReport {
    /// Keep only ESG-related articles, most relevant first.
    pub fn retain_relevant(&mut self) {
        self.articles = sort_by_relevance(&self.articles).into_iter().cloned().collect();
    }
}

pub struct MediaAnalyzer {
    deduplicator: Deduplicator,
    funnel: ClassificationFunnel,
    config: PipelineConfig,
    logger: StageLogger,
}

impl MediaAnalyzer {
    pub fn new(oracles: OracleSet, config: PipelineConfig) -> Self {
        let deduplicator = Deduplicator::new(oracles.embedding.clone(), config.dedup.clone());
        let funnel = ClassificationFunnel::new(oracles.classifier, oracles.quick_filter, config.funnel.clone());
        Self {
            deduplicator,
            funnel,
            config,
            logger: StageLogger::new().stage("analyze"),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn deduplicate(&self, articles: Vec<Article>) -> DedupReport {
        self.deduplicator.deduplicate(articles).await
    }

    pub async fn analyze(&self, articles: Vec<Article>, options: AnalyzeOptions) -> MediaAnalysisReport {
        let run_id = Uuid::new_v4();
        let total_articles = articles.len();
        let top_n = options.top_n.unwrap_or(self.config.top_n);
        let aggregator = IssueAggregator::new(top_n).with_normalization(self.config.label_normalization);

        self.logger.info(&format!(
            "🚀 Run {} over {} articles{}",
            run_id,
            total_articles,
            options
                .keyword
                .as_deref()
                .map(|k| format!(" for '{}'", k))
                .unwrap_or_default()
        ));

        if articles.is_empty() {
            self.logger.info("📭 Nothing to analyze");
            let ranking = aggregator.aggregate(&[]);
            return MediaAnalysisReport {
                run_id,
                keyword: options.keyword,
                total_articles,
                dedup: self.deduplicator.deduplicate(Vec::new()).await,
                classification: None,
                availability: ranking.availability(),
                stats: MediaStats::default(),
                ranking,
                media_scores: Vec::new(),
                articles: Vec::new(),
            };
        }

        let dedup_log = self.logger.stage("dedup");
        let dedup = if options.deduplicate {
            self.deduplicator.deduplicate(articles).await
        } else {
            dedup_log.info("⏭️ Deduplication disabled");
            DedupReport::skipped(articles)
        };
        dedup_log.info(&format!(
            "{} representatives from {} articles",
            dedup.output_count(),
            dedup.input_count
        ));

        let funnel_log = self.logger.stage("funnel");
        let classification = self.funnel.classify(dedup.representatives.clone(), options.mode).await;
        if classification.classification_unavailable() {
            funnel_log.error("❌ Every classification call failed; issue ranking will be empty");
        } else {
            funnel_log.info(&format!(
                "{} classified, {} failed, {} filtered in stage 1",
                classification.classified, classification.failed, classification.stage1_filtered
            ));
        }

        let articles = classification.articles.clone();
        let stats = MediaStats::from_classified(&articles);
        let ranking = aggregator
            .aggregate(&articles)
            .with_classification_failed(classification.classification_unavailable());
        let keywords: Vec<IssueKeywords> = ranking.issues.iter().map(|i| IssueKeywords::new(&i.name)).collect();
        let scores = media_scores(&articles, &keywords);

        let availability = ranking.availability();
        let aggregate_log = self.logger.stage("aggregate");
        match availability {
            Availability::Ranked => aggregate_log.info(&format!("🏁 Top {} issues ranked", ranking.issues.len())),
            Availability::NoIssuesFound => aggregate_log.info("No ESG issues found"),
            Availability::ClassificationUnavailable => aggregate_log.warn("⚠️ Classification unavailable"),
            Availability::NoInput => {}
        }

        MediaAnalysisReport {
            run_id,
            keyword: options.keyword,
            total_articles,
            dedup,
            classification: Some(classification),
            availability,
            stats,
            ranking,
            media_scores: scores,
            articles,
        }
    }
}
