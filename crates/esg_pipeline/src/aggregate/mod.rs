//! Folding classified articles into ranked issue statistics.

use std::collections::{HashMap, HashSet};

use esg_core::{ClassifiedArticle, Exemplar, IssueAggregate, Sentiment, MAX_EXEMPLARS};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod stats;

pub use stats::{media_scores, sort_by_relevance, IssueKeywords, MediaScore, MediaStats};

/// How issue labels from the classifier are turned into aggregation keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelNormalization {
    /// Labels are keys and names exactly as the classifier wrote them,
    /// surrounding whitespace included. Blank labels are still skipped and an
    /// identical label repeated within one article still counts once.
    Verbatim,
    /// Labels are trimmed, inner whitespace collapsed and lowercased.
    #[default]
    Normalized,
}

/// Trim, collapse runs of whitespace to one space, lowercase.
pub fn normalize_issue_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// `part / total * 100`, rounded to one decimal.
pub fn ratio_pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    /// At least one issue was ranked.
    Ranked,
    /// Classification worked but nothing ESG-related with issues was found.
    NoIssuesFound,
    /// Every attempted classification failed, so the ranking says nothing.
    ClassificationUnavailable,
    NoInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRanking {
    pub issues: Vec<IssueAggregate>,
    /// Distinct issues before truncation to top N.
    pub total_issues: usize,
    pub total_articles: usize,
    pub esg_related: usize,
    pub unclassified: usize,
    /// Set when full classification was attempted and failed every time,
    /// even if quick-filtered articles still carry a synthetic analysis.
    pub classification_failed: bool,
}

impl IssueRanking {
    pub fn availability(&self) -> Availability {
        if self.total_articles == 0 {
            Availability::NoInput
        } else if self.classification_failed || self.unclassified == self.total_articles {
            Availability::ClassificationUnavailable
        } else if self.total_issues == 0 {
            Availability::NoIssuesFound
        } else {
            Availability::Ranked
        }
    }

    /// Record that the classifier failed on every article it was given.
    pub fn with_classification_failed(mut self, failed: bool) -> Self {
        self.classification_failed = failed;
        self
    }
}

#[derive(Debug, Clone)]
pub struct IssueAggregator {
    top_n: usize,
    normalization: LabelNormalization,
}

impl Default for IssueAggregator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl IssueAggregator {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            normalization: LabelNormalization::default(),
        }
    }

    pub fn with_normalization(mut self, normalization: LabelNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Display name and aggregation key for a label.
    fn name_and_key<'a>(&self, label: &'a str) -> (&'a str, String) {
        match self.normalization {
            LabelNormalization::Verbatim => (label, label.to_string()),
            LabelNormalization::Normalized => (label.trim(), normalize_issue_label(label)),
        }
    }

    /// Aggregate ESG-related articles into per-issue statistics, ranked by
    /// weighted mention count. Ties keep the order in which issues were
    /// first seen. The issue name is the first spelling seen for its key.
    pub fn aggregate(&self, articles: &[ClassifiedArticle]) -> IssueRanking {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut issues: Vec<IssueAggregate> = Vec::new();
        let mut esg_related = 0;
        let mut unclassified = 0;

        for classified in articles {
            let Some(analysis) = &classified.analysis else {
                unclassified += 1;
                continue;
            };
            if !analysis.is_esg_related {
                continue;
            }
            esg_related += 1;

            let weight = classified.duplicate_count().max(1);
            let mut seen_here: HashSet<String> = HashSet::new();

            for label in &analysis.issues {
                if label.trim().is_empty() {
                    continue;
                }
                let (name, key) = self.name_and_key(label);
                if !seen_here.insert(key.clone()) {
                    continue;
                }

                let slot = *slots.entry(key).or_insert_with(|| {
                    issues.push(IssueAggregate::new(name));
                    issues.len() - 1
                });
                let issue = &mut issues[slot];

                issue.mention_count += 1;
                issue.weighted_mention_count += weight;
                match analysis.sentiment {
                    Sentiment::Positive => issue.positive_weight += weight,
                    Sentiment::Negative => issue.negative_weight += weight,
                    Sentiment::Neutral => issue.neutral_weight += weight,
                }
                issue.categories.extend(analysis.esg_categories.iter().copied());
                if issue.exemplars.len() < MAX_EXEMPLARS {
                    issue
                        .exemplars
                        .push(Exemplar::new(classified.article(), analysis.sentiment, weight));
                }
            }
        }

        for issue in &mut issues {
            issue.negative_ratio = ratio_pct(issue.negative_weight, issue.weighted_mention_count);
            issue.positive_ratio = ratio_pct(issue.positive_weight, issue.weighted_mention_count);
            issue.neutral_ratio = ratio_pct(issue.neutral_weight, issue.weighted_mention_count);
        }

        // stable: equal weights keep first-seen order
        issues.sort_by(|a, b| b.weighted_mention_count.cmp(&a.weighted_mention_count));
        let total_issues = issues.len();
        issues.truncate(self.top_n);

        info!(
            "📊 {} distinct issues from {} ESG-related articles, returning top {}",
            total_issues,
            esg_related,
            issues.len()
        );

        IssueRanking {
            issues,
            total_issues,
            total_articles: articles.len(),
            esg_related,
            unclassified,
            classification_failed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use esg_core::{Analysis, Article, EsgCategory, RepresentativeArticle};

    fn classified(title: &str, issues: &[&str], sentiment: Sentiment, duplicate_count: usize) -> ClassifiedArticle {
        ClassifiedArticle {
            representative: RepresentativeArticle {
                duplicate_count,
                ..RepresentativeArticle::singleton(Article {
                    title: title.to_string(),
                    snippet: String::new(),
                    link: format!("https://news.example.com/{}", title),
                    original_link: None,
                    publish_date: Utc::now(),
                })
            },
            analysis: Some(Analysis {
                is_esg_related: true,
                esg_categories: vec![EsgCategory::Social],
                issues: issues.iter().map(|s| s.to_string()).collect(),
                sentiment,
                relevance_score: 3,
            }),
        }
    }

    #[test]
    fn test_normalize_issue_label() {
        assert_eq!(normalize_issue_label("  Carbon   Emissions\t"), "carbon emissions");
        assert_eq!(normalize_issue_label("해양  오염"), "해양 오염");
    }

    #[test]
    fn test_ratio_rounding() {
        assert_eq!(ratio_pct(4, 6), 66.7);
        assert_eq!(ratio_pct(2, 6), 33.3);
        assert_eq!(ratio_pct(1, 3), 33.3);
        assert_eq!(ratio_pct(0, 0), 0.0);
    }

    #[test]
    fn test_weights_follow_duplicate_count() {
        let articles = vec![
            classified("a", &["산업안전"], Sentiment::Negative, 4),
            classified("b", &["산업안전"], Sentiment::Positive, 1),
        ];
        let ranking = IssueAggregator::new(10).aggregate(&articles);
        let issue = &ranking.issues[0];

        assert_eq!(issue.mention_count, 2);
        assert_eq!(issue.weighted_mention_count, 5);
        assert_eq!(issue.negative_weight, 4);
        assert_eq!(issue.negative_ratio, 80.0);
        assert_eq!(issue.positive_ratio, 20.0);
        assert_eq!(issue.exemplars[0].duplicate_count, 4);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let articles = vec![
            classified("a", &["beta"], Sentiment::Neutral, 1),
            classified("b", &["alpha"], Sentiment::Neutral, 1),
            classified("c", &["gamma"], Sentiment::Neutral, 2),
            classified("d", &["alpha"], Sentiment::Neutral, 1),
            classified("e", &["beta"], Sentiment::Neutral, 1),
        ];
        let ranking = IssueAggregator::new(10).aggregate(&articles);
        let names: Vec<&str> = ranking.issues.iter().map(|i| i.name.as_str()).collect();
        // all three weigh 2; beta was seen first, then alpha, then gamma
        assert_eq!(names, vec!["beta", "alpha", "gamma"]);

        let top_two = IssueAggregator::new(2).aggregate(&articles);
        assert_eq!(top_two.issues.len(), 2);
        assert_eq!(top_two.total_issues, 3);
        assert_eq!(top_two.issues[1].name, "alpha");
    }

    #[test]
    fn test_zero_top_n_still_reports_found_issues() {
        let articles = vec![classified("a", &["산업안전"], Sentiment::Negative, 1)];
        let ranking = IssueAggregator::new(0).aggregate(&articles);
        assert!(ranking.issues.is_empty());
        assert_eq!(ranking.total_issues, 1);
        assert_eq!(ranking.availability(), Availability::Ranked);
    }

    #[test]
    fn test_exemplars_are_capped_in_first_seen_order() {
        let articles: Vec<ClassifiedArticle> = (0..8)
            .map(|i| classified(&format!("t{}", i), &["popular"], Sentiment::Negative, 1))
            .collect();
        let ranking = IssueAggregator::new(10).aggregate(&articles);
        let titles: Vec<&str> = ranking.issues[0].exemplars.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(ranking.issues[0].mention_count, 8);
    }

    #[test]
    fn test_label_normalization_merges_spellings() {
        let articles = vec![
            classified("a", &["Carbon Emissions"], Sentiment::Negative, 1),
            classified("b", &["carbon  emissions "], Sentiment::Negative, 1),
            classified("c", &["carbon emissions", "CARBON EMISSIONS"], Sentiment::Negative, 1),
        ];
        let normalized = IssueAggregator::new(10).aggregate(&articles);
        assert_eq!(normalized.issues.len(), 1);
        assert_eq!(normalized.issues[0].name, "Carbon Emissions");
        assert_eq!(normalized.issues[0].mention_count, 3);

        let verbatim = IssueAggregator::new(10)
            .with_normalization(LabelNormalization::Verbatim)
            .aggregate(&articles);
        assert_eq!(verbatim.issues.len(), 4);
        let names: Vec<&str> = verbatim.issues.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Carbon Emissions", "carbon  emissions ", "carbon emissions", "CARBON EMISSIONS"]
        );

        let repeated = vec![classified("d", &["Carbon", "Carbon", " Carbon"], Sentiment::Negative, 1)];
        let verbatim = IssueAggregator::new(10)
            .with_normalization(LabelNormalization::Verbatim)
            .aggregate(&repeated);
        assert_eq!(verbatim.issues.len(), 2);
        assert_eq!(verbatim.issues[0].mention_count, 1);
    }

    #[test]
    fn test_non_esg_and_unclassified_do_not_contribute() {
        let mut not_esg = classified("x", &["ignored"], Sentiment::Negative, 3);
        if let Some(analysis) = not_esg.analysis.as_mut() {
            analysis.is_esg_related = false;
        }
        let mut failed = classified("y", &["ignored"], Sentiment::Negative, 1);
        failed.analysis = None;

        let ranking = IssueAggregator::new(10).aggregate(&[not_esg.clone(), failed.clone()]);
        assert!(ranking.issues.is_empty());
        assert_eq!(ranking.esg_related, 0);
        assert_eq!(ranking.availability(), Availability::NoIssuesFound);

        let unavailable = IssueAggregator::new(10).aggregate(&[failed]);
        assert_eq!(unavailable.availability(), Availability::ClassificationUnavailable);

        let outage = IssueAggregator::new(10)
            .aggregate(&[not_esg.clone()])
            .with_classification_failed(true);
        assert_eq!(outage.availability(), Availability::ClassificationUnavailable);
        assert_eq!(IssueAggregator::new(10).aggregate(&[]).availability(), Availability::NoInput);
    }
}
