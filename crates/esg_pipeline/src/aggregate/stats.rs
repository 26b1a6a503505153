use esg_core::{ClassifiedArticle, EsgCategory, Sentiment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    #[serde(rename = "E")]
    pub environmental: usize,
    #[serde(rename = "S")]
    pub social: usize,
    #[serde(rename = "G")]
    pub governance: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Unweighted per-article counts over a classified batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStats {
    pub total: usize,
    pub esg_related: usize,
    pub unclassified: usize,
    pub by_category: CategoryCounts,
    pub by_sentiment: SentimentCounts,
}

impl MediaStats {
    pub fn from_classified(articles: &[ClassifiedArticle]) -> Self {
        let mut stats = Self {
            total: articles.len(),
            ..Self::default()
        };

        for classified in articles {
            let Some(analysis) = &classified.analysis else {
                stats.unclassified += 1;
                continue;
            };
            if !analysis.is_esg_related {
                continue;
            }
            stats.esg_related += 1;

            for category in &analysis.esg_categories {
                match category {
                    EsgCategory::Environmental => stats.by_category.environmental += 1,
                    EsgCategory::Social => stats.by_category.social += 1,
                    EsgCategory::Governance => stats.by_category.governance += 1,
                }
            }
            match analysis.sentiment {
                Sentiment::Positive => stats.by_sentiment.positive += 1,
                Sentiment::Negative => stats.by_sentiment.negative += 1,
                Sentiment::Neutral => stats.by_sentiment.neutral += 1,
            }
        }

        stats
    }
}

/// An issue to score, matched by keyword against title and snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueKeywords {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl IssueKeywords {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    /// Lowercased keywords, or the issue name itself when none were given.
    fn needles(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            vec![self.name.to_lowercase()]
        } else {
            self.keywords.iter().map(|k| k.to_lowercase()).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaScore {
    pub issue: String,
    /// 1, 3 or 5.
    pub score: u8,
    pub exposure_rate: f64,
    pub negative_rate: f64,
    pub total_count: usize,
    pub related_count: usize,
    pub negative_count: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn score_for(exposure_rate: f64, negative_rate: f64) -> u8 {
    if exposure_rate >= 10.0 && negative_rate >= 70.0 {
        5
    } else if (10.0..=50.0).contains(&exposure_rate) {
        3
    } else {
        1
    }
}

/// Score each issue by how often it shows up in ESG-related coverage and
/// how negative that coverage is. Exposure is measured against every
/// article in the batch.
pub fn media_scores(articles: &[ClassifiedArticle], issues: &[IssueKeywords]) -> Vec<MediaScore> {
    let total_count = articles.len();

    issues
        .iter()
        .map(|issue| {
            let needles = issue.needles();
            let related: Vec<&ClassifiedArticle> = articles
                .iter()
                .filter(|classified| classified.is_esg_related())
                .filter(|classified| {
                    let article = classified.article();
                    let title = article.title.to_lowercase();
                    let snippet = article.snippet.to_lowercase();
                    needles
                        .iter()
                        .any(|needle| title.contains(needle.as_str()) || snippet.contains(needle.as_str()))
                })
                .collect();

            let related_count = related.len();
            let negative_count = related
                .iter()
                .filter(|c| c.analysis.as_ref().is_some_and(|a| a.sentiment == Sentiment::Negative))
                .count();

            let exposure_rate = if total_count > 0 {
                related_count as f64 / total_count as f64 * 100.0
            } else {
                0.0
            };
            let negative_rate = if related_count > 0 {
                negative_count as f64 / related_count as f64 * 100.0
            } else {
                0.0
            };

            MediaScore {
                issue: issue.name.clone(),
                score: score_for(exposure_rate, negative_rate),
                exposure_rate: round2(exposure_rate),
                negative_rate: round2(negative_rate),
                total_count,
                related_count,
                negative_count,
            }
        })
        .collect()
}

/// ESG-related articles, most relevant first. Equal scores keep input order.
pub fn sort_by_relevance(articles: &[ClassifiedArticle]) -> Vec<&ClassifiedArticle> {
    let mut related: Vec<&ClassifiedArticle> = articles.iter().filter(|c| c.is_esg_related()).collect();
    related.sort_by_key(|c| std::cmp::Reverse(c.analysis.as_ref().map_or(0, |a| a.relevance_score)));
    related
}
