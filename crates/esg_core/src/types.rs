use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of exemplar articles kept per issue.
pub const MAX_EXEMPLARS: usize = 5;

/// A raw search result as handed over by the news search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_link: Option<String>,
    pub publish_date: DateTime<Utc>,
}

impl Article {
    /// Text sent to the embedding oracle: title and snippet on separate lines.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.snippet)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedArticle {
    pub article: Article,
    pub embedding: Option<Vec<f32>>,
}

impl EmbeddedArticle {
    pub fn new(article: Article, embedding: Option<Vec<f32>>) -> Self {
        Self { article, embedding }
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn publish_date(&self) -> DateTime<Utc> {
        self.article.publish_date
    }
}

/// Articles whose dates all fall within the window of the anchor, the most
/// recent member. A group always has at least one member.
#[derive(Debug, Clone)]
pub struct TimeGroup {
    members: Vec<EmbeddedArticle>,
}

impl TimeGroup {
    pub fn new(anchor: EmbeddedArticle) -> Self {
        Self { members: vec![anchor] }
    }

    pub fn anchor_date(&self) -> DateTime<Utc> {
        self.members[0].publish_date()
    }

    pub fn push(&mut self, article: EmbeddedArticle) {
        self.members.push(article);
    }

    pub fn members(&self) -> &[EmbeddedArticle] {
        &self.members
    }

    pub fn into_members(self) -> Vec<EmbeddedArticle> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl ClusterDateRange {
    pub fn span(&self) -> Duration {
        self.latest - self.earliest
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: usize,
    pub members: Vec<EmbeddedArticle>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn date_range(&self) -> Option<ClusterDateRange> {
        let earliest = self.members.iter().map(EmbeddedArticle::publish_date).min()?;
        let latest = self.members.iter().map(EmbeddedArticle::publish_date).max()?;
        Some(ClusterDateRange { earliest, latest })
    }
}

fn default_duplicate_count() -> usize {
    1
}

/// The canonical article standing in for a cluster of near-duplicates.
///
/// `duplicate_count` is terminal: it is the size of the cluster this article
/// was chosen from and is never multiplied again downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentativeArticle {
    #[serde(flatten)]
    pub article: Article,
    #[serde(default = "default_duplicate_count")]
    pub duplicate_count: usize,
    #[serde(default)]
    pub cluster_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_date_range: Option<ClusterDateRange>,
}

impl RepresentativeArticle {
    /// An article standing only for itself, outside any cluster.
    pub fn singleton(article: Article) -> Self {
        Self {
            article,
            duplicate_count: 1,
            cluster_id: None,
            cluster_date_range: None,
        }
    }
}

impl From<Article> for RepresentativeArticle {
    fn from(article: Article) -> Self {
        Self::singleton(article)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EsgCategory {
    #[serde(rename = "E")]
    Environmental,
    #[serde(rename = "S")]
    Social,
    #[serde(rename = "G")]
    Governance,
}

impl EsgCategory {
    pub const ALL: [EsgCategory; 3] = [Self::Environmental, Self::Social, Self::Governance];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Environmental => "E",
            Self::Social => "S",
            Self::Governance => "G",
        }
    }
}

impl fmt::Display for EsgCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EsgCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e" | "environmental" | "environment" => Ok(Self::Environmental),
            "s" | "social" => Ok(Self::Social),
            "g" | "governance" => Ok(Self::Governance),
            other => Err(crate::Error::MalformedResponse(format!(
                "unknown ESG category: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl FromStr for Sentiment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(crate::Error::MalformedResponse(format!(
                "unknown sentiment: {}",
                other
            ))),
        }
    }
}

/// Per-article output of the classification oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(rename = "isESGRelated")]
    pub is_esg_related: bool,
    pub esg_categories: Vec<EsgCategory>,
    pub issues: Vec<String>,
    pub sentiment: Sentiment,
    pub relevance_score: u8,
}

impl Analysis {
    /// Synthetic analysis for articles rejected by the quick filter.
    pub fn filtered_out() -> Self {
        Self {
            is_esg_related: false,
            esg_categories: Vec::new(),
            issues: Vec::new(),
            sentiment: Sentiment::Neutral,
            relevance_score: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    #[serde(flatten)]
    pub representative: RepresentativeArticle,
    pub analysis: Option<Analysis>,
}

impl ClassifiedArticle {
    pub fn article(&self) -> &Article {
        &self.representative.article
    }

    pub fn duplicate_count(&self) -> usize {
        self.representative.duplicate_count
    }

    pub fn is_esg_related(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.is_esg_related)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exemplar {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub original_link: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub duplicate_count: usize,
}

impl Exemplar {
    pub fn new(article: &Article, sentiment: Sentiment, duplicate_count: usize) -> Self {
        Self {
            title: article.title.clone(),
            snippet: article.snippet.clone(),
            link: article.link.clone(),
            original_link: article.original_link.clone(),
            publish_date: article.publish_date,
            sentiment,
            duplicate_count,
        }
    }
}

/// Statistics for one issue label across all ESG-related articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAggregate {
    pub name: String,
    pub mention_count: usize,
    pub weighted_mention_count: usize,
    pub positive_weight: usize,
    pub negative_weight: usize,
    pub neutral_weight: usize,
    pub categories: BTreeSet<EsgCategory>,
    pub exemplars: Vec<Exemplar>,
    pub negative_ratio: f64,
    pub positive_ratio: f64,
    pub neutral_ratio: f64,
}

impl IssueAggregate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mention_count: 0,
            weighted_mention_count: 0,
            positive_weight: 0,
            negative_weight: 0,
            neutral_weight: 0,
            categories: BTreeSet::new(),
            exemplars: Vec::new(),
            negative_ratio: 0.0,
            positive_ratio: 0.0,
            neutral_ratio: 0.0,
        }
    }
}
