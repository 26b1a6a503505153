//! Where articles come from: JSON dumps of search results, or a synthetic
//! source for offline runs.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use esg_core::{Article, Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    original_link: Option<String>,
    #[serde(default)]
    publish_date: Option<String>,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

fn into_article(raw: RawArticle, loaded_at: DateTime<Utc>) -> Article {
    let publish_date = match raw.publish_date.as_deref().and_then(parse_publish_date) {
        Some(date) => date,
        None => {
            debug!("🕒 No usable publish date for '{}', using load time", raw.title);
            loaded_at
        }
    };
    Article {
        title: raw.title,
        snippet: raw.snippet,
        link: raw.link,
        original_link: raw.original_link,
        publish_date,
    }
}

/// Parse a JSON array of search results.
pub fn parse_articles(json: &str) -> Result<Vec<Article>> {
    let raw: Vec<RawArticle> = serde_json::from_str(json)?;
    let loaded_at = Utc::now();
    Ok(raw.into_iter().map(|r| into_article(r, loaded_at)).collect())
}

pub fn load_articles(path: impl AsRef<Path>) -> Result<Vec<Article>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let articles = parse_articles(&json)?;
    info!("📥 Loaded {} articles from {}", articles.len(), path.display());
    Ok(articles)
}

const MOCK_TOPICS: &[&str] = &[
    "온실가스 배출 감축",
    "재생에너지 전환",
    "산업안전보건",
    "근로자 인권",
    "공급망 관리",
    "데이터 프라이버시",
    "이사회 다양성",
    "윤리경영",
];

/// Synthetic search results for a keyword. Output depends only on the
/// keyword, the count and the anchor time.
#[derive(Debug, Clone)]
pub struct MockNewsSource {
    keyword: String,
    anchor: DateTime<Utc>,
}

impl MockNewsSource {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            anchor: Utc::now(),
        }
    }

    pub fn anchored_at(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn generate(&self, count: usize) -> Vec<Article> {
        info!("🧪 Generating {} mock articles for '{}'", count, self.keyword);
        (0..count)
            .map(|i| {
                let topic = MOCK_TOPICS[i % MOCK_TOPICS.len()];
                // negative every third article
                let negative = i % 3 == 0;
                let (headline, body) = if negative {
                    ("논란", "부정적인 이슈가 제기")
                } else {
                    ("개선", "긍정적인 성과를 달성")
                };
                // spread over the last year without clumping on the anchor
                let hours_back = (i as i64 * 37) % (365 * 24);

                Article {
                    title: format!("{} {} 관련 {} ({})", self.keyword, topic, headline, i + 1),
                    snippet: format!(
                        "{}가 {}과 관련하여 {}되었습니다. 최근 1년간의 데이터를 분석한 결과...",
                        self.keyword, topic, body
                    ),
                    link: format!("https://news.example.com/article-{}", i + 1),
                    original_link: None,
                    publish_date: self.anchor - Duration::hours(hours_back),
                }
            })
            .collect()
    }
}

/// Look-back window accepted by the news search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPeriod {
    #[default]
    OneYear,
    SixMonths,
    ThreeMonths,
    OneMonth,
}

impl SearchPeriod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneYear => "y1",
            Self::SixMonths => "m6",
            Self::ThreeMonths => "m3",
            Self::OneMonth => "m1",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::OneYear => Duration::days(365),
            Self::SixMonths => Duration::days(182),
            Self::ThreeMonths => Duration::days(91),
            Self::OneMonth => Duration::days(30),
        }
    }

    /// Keep only articles published within the period before `now`.
    pub fn filter(&self, articles: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        let since = now - self.duration();
        articles.into_iter().filter(|a| a.publish_date >= since).collect()
    }
}

impl fmt::Display for SearchPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SearchPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "y1" => Ok(Self::OneYear),
            "m6" => Ok(Self::SixMonths),
            "m3" => Ok(Self::ThreeMonths),
            "m1" => Ok(Self::OneMonth),
            other => Err(Error::Config(format!(
                "Invalid period '{}'. Expected one of y1, m6, m3, m1",
                other
            ))),
        }
    }
}
