use esg_core::{Analysis, Article, Error, EsgCategory, Result, Sentiment};
use serde::Deserialize;
use tracing::debug;

pub fn classification_prompt(article: &Article) -> String {
    format!(
        r#"다음 뉴스 기사가 ESG(환경·사회·지배구조) 이슈와 관련이 있는지 평가하세요.

제목: {title}
내용: {snippet}

JSON 객체 하나만 출력하세요:
{{
  "isESGRelated": true 또는 false,
  "esgCategories": ["E", "S", "G"] 중 해당하는 값,
  "issues": ["짧고 구체적인 이슈명"],
  "sentiment": "positive" | "negative" | "neutral",
  "relevanceScore": 1부터 5 사이의 정수
}}"#,
        title = article.title,
        snippet = article.snippet,
    )
}

pub fn quick_filter_prompt(titles: &[String]) -> String {
    let numbered = titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"아래 뉴스 제목 중 ESG(환경·사회·지배구조) 이슈와 관련된 기사의 번호만 고르세요.

{numbered}

관련 기사 번호를 JSON 배열로만 출력하세요. 예: [1, 4, 7]
관련 기사가 없으면 []를 출력하세요."#
    )
}

/// The span from the first `open` to the last `close`, inclusive.
fn extract_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(rename = "isESGRelated", alias = "isEsgRelated")]
    is_esg_related: Option<bool>,
    #[serde(default)]
    esg_categories: Vec<String>,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    relevance_score: Option<f64>,
}

/// Parse a classification reply. The model may wrap the object in prose or
/// code fences; only the outermost `{...}` span is read.
pub fn parse_analysis(text: &str) -> Result<Analysis> {
    let json = extract_span(text, '{', '}')
        .ok_or_else(|| Error::MalformedResponse("no JSON object in classification reply".to_string()))?;
    let raw: RawAnalysis = serde_json::from_str(json)
        .map_err(|e| Error::MalformedResponse(format!("classification reply: {}", e)))?;

    let is_esg_related = raw
        .is_esg_related
        .ok_or_else(|| Error::MalformedResponse("classification reply lacks isESGRelated".to_string()))?;

    let mut esg_categories: Vec<EsgCategory> = Vec::new();
    for code in &raw.esg_categories {
        match code.parse::<EsgCategory>() {
            Ok(category) if !esg_categories.contains(&category) => esg_categories.push(category),
            Ok(_) => {}
            Err(e) => debug!("Skipping category in classification reply: {}", e),
        }
    }

    let issues = raw
        .issues
        .into_iter()
        .map(|issue| issue.trim().to_string())
        .filter(|issue| !issue.is_empty())
        .collect();

    let sentiment = raw
        .sentiment
        .as_deref()
        .and_then(|s| s.parse::<Sentiment>().ok())
        .unwrap_or_default();

    let relevance_score = raw
        .relevance_score
        .map(|score| score.round().clamp(1.0, 5.0) as u8)
        .unwrap_or(1);

    Ok(Analysis {
        is_esg_related,
        esg_categories,
        issues,
        sentiment,
        relevance_score,
    })
}

/// Parse a quick-filter reply into 1-based indices, in reply order.
/// Numbers may be JSON numbers or numeric strings.
pub fn parse_indices(text: &str) -> Result<Vec<usize>> {
    let json = extract_span(text, '[', ']')
        .ok_or_else(|| Error::MalformedResponse("no JSON array in quick-filter reply".to_string()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| Error::MalformedResponse(format!("quick-filter reply: {}", e)))?;

    values
        .iter()
        .map(|value| match value {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
            serde_json::Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        })
        .map(|index| {
            index.ok_or_else(|| Error::MalformedResponse(format!("quick-filter reply: not an index in {}", json)))
        })
        .collect()
}
