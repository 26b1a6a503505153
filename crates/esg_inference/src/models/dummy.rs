use std::fmt;

use async_trait::async_trait;
use esg_core::{
    Analysis, Article, ClassificationOracle, EmbeddingOracle, EsgCategory, Oracle, QuickFilterOracle,
    Result, Sentiment,
};
use sha2::{Digest, Sha256};

const EMBEDDING_DIM: usize = 256;

/// keyword, category, issue label
const LEXICON: &[(&str, EsgCategory, &str)] = &[
    ("온실가스", EsgCategory::Environmental, "온실가스 배출"),
    ("탄소", EsgCategory::Environmental, "온실가스 배출"),
    ("배출", EsgCategory::Environmental, "온실가스 배출"),
    ("재생에너지", EsgCategory::Environmental, "재생에너지 전환"),
    ("기후", EsgCategory::Environmental, "기후변화 대응"),
    ("오염", EsgCategory::Environmental, "환경 오염"),
    ("폐기물", EsgCategory::Environmental, "자원순환"),
    ("산업안전", EsgCategory::Social, "산업안전보건"),
    ("산업재해", EsgCategory::Social, "산업안전보건"),
    ("안전사고", EsgCategory::Social, "산업안전보건"),
    ("인권", EsgCategory::Social, "근로자 인권"),
    ("근로자", EsgCategory::Social, "근로자 인권"),
    ("노동", EsgCategory::Social, "근로자 인권"),
    ("공급망", EsgCategory::Social, "공급망 관리"),
    ("개인정보", EsgCategory::Social, "데이터 프라이버시"),
    ("프라이버시", EsgCategory::Social, "데이터 프라이버시"),
    ("이사회", EsgCategory::Governance, "이사회 다양성"),
    ("지배구조", EsgCategory::Governance, "지배구조"),
    ("윤리", EsgCategory::Governance, "윤리경영"),
    ("횡령", EsgCategory::Governance, "윤리경영"),
    ("뇌물", EsgCategory::Governance, "윤리경영"),
    ("carbon", EsgCategory::Environmental, "greenhouse gas emissions"),
    ("emission", EsgCategory::Environmental, "greenhouse gas emissions"),
    ("pollution", EsgCategory::Environmental, "pollution"),
    ("safety", EsgCategory::Social, "occupational safety"),
    ("labor", EsgCategory::Social, "labor rights"),
    ("privacy", EsgCategory::Social, "data privacy"),
    ("governance", EsgCategory::Governance, "corporate governance"),
    ("bribery", EsgCategory::Governance, "business ethics"),
];

const NEGATIVE_CUES: &[&str] = &[
    "논란", "사고", "위반", "벌금", "소송", "의혹", "유출", "controversy", "violation", "fine", "lawsuit",
    "accident", "leak",
];

const POSITIVE_CUES: &[&str] = &[
    "개선", "달성", "성과", "감축", "수상", "확대", "improve", "award", "achieve", "reduce",
];

/// Deterministic offline oracle. Embeddings are hashed character bigrams, so
/// texts sharing most of their wording land close together; classification
/// is a keyword lexicon.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }

    fn matches(text: &str) -> Vec<&'static (&'static str, EsgCategory, &'static str)> {
        let lowered = text.to_lowercase();
        LEXICON
            .iter()
            .filter(|(keyword, _, _)| lowered.contains(keyword))
            .collect()
    }

    fn sentiment(text: &str) -> Sentiment {
        let lowered = text.to_lowercase();
        let negative = NEGATIVE_CUES.iter().filter(|cue| lowered.contains(*cue)).count();
        let positive = POSITIVE_CUES.iter().filter(|cue| lowered.contains(*cue)).count();
        match negative.cmp(&positive) {
            std::cmp::Ordering::Greater => Sentiment::Negative,
            std::cmp::Ordering::Less => Sentiment::Positive,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

impl Oracle for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }
}

#[async_trait]
impl EmbeddingOracle for DummyModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; EMBEDDING_DIM];
        let chars: Vec<char> = text.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();

        for pair in chars.windows(2) {
            let bigram: String = pair.iter().collect();
            let digest = Sha256::digest(bigram.as_bytes());
            let slot = u16::from_le_bytes([digest[0], digest[1]]) as usize % EMBEDDING_DIM;
            let sign = if digest[2] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[slot] += sign;
        }

        Ok(embedding)
    }
}

#[async_trait]
impl ClassificationOracle for DummyModel {
    async fn classify(&self, article: &Article) -> Result<Analysis> {
        let text = format!("{} {}", article.title, article.snippet);
        let hits = Self::matches(&text);

        let mut esg_categories = Vec::new();
        let mut issues: Vec<String> = Vec::new();
        for (_, category, issue) in &hits {
            if !esg_categories.contains(category) {
                esg_categories.push(*category);
            }
            if !issues.iter().any(|i| i == issue) {
                issues.push(issue.to_string());
            }
        }

        let is_esg_related = !issues.is_empty();
        Ok(Analysis {
            is_esg_related,
            esg_categories,
            relevance_score: if is_esg_related { (1 + issues.len()).min(5) as u8 } else { 1 },
            issues,
            sentiment: Self::sentiment(&text),
        })
    }
}

#[async_trait]
impl QuickFilterOracle for DummyModel {
    async fn relevant_indices(&self, titles: &[String]) -> Result<Vec<usize>> {
        Ok(titles
            .iter()
            .enumerate()
            .filter(|(_, title)| !Self::matches(title).is_empty())
            .map(|(i, _)| i + 1)
            .collect())
    }
}
