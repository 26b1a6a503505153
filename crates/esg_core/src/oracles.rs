use std::fmt;

use async_trait::async_trait;

use crate::types::{Analysis, Article};
use crate::Result;

pub trait Oracle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

#[async_trait]
pub trait EmbeddingOracle: Oracle {
    /// Embed a piece of text into a fixed-dimensionality vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait ClassificationOracle: Oracle {
    /// Full ESG analysis of a single article's title and snippet.
    async fn classify(&self, article: &Article) -> Result<Analysis>;
}

#[async_trait]
pub trait QuickFilterOracle: Oracle {
    /// Given titles numbered from 1, return the 1-based numbers judged
    /// ESG-relevant.
    async fn relevant_indices(&self, titles: &[String]) -> Result<Vec<usize>>;
}
