use std::sync::Arc;
use std::time::Duration;

use esg_core::{Article, EmbeddedArticle, EmbeddingOracle};
use futures::future::join_all;
use tracing::{debug, warn};

/// Embeds articles in fixed-size batches. Calls inside a batch run
/// concurrently; batches run one after another with a fixed pause between
/// them. A failed call yields a `None` embedding for that article only.
pub struct EmbeddingGenerator {
    oracle: Arc<dyn EmbeddingOracle>,
    batch_size: usize,
    batch_delay: Duration,
}

impl EmbeddingGenerator {
    pub fn new(oracle: Arc<dyn EmbeddingOracle>, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            oracle,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub async fn generate_text_embedding(&self, text: &str) -> Option<Vec<f32>> {
        match self.oracle.embed(text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!("⚠️ Embedding failed: {}", e);
                None
            }
        }
    }

    pub async fn embed_articles(&self, articles: Vec<Article>) -> Vec<EmbeddedArticle> {
        let total_batches = articles.len().div_ceil(self.batch_size);
        let mut embedded = Vec::with_capacity(articles.len());

        for (batch_no, batch) in articles.chunks(self.batch_size).enumerate() {
            if batch_no > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let texts: Vec<String> = batch.iter().map(Article::embedding_text).collect();
            let results = join_all(texts.iter().map(|text| self.generate_text_embedding(text))).await;

            let failed = results.iter().filter(|r| r.is_none()).count();
            debug!(
                "🔢 Embedding batch {}/{} done ({} articles, {} failed)",
                batch_no + 1,
                total_batches,
                batch.len(),
                failed
            );

            embedded.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(results)
                    .map(|(article, embedding)| EmbeddedArticle::new(article, embedding)),
            );
        }

        embedded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use esg_core::{Error, Oracle, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FlakyEmbedder {
        calls: AtomicUsize,
    }

    impl Oracle for FlakyEmbedder {
        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[async_trait]
    impl EmbeddingOracle for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.starts_with("fail") {
                return Err(Error::Inference("boom".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            snippet: String::new(),
            link: format!("https://news.example.com/{}", title),
            original_link: None,
            publish_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_order_is_kept() {
        let oracle = Arc::new(FlakyEmbedder::default());
        let generator = EmbeddingGenerator::new(oracle.clone(), 2, Duration::ZERO);

        let articles = vec![article("a"), article("fail-b"), article("c"), article("d"), article("fail-e")];
        let embedded = generator.embed_articles(articles).await;

        assert_eq!(oracle.calls.load(Ordering::SeqCst), 5);
        let titles: Vec<&str> = embedded.iter().map(|e| e.article.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "fail-b", "c", "d", "fail-e"]);
        let present: Vec<bool> = embedded.iter().map(|e| e.embedding.is_some()).collect();
        assert_eq!(present, vec![true, false, true, true, false]);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let generator = EmbeddingGenerator::new(Arc::new(FlakyEmbedder::default()), 0, Duration::ZERO);
        let embedded = generator.embed_articles(vec![article("a")]).await;
        assert_eq!(embedded.len(), 1);
    }
}
