use std::sync::Arc;
use std::fmt;

use esg_core::{ClassificationOracle, EmbeddingOracle, Error, QuickFilterOracle, Result};
use tracing::{info, warn};

use crate::Config;

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// The oracles one pipeline run talks to. A missing embedding oracle means
/// deduplication runs in passthrough mode.
#[derive(Clone)]
pub struct OracleSet {
    pub embedding: Option<Arc<dyn EmbeddingOracle>>,
    pub classifier: Arc<dyn ClassificationOracle>,
    pub quick_filter: Arc<dyn QuickFilterOracle>,
}

impl fmt::Debug for OracleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSet")
            .field("embedding", &self.embedding.as_ref().map(|o| o.name().to_string()))
            .field("classifier", &self.classifier.name())
            .field("quick_filter", &self.quick_filter.name())
            .finish()
    }
}

impl OracleSet {
    /// Use one model for all three roles.
    pub fn from_model<M>(model: Arc<M>) -> Self
    where
        M: EmbeddingOracle + ClassificationOracle + QuickFilterOracle + 'static,
    {
        Self {
            embedding: Some(model.clone()),
            classifier: model.clone(),
            quick_filter: model,
        }
    }

    pub fn without_embeddings(mut self) -> Self {
        self.embedding = None;
        self
    }
}

pub fn create_oracles(config: Option<Config>) -> Result<OracleSet> {
    let config = config.unwrap_or_default();
    let model_name = config.model_name.as_deref().unwrap_or("gemini").to_lowercase();

    match model_name.as_str() {
        "gemini" => {
            let has_key = config.api_key.is_some();
            let model = Arc::new(GeminiModel::new(config.api_key.clone(), &config.inference_config)?);
            info!("🧠 Gemini oracles ready (chat: {}, embedding: {})", model.chat_model(), model.embedding_model());
            let oracles = OracleSet::from_model(model);
            if has_key {
                Ok(oracles)
            } else {
                warn!("⚠️ GEMINI_API_KEY is not set; deduplication will be skipped and classification will degrade");
                Ok(oracles.without_embeddings())
            }
        }
        "dummy" => {
            info!("🧠 Using offline dummy oracles");
            Ok(OracleSet::from_model(Arc::new(DummyModel::new())))
        }
        other => Err(Error::Config(format!(
            "Unknown model '{}'. Available models: gemini (default), dummy",
            other
        ))),
    }
}
