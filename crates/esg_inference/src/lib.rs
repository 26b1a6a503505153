use std::fmt;

pub mod classification;
pub mod embeddings;
pub mod models;
pub mod prompts;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    pub model_url: Option<String>,
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
}

#[derive(Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub inference_config: InferenceConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("inference_config", &self.inference_config)
            .finish()
    }
}

pub mod prelude {
    pub use super::classification::{ClassificationFunnel, ClassificationReport, FunnelConfig, FunnelMode};
    pub use super::embeddings::EmbeddingGenerator;
    pub use super::models::{create_oracles, OracleSet};
    pub use super::{Config, InferenceConfig};
    pub use esg_core::{Article, Error, Result};
}

pub use models::{create_oracles, OracleSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            model_name: Some("gemini".to_string()),
            inference_config: InferenceConfig::default(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
