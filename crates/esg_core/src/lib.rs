pub mod error;
pub mod oracles;
pub mod serde_helpers;
pub mod similarity;
pub mod types;

pub use error::Error;
pub use oracles::{ClassificationOracle, EmbeddingOracle, Oracle, QuickFilterOracle};
pub use similarity::cosine_similarity;
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
