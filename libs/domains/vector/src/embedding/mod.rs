mod openai;
mod provider;

pub use openai::{DEFAULT_DIMENSION, DEFAULT_MODEL, OpenAIConfig, OpenAIProvider};
#[cfg(any(test, feature = "mocks"))]
pub use provider::MockEmbeddingProvider;
pub use provider::EmbeddingProvider;
