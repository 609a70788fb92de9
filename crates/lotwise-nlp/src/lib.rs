//! Lotwise NLP - Free-text question parsing
//!
//! Maps a free-text question to a `(QueryKind, address text)` pair. The
//! deterministic [`RuleParser`] covers tests and keyless deployments; the
//! [`LlmParser`] adds model-backed routing for phrasings the rules miss.
//! Both sit behind the [`QueryParser`] trait so the query core never
//! depends on an external LLM.

pub mod llm;
pub mod rules;

pub use llm::LlmParser;
pub use rules::RuleParser;

use async_trait::async_trait;
use lotwise_core::{QueryKind, Result};
use serde::{Deserialize, Serialize};

/// A parsed free-text question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Which of the ten fixed lookups to run
    pub kind: QueryKind,
    /// The address text extracted from the question
    pub address: String,
}

/// Maps free text to a structured query.
#[async_trait]
pub trait QueryParser: Send + Sync {
    /// Parse a question. Fails with `ValidationError` when no supported
    /// query kind or no address can be recognized.
    async fn parse(&self, text: &str) -> Result<ParsedQuery>;
}
