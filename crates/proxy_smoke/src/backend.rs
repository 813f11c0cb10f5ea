//! Backend seam between the harness and an OpenAI-compatible endpoint
//!
//! The harness only talks to a [`ProxyBackend`]. [`crate::client::ProxyClient`]
//! is the network implementation; tests substitute in-memory backends.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SmokeError};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Non-streaming chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Text of the first completion choice, absent when the server sent none
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: String,
}

/// Embedding vectors in the order returned by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingReply {
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingReply {
    /// Length of the first vector, if any
    pub fn dimensions(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}

/// Streaming chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// One incremental fragment of a streamed completion.
///
/// `content` is legitimately absent on role-only and finish chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: Option<String>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// Content only when it is present and non-empty
    pub fn fragment(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Ordered stream of chunks as received from the server
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Status reported by the proxy's health route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Operations the smoke test exercises on an OpenAI-compatible endpoint
#[async_trait]
pub trait ProxyBackend: Send + Sync {
    /// List available model identifiers, in server order
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Run a single synchronous chat completion
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Request embeddings for a single input
    async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingReply>;

    /// Open a streaming chat completion
    async fn chat_stream(&self, request: &StreamRequest) -> Result<ChunkStream>;

    /// Query the proxy's health route
    async fn health(&self) -> Result<HealthStatus> {
        Err(SmokeError::Unsupported(
            "health check is not available for this backend".to_string(),
        ))
    }
}
