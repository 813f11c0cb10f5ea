//! The four smoke-test steps
//!
//! Each step returns its own `Result`; the harness decides how to render a
//! failure and always moves on to the next step.

use std::io::Write;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{ChatRequest, ChunkStream, EmbeddingRequest, ProxyBackend, StreamRequest};
use crate::error::{Result, SmokeError};

/// Smoke-test step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    Models,
    Chat,
    Embeddings,
    Streaming,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Models, Step::Chat, Step::Embeddings, Step::Streaming];

    /// Parse a step from its name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "models" => Some(Self::Models),
            "chat" => Some(Self::Chat),
            "embeddings" => Some(Self::Embeddings),
            "streaming" | "stream" => Some(Self::Streaming),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Chat => "chat",
            Self::Embeddings => "embeddings",
            Self::Streaming => "streaming",
        }
    }

    /// Position shown in the section banner
    pub fn number(&self) -> usize {
        match self {
            Self::Models => 1,
            Self::Chat => 2,
            Self::Embeddings => 3,
            Self::Streaming => 4,
        }
    }

    /// i18n key of the section banner
    pub fn banner_key(&self) -> &'static str {
        match self {
            Self::Models => "models_banner",
            Self::Chat => "chat_banner",
            Self::Embeddings => "embeddings_banner",
            Self::Streaming => "streaming_banner",
        }
    }
}

/// List model identifiers in the order the server returned them
pub async fn list_models<B>(backend: &B) -> Result<Vec<String>>
where
    B: ProxyBackend + ?Sized,
{
    let models = backend.list_models().await?;
    info!(count = models.len(), "listed models");
    Ok(models)
}

/// Run one chat completion and return the first choice's text
pub async fn chat_completion<B>(backend: &B, request: &ChatRequest) -> Result<String>
where
    B: ProxyBackend + ?Sized,
{
    let reply = backend.chat(request).await?;
    reply.content.ok_or_else(|| {
        SmokeError::MissingContent("chat completion message has no content".to_string())
    })
}

/// Embed the request input and return the first vector's dimensionality
pub async fn embeddings<B>(backend: &B, request: &EmbeddingRequest) -> Result<usize>
where
    B: ProxyBackend + ?Sized,
{
    let reply = backend.embed(request).await?;
    let dimensions = reply
        .dimensions()
        .ok_or_else(|| SmokeError::EmptyResponse("no embedding returned".to_string()))?;
    info!(dimensions, "embedding created");
    Ok(dimensions)
}

/// Open a streaming chat completion. Succeeds once the server has
/// accepted the request; chunks are pulled by [`streaming_chat`].
pub async fn open_stream<B>(backend: &B, request: &StreamRequest) -> Result<ChunkStream>
where
    B: ProxyBackend + ?Sized,
{
    let stream = backend.chat_stream(request).await?;
    debug!(model = %request.model, "stream opened");
    Ok(stream)
}

/// Drain an opened stream, writing each non-empty fragment to `out` as it
/// arrives. Returns the assembled text.
///
/// On a mid-stream error, fragments already written stay in `out`.
pub async fn streaming_chat<W>(mut stream: ChunkStream, out: &mut W) -> Result<String>
where
    W: Write + ?Sized,
{
    let mut assembled = String::new();
    let mut chunk_count = 0usize;

    while let Some(item) = stream.next().await {
        let chunk = item?;
        chunk_count += 1;

        if let Some(fragment) = chunk.fragment() {
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
            assembled.push_str(fragment);
        }
    }

    debug!(chunk_count, length = assembled.len(), "stream finished");
    Ok(assembled)
}
