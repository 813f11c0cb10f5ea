//! Proxy client for OpenAI-compatible endpoints

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse, CreateEmbeddingRequestArgs, CreateEmbeddingResponse,
    ListModelResponse,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::backend::{
    ChatMessage, ChatReply, ChatRequest, ChunkStream, EmbeddingReply, EmbeddingRequest,
    HealthStatus, ProxyBackend, Role, StreamRequest,
};
use crate::error::{Result, SmokeError};
use crate::sse;

/// Default proxy address, OpenAI API prefix included
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/v1";

/// Placeholder credential; the proxy authenticates upstream on its own
pub const DEFAULT_API_KEY: &str = "sk-fake-key-for-testing";

/// Connection settings for the proxy under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// URL of the proxy's health route: the base URL's origin plus `/health`
    pub fn health_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path("/health");
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

/// Client for a local OpenAI-compatible proxy.
///
/// Requests and replies use the async-openai wire types. Every call is
/// attempted exactly once, and a non-2xx answer is reported with its status
/// and raw body, since the proxy's error bodies are not OpenAI-shaped.
pub struct ProxyClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ProxyClient {
    /// Create a new ProxyClient
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send an authenticated request; a non-2xx answer becomes `SmokeError::Status`
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.config.api_key).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        debug!(status = %status, body = %body, "proxy returned an error");
        Err(SmokeError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.as_str();
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(built)
}

fn to_request_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages.iter().map(to_request_message).collect()
}

#[async_trait]
impl ProxyBackend for ProxyClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.endpoint("models");
        debug!("GET {}", url);

        let response: ListModelResponse = self.send(self.http.get(url)).await?.json().await?;
        Ok(response.data.into_iter().map(|model| model.id).collect())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(to_request_messages(&request.messages)?);
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            args.max_tokens(max_tokens);
        }
        let chat_request = args.build()?;

        let url = self.endpoint("chat/completions");
        debug!(model = %request.model, "POST {}", url);
        let response: CreateChatCompletionResponse = self
            .send(self.http.post(url).json(&chat_request))
            .await?
            .json()
            .await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            SmokeError::EmptyResponse("chat completion returned no choices".to_string())
        })?;

        Ok(ChatReply {
            content: choice.message.content,
        })
    }

    async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingReply> {
        let embedding_request = CreateEmbeddingRequestArgs::default()
            .model(&request.model)
            .input(request.input.clone())
            .build()?;

        let url = self.endpoint("embeddings");
        debug!(model = %request.model, "POST {}", url);
        let response: CreateEmbeddingResponse = self
            .send(self.http.post(url).json(&embedding_request))
            .await?
            .json()
            .await?;

        Ok(EmbeddingReply {
            vectors: response
                .data
                .into_iter()
                .map(|embedding| embedding.embedding)
                .collect(),
        })
    }

    async fn chat_stream(&self, request: &StreamRequest) -> Result<ChunkStream> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(to_request_messages(&request.messages)?)
            .stream(true)
            .build()?;

        let url = self.endpoint("chat/completions");
        debug!(model = %request.model, "POST {} (stream)", url);
        let response = self.send(self.http.post(url).json(&chat_request)).await?;

        let body = response
            .bytes_stream()
            .map(|read| read.map(|bytes| bytes.to_vec()).map_err(SmokeError::from))
            .boxed();

        Ok(sse::decode_chunks(body))
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.config.health_url()?;
        debug!("GET {}", url);

        let status: HealthStatus = self.send(self.http.get(url)).await?.json().await?;
        Ok(status)
    }
}
