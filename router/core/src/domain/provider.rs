// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Provider
//!
//! Uniform contract every AI vendor adapter implements.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption boundary between routing logic and vendor APIs

// Provider Adapter Domain Interface (Anti-Corruption Layer)
//
// Vendor adapters (Gemini, Z.ai, local models) live outside this crate and
// implement `ProviderAdapter`. The router only ever talks to this trait, so
// adapters must be stateless per call: the router shares a single instance
// per provider type across concurrent executions.

use crate::domain::capability::CapabilitySet;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Domain interface for AI provider adapters
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider type name this adapter serves (e.g. "gemini")
    fn provider_type(&self) -> &str;

    /// Capabilities declared by this instance. Fixed for the instance lifetime.
    fn capabilities(&self) -> &CapabilitySet;

    /// Whether the adapter is ready to take calls (credentials present, etc.)
    fn is_available(&self) -> bool;

    /// Generate a completion for a text (or multimodal) prompt
    async fn generate_content(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, ProviderError>;

    /// Stream a completion chunk by chunk
    async fn generate_content_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<ContentStream, ProviderError>;

    /// Produce embedding vectors for `content`
    async fn generate_embeddings(
        &self,
        content: &str,
        options: &GenerationOptions,
    ) -> Result<EmbeddingResponse, ProviderError>;

    /// Transcribe (and optionally summarise) an audio clip
    async fn transcribe_audio(
        &self,
        audio: &AudioInput,
        options: &GenerationOptions,
    ) -> Result<TranscriptionResponse, ProviderError>;

    /// Generate an image from a prompt
    async fn generate_image(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<ImageResponse, ProviderError>;

    /// Count the tokens `content` would consume
    async fn count_tokens(
        &self,
        content: &str,
        options: &GenerationOptions,
    ) -> Result<u32, ProviderError>;

    /// Liveness probe. The default performs the smallest possible generation.
    async fn health_check(&self) -> Result<(), ProviderError> {
        self.generate_content("ping", &GenerationOptions::probe())
            .await
            .map(|_| ())
    }
}

/// Stream of content chunks returned by streaming generation
pub type ContentStream = BoxStream<'static, Result<StreamChunk, ProviderError>>;

/// Options for a single adapter call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,

    /// Sequences that stop generation
    pub stop_sequences: Option<Vec<String>>,

    /// System instruction prepended by adapters that support one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Per-call model override; adapters fall back to their configured model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationOptions {
    /// Minimal budget used by liveness probes
    pub fn probe() -> Self {
        Self {
            max_tokens: Some(1),
            temperature: Some(0.0),
            ..Self::default()
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.7),
            stop_sequences: None,
            system_instruction: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub content: String,

    /// Source citations (grounded generation), if the vendor returns any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    /// Model used (e.g., "gemini-2.0-flash")
    pub model: String,

    /// Provider name (e.g., "gemini", "zai")
    pub provider: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,

    /// Token usage stats
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter
    ContentFilter,
}

/// One increment of a streamed completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: String,

    /// Set on the final chunk when the vendor reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
    pub provider: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInput {
    pub data: Vec<u8>,
    /// MIME type, e.g. "audio/webm"
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// URL or data URI of the generated image
    pub image_url: String,
    pub provider: String,
    pub model: String,
}

/// Errors an adapter can report
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl ProviderError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::RateLimit | ProviderError::Timeout(_)
        )
    }
}
