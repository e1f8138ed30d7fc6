// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Scriptable in-memory adapter shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use glassy_router::capability::{Capability, CapabilitySet};
use glassy_router::provider::{
    AudioInput, ContentStream, EmbeddingResponse, FinishReason, GenerationOptions,
    GenerationResponse, ImageResponse, ProviderAdapter, ProviderError, StreamChunk, TokenUsage,
    TranscriptionResponse,
};
use glassy_router::provider_config::{ProviderConfiguration, ProviderDefaults};
use glassy_router::ProviderRouter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Knobs shared between a test and every adapter instance built from it
#[derive(Default)]
pub struct MockBehaviour {
    /// Errors returned by the next calls, oldest first
    pub failures: Mutex<VecDeque<ProviderError>>,
    pub delay: Mutex<Option<Duration>>,
    /// Pause before each streamed chunk
    pub chunk_delay: Mutex<Option<Duration>>,
    pub chunks: Mutex<Vec<String>>,
    pub health_error: Mutex<Option<ProviderError>>,
    pub calls: AtomicU32,
    pub builds: AtomicU32,
}

impl MockBehaviour {
    pub fn fail_next(&self, error: ProviderError) {
        self.failures.lock().push_back(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn set_chunks(&self, chunks: &[&str]) {
        *self.chunks.lock() = chunks.iter().map(|c| c.to_string()).collect();
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct MockAdapter {
    provider_type: String,
    model: String,
    capabilities: CapabilitySet,
    behaviour: Arc<MockBehaviour>,
}

impl MockAdapter {
    async fn call(&self) -> Result<(), ProviderError> {
        self.behaviour.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.behaviour.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.behaviour.failures.lock().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn generate_content(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationResponse, ProviderError> {
        self.call().await?;
        Ok(GenerationResponse {
            content: format!("{} says: {}", self.provider_type, prompt),
            citations: vec![],
            model: self.model.clone(),
            provider: self.provider_type.clone(),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        })
    }

    async fn generate_content_stream(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<ContentStream, ProviderError> {
        self.call().await?;
        let chunks: Vec<Result<StreamChunk, ProviderError>> = self
            .behaviour
            .chunks
            .lock()
            .iter()
            .map(|c| Ok(StreamChunk::text(c.clone())))
            .collect();
        let chunk_delay = *self.behaviour.chunk_delay.lock();
        let stream = futures::stream::iter(chunks).then(move |chunk| async move {
            if let Some(delay) = chunk_delay {
                tokio::time::sleep(delay).await;
            }
            chunk
        });
        Ok(Box::pin(stream))
    }

    async fn generate_embeddings(
        &self,
        _content: &str,
        _options: &GenerationOptions,
    ) -> Result<EmbeddingResponse, ProviderError> {
        self.call().await?;
        Ok(EmbeddingResponse {
            embeddings: vec![vec![0.1, 0.2, 0.3]],
            model: self.model.clone(),
            provider: self.provider_type.clone(),
            usage: TokenUsage::default(),
        })
    }

    async fn transcribe_audio(
        &self,
        audio: &AudioInput,
        _options: &GenerationOptions,
    ) -> Result<TranscriptionResponse, ProviderError> {
        self.call().await?;
        Ok(TranscriptionResponse {
            transcript: format!("{} bytes of {}", audio.data.len(), audio.mime_type),
            summary: None,
            language: Some("en".to_string()),
            provider: self.provider_type.clone(),
        })
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<ImageResponse, ProviderError> {
        self.call().await?;
        Ok(ImageResponse {
            image_url: format!("https://images.test/{}", prompt.replace(' ', "-")),
            provider: self.provider_type.clone(),
            model: self.model.clone(),
        })
    }

    async fn count_tokens(
        &self,
        content: &str,
        _options: &GenerationOptions,
    ) -> Result<u32, ProviderError> {
        Ok(content.split_whitespace().count() as u32)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let error = self.behaviour.health_error.lock().clone();
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Register a mock provider type declaring `capabilities`; returns its knobs
pub fn register_mock(
    router: &ProviderRouter,
    provider_type: &str,
    capabilities: &[Capability],
) -> Arc<MockBehaviour> {
    register_mock_with(router, provider_type, capabilities, |_| {})
}

/// Like [`register_mock`], running `on_build` inside the constructor
pub fn register_mock_with(
    router: &ProviderRouter,
    provider_type: &str,
    capabilities: &[Capability],
    on_build: impl Fn(&ProviderConfiguration) + Send + Sync + 'static,
) -> Arc<MockBehaviour> {
    let behaviour = Arc::new(MockBehaviour::default());
    let shared = behaviour.clone();
    let declared = CapabilitySet::from_flags(capabilities.iter().copied());
    let name = provider_type.to_string();

    router.register_provider(
        provider_type,
        move |config: &ProviderConfiguration| {
            on_build(config);
            shared.builds.fetch_add(1, Ordering::SeqCst);
            let adapter: Arc<dyn ProviderAdapter> = Arc::new(MockAdapter {
                provider_type: name.clone(),
                model: config.model.clone().unwrap_or_else(|| "mock-1".to_string()),
                capabilities: declared.clone(),
                behaviour: shared.clone(),
            });
            Ok(adapter)
        },
        ProviderDefaults::default(),
    );
    behaviour
}

/// Register a mock and add an active, keyed user configuration for it
pub fn activate_mock(
    router: &ProviderRouter,
    provider_type: &str,
    capabilities: &[Capability],
) -> Arc<MockBehaviour> {
    let behaviour = register_mock(router, provider_type, capabilities);
    router
        .add_user_provider(ProviderConfiguration::new(provider_type).with_api_key("test-key"))
        .expect("mock provider should be added");
    behaviour
}
