// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Task Executor - dispatch, retry, deadline and metrics for one task call
//
// Receives an already-selected provider and its adapter, maps the task type
// to the adapter operation, and records exactly one metrics event per call
// regardless of how many attempts the retry policy made. Errors are recorded
// against the attempted provider and returned to the caller unchanged.

use crate::domain::capability::{Capability, CapabilitySet};
use crate::domain::error::{RouterError, RouterResult};
use crate::domain::events::RouterEvent;
use crate::domain::execution::{
    ExecutionOptions, StreamExecution, StreamHandlers, StreamSummary, TaskExecution, TaskPayload,
    TaskResult,
};
use crate::domain::metrics::Outcome;
use crate::domain::provider::{AudioInput, ProviderAdapter, ProviderError};
use crate::domain::router_config::RetryConfig;
use crate::domain::selection::ProviderSelection;
use crate::domain::task::{TaskOperation, TaskType};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::metrics_recorder::{MetricsRecorder, UNKNOWN_PROVIDER};
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct TaskExecutor {
    metrics: Arc<MetricsRecorder>,
    retry: RetryConfig,
    event_bus: EventBus,
}

impl TaskExecutor {
    pub fn new(metrics: Arc<MetricsRecorder>, retry: RetryConfig, event_bus: EventBus) -> Self {
        Self {
            metrics,
            retry,
            event_bus,
        }
    }

    /// Run `task_type` against the selected provider
    pub async fn execute(
        &self,
        task_type: &TaskType,
        selection: &ProviderSelection,
        adapter: Arc<dyn ProviderAdapter>,
        payload: &TaskPayload,
        options: &ExecutionOptions,
    ) -> RouterResult<TaskExecution> {
        let execution_id = Uuid::new_v4();
        let provider = selection.provider_type.as_str();
        let start = Instant::now();

        let (outcome, attempts) = self
            .run_with_retry(task_type, provider, adapter.as_ref(), payload, options)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                self.record_success(execution_id, task_type, provider, latency_ms, attempts);
                Ok(TaskExecution {
                    execution_id,
                    result,
                    provider_name: provider.to_string(),
                    latency_ms,
                    task_type: task_type.clone(),
                    tier: selection.tier,
                    attempts,
                })
            }
            Err(e) => {
                self.record_failure(execution_id, task_type, provider, &e, attempts);
                Err(e)
            }
        }
    }

    /// Stream a content task, forwarding chunks as they arrive.
    ///
    /// `capabilities` are the provider's effective capabilities; without
    /// STREAMING the call fails before the adapter is touched. Streams are
    /// never retried.
    pub async fn execute_stream(
        &self,
        task_type: &TaskType,
        selection: &ProviderSelection,
        adapter: Arc<dyn ProviderAdapter>,
        capabilities: &CapabilitySet,
        prompt: &str,
        handlers: StreamHandlers,
    ) -> RouterResult<StreamExecution> {
        let execution_id = Uuid::new_v4();
        let provider = selection.provider_type.as_str();
        let start = Instant::now();

        let outcome = match task_type.operation() {
            Some(TaskOperation::GenerateContent) if capabilities.supports(Capability::Streaming) => {
                Self::consume_stream(task_type, provider, adapter.as_ref(), prompt, handlers).await
            }
            Some(TaskOperation::GenerateContent) => Err(RouterError::StreamingUnsupported {
                provider: provider.to_string(),
                task_type: task_type.clone(),
            }),
            _ => Err(RouterError::UnsupportedTask(task_type.clone())),
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(summary) => {
                self.record_success(execution_id, task_type, provider, latency_ms, 1);
                Ok(StreamExecution {
                    execution_id,
                    summary,
                    provider_name: provider.to_string(),
                    latency_ms,
                    task_type: task_type.clone(),
                    tier: selection.tier,
                })
            }
            Err(e) => {
                let attempts = match e {
                    RouterError::StreamingUnsupported { .. } | RouterError::UnsupportedTask(_) => 0,
                    _ => 1,
                };
                self.record_failure(execution_id, task_type, provider, &e, attempts);
                Err(e)
            }
        }
    }

    /// Record a call that failed before reaching the adapter. Without a
    /// provider the error is booked against "unknown".
    pub fn record_rejected(&self, task_type: &TaskType, provider: Option<&str>, error: &RouterError) {
        let provider = provider.unwrap_or(UNKNOWN_PROVIDER);
        self.record_failure(Uuid::new_v4(), task_type, provider, error, 0);
    }

    async fn run_with_retry(
        &self,
        task_type: &TaskType,
        provider: &str,
        adapter: &dyn ProviderAdapter,
        payload: &TaskPayload,
        options: &ExecutionOptions,
    ) -> (RouterResult<TaskResult>, u32) {
        let policy = self.retry.policy_for(task_type);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = Self::dispatch(task_type, provider, adapter, payload, options).await;

            match result {
                Err(RouterError::Provider { ref source, .. })
                    if source.is_retryable() && attempt <= policy.max_retries =>
                {
                    let delay = policy.delay_for(attempt - 1);
                    warn!(
                        "Task '{}' on '{}' failed (attempt {}/{}): {}; retrying in {}ms",
                        task_type,
                        provider,
                        attempt,
                        policy.max_retries + 1,
                        source,
                        delay.as_millis()
                    );
                    if !backoff(delay, options.cancellation.as_ref()).await {
                        let cancelled = RouterError::Cancelled {
                            provider: provider.to_string(),
                            task_type: task_type.clone(),
                        };
                        return (Err(cancelled), attempt);
                    }
                }
                other => return (other, attempt),
            }
        }
    }

    async fn dispatch(
        task_type: &TaskType,
        provider: &str,
        adapter: &dyn ProviderAdapter,
        payload: &TaskPayload,
        options: &ExecutionOptions,
    ) -> RouterResult<TaskResult> {
        let operation = task_type
            .operation()
            .ok_or_else(|| RouterError::UnsupportedTask(task_type.clone()))?;
        let generation = &options.generation;

        match operation {
            TaskOperation::GenerateContent => {
                let prompt = text_payload(task_type, payload)?;
                guarded(adapter.generate_content(prompt, generation), provider, task_type, options)
                    .await
                    .map(TaskResult::Content)
            }
            TaskOperation::GenerateImage => {
                let prompt = text_payload(task_type, payload)?;
                guarded(adapter.generate_image(prompt, generation), provider, task_type, options)
                    .await
                    .map(TaskResult::Image)
            }
            TaskOperation::GenerateEmbeddings => {
                let content = text_payload(task_type, payload)?;
                guarded(adapter.generate_embeddings(content, generation), provider, task_type, options)
                    .await
                    .map(TaskResult::Embeddings)
            }
            TaskOperation::TranscribeAudio => {
                let audio = audio_payload(task_type, payload)?;
                guarded(adapter.transcribe_audio(audio, generation), provider, task_type, options)
                    .await
                    .map(TaskResult::Transcription)
            }
            TaskOperation::ExecuteCode => Err(RouterError::CapabilityUnsupported {
                provider: provider.to_string(),
                task_type: task_type.clone(),
                capability: Capability::CodeExecution,
            }),
        }
    }

    async fn consume_stream(
        task_type: &TaskType,
        provider: &str,
        adapter: &dyn ProviderAdapter,
        prompt: &str,
        handlers: StreamHandlers,
    ) -> RouterResult<StreamSummary> {
        let StreamHandlers {
            mut on_chunk,
            on_complete,
            execution,
        } = handlers;

        let stream_call = async {
            let mut stream = adapter
                .generate_content_stream(prompt, &execution.generation)
                .await?;
            let mut summary = StreamSummary::default();

            while let Some(item) = stream.next().await {
                let chunk = item?;
                summary.chunks += 1;
                summary.text.push_str(&chunk.text);
                if chunk.finish_reason.is_some() {
                    summary.finish_reason = chunk.finish_reason.clone();
                }
                on_chunk(&chunk);
            }
            Ok::<_, ProviderError>(summary)
        };

        let summary = guarded(stream_call, provider, task_type, &execution).await?;
        debug!(
            "Stream for task '{}' on '{}' finished after {} chunks",
            task_type, provider, summary.chunks
        );

        if let Some(on_complete) = on_complete {
            on_complete(&summary);
        }
        Ok(summary)
    }

    fn record_success(
        &self,
        execution_id: Uuid,
        task_type: &TaskType,
        provider: &str,
        latency_ms: u64,
        attempts: u32,
    ) {
        self.metrics.record(provider, Outcome::Success, Some(latency_ms));
        info!(
            "Task '{}' completed on '{}' in {}ms (attempt {})",
            task_type, provider, latency_ms, attempts
        );
        self.event_bus.publish(RouterEvent::TaskCompleted {
            execution_id,
            task_type: task_type.clone(),
            provider_type: provider.to_string(),
            latency_ms,
            attempts,
            completed_at: Utc::now(),
        });
    }

    fn record_failure(
        &self,
        execution_id: Uuid,
        task_type: &TaskType,
        provider: &str,
        error: &RouterError,
        attempts: u32,
    ) {
        self.metrics.record(provider, Outcome::Error, None);
        warn!("Task '{}' failed on '{}': {}", task_type, provider, error);
        self.event_bus.publish(RouterEvent::TaskFailed {
            execution_id,
            task_type: task_type.clone(),
            provider_type: provider.to_string(),
            error: error.to_string(),
            attempts,
            failed_at: Utc::now(),
        });
    }
}

/// Race an adapter call against the caller's deadline and cancellation token
async fn guarded<T, F>(
    call: F,
    provider: &str,
    task_type: &TaskType,
    options: &ExecutionOptions,
) -> RouterResult<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let provider_error = |source: ProviderError| RouterError::Provider {
        provider: provider.to_string(),
        task_type: task_type.clone(),
        source,
    };

    let bounded = async {
        match options.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(result) => result.map_err(provider_error),
                Err(_) => Err(RouterError::TimedOut {
                    provider: provider.to_string(),
                    task_type: task_type.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            },
            None => call.await.map_err(provider_error),
        }
    };

    match &options.cancellation {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(RouterError::Cancelled {
                provider: provider.to_string(),
                task_type: task_type.clone(),
            }),
            result = bounded => result,
        },
        None => bounded.await,
    }
}

/// Sleep for `delay`; false when cancelled first
async fn backoff(delay: Duration, cancellation: Option<&CancellationToken>) -> bool {
    match cancellation {
        Some(token) => tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

fn text_payload<'a>(task_type: &TaskType, payload: &'a TaskPayload) -> RouterResult<&'a str> {
    payload.as_text().ok_or_else(|| RouterError::InvalidPayload {
        task_type: task_type.clone(),
        reason: "expected a text prompt".to_string(),
    })
}

fn audio_payload<'a>(task_type: &TaskType, payload: &'a TaskPayload) -> RouterResult<&'a AudioInput> {
    match payload {
        TaskPayload::Audio(audio) => Ok(audio),
        TaskPayload::Text(_) => Err(RouterError::InvalidPayload {
            task_type: task_type.clone(),
            reason: "expected audio input".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_times_out() {
        let options = ExecutionOptions::default().with_timeout(Duration::from_millis(10));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ProviderError>(())
        };

        let err = guarded(slow, "gemini", &TaskType::TextGeneration, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::TimedOut { timeout_ms: 10, .. }));
    }

    #[tokio::test]
    async fn test_guarded_honours_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let options = ExecutionOptions::default().with_cancellation(token);

        let err = guarded(
            std::future::pending::<Result<(), ProviderError>>(),
            "zai",
            &TaskType::Vision,
            &options,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RouterError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_guarded_maps_provider_error() {
        let err = guarded(
            async { Err::<(), _>(ProviderError::RateLimit) },
            "local",
            &TaskType::Embeddings,
            &ExecutionOptions::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.provider(), Some("local"));
        assert_eq!(err.provider_error(), Some(&ProviderError::RateLimit));
    }

    #[tokio::test]
    async fn test_backoff_interrupted_by_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!backoff(Duration::from_secs(60), Some(&token)).await);
        assert!(backoff(Duration::from_millis(1), None).await);
    }

    #[test]
    fn test_payload_shape_checks() {
        let audio = TaskPayload::Audio(AudioInput {
            data: vec![1, 2, 3],
            mime_type: "audio/webm".to_string(),
        });
        assert!(text_payload(&TaskType::TextGeneration, &audio).is_err());
        assert!(audio_payload(&TaskType::AudioTranscription, &"hello".into()).is_err());
        assert!(audio_payload(&TaskType::AudioTranscription, &audio).is_ok());
    }
}
