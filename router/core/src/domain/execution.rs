// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Execution
//!
//! Request and result envelopes for task execution, plus the normalised
//! handler set used by streaming execution.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Uniform payload/result shapes independent of the vendor

use crate::domain::provider::{
    AudioInput, EmbeddingResponse, FinishReason, GenerationOptions, GenerationResponse,
    ImageResponse, StreamChunk, TranscriptionResponse,
};
use crate::domain::selection::SelectionTier;
use crate::domain::task::TaskType;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What the caller hands to a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    Text(String),
    Audio(AudioInput),
}

impl TaskPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TaskPayload::Text(text) => Some(text),
            TaskPayload::Audio(_) => None,
        }
    }
}

impl From<&str> for TaskPayload {
    fn from(value: &str) -> Self {
        TaskPayload::Text(value.to_string())
    }
}

impl From<String> for TaskPayload {
    fn from(value: String) -> Self {
        TaskPayload::Text(value)
    }
}

impl From<AudioInput> for TaskPayload {
    fn from(value: AudioInput) -> Self {
        TaskPayload::Audio(value)
    }
}

/// Adapter output, one variant per dispatched operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskResult {
    Content(GenerationResponse),
    Image(ImageResponse),
    Transcription(TranscriptionResponse),
    Embeddings(EmbeddingResponse),
}

/// Uniform envelope returned by every successful execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub execution_id: Uuid,
    pub result: TaskResult,
    pub provider_name: String,
    pub latency_ms: u64,
    pub task_type: TaskType,
    pub tier: SelectionTier,
    /// Adapter calls made, including retries
    pub attempts: u32,
}

/// Per-call execution controls
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub generation: GenerationOptions,

    /// Aborts the in-flight adapter call when cancelled
    pub cancellation: Option<CancellationToken>,

    /// Deadline for each adapter call
    pub timeout: Option<Duration>,
}

impl ExecutionOptions {
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Aggregate handed to the completion handler once a stream ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub text: String,
    pub chunks: usize,
    pub finish_reason: Option<FinishReason>,
}

/// Envelope returned once a streamed execution has been fully consumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamExecution {
    pub execution_id: Uuid,
    pub summary: StreamSummary,
    pub provider_name: String,
    pub latency_ms: u64,
    pub task_type: TaskType,
    pub tier: SelectionTier,
}

pub type ChunkHandler = Box<dyn FnMut(&StreamChunk) + Send>;
pub type CompleteHandler = Box<dyn FnOnce(&StreamSummary) + Send>;

/// Single-object call shape for streaming execution
pub struct StreamOptions {
    pub on_chunk: ChunkHandler,
    pub on_complete: Option<CompleteHandler>,
    pub execution: ExecutionOptions,
}

impl StreamOptions {
    pub fn new(on_chunk: impl FnMut(&StreamChunk) + Send + 'static) -> Self {
        Self {
            on_chunk: Box::new(on_chunk),
            on_complete: None,
            execution: ExecutionOptions::default(),
        }
    }

    pub fn on_complete(mut self, handler: impl FnOnce(&StreamSummary) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    pub fn execution(mut self, execution: ExecutionOptions) -> Self {
        self.execution = execution;
        self
    }
}

/// Third argument of streaming execution: a chunk handler, or a
/// [`StreamOptions`] carrying every handler at once
pub enum StreamArgument {
    OnChunk(ChunkHandler),
    Options(StreamOptions),
}

impl StreamArgument {
    pub fn on_chunk(handler: impl FnMut(&StreamChunk) + Send + 'static) -> Self {
        StreamArgument::OnChunk(Box::new(handler))
    }
}

impl From<StreamOptions> for StreamArgument {
    fn from(options: StreamOptions) -> Self {
        StreamArgument::Options(options)
    }
}

/// Normalised handler set; both call shapes collapse into this
pub struct StreamHandlers {
    pub on_chunk: ChunkHandler,
    pub on_complete: Option<CompleteHandler>,
    pub execution: ExecutionOptions,
}

impl StreamHandlers {
    /// Merge the positional and object call shapes.
    ///
    /// Handlers carried in a [`StreamOptions`] take precedence over the
    /// positional `on_complete`; explicit `options` replace the ones carried
    /// in the object.
    pub fn normalize(
        argument: StreamArgument,
        on_complete: Option<CompleteHandler>,
        options: Option<ExecutionOptions>,
    ) -> Self {
        match argument {
            StreamArgument::OnChunk(on_chunk) => Self {
                on_chunk,
                on_complete,
                execution: options.unwrap_or_default(),
            },
            StreamArgument::Options(carried) => Self {
                on_chunk: carried.on_chunk,
                on_complete: carried.on_complete.or(on_complete),
                execution: options.unwrap_or(carried.execution),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_positional_shape_normalizes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut handlers = StreamHandlers::normalize(
            StreamArgument::on_chunk(move |c| sink.lock().unwrap().push(c.text.clone())),
            None,
            Some(ExecutionOptions::default().with_timeout(Duration::from_secs(5))),
        );

        (handlers.on_chunk)(&StreamChunk::text("hi"));
        assert_eq!(*seen.lock().unwrap(), vec!["hi".to_string()]);
        assert!(handlers.on_complete.is_none());
        assert_eq!(handlers.execution.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_object_shape_keeps_carried_handlers() {
        let completed = Arc::new(Mutex::new(false));
        let flag = completed.clone();
        let options = StreamOptions::new(|_| {})
            .on_complete(move |_| *flag.lock().unwrap() = true)
            .execution(ExecutionOptions::default().with_timeout(Duration::from_secs(9)));

        let handlers = StreamHandlers::normalize(options.into(), None, None);
        assert_eq!(handlers.execution.timeout, Some(Duration::from_secs(9)));

        let on_complete = handlers.on_complete.expect("carried completion handler");
        on_complete(&StreamSummary::default());
        assert!(*completed.lock().unwrap());
    }

    #[test]
    fn test_object_shape_falls_back_to_positional_completion() {
        let handlers = StreamHandlers::normalize(
            StreamOptions::new(|_| {}).into(),
            Some(Box::new(|_| {})),
            None,
        );
        assert!(handlers.on_complete.is_some());
    }
}
