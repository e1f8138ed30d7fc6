// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Streaming execution: capability enforcement before any chunk, both
//! handler call shapes, and metrics accounting.

mod common;

use common::activate_mock;
use glassy_router::capability::Capability;
use glassy_router::error::RouterError;
use glassy_router::execution::{ExecutionOptions, StreamArgument, StreamOptions, StreamSummary};
use glassy_router::task::TaskType;
use glassy_router::ProviderRouter;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_non_streaming_provider_rejected_before_any_chunk() {
    let router = ProviderRouter::new();
    let behaviour = activate_mock(&router, "zai", &[Capability::Text]);
    behaviour.set_chunks(&["never", "seen"]);

    let fired = Arc::new(Mutex::new(0usize));
    let counter = fired.clone();

    let err = router
        .execute_task_stream(
            TaskType::TextGeneration,
            "stream please",
            StreamArgument::on_chunk(move |_| *counter.lock().unwrap() += 1),
            None,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::StreamingUnsupported { ref provider, .. } if provider == "zai"));
    assert_eq!(*fired.lock().unwrap(), 0);
    assert_eq!(behaviour.calls(), 0);
    assert_eq!(router.get_provider_metrics("zai").unwrap().error_count, 1);
}

#[tokio::test]
async fn test_positional_handlers_receive_chunks_and_summary() {
    let router = ProviderRouter::new();
    let behaviour = activate_mock(&router, "gemini", &[Capability::Text, Capability::Streaming]);
    behaviour.set_chunks(&["Hel", "lo", "!"]);

    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink = chunks.clone();
    let completed = Arc::new(Mutex::new(None::<StreamSummary>));
    let done = completed.clone();

    let execution = router
        .execute_task_stream(
            "text-generation",
            "greet",
            StreamArgument::on_chunk(move |chunk| sink.lock().unwrap().push(chunk.text.clone())),
            Some(Box::new(move |summary: &StreamSummary| {
                *done.lock().unwrap() = Some(summary.clone())
            })),
            None,
        )
        .await
        .unwrap();

    assert_eq!(*chunks.lock().unwrap(), vec!["Hel", "lo", "!"]);
    let summary = completed.lock().unwrap().clone().unwrap();
    assert_eq!(summary.text, "Hello!");
    assert_eq!(summary.chunks, 3);
    assert_eq!(execution.summary, summary);
    assert_eq!(execution.provider_name, "gemini");
    assert_eq!(router.get_provider_metrics("gemini").unwrap().success_count, 1);
}

#[tokio::test]
async fn test_options_object_shape() {
    let router = ProviderRouter::new();
    let behaviour = activate_mock(&router, "gemini", &[Capability::Text, Capability::Streaming]);
    behaviour.set_chunks(&["a", "b"]);

    let text = Arc::new(Mutex::new(String::new()));
    let sink = text.clone();
    let final_text = Arc::new(Mutex::new(String::new()));
    let done = final_text.clone();

    let options = StreamOptions::new(move |chunk| sink.lock().unwrap().push_str(&chunk.text))
        .on_complete(move |summary| *done.lock().unwrap() = summary.text.clone())
        .execution(ExecutionOptions::default().with_timeout(Duration::from_secs(5)));

    router
        .execute_task_stream("transform", "abc", options, None, None)
        .await
        .unwrap();

    assert_eq!(*text.lock().unwrap(), "ab");
    assert_eq!(*final_text.lock().unwrap(), "ab");
}

#[tokio::test]
async fn test_streaming_non_content_task_is_unsupported() {
    let router = ProviderRouter::new();
    activate_mock(&router, "gemini", &[Capability::Embeddings, Capability::Streaming]);

    let err = router
        .execute_task_stream(
            TaskType::Embeddings,
            "vector",
            StreamArgument::on_chunk(|_| {}),
            None,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::UnsupportedTask(TaskType::Embeddings)));
}

#[tokio::test]
async fn test_stream_deadline() {
    let router = ProviderRouter::new();
    let behaviour = activate_mock(&router, "gemini", &[Capability::Text, Capability::Streaming]);
    behaviour.set_delay(Duration::from_secs(5));

    let err = router
        .execute_task_stream(
            "text-generation",
            "slow",
            StreamArgument::on_chunk(|_| {}),
            None,
            Some(ExecutionOptions::default().with_timeout(Duration::from_millis(20))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::TimedOut { .. }));
}

#[tokio::test]
async fn test_cancellation_stops_stream_consumption() {
    let router = ProviderRouter::new();
    let behaviour = activate_mock(&router, "gemini", &[Capability::Text, Capability::Streaming]);
    behaviour.set_chunks(&["one", "two", "three", "four"]);
    *behaviour.chunk_delay.lock() = Some(Duration::from_millis(50));

    let token = CancellationToken::new();
    let trigger = token.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let completed = Arc::new(Mutex::new(false));
    let done = completed.clone();

    let options = StreamOptions::new(move |chunk| {
        sink.lock().unwrap().push(chunk.text.clone());
        trigger.cancel();
    })
    .on_complete(move |_| *done.lock().unwrap() = true)
    .execution(ExecutionOptions::default().with_cancellation(token));

    let err = router
        .execute_task_stream("text-generation", "stop early", options, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::Cancelled { .. }));
    assert_eq!(*seen.lock().unwrap(), vec!["one"]);
    assert!(!*completed.lock().unwrap());

    let metrics = router.get_provider_metrics("gemini").unwrap();
    assert_eq!(metrics.error_count, 1);
    assert_eq!(metrics.success_count, 0);
}
