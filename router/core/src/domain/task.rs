// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Task Types - Abstract categories of work requested by callers
//
// A task type is independent of which vendor fulfils it. Each known task type
// maps to exactly one required capability flag and one adapter operation.

use crate::domain::capability::Capability;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    TextGeneration,
    ImageGeneration,
    AudioTranscription,
    Embeddings,
    CodeExecution,
    Transform,
    Vision,
    /// Any task type the router has no built-in knowledge of.
    Other(String),
}

/// Adapter operation a task type dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    GenerateContent,
    GenerateImage,
    TranscribeAudio,
    GenerateEmbeddings,
    ExecuteCode,
}

impl TaskType {
    /// The built-in task types, in the order they are seeded into the task map
    pub const KNOWN: [TaskType; 7] = [
        TaskType::TextGeneration,
        TaskType::ImageGeneration,
        TaskType::AudioTranscription,
        TaskType::Embeddings,
        TaskType::CodeExecution,
        TaskType::Transform,
        TaskType::Vision,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TaskType::TextGeneration => "text-generation",
            TaskType::ImageGeneration => "image-generation",
            TaskType::AudioTranscription => "audio-transcription",
            TaskType::Embeddings => "embeddings",
            TaskType::CodeExecution => "code-execution",
            TaskType::Transform => "transform",
            TaskType::Vision => "vision",
            TaskType::Other(name) => name,
        }
    }

    /// Capability flag a provider must declare to serve this task type.
    /// `None` means capability negotiation always fails for it.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            TaskType::TextGeneration => Some(Capability::Text),
            TaskType::ImageGeneration => Some(Capability::Images),
            TaskType::AudioTranscription => Some(Capability::Audio),
            TaskType::Embeddings => Some(Capability::Embeddings),
            TaskType::CodeExecution => Some(Capability::CodeExecution),
            TaskType::Transform | TaskType::Vision => Some(Capability::Multimodal),
            TaskType::Other(_) => None,
        }
    }

    pub fn operation(&self) -> Option<TaskOperation> {
        match self {
            TaskType::TextGeneration | TaskType::Transform | TaskType::Vision => {
                Some(TaskOperation::GenerateContent)
            }
            TaskType::ImageGeneration => Some(TaskOperation::GenerateImage),
            TaskType::AudioTranscription => Some(TaskOperation::TranscribeAudio),
            TaskType::Embeddings => Some(TaskOperation::GenerateEmbeddings),
            TaskType::CodeExecution => Some(TaskOperation::ExecuteCode),
            TaskType::Other(_) => None,
        }
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        TaskType::KNOWN
            .iter()
            .find(|t| t.as_str() == trimmed)
            .cloned()
            .unwrap_or_else(|| TaskType::Other(trimmed.to_string()))
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        TaskType::from(value.as_str())
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for TaskType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaskType::from(s))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
