// Copyright (c) 2026 Glassy Dash Contributors
// SPDX-License-Identifier: AGPL-3.0

// Task-to-Provider Map - ordered provider preferences per task type
//
// Seeded with built-in defaults; configuration overrides and runtime
// `set` calls replace whole entries. Unknown task types map to an empty list.

use crate::domain::task::TaskType;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProviderMap {
    entries: BTreeMap<TaskType, Vec<String>>,
}

impl TaskProviderMap {
    /// Built-in preferences
    pub fn with_defaults() -> Self {
        let defaults: [(TaskType, &[&str]); 7] = [
            (TaskType::TextGeneration, &["gemini", "zai", "local"]),
            (TaskType::ImageGeneration, &["gemini"]),
            (TaskType::AudioTranscription, &["gemini"]),
            (TaskType::Embeddings, &["gemini", "local"]),
            (TaskType::CodeExecution, &["gemini"]),
            (TaskType::Transform, &["gemini", "zai"]),
            (TaskType::Vision, &["gemini", "zai"]),
        ];

        let entries = defaults
            .into_iter()
            .map(|(task, providers)| {
                (task, providers.iter().map(|p| p.to_string()).collect())
            })
            .collect();

        Self { entries }
    }

    /// Defaults with `overrides` replacing matching entries
    pub fn with_overrides(overrides: &BTreeMap<TaskType, Vec<String>>) -> Self {
        let mut map = Self::with_defaults();
        for (task, providers) in overrides {
            map.set(task.clone(), providers.clone());
        }
        map
    }

    /// Preference list for `task_type`; empty when unmapped
    pub fn get(&self, task_type: &TaskType) -> &[String] {
        self.entries
            .get(task_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace the whole preference list for `task_type`
    pub fn set(&mut self, task_type: TaskType, providers: Vec<String>) {
        self.entries.insert(task_type, providers);
    }

    pub fn all(&self) -> &BTreeMap<TaskType, Vec<String>> {
        &self.entries
    }
}

impl Default for TaskProviderMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}
