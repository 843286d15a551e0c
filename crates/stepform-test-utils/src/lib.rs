//! Testing utilities for the stepform workspace
//!
//! Shared fixtures: the dataset-upload wizard, in-memory files, a recording
//! submit handler and a scripted search provider.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use stepform_core::{EngineConfig, FormEngine, Step, SubmitError, SubmitHandler};
use stepform_render::{SearchError, SearchProvider};
use stepform_schema::{
    ChipProps, DateProps, FieldDescriptor, FieldKind, FieldOption, FieldPath, FileProps, FormValueTree,
    SelectProps, TextProps, TextareaProps,
};
use stepform_upload::{FileSource, InMemoryFile};

pub const MIB: u64 = 1024 * 1024;

/// Parse a path, panicking on malformed input
pub fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

pub fn licenses() -> Vec<FieldOption> {
    vec![
        FieldOption::new("cc-by", "CC BY 4.0"),
        FieldOption::new("cc0", "CC0 1.0"),
        FieldOption::new("mit", "MIT"),
    ]
}

/// Three steps: Basics (title required), Details, Files
pub fn dataset_steps() -> Vec<Step> {
    let title = FieldDescriptor::parse(
        "title",
        FieldKind::Text(TextProps {
            min_length: Some(1),
            max_length: Some(120),
            pattern: None,
        }),
        "Title",
    )
    .unwrap()
    .required();
    let summary = FieldDescriptor::parse(
        "summary",
        FieldKind::Textarea(TextareaProps {
            max_length: Some(500),
            ..TextareaProps::default()
        }),
        "Summary",
    )
    .unwrap();
    let license = FieldDescriptor::parse(
        "license",
        FieldKind::Select(SelectProps {
            options: licenses(),
            ..SelectProps::default()
        }),
        "License",
    )
    .unwrap();
    let tags = FieldDescriptor::parse(
        "tags",
        FieldKind::Chip(ChipProps {
            max_items: Some(5),
            ..ChipProps::default()
        }),
        "Tags",
    )
    .unwrap();
    let published = FieldDescriptor::parse("meta.published", FieldKind::Date(DateProps::default()), "Published")
        .unwrap();
    let data = FieldDescriptor::parse(
        "data",
        FieldKind::File(FileProps {
            accept: vec!["csv".into(), "json".into()],
            max_size_bytes: Some(10 * MIB),
            multiple: true,
        }),
        "Data files",
    )
    .unwrap();
    let terms = FieldDescriptor::parse("terms", FieldKind::Checkbox, "I accept the terms")
        .unwrap()
        .required();

    vec![
        Step::new("Basics")
            .with_description("Name and describe the dataset")
            .with_field(title)
            .with_field(summary),
        Step::new("Details")
            .with_field(license)
            .with_field(tags)
            .with_field(published),
        Step::new("Files").with_field(data).with_field(terms),
    ]
}

/// Defaults matching [`dataset_steps`]
pub fn dataset_defaults() -> FormValueTree {
    let mut tree = FormValueTree::new();
    for step in dataset_steps() {
        for field in step.fields {
            tree.insert(field.path, field.default).unwrap();
        }
    }
    tree
}

/// "Today" used by fixture engines
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Dataset wizard engine with a fixed "today"
pub fn dataset_engine(handler: Arc<dyn SubmitHandler>) -> FormEngine {
    FormEngine::builder(dataset_steps(), dataset_defaults(), handler)
        .with_config(EngineConfig::new().with_today(fixed_today()))
        .build()
        .unwrap()
}

/// CSV file held in memory
pub fn csv_file(name: &str, rows: usize) -> Arc<dyn FileSource> {
    let mut body = String::from("station,mm\n");
    for i in 0..rows {
        body.push_str(&format!("s{i},{}\n", i % 40));
    }
    InMemoryFile::new(name, body).shared()
}

/// File reporting `size` bytes without holding them
pub fn sized_file(name: &str, size: u64) -> Arc<dyn FileSource> {
    InMemoryFile::new(name, Vec::new()).with_reported_size(size).shared()
}

/// File whose read completes after `delay`
pub fn slow_file(name: &str, delay: Duration) -> Arc<dyn FileSource> {
    InMemoryFile::new(name, "a,b\n1,2\n").with_delay(delay).shared()
}

/// File whose read fails
pub fn broken_file(name: &str) -> Arc<dyn FileSource> {
    InMemoryFile::new(name, "").failing("device not ready").shared()
}

/// Submit handler recording every call
#[derive(Debug, Default)]
pub struct RecordingSubmitHandler {
    calls: Mutex<Vec<FormValueTree>>,
    delay: Duration,
    failure: Option<SubmitError>,
}

impl RecordingSubmitHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle only after `delay`
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every call with `error`
    #[must_use]
    pub fn failing(mut self, error: SubmitError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<FormValueTree> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SubmitHandler for RecordingSubmitHandler {
    async fn submit(&self, data: FormValueTree) -> Result<(), SubmitError> {
        self.calls.lock().push(data);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Search provider answering from a script, each query with its own latency
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    script: HashMap<String, (Duration, Vec<FieldOption>)>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with options labelled like their values, after `latency`
    #[must_use]
    pub fn answer(mut self, query: &str, latency: Duration, values: &[&str]) -> Self {
        let options = values.iter().map(|v| FieldOption::new(*v, *v)).collect();
        self.script.insert(query.to_string(), (latency, options));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Queries that reached the provider, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str) -> Result<Vec<FieldOption>, SearchError> {
        self.queries.lock().push(query.to_string());
        let Some((latency, options)) = self.script.get(query).cloned() else {
            return Ok(Vec::new());
        };
        tokio::time::sleep(latency).await;
        Ok(options)
    }
}
