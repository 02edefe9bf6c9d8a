//! Record intake: validates submitted input, resolves it, and hands the
//! resulting record to a [`RecordSink`].
//!
//! Storage itself lives behind the sink trait. [`JsonLinesSink`] and
//! [`MemorySink`] cover the CLI and tests.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::parser::PUBLISHER_PLACEHOLDER;
use crate::resolver::MetadataResolver;

/// Errors surfaced to whoever submitted a URL.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Input was empty or whitespace only
    #[error("no URL given\n  Suggestion: provide a link such as https://example.com/article")]
    EmptyInput,

    /// The sink could not store the record
    #[error("failed to store record for '{url}': {reason}")]
    Sink {
        /// Submitted URL
        url: String,
        /// Sink failure message
        reason: String,
    },
}

impl IntakeError {
    /// Creates a `Sink` error.
    #[must_use]
    pub fn sink(url: &str, reason: impl ToString) -> Self {
        Self::Sink {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A stored reading-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// URL as submitted (trimmed).
    pub url: String,
    /// Display title.
    pub title: String,
    /// Publisher label.
    pub publisher: String,
    /// Icon URL, when one was found.
    pub icon_url: Option<String>,
    /// Submission time (UTC).
    pub created_at: DateTime<Utc>,
}

/// Destination for resolved records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Stores one record.
    async fn store(&self, record: &ArticleRecord) -> Result<(), IntakeError>;
}

/// Writes each record as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    async fn store(&self, record: &ArticleRecord) -> Result<(), IntakeError> {
        let line = serde_json::to_string(record).map_err(|e| IntakeError::sink(&record.url, e))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| IntakeError::sink(&record.url, "writer lock poisoned"))?;
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| IntakeError::sink(&record.url, e))
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ArticleRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored records in submission order.
    #[must_use]
    pub fn records(&self) -> Vec<ArticleRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn store(&self, record: &ArticleRecord) -> Result<(), IntakeError> {
        self.records
            .lock()
            .map_err(|_| IntakeError::sink(&record.url, "record store lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}

/// Validates and resolves `raw_url` into a record without storing it.
///
/// # Errors
///
/// Returns [`IntakeError::EmptyInput`] for blank input; nothing is resolved.
#[instrument(skip(resolver))]
pub async fn prepare(
    resolver: &MetadataResolver,
    raw_url: &str,
) -> Result<ArticleRecord, IntakeError> {
    let url = raw_url.trim();
    if url.is_empty() {
        return Err(IntakeError::EmptyInput);
    }

    let resolved = resolver.resolve(url).await;
    Ok(ArticleRecord {
        url: url.to_string(),
        title: non_blank_or(resolved.title, url),
        publisher: non_blank_or(resolved.publisher, PUBLISHER_PLACEHOLDER),
        icon_url: resolved.icon_url,
        created_at: Utc::now(),
    })
}

/// Resolves `raw_url` and stores the resulting record.
///
/// # Errors
///
/// Returns [`IntakeError::EmptyInput`] for blank input (nothing is resolved),
/// or [`IntakeError::Sink`] when the sink rejects the record.
pub async fn submit(
    resolver: &MetadataResolver,
    sink: &dyn RecordSink,
    raw_url: &str,
) -> Result<ArticleRecord, IntakeError> {
    let record = prepare(resolver, raw_url).await?;
    sink.store(&record).await?;
    debug!(title = %record.title, "record stored");
    Ok(record)
}

fn non_blank_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
