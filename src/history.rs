//! Lookup history
//!
//! One entry per symbol name, most recent first, bounded by
//! [`HistoryConfig::max_items`]. Stores serialize their own operations, so
//! concurrent lookups never observe a half-written history.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::analysis::record::SymbolRecord;
use crate::config::HistoryConfig;
use crate::language::Language;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is malformed: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One remembered lookup. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub function_name: String,
    pub signature: String,
    pub language: Language,
    pub usage: String,
    /// Serialized as RFC 3339
    pub timestamp: DateTime<Utc>,
    pub file_path: PathBuf,
    /// 1-based
    pub line_number: u32,
}

impl HistoryEntry {
    pub fn from_record(record: &SymbolRecord, usage: impl Into<String>) -> Self {
        Self::from_record_at(record, usage, Utc::now())
    }

    pub fn from_record_at(
        record: &SymbolRecord,
        usage: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            function_name: record.name().to_string(),
            signature: record.signature().to_string(),
            language: record.language().clone(),
            usage: usage.into(),
            timestamp,
            file_path: record.file_path().to_path_buf(),
            line_number: record.line_number(),
        }
    }
}

/// Put `entry` first, dropping any older entry with the same name, then cap
fn upsert_into(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, max_items: usize) {
    entries.retain(|existing| existing.function_name != entry.function_name);
    entries.insert(0, entry);
    entries.truncate(max_items);
}

// ============================================================================
// Stores
// ============================================================================

/// Ordered persistence for history entries, most recent first
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Replace the entry with the same function name, then keep at most `max_items`
    async fn upsert(&self, entry: HistoryEntry, max_items: usize) -> Result<(), HistoryError>;

    async fn clear(&self) -> Result<(), HistoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn upsert(&self, entry: HistoryEntry, max_items: usize) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().await;
        upsert_into(&mut entries, entry, max_items);
        Ok(())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// History persisted as a JSON array. A missing file is an empty history.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let io_error = |source: std::io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Staged write, then rename over the old file
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await.map_err(io_error)?;
        tokio::fs::rename(&staging, &self.path).await.map_err(io_error)
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn get_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn upsert(&self, entry: HistoryEntry, max_items: usize) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        upsert_into(&mut entries, entry, max_items);
        self.write(&entries).await
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;
        self.write(&[]).await
    }
}

// ============================================================================
// Manager
// ============================================================================

pub struct HistoryManager {
    store: Box<dyn HistoryStore>,
    config: HistoryConfig,
}

impl HistoryManager {
    pub fn new(store: Box<dyn HistoryStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    /// Store chosen by the configuration: a JSON file when a path is set, else memory
    pub fn from_config(config: HistoryConfig) -> Self {
        let store: Box<dyn HistoryStore> = match &config.file_path {
            Some(path) => Box::new(JsonFileHistoryStore::new(path)),
            None => Box::new(InMemoryHistoryStore::new()),
        };
        Self::new(store, config)
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// New limits apply from the next save or query. The store is kept.
    pub fn reconfigure(&mut self, config: HistoryConfig) {
        debug!(?config, "History reconfigured");
        self.config = config;
    }

    pub async fn save(&self, record: &SymbolRecord, usage: &str) -> Result<(), HistoryError> {
        let entry = HistoryEntry::from_record(record, usage);
        debug!(name = %entry.function_name, "Saving history entry");
        self.store.upsert(entry, self.config.max_items).await
    }

    pub async fn all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.store.get_all().await?;
        entries.truncate(self.config.max_items);
        Ok(entries)
    }

    pub async fn for_function(&self, name: &str) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.store.get_all().await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.function_name == name)
            .collect())
    }

    /// First `limit` entries, or the configured recent limit
    pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, HistoryError> {
        let limit = limit.unwrap_or(self.config.recent_limit);
        let mut entries = self.store.get_all().await?;
        entries.truncate(limit);
        Ok(entries)
    }

    pub async fn clear(&self) -> Result<(), HistoryError> {
        self.store.clear().await.inspect_err(|e| {
            warn!("Failed to clear history: {}", e);
        })
    }
}
