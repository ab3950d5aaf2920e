//! Usage finder
//!
//! Finds real usage sites for a recognized symbol:
//!
//! - **Precise path**: ask a [`ReferenceProvider`] for references at the
//!   symbol's name, drop the definition itself, and attach block-aware context.
//! - **Heuristic path**: text search over the workspace (see [`workspace`]).
//!
//! The precise path runs first when a provider is available; an empty answer
//! or any provider failure falls through to the heuristic path. Errors never
//! escape: the worst outcome is an empty list.

pub mod context;
pub mod references;
pub mod workspace;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{Level, debug, warn};

use crate::analysis::record::SymbolRecord;
use crate::config::UsageSearchConfig;
use crate::io::file_search::FileSearch;
use crate::io::text_source::{TextDocument, TextSource};
use crate::language::Language;
use crate::symbol::location::Position;

pub use context::{ContextWindow, block_context, fixed_window};
pub use references::{LspLocationsProvider, ReferenceError, ReferenceProvider};
pub use workspace::search_workspace;

/// One observed usage site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageExample {
    /// Trimmed line containing the occurrence
    pub code: String,
    pub file_path: PathBuf,
    /// 1-based
    pub line_number: u32,
    /// Surrounding lines joined with `\n`
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

// ============================================================================
// Usage Finder
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct UsageFinder {
    config: UsageSearchConfig,
}

impl UsageFinder {
    pub fn new(config: UsageSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UsageSearchConfig {
        &self.config
    }

    pub fn reconfigure(&mut self, config: UsageSearchConfig) {
        debug!(?config, "Usage finder reconfigured");
        self.config = config;
    }

    /// Usages of `record`, provider first, workspace search as fallback
    pub async fn find_usages(
        &self,
        record: &SymbolRecord,
        search: &dyn FileSearch,
        provider: Option<&dyn ReferenceProvider>,
    ) -> Vec<UsageExample> {
        let started = Instant::now();

        if let Some(provider) = provider {
            match self.find_with_provider(record, search, provider).await {
                Ok(usages) if !usages.is_empty() => {
                    crate::log_timing!(Level::DEBUG, "find_usages.references", started.elapsed());
                    return usages;
                }
                Ok(_) => debug!(name = record.name(), "No references, searching workspace"),
                Err(e) => warn!(
                    name = record.name(),
                    "Reference provider failed, searching workspace: {}", e
                ),
            }
        }

        let usages = workspace::search_workspace(search, record, &self.config).await;
        crate::log_timing!(Level::DEBUG, "find_usages.workspace", started.elapsed());
        usages
    }

    /// Precise path. Only a provider failure is an error; unreadable
    /// reference files are skipped.
    pub async fn find_with_provider(
        &self,
        record: &SymbolRecord,
        search: &dyn FileSearch,
        provider: &dyn ReferenceProvider,
    ) -> Result<Vec<UsageExample>, ReferenceError> {
        let definition_line = record.line_number().saturating_sub(1);
        let column = match record.name_position() {
            Some(column) => column,
            None => locate_name(search, record, definition_line).await,
        };
        let position = Position::new(definition_line, column);

        let locations = provider
            .find_references(record.file_path(), position)
            .await?;
        let total = locations.len();

        let mut documents: HashMap<PathBuf, Option<TextDocument>> = HashMap::new();
        let mut usages = Vec::new();

        for location in locations
            .iter()
            .filter(|location| !location.is_on_line(record.file_path(), definition_line))
            .take(self.config.max_usages)
        {
            let path = &location.file_path;
            if !documents.contains_key(path) {
                let opened = match search.open_document(path).await {
                    Ok(document) => Some(document),
                    Err(e) => {
                        warn!(file = %path.display(), "Cannot open reference location: {}", e);
                        None
                    }
                };
                documents.insert(path.clone(), opened);
            }
            let Some(Some(document)) = documents.get(path) else {
                continue;
            };

            let line = location.start_line() as usize;
            let Some(text) = document.line_at(line) else {
                warn!(location = %location, "Reference points past end of file");
                continue;
            };

            usages.push(UsageExample {
                code: text.trim().to_string(),
                file_path: path.clone(),
                line_number: line as u32 + 1,
                context: block_context(
                    document,
                    line,
                    self.config.block_scan_lines,
                    self.config.context_window(),
                ),
                language: Some(document.language().clone()),
            });
        }

        debug!(
            name = record.name(),
            references = total,
            usages = usages.len(),
            "Resolved provider references"
        );
        Ok(usages)
    }
}

/// Column of the symbol name on its defining line, 0 when it cannot be found
async fn locate_name(search: &dyn FileSearch, record: &SymbolRecord, line: u32) -> u32 {
    let document = match search.open_document(record.file_path()).await {
        Ok(document) => document,
        Err(e) => {
            debug!(file = %record.file_path().display(), "Defining file unreadable: {}", e);
            return 0;
        }
    };
    document
        .line_at(line as usize)
        .and_then(|text| {
            text.find(record.name())
                .map(|offset| text[..offset].chars().count() as u32)
        })
        .unwrap_or(0)
}

// ============================================================================
// Summary
// ============================================================================

/// Numbered plain-text list of usages, paths relative to `root` when possible
pub fn summarize_usages(usages: &[UsageExample], root: Option<&Path>) -> String {
    if usages.is_empty() {
        return "No usage examples found in the codebase.".to_string();
    }

    let mut summary = format!("Found {} usage example(s) in the codebase:\n\n", usages.len());
    for (index, usage) in usages.iter().enumerate() {
        let path = root
            .and_then(|root| usage.file_path.strip_prefix(root).ok())
            .unwrap_or(&usage.file_path);
        summary.push_str(&format!(
            "{}. {}:{}\n   {}\n\n",
            index + 1,
            path.display(),
            usage.line_number,
            usage.code
        ));
    }
    summary
}
