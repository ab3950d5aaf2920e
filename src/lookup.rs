//! Entry points for hosts: recognize, synthesize, find usages, explain
//!
//! The free functions are stateless. [`PeekSession`] ties them to a
//! configuration, a history and an optional generative text service, and
//! produces the [`PeekReport`] a presentation layer renders.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{self, AiError, GenerativeText, OpenAiClient, build_prompt, source_excerpt};
use crate::analysis::function::analyze_function;
use crate::analysis::patterns::{clean_identifier, is_identifier};
use crate::analysis::record::SymbolRecord;
use crate::analysis::symbol::classify_symbol;
use crate::config::{PeekConfig, UsageSearchConfig};
use crate::finder::{ReferenceProvider, UsageExample, UsageFinder, summarize_usages};
use crate::history::{HistoryEntry, HistoryError, HistoryManager, HistoryStore};
use crate::io::file_search::FileSearch;
use crate::io::text_source::{TextDocument, TextSource};
use crate::language::Language;
use crate::synthesis;

// ============================================================================
// Stateless operations
// ============================================================================

/// Recognize the symbol described by `text` near `cursor_line` (0-based).
///
/// Function analysis runs first. A plain identifier it cannot place is
/// classified generically; any other text yields `None`.
pub fn recognize_symbol<S: TextSource + ?Sized>(
    text: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> Option<SymbolRecord> {
    if let Some(record) = analyze_function(text, language, source, cursor_line) {
        return Some(record);
    }

    let name = clean_identifier(text);
    if !is_identifier(&name) {
        debug!(text = name.as_str(), "Selection is not a symbol");
        return None;
    }
    Some(classify_symbol(&name, language, source, cursor_line))
}

/// Literal call or component example for `record`
pub fn synthesize_example(record: &SymbolRecord) -> String {
    synthesis::synthesize(record)
}

/// Example shown to the user: a synthesized call when there is something to
/// pass, otherwise a references placeholder
pub fn display_example(record: &SymbolRecord) -> String {
    if record.parameters().is_empty() {
        format!("// References for: {}", record.name())
    } else {
        synthesize_example(record)
    }
}

/// Usages of `record` under `config`, precise references first
pub async fn find_usages(
    record: &SymbolRecord,
    search: &dyn FileSearch,
    provider: Option<&dyn ReferenceProvider>,
    config: &UsageSearchConfig,
) -> Vec<UsageExample> {
    UsageFinder::new(config.clone())
        .find_usages(record, search, provider)
        .await
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PeekError {
    #[error("Select text or place the cursor on a symbol")]
    NoSelection,

    #[error("\"{0}\" is not a valid symbol to search")]
    NotASymbol(String),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Everything a presentation layer needs for one lookup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeekReport {
    pub symbol: SymbolRecord,
    pub example: String,
    pub usages: Vec<UsageExample>,
    /// Earlier lookups of the same name, before this one was recorded
    pub history: Vec<HistoryEntry>,
    pub ai_enabled: bool,
}

impl PeekReport {
    /// Plain-text rendering with paths relative to `root`
    pub fn render_text(&self, root: Option<&Path>) -> String {
        let symbol = &self.symbol;
        let mut text = format!(
            "{} {} ({}:{})\n\n{}\n\n{}",
            symbol.kind(),
            symbol.signature(),
            display_path(symbol.file_path(), root),
            symbol.line_number(),
            self.example,
            summarize_usages(&self.usages, root)
        );
        if !self.history.is_empty() {
            text.push_str(&format!("Previously looked up {} time(s)\n", self.history.len()));
        }
        text
    }
}

/// Result of an explanation request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub symbol: SymbolRecord,
    pub text: String,
    pub usages_in_prompt: usize,
}

fn display_path(path: &Path, root: Option<&Path>) -> String {
    root.and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Lookups bound to one configuration, history and generative text service
pub struct PeekSession {
    config: PeekConfig,
    finder: UsageFinder,
    history: HistoryManager,
    model: Box<dyn GenerativeText>,
}

impl PeekSession {
    pub fn new(config: PeekConfig) -> Self {
        Self {
            finder: UsageFinder::new(config.usage.clone()),
            history: HistoryManager::from_config(config.history.clone()),
            model: Box::new(OpenAiClient::new(config.ai.clone())),
            config,
        }
    }

    pub fn with_history_store(mut self, store: Box<dyn HistoryStore>) -> Self {
        self.history = HistoryManager::new(store, self.config.history.clone());
        self
    }

    pub fn with_model(mut self, model: Box<dyn GenerativeText>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &PeekConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn ai_enabled(&self) -> bool {
        self.model.is_enabled()
    }

    /// Apply new settings to every component
    pub fn reconfigure(&mut self, config: PeekConfig) {
        self.finder.reconfigure(config.usage.clone());
        self.history.reconfigure(config.history.clone());
        self.model.reconfigure(config.ai.clone());
        self.config = config;
        info!("Session reconfigured");
    }

    /// Record for the document's selection, or the word under its cursor
    pub fn recognize(&self, document: &TextDocument) -> Result<SymbolRecord, PeekError> {
        let text = document
            .selected_text_or_word()
            .ok_or(PeekError::NoSelection)?;
        recognize_symbol(&text, document.language(), document, document.cursor_line())
            .ok_or(PeekError::NotASymbol(text))
    }

    /// Recognize, synthesize, search usages, then record the lookup.
    ///
    /// History failures are logged; the report is still produced.
    pub async fn peek(
        &self,
        document: &TextDocument,
        search: &dyn FileSearch,
        provider: Option<&dyn ReferenceProvider>,
    ) -> Result<PeekReport, PeekError> {
        let symbol = self.recognize(document)?;
        let example = display_example(&symbol);
        let usages = self.finder.find_usages(&symbol, search, provider).await;

        let history = self
            .history
            .for_function(symbol.name())
            .await
            .unwrap_or_else(|e| {
                warn!(name = symbol.name(), "Failed to load history: {}", e);
                Vec::new()
            });
        if let Err(e) = self.history.save(&symbol, &example).await {
            warn!(name = symbol.name(), "Failed to save history: {}", e);
        }

        info!(
            name = symbol.name(),
            kind = %symbol.kind(),
            usages = usages.len(),
            "Peek complete"
        );
        Ok(PeekReport {
            symbol,
            example,
            usages,
            history,
            ai_enabled: self.ai_enabled(),
        })
    }

    async fn explanation_prompt(
        &self,
        document: &TextDocument,
        search: &dyn FileSearch,
    ) -> Result<(SymbolRecord, String, usize), PeekError> {
        if !self.model.is_enabled() {
            return Err(AiError::NotEnabled.into());
        }
        let symbol = self.recognize(document)?;
        let source = source_excerpt(document, document.selection());
        let usages = self.finder.find_usages(&symbol, search, None).await;
        let shown = usages.len().min(self.config.ai.max_usages_in_prompt);
        let prompt = build_prompt(&symbol, Some(&source), &usages, shown);
        Ok((symbol, prompt, shown))
    }

    async fn remember(&self, symbol: &SymbolRecord, text: &str) {
        if let Err(e) = self.history.save(symbol, text).await {
            warn!(name = symbol.name(), "Failed to save explanation: {}", e);
        }
    }

    /// Explain the selected symbol with real usages as context
    pub async fn explain(
        &self,
        document: &TextDocument,
        search: &dyn FileSearch,
    ) -> Result<Explanation, PeekError> {
        let (symbol, prompt, usages_in_prompt) = self.explanation_prompt(document, search).await?;
        let text = self.model.complete(&prompt).await?;
        self.remember(&symbol, &text).await;
        Ok(Explanation {
            symbol,
            text,
            usages_in_prompt,
        })
    }

    /// Same as [`PeekSession::explain`], passing each chunk to `on_chunk` as it arrives
    pub async fn explain_streaming<F>(
        &self,
        document: &TextDocument,
        search: &dyn FileSearch,
        on_chunk: F,
    ) -> Result<Explanation, PeekError>
    where
        F: FnMut(&str),
    {
        let (symbol, prompt, usages_in_prompt) = self.explanation_prompt(document, search).await?;
        let text = ai::complete_streaming(self.model.as_ref(), &prompt, on_chunk).await?;
        self.remember(&symbol, &text).await;
        Ok(Explanation {
            symbol,
            text,
            usages_in_prompt,
        })
    }
}
