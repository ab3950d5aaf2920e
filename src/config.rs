//! Configuration for lookups, usage search, history and AI explanations
//!
//! Every component receives its configuration by value and can be handed a new
//! one through `reconfigure`. Nothing here is global: [`PeekConfig::from_env`]
//! is read once by the binary and passed down.

use std::env;
use std::path::PathBuf;

use crate::finder::context::ContextWindow;
use crate::io::file_search::GlobFilter;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Maximum number of files the heuristic search opens
pub const DEFAULT_MAX_FILES: usize = 100;

/// Maximum usages returned by either search path
pub const DEFAULT_MAX_USAGES: usize = 10;

/// Maximum usages taken from a single file
pub const DEFAULT_MAX_USAGES_PER_FILE: usize = 3;

/// Source files considered by the heuristic search
pub const DEFAULT_FILE_PATTERN: &str = "**/*.{ts,tsx,js,jsx,py,java}";

/// Lines scanned up and down when looking for the enclosing block of a usage
pub const DEFAULT_BLOCK_SCAN_LINES: usize = 20;

pub const DEFAULT_HISTORY_MAX_ITEMS: usize = 50;
pub const DEFAULT_HISTORY_RECENT_LIMIT: usize = 5;

pub const DEFAULT_AI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_AI_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_AI_MAX_TOKENS: u32 = 500;

/// Real usages quoted in an explanation prompt
pub const DEFAULT_AI_MAX_USAGES_IN_PROMPT: usize = 3;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("Invalid {field} pattern '{pattern}': {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        reason: String,
    },

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnvValue { name: String, value: String },

    #[error("Temperature must be within 0.0..=2.0, got {0}")]
    InvalidTemperature(f32),
}

// ============================================================================
// Core Configuration Types
// ============================================================================

/// Usage search limits and file selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSearchConfig {
    pub max_files: usize,
    pub max_usages: usize,
    pub max_usages_per_file: usize,
    pub context_lines_before: usize,
    pub context_lines_after: usize,
    pub file_pattern: String,
    /// Empty excludes nothing
    pub exclude_pattern: String,
    pub block_scan_lines: usize,
}

impl Default for UsageSearchConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_usages: DEFAULT_MAX_USAGES,
            max_usages_per_file: DEFAULT_MAX_USAGES_PER_FILE,
            context_lines_before: 2,
            context_lines_after: 2,
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            exclude_pattern: String::new(),
            block_scan_lines: DEFAULT_BLOCK_SCAN_LINES,
        }
    }
}

impl UsageSearchConfig {
    pub fn context_window(&self) -> ContextWindow {
        ContextWindow {
            before: self.context_lines_before,
            after: self.context_lines_after,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_files", self.max_files),
            ("max_usages", self.max_usages),
            ("max_usages_per_file", self.max_usages_per_file),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }

        GlobFilter::new(&self.file_pattern, &self.exclude_pattern).map_err(|e| {
            ConfigError::InvalidPattern {
                field: "file/exclude",
                pattern: format!("{} | {}", self.file_pattern, self.exclude_pattern),
                reason: e.to_string(),
            }
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub max_items: usize,
    pub recent_limit: usize,
    /// JSON file backing the history; `None` keeps it in memory
    pub file_path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_HISTORY_MAX_ITEMS,
            recent_limit: DEFAULT_HISTORY_RECENT_LIMIT,
            file_path: None,
        }
    }
}

/// OpenAI-compatible chat completion settings
#[derive(Clone, PartialEq)]
pub struct AiConfig {
    pub enabled: bool,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_usages_in_prompt: usize,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_usages_in_prompt", &self.max_usages_in_prompt)
            .finish()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            temperature: DEFAULT_AI_TEMPERATURE,
            max_tokens: DEFAULT_AI_MAX_TOKENS,
            max_usages_in_prompt: DEFAULT_AI_MAX_USAGES_IN_PROMPT,
        }
    }
}

impl AiConfig {
    /// Enabled and holding a key
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeekConfig {
    pub usage: UsageSearchConfig,
    pub history: HistoryConfig,
    pub ai: AiConfig,
}

impl PeekConfig {
    /// Defaults overridden by `FUNCPEEK_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let usage = &mut config.usage;
        read_parsed(&lookup, "FUNCPEEK_MAX_FILES", &mut usage.max_files)?;
        read_parsed(&lookup, "FUNCPEEK_MAX_USAGES", &mut usage.max_usages)?;
        read_parsed(&lookup, "FUNCPEEK_MAX_USAGES_PER_FILE", &mut usage.max_usages_per_file)?;
        read_parsed(&lookup, "FUNCPEEK_CONTEXT_BEFORE", &mut usage.context_lines_before)?;
        read_parsed(&lookup, "FUNCPEEK_CONTEXT_AFTER", &mut usage.context_lines_after)?;
        read_parsed(&lookup, "FUNCPEEK_BLOCK_SCAN_LINES", &mut usage.block_scan_lines)?;
        if let Some(pattern) = lookup("FUNCPEEK_FILE_PATTERN") {
            usage.file_pattern = pattern;
        }
        if let Some(pattern) = lookup("FUNCPEEK_EXCLUDE_PATTERN") {
            usage.exclude_pattern = pattern;
        }

        let history = &mut config.history;
        read_parsed(&lookup, "FUNCPEEK_HISTORY_MAX", &mut history.max_items)?;
        read_parsed(&lookup, "FUNCPEEK_HISTORY_RECENT", &mut history.recent_limit)?;
        history.file_path = lookup("FUNCPEEK_HISTORY_FILE").map(PathBuf::from);

        let ai = &mut config.ai;
        read_parsed(&lookup, "FUNCPEEK_AI_ENABLED", &mut ai.enabled)?;
        if let Some(key) = lookup("FUNCPEEK_AI_API_KEY") {
            ai.api_key = key;
        }
        if let Some(endpoint) = lookup("FUNCPEEK_AI_ENDPOINT") {
            ai.endpoint = endpoint;
        }
        if let Some(model) = lookup("FUNCPEEK_AI_MODEL") {
            ai.model = model;
        }
        read_parsed(&lookup, "FUNCPEEK_AI_TEMPERATURE", &mut ai.temperature)?;
        read_parsed(&lookup, "FUNCPEEK_AI_MAX_TOKENS", &mut ai.max_tokens)?;
        read_parsed(&lookup, "FUNCPEEK_AI_MAX_USAGES_IN_PROMPT", &mut ai.max_usages_in_prompt)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.usage.validate()?;
        if self.history.max_items == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "history.max_items",
            });
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(ConfigError::InvalidTemperature(self.ai.temperature));
        }
        Ok(())
    }

    pub fn with_exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.usage.exclude_pattern = pattern.into();
        self
    }

    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history.file_path = Some(path.into());
        self
    }
}

fn read_parsed<F, T>(lookup: &F, name: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return Ok(());
    };
    *target = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue {
            name: name.to_string(),
            value: raw.clone(),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PeekConfig::default();
        assert_eq!(config.usage.max_files, 100);
        assert_eq!(config.usage.max_usages, 10);
        assert_eq!(config.usage.max_usages_per_file, 3);
        assert_eq!(config.usage.context_window(), ContextWindow { before: 2, after: 2 });
        assert_eq!(config.usage.file_pattern, "**/*.{ts,tsx,js,jsx,py,java}");
        assert_eq!(config.usage.exclude_pattern, "");
        assert_eq!(config.history.max_items, 50);
        assert_eq!(config.history.recent_limit, 5);
        assert_eq!(config.ai.model, "gpt-3.5-turbo");
        assert!(!config.ai.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = PeekConfig::from_lookup(lookup_from(&[
            ("FUNCPEEK_MAX_FILES", "20"),
            ("FUNCPEEK_EXCLUDE_PATTERN", "**/node_modules/**"),
            ("FUNCPEEK_HISTORY_FILE", "/tmp/history.json"),
            ("FUNCPEEK_AI_ENABLED", "true"),
            ("FUNCPEEK_AI_API_KEY", "sk-test"),
            ("FUNCPEEK_AI_TEMPERATURE", "0.2"),
        ]))
        .unwrap();

        assert_eq!(config.usage.max_files, 20);
        assert_eq!(config.usage.exclude_pattern, "**/node_modules/**");
        assert_eq!(config.history.file_path, Some(PathBuf::from("/tmp/history.json")));
        assert!(config.ai.is_enabled());
        assert_eq!(config.ai.temperature, 0.2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = PeekConfig::from_lookup(lookup_from(&[("FUNCPEEK_MAX_USAGES", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));

        let err = PeekConfig::from_lookup(lookup_from(&[("FUNCPEEK_MAX_USAGES", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLimit { field: "max_usages" }));

        let err = PeekConfig::from_lookup(lookup_from(&[("FUNCPEEK_FILE_PATTERN", "src/[")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));

        let err = PeekConfig::from_lookup(lookup_from(&[("FUNCPEEK_AI_TEMPERATURE", "3.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemperature(_)));
    }

    #[test]
    fn test_enabled_requires_key() {
        let ai = AiConfig {
            enabled: true,
            api_key: "  ".to_string(),
            ..AiConfig::default()
        };
        assert!(!ai.is_enabled());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let ai = AiConfig {
            api_key: "sk-secret".to_string(),
            ..AiConfig::default()
        };
        let rendered = format!("{ai:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
