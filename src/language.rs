//! Language identifiers and per-family conventions
//!
//! Editors hand us free-form language ids (`typescriptreact`, `python`, ...).
//! Everything downstream works on a [`Language`], which keeps the JSX flavour
//! (needed to decide whether a capitalised symbol is a UI component) while
//! exposing the [`LanguageFamily`] that selects patterns and defaults.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pattern/defaults family a language belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageFamily {
    TypeScript,
    JavaScript,
    Python,
    Java,
}

/// Normalized language identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    TypeScript,
    TypeScriptReact,
    JavaScript,
    JavaScriptReact,
    Python,
    Java,
    /// Anything else; analysed with the TypeScript family patterns
    Other(String),
}

impl Language {
    /// Parse an editor language id. Never fails.
    pub fn from_id(id: &str) -> Self {
        match id.trim() {
            "typescript" => Language::TypeScript,
            "typescriptreact" => Language::TypeScriptReact,
            "javascript" => Language::JavaScript,
            "javascriptreact" => Language::JavaScriptReact,
            "python" => Language::Python,
            "java" => Language::Java,
            other => Language::Other(other.to_string()),
        }
    }

    /// Guess the language from a file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::TypeScriptReact,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "jsx" => Language::JavaScriptReact,
            "py" | "pyi" => Language::Python,
            "java" => Language::Java,
            _ => Language::Other(ext),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Language::TypeScript => "typescript",
            Language::TypeScriptReact => "typescriptreact",
            Language::JavaScript => "javascript",
            Language::JavaScriptReact => "javascriptreact",
            Language::Python => "python",
            Language::Java => "java",
            Language::Other(id) => id,
        }
    }

    /// Family used for pattern selection; unknown languages fall back to TypeScript
    pub fn family(&self) -> LanguageFamily {
        match self {
            Language::TypeScript | Language::TypeScriptReact | Language::Other(_) => {
                LanguageFamily::TypeScript
            }
            Language::JavaScript | Language::JavaScriptReact => LanguageFamily::JavaScript,
            Language::Python => LanguageFamily::Python,
            Language::Java => LanguageFamily::Java,
        }
    }

    /// Whether the language is one we actually know, as opposed to a fallback
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Language::Other(_))
    }

    /// JSX-capable languages, where capitalised functions are components
    pub fn supports_components(&self) -> bool {
        matches!(self, Language::TypeScriptReact | Language::JavaScriptReact)
    }

    /// Return type assumed when none is written in the source
    pub fn default_return_type(&self) -> &'static str {
        self.family().default_return_type()
    }

    /// Whether `return_type` means "returns nothing useful" for this language.
    ///
    /// Void-like return types are never rendered in signatures and never get a
    /// `result = ` prefix in synthesized calls.
    pub fn is_void_like(&self, return_type: &str) -> bool {
        self.family().is_void_like(return_type)
    }
}

impl LanguageFamily {
    pub fn default_return_type(self) -> &'static str {
        match self {
            LanguageFamily::Python => "Any",
            LanguageFamily::TypeScript | LanguageFamily::JavaScript | LanguageFamily::Java => {
                "void"
            }
        }
    }

    pub fn is_void_like(self, return_type: &str) -> bool {
        let return_type = return_type.trim();
        match self {
            LanguageFamily::Python => matches!(return_type, "Any" | "void"),
            LanguageFamily::TypeScript | LanguageFamily::JavaScript | LanguageFamily::Java => {
                return_type == "void"
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<&str> for Language {
    fn from(id: &str) -> Self {
        Language::from_id(id)
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = String::deserialize(deserializer)?;
        Ok(Language::from_id(&id))
    }
}
