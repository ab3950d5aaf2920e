//! Recognition result types
//!
//! A [`SymbolRecord`] is rebuilt on every lookup. Its signature is computed
//! from the structural fields at construction and cannot be edited afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::language::Language;

/// Kind of code construct a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    #[serde(rename = "type")]
    TypeAlias,
    Enum,
    Variable,
    Constant,
    Object,
    Property,
    Unknown,
}

impl SymbolKind {
    /// Return type used when the source does not spell one out
    pub fn default_return_type(self, language: &Language) -> &'static str {
        match self {
            SymbolKind::Function => language.default_return_type(),
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::TypeAlias => "type",
            SymbolKind::Object => "object",
            SymbolKind::Constant | SymbolKind::Variable => "any",
            SymbolKind::Enum | SymbolKind::Property | SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Object => "object",
            SymbolKind::Property => "property",
            SymbolKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Reconstruct a human readable signature. Pure in all of its inputs.
pub fn build_signature(
    kind: SymbolKind,
    name: &str,
    parameters: &[String],
    return_type: &str,
    language: &Language,
) -> String {
    match kind {
        SymbolKind::Function => {
            let mut signature = format!("{}({})", name, parameters.join(", "));
            if !language.is_void_like(return_type) {
                signature.push_str(": ");
                signature.push_str(return_type);
            }
            signature
        }
        SymbolKind::Class => format!("class {name}"),
        SymbolKind::Interface => format!("interface {name}"),
        SymbolKind::TypeAlias => format!("type {name}"),
        SymbolKind::Enum => format!("enum {name}"),
        SymbolKind::Object => format!("const {name} = {{...}}"),
        SymbolKind::Constant | SymbolKind::Variable | SymbolKind::Property => {
            if matches!(return_type, "any" | "unknown" | "") {
                name.to_string()
            } else {
                format!("{name}: {return_type}")
            }
        }
        SymbolKind::Unknown => name.to_string(),
    }
}

/// Canonical recognition result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    name: String,
    kind: SymbolKind,
    signature: String,
    parameters: Vec<String>,
    return_type: String,
    language: Language,
    file_path: PathBuf,
    /// 1-based
    line_number: u32,
    /// 0-based character offset of the name in its defining line
    #[serde(skip_serializing_if = "Option::is_none")]
    name_position: Option<u32>,
}

impl SymbolRecord {
    pub fn new(
        kind: SymbolKind,
        name: impl Into<String>,
        parameters: Vec<String>,
        return_type: impl Into<String>,
        language: Language,
        file_path: impl Into<PathBuf>,
        line_number: u32,
    ) -> Self {
        let name = name.into();
        let return_type = return_type.into();
        let signature = build_signature(kind, &name, &parameters, &return_type, &language);

        Self {
            name,
            kind,
            signature,
            parameters,
            return_type,
            language,
            file_path: file_path.into(),
            line_number,
            name_position: None,
        }
    }

    /// Record for an identifier nothing else could classify
    pub fn bare_identifier(
        name: impl Into<String>,
        language: Language,
        file_path: impl Into<PathBuf>,
        line_number: u32,
    ) -> Self {
        Self::new(
            SymbolKind::Unknown,
            name,
            Vec::new(),
            "unknown",
            language,
            file_path,
            line_number,
        )
    }

    pub fn with_name_position(mut self, name_position: Option<u32>) -> Self {
        self.name_position = name_position;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn name_position(&self) -> Option<u32> {
        self.name_position
    }
}
