//! Generic symbol classification for names that are not function definitions

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::analysis::params::split_parameters;
use crate::analysis::patterns::escape_for_literal_match;
use crate::analysis::record::{SymbolKind, SymbolRecord};
use crate::io::text_source::TextSource;
use crate::language::Language;

pub const CLASSIFY_LINES_ABOVE: usize = 5;
pub const CLASSIFY_LINES_BELOW: usize = 2;

/// Declaration rules in precedence order. A `const` line containing `{` is an
/// object literal.
const DECLARATION_RULES: &[(SymbolKind, &str)] = &[
    (SymbolKind::Class, r"\bclass\s+"),
    (SymbolKind::Interface, r"\binterface\s+"),
    (SymbolKind::TypeAlias, r"\btype\s+"),
    (SymbolKind::Enum, r"\benum\s+"),
    (SymbolKind::Constant, r"\bconst\s+"),
    (SymbolKind::Variable, r"\b(?:let|var)\s+"),
    (SymbolKind::Function, r"\bfunction\s+"),
    (SymbolKind::Function, r"=\s*(?:\(.*\)|[a-zA-Z_$][\w$]*)\s*=>"),
];

fn declaration_rules() -> &'static [(SymbolKind, Regex)] {
    static RULES: OnceLock<Vec<(SymbolKind, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        DECLARATION_RULES
            .iter()
            .map(|(kind, source)| (*kind, Regex::new(source).expect("valid declaration rule")))
            .collect()
    })
}

/// Kind of the first declaration line mentioning `name` near the cursor, and
/// that line's 0-based index
pub fn detect_symbol_kind<S: TextSource + ?Sized>(
    source: &S,
    name: &str,
    cursor_line: usize,
) -> (SymbolKind, Option<usize>) {
    let line_count = source.line_count();
    if line_count == 0 || name.is_empty() {
        return (SymbolKind::Unknown, None);
    }

    let first = cursor_line.saturating_sub(CLASSIFY_LINES_ABOVE);
    let last = (cursor_line + CLASSIFY_LINES_BELOW).min(line_count - 1);

    for idx in first..=last {
        let Some(line) = source.line_at(idx) else {
            continue;
        };
        if !line.contains(name) {
            continue;
        }

        let matched = declaration_rules()
            .iter()
            .find(|(_, rule)| rule.is_match(line))
            .map(|(kind, _)| *kind);

        if let Some(kind) = matched {
            let kind = if kind == SymbolKind::Constant && line.contains('{') {
                SymbolKind::Object
            } else {
                kind
            };
            return (kind, Some(idx));
        }
    }

    (SymbolKind::Unknown, None)
}

/// Best-effort type details from a single declaration line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeInfo {
    pub parameters: Vec<String>,
    /// `name: Type` annotation
    pub value_type: Option<String>,
    /// `): Type` return annotation, falling back to the value annotation
    pub return_type: Option<String>,
}

pub fn extract_type_info(line: &str, name: &str) -> TypeInfo {
    static PARAMS: OnceLock<Regex> = OnceLock::new();
    static RETURN: OnceLock<Regex> = OnceLock::new();

    let mut info = TypeInfo::default();

    let annotation = format!(r"{}\s*:\s*([^=;]+)", escape_for_literal_match(name));
    if let Ok(re) = Regex::new(&annotation)
        && let Some(caps) = re.captures(line)
    {
        let value_type = caps[1].trim();
        if !value_type.is_empty() {
            info.value_type = Some(value_type.to_string());
            info.return_type = Some(value_type.to_string());
        }
    }

    let params = PARAMS.get_or_init(|| Regex::new(r"\(([^)]*)\)").expect("valid params regex"));
    if let Some(caps) = params.captures(line) {
        info.parameters = split_parameters(&caps[1]);
    }

    let ret = RETURN.get_or_init(|| Regex::new(r"\):\s*([^{;=]+)").expect("valid return regex"));
    if let Some(caps) = ret.captures(line) {
        let return_type = caps[1].trim();
        if !return_type.is_empty() {
            info.return_type = Some(return_type.to_string());
        }
    }

    info
}

/// Build a record for `name` from the declaration found near the cursor.
///
/// Always succeeds: a name with no recognizable declaration becomes an
/// [`SymbolKind::Unknown`] record located at the cursor.
pub fn classify_symbol<S: TextSource + ?Sized>(
    name: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> SymbolRecord {
    let (kind, matched_line) = detect_symbol_kind(source, name, cursor_line);
    let line_idx = matched_line.unwrap_or(cursor_line);
    let line = source.line_at(line_idx).unwrap_or_default();

    let info = extract_type_info(line, name);
    let return_type = info
        .return_type
        .unwrap_or_else(|| kind.default_return_type(language).to_string());

    let name_position = matched_line
        .and_then(|_| line.find(name))
        .map(|offset| line[..offset].chars().count() as u32);

    debug!(name, kind = %kind, line = line_idx + 1, "Classified symbol");

    SymbolRecord::new(
        kind,
        name,
        info.parameters,
        return_type,
        language.clone(),
        source.file_path(),
        line_idx as u32 + 1,
    )
    .with_name_position(name_position)
}
