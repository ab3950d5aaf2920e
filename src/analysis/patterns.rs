//! Structural pattern library
//!
//! Each language family owns an ordered table of [`StructuralPattern`]s. The
//! table order is the match priority: callers try the entries in order and the
//! first one that matches wins, even when a later entry would also match (a
//! class method also looks like a plain call, for example). Adding a language is
//! a matter of adding a table, not a new code path.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::language::{Language, LanguageFamily};

// ============================================================================
// Pattern Table Types
// ============================================================================

/// Declaration shape a structural pattern recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Function,
    Method,
    Arrow,
    ClassMethod,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Function => "function",
            PatternKind::Method => "method",
            PatternKind::Arrow => "arrow",
            PatternKind::ClassMethod => "classMethod",
        }
    }
}

/// Which capture group holds which field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: usize,
    pub params: usize,
    /// `None` when the family never writes return types (JavaScript)
    pub return_type: Option<usize>,
}

/// Name/parameter-list first, optional return type third
const NAME_PARAMS_RETURN: FieldLayout = FieldLayout {
    name: 1,
    params: 2,
    return_type: Some(3),
};

const NAME_PARAMS: FieldLayout = FieldLayout {
    name: 1,
    params: 2,
    return_type: None,
};

/// Return type precedes the name (Java)
const RETURN_NAME_PARAMS: FieldLayout = FieldLayout {
    name: 2,
    params: 3,
    return_type: Some(1),
};

/// One entry of a language table
#[derive(Debug)]
pub struct StructuralPattern {
    pub kind: PatternKind,
    pub regex: Regex,
    pub layout: FieldLayout,
}

/// Raw fields captured from a definition fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefinition {
    pub kind: PatternKind,
    pub name: String,
    pub params: String,
    /// Trimmed return type text, if the source spelled one out
    pub return_type: Option<String>,
    /// Byte offset of the whole match within the searched text
    pub match_start: usize,
}

impl StructuralPattern {
    fn new(kind: PatternKind, source: &str, layout: FieldLayout) -> Option<Self> {
        match Regex::new(source) {
            Ok(regex) => Some(Self {
                kind,
                regex,
                layout,
            }),
            Err(e) => {
                debug!("Skipping invalid {} pattern: {}", kind.as_str(), e);
                None
            }
        }
    }

    /// First (leftmost) match in `text`
    pub fn find(&self, text: &str) -> Option<RawDefinition> {
        let caps = self.regex.captures(text)?;
        Some(self.extract(&caps))
    }

    fn extract(&self, caps: &Captures<'_>) -> RawDefinition {
        let group = |idx: usize| caps.get(idx).map(|m| m.as_str()).unwrap_or_default();

        let return_type = self
            .layout
            .return_type
            .map(|idx| group(idx).trim())
            .filter(|rt| !rt.is_empty())
            .map(str::to_string);

        RawDefinition {
            kind: self.kind,
            name: group(self.layout.name).to_string(),
            params: group(self.layout.params).to_string(),
            return_type,
            match_start: caps.get(0).map(|m| m.start()).unwrap_or(0),
        }
    }
}

// ============================================================================
// Language Tables
// ============================================================================

const TYPESCRIPT_PATTERNS: &[(PatternKind, &str, FieldLayout)] = &[
    (
        PatternKind::Function,
        r"(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)\s*(?::\s*([^{;\n]+))?",
        NAME_PARAMS_RETURN,
    ),
    (
        PatternKind::Method,
        r"(?:public|private|protected)?\s*(?:static\s+)?(?:async\s+)?(\w+)\s*\(([^)]*)\)\s*(?::\s*([^{;\n]+))?",
        NAME_PARAMS_RETURN,
    ),
    (
        PatternKind::Arrow,
        r"(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*(?::\s*([^{=\n]+?)\s*)?=>",
        NAME_PARAMS_RETURN,
    ),
    (
        PatternKind::ClassMethod,
        r"(?:public|private|protected)?\s*(?:static\s+)?(\w+)\s*\(([^)]*)\)\s*(?::\s*([^{;\n]+))?\s*\{",
        NAME_PARAMS_RETURN,
    ),
];

const JAVASCRIPT_PATTERNS: &[(PatternKind, &str, FieldLayout)] = &[
    (
        PatternKind::Function,
        r"(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)",
        NAME_PARAMS,
    ),
    (
        PatternKind::Method,
        r"(\w+)\s*:\s*(?:async\s+)?function\s*\(([^)]*)\)",
        NAME_PARAMS,
    ),
    (
        PatternKind::Arrow,
        r"(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>",
        NAME_PARAMS,
    ),
];

const PYTHON_PATTERNS: &[(PatternKind, &str, FieldLayout)] = &[(
    PatternKind::Function,
    r"def\s+(\w+)\s*\(([^)]*)\)\s*(?:->\s*([^:\n]+))?",
    NAME_PARAMS_RETURN,
)];

const JAVA_PATTERNS: &[(PatternKind, &str, FieldLayout)] = &[(
    PatternKind::Method,
    r"(?:public|private|protected)?\s*(?:static)?\s*(\w+)\s+(\w+)\s*\(([^)]*)\)",
    RETURN_NAME_PARAMS,
)];

fn compile_table(entries: &[(PatternKind, &str, FieldLayout)]) -> Vec<StructuralPattern> {
    entries
        .iter()
        .filter_map(|(kind, source, layout)| StructuralPattern::new(*kind, source, *layout))
        .collect()
}

/// Ordered pattern table for a language. Unknown languages get the TypeScript table.
pub fn patterns_for(language: &Language) -> &'static [StructuralPattern] {
    static TYPESCRIPT: OnceLock<Vec<StructuralPattern>> = OnceLock::new();
    static JAVASCRIPT: OnceLock<Vec<StructuralPattern>> = OnceLock::new();
    static PYTHON: OnceLock<Vec<StructuralPattern>> = OnceLock::new();
    static JAVA: OnceLock<Vec<StructuralPattern>> = OnceLock::new();

    match language.family() {
        LanguageFamily::TypeScript => TYPESCRIPT.get_or_init(|| compile_table(TYPESCRIPT_PATTERNS)),
        LanguageFamily::JavaScript => JAVASCRIPT.get_or_init(|| compile_table(JAVASCRIPT_PATTERNS)),
        LanguageFamily::Python => PYTHON.get_or_init(|| compile_table(PYTHON_PATTERNS)),
        LanguageFamily::Java => JAVA.get_or_init(|| compile_table(JAVA_PATTERNS)),
    }
}

/// Run the language table against `text`; the first kind with a match wins
pub fn first_definition(text: &str, language: &Language) -> Option<RawDefinition> {
    patterns_for(language)
        .iter()
        .find_map(|pattern| pattern.find(text))
}

// ============================================================================
// Name Search Matchers
// ============================================================================

/// Build matchers that find a definition whose declared name is exactly `name`.
///
/// `name` is expected to have gone through [`clean_identifier`] already; it is
/// escaped here, so any text is safe to pass.
pub fn build_name_search_matchers(name: &str, language: &Language) -> Vec<Regex> {
    if name.is_empty() {
        return Vec::new();
    }

    let escaped = escape_for_literal_match(name);
    let boundary = match name.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    };
    let name = format!("{boundary}{escaped}");

    let sources = match language.family() {
        LanguageFamily::TypeScript | LanguageFamily::JavaScript => vec![
            // Class method with optional modifiers, optional return type
            format!(
                r"(?:public|private|protected)?\s*(?:static)?\s*(?:async)?\s*{name}\s*\([^)]*\)(?:\s*:\s*[^{{]+)?"
            ),
            // Function-valued const/let/var
            format!(
                r"(?:const|let|var)\s+{name}\s*=\s*(?:async\s+)?\([^)]*\)\s*(?::\s*[^=\n]+?\s*)?=>"
            ),
            format!(r"(?:export\s+)?(?:async\s+)?function\s+{name}\s*\([^)]*\)"),
        ],
        LanguageFamily::Python => vec![format!(r"def\s+{name}\s*\([^)]*\)(?:\s*->\s*[^:]+)?")],
        LanguageFamily::Java => vec![format!(
            r"(?:public|private|protected)?\s*(?:static)?\s*\w+\s+{name}\s*\([^)]*\)"
        )],
    };

    sources
        .iter()
        .filter_map(|source| match Regex::new(source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                debug!("Dropping name matcher {}: {}", source, e);
                None
            }
        })
        .collect()
}

// ============================================================================
// Text Helpers
// ============================================================================

fn leading_modifier_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"^(?:public|private|protected)\s+").expect("valid visibility regex"),
            Regex::new(r"^static\s+").expect("valid static regex"),
            Regex::new(r"^async\s+").expect("valid async regex"),
        ]
    })
}

/// Strip leading `public`/`private`/`protected`, `static` and `async` (in that
/// order) plus surrounding whitespace from a selected fragment
pub fn clean_identifier(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for re in leading_modifier_regexes() {
        text = re.replace(&text, "").into_owned();
    }
    text.trim().to_string()
}

/// Escape `text` so it matches literally inside a regex
pub fn escape_for_literal_match(text: &str) -> String {
    regex::escape(text)
}

/// Whether `text` is a single bare identifier
pub fn is_identifier(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"))
        .is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_falls_back_to_typescript_table() {
        let ts = patterns_for(&Language::TypeScript);
        let other = patterns_for(&Language::from_id("kotlin"));
        assert!(std::ptr::eq(ts, other));
        let kinds: Vec<_> = ts.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PatternKind::Function,
                PatternKind::Method,
                PatternKind::Arrow,
                PatternKind::ClassMethod
            ]
        );
    }

    #[test]
    fn test_typescript_function_fields() {
        let def = first_definition(
            "export async function load(id: string, opts?: Options): Promise<User> {",
            &Language::TypeScript,
        )
        .unwrap();
        assert_eq!(def.kind, PatternKind::Function);
        assert_eq!(def.name, "load");
        assert_eq!(def.params, "id: string, opts?: Options");
        assert_eq!(def.return_type.as_deref(), Some("Promise<User>"));
    }

    #[test]
    fn test_typescript_arrow_return_type_stops_at_arrow() {
        let def = first_definition(
            "const arrowFunc = (a: number, b: number): number => a + b;",
            &Language::TypeScript,
        )
        .unwrap();
        assert_eq!(def.kind, PatternKind::Arrow);
        assert_eq!(def.name, "arrowFunc");
        assert_eq!(def.return_type.as_deref(), Some("number"));
    }

    #[test]
    fn test_first_match_wins_in_table_order() {
        // Also matches the method and classMethod shapes; `function` is listed first
        let def = first_definition("function run(x) { go(x); }", &Language::TypeScript).unwrap();
        assert_eq!(def.kind, PatternKind::Function);
        assert_eq!(def.name, "run");
    }

    #[test]
    fn test_javascript_has_no_return_type() {
        let def = first_definition(
            "const fetchAll = async (url) => {",
            &Language::JavaScript,
        )
        .unwrap();
        assert_eq!(def.kind, PatternKind::Arrow);
        assert_eq!(def.name, "fetchAll");
        assert_eq!(def.return_type, None);
    }

    #[test]
    fn test_python_def_with_return_annotation() {
        let def = first_definition("def area(w: int, h: int) -> int:", &Language::Python).unwrap();
        assert_eq!(def.name, "area");
        assert_eq!(def.params, "w: int, h: int");
        assert_eq!(def.return_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_java_group_order_is_return_first() {
        let def = first_definition(
            "public static int add(int a, int b) {",
            &Language::Java,
        )
        .unwrap();
        assert_eq!(def.name, "add");
        assert_eq!(def.return_type.as_deref(), Some("int"));
        assert_eq!(def.params, "int a, int b");
    }

    #[test]
    fn test_clean_identifier_strips_modifiers() {
        assert_eq!(clean_identifier("  public static async fetchData "), "fetchData");
        assert_eq!(clean_identifier("private helper"), "helper");
        assert_eq!(clean_identifier("statics"), "statics");
    }

    #[test]
    fn test_escape_for_literal_match() {
        let escaped = escape_for_literal_match("a.b$(c)");
        let re = Regex::new(&escaped).unwrap();
        assert!(re.is_match("xa.b$(c)y"));
        assert!(!re.is_match("aXb$(c)"));
    }

    #[test]
    fn test_name_matchers_require_exact_name() {
        let matchers = build_name_search_matchers("Sum", &Language::TypeScript);
        let line = "function calculateSum(a: number, b: number): number {";
        assert!(matchers.iter().all(|m| !m.is_match(line)));

        let matchers = build_name_search_matchers("calculateSum", &Language::TypeScript);
        assert!(matchers.iter().any(|m| m.is_match(line)));
    }

    #[test]
    fn test_name_matchers_find_typed_arrow() {
        let matchers = build_name_search_matchers("total", &Language::TypeScript);
        let line = "export const total = (items: Item[]): number => items.length;";
        assert!(matchers.iter().any(|m| m.is_match(line)));
    }

    #[test]
    fn test_name_matchers_per_family() {
        assert_eq!(build_name_search_matchers("f", &Language::TypeScript).len(), 3);
        assert_eq!(build_name_search_matchers("f", &Language::Python).len(), 1);
        assert_eq!(build_name_search_matchers("f", &Language::Java).len(), 1);
        assert!(build_name_search_matchers("", &Language::Java).is_empty());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("$scope"));
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("foo bar"));
    }
}
