//! Function and method recognition
//!
//! Recognition runs in fixed stages and stops at the first success:
//!
//! 1. **Simple name**: the selection is a bare name. Look for a definition of
//!    exactly that name on the cursor line, then up to 3 lines above (nearest
//!    first), then up to 2 lines below, and parse the matched fragment.
//! 2. **Full pattern**: the trimmed selection is matched against the
//!    language's pattern table; the first kind in table order wins, wherever
//!    in the selection it matches.
//! 3. **Embedded**: the selection *contains* a definition somewhere.
//!
//! A miss at every stage is a normal outcome and yields `None`.

use tracing::debug;

use crate::analysis::params::split_parameters;
use crate::analysis::patterns::{
    RawDefinition, build_name_search_matchers, clean_identifier, first_definition, is_identifier,
};
use crate::analysis::record::{SymbolKind, SymbolRecord};
use crate::io::text_source::TextSource;
use crate::language::Language;

/// Lines searched above the cursor in the simple-name stage
pub const NAME_SEARCH_LINES_ABOVE: usize = 3;
/// Lines searched below the cursor in the simple-name stage
pub const NAME_SEARCH_LINES_BELOW: usize = 2;

/// Recognize a function-style definition from a selection.
///
/// `cursor_line` is 0-based; returned records carry 1-based line numbers.
pub fn analyze_function<S: TextSource + ?Sized>(
    selected: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> Option<SymbolRecord> {
    let text = selected.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(record) = match_simple_name(text, language, source, cursor_line) {
        debug!(name = record.name(), "Recognized definition from name selection");
        return Some(record);
    }

    // Lines dropped by the trim still count towards the definition's line
    let leading_lines = selected[..selected.len() - selected.trim_start().len()]
        .matches('\n')
        .count();
    if let Some(record) = match_full_definition(text, language, source, cursor_line + leading_lines)
    {
        debug!(name = record.name(), "Recognized selected definition");
        return Some(record);
    }

    let record = find_embedded_definition(selected, language, source, cursor_line);
    if let Some(record) = &record {
        debug!(name = record.name(), "Recognized definition inside selection");
    }
    record
}

/// Line indices to search, in priority order
fn name_search_lines(cursor_line: usize, line_count: usize) -> Vec<usize> {
    let mut lines = Vec::with_capacity(1 + NAME_SEARCH_LINES_ABOVE + NAME_SEARCH_LINES_BELOW);
    if cursor_line < line_count {
        lines.push(cursor_line);
    }
    lines.extend((1..=NAME_SEARCH_LINES_ABOVE).filter_map(|i| cursor_line.checked_sub(i)));
    lines.extend(
        (1..=NAME_SEARCH_LINES_BELOW)
            .map(|i| cursor_line + i)
            .filter(|&line| line < line_count),
    );
    lines
}

fn match_simple_name<S: TextSource + ?Sized>(
    text: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> Option<SymbolRecord> {
    let name = clean_identifier(text);
    if !is_identifier(&name) {
        return None;
    }

    let matchers = build_name_search_matchers(&name, language);

    for line_idx in name_search_lines(cursor_line, source.line_count()) {
        let Some(line) = source.line_at(line_idx) else {
            continue;
        };
        if !line.contains(name.as_str()) {
            continue;
        }

        for matcher in &matchers {
            let Some(found) = matcher.find(line) else {
                continue;
            };
            let fragment = found.as_str();
            let match_start = found.start();

            let Some(definition) = first_definition(fragment, language) else {
                continue;
            };

            let Some(record) = build_record(definition, language, source, line_idx as u32 + 1)
            else {
                continue;
            };

            // Prefer the name inside the matched fragment; otherwise take the
            // first occurrence at or after the match start
            let byte_offset = fragment
                .find(record.name())
                .map(|idx| match_start + idx)
                .or_else(|| {
                    line[match_start..]
                        .find(record.name())
                        .map(|idx| match_start + idx)
                });
            let name_position = byte_offset.map(|offset| line[..offset].chars().count() as u32);

            return Some(record.with_name_position(name_position));
        }
    }

    None
}

fn match_full_definition<S: TextSource + ?Sized>(
    text: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> Option<SymbolRecord> {
    let definition = first_definition(text, language)?;
    let line_number = definition_line(text, &definition, cursor_line);
    build_record(definition, language, source, line_number)
}

fn find_embedded_definition<S: TextSource + ?Sized>(
    text: &str,
    language: &Language,
    source: &S,
    cursor_line: usize,
) -> Option<SymbolRecord> {
    let definition = first_definition(text, language)?;
    let line_number = definition_line(text, &definition, cursor_line);
    build_record(definition, language, source, line_number)
}

/// 1-based line of the first non-blank character of the match, given that
/// `text` starts on `first_line` (0-based)
fn definition_line(text: &str, definition: &RawDefinition, first_line: usize) -> u32 {
    let rest = &text[definition.match_start..];
    let start = definition.match_start + (rest.len() - rest.trim_start().len());
    (first_line + text[..start].matches('\n').count()) as u32 + 1
}

fn build_record<S: TextSource + ?Sized>(
    definition: RawDefinition,
    language: &Language,
    source: &S,
    line_number: u32,
) -> Option<SymbolRecord> {
    if definition.name.is_empty() {
        return None;
    }

    let return_type = definition
        .return_type
        .unwrap_or_else(|| language.default_return_type().to_string());

    Some(SymbolRecord::new(
        SymbolKind::Function,
        definition.name,
        split_parameters(&definition.params),
        return_type,
        language.clone(),
        source.file_path(),
        line_number,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::text_source::TextDocument;

    fn ts_doc(content: &str) -> TextDocument {
        TextDocument::new("/src/file.ts", Language::TypeScript, content)
    }

    #[test]
    fn test_full_line_selection_of_simple_function() {
        let text = "function calculateSum(a: number, b: number): number { return a + b; }";
        let doc = ts_doc(text);

        let record = analyze_function(text, &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(record.name(), "calculateSum");
        assert_eq!(record.parameters(), ["a: number", "b: number"]);
        assert_eq!(record.return_type(), "number");
        assert_eq!(record.signature(), "calculateSum(a: number, b: number): number");
        assert_eq!(record.line_number(), 1);
        assert_eq!(record.kind(), SymbolKind::Function);
    }

    #[test]
    fn test_name_only_selection_finds_enclosing_method() {
        let doc = ts_doc(
            "class TaskManager { addTask(title: string): void { console.log(title); } }",
        );

        let record = analyze_function("addTask", &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(record.name(), "addTask");
        assert_eq!(record.parameters(), ["title: string"]);
        assert_eq!(record.return_type(), "void");
        assert_eq!(record.signature(), "addTask(title: string)");
        assert_eq!(record.name_position(), Some(20));
    }

    #[test]
    fn test_name_selection_searches_nearby_lines() {
        let doc = ts_doc(
            "class MyClass {\n    public myMethod(param: string): void { }\n\n\n}",
        );

        // Cursor two lines below the definition
        let record = analyze_function("myMethod", &Language::TypeScript, &doc, 3).unwrap();
        assert_eq!(record.name(), "myMethod");
        assert_eq!(record.line_number(), 2);
        assert_eq!(record.name_position(), Some(11));
    }

    #[test]
    fn test_name_search_prefers_current_then_above() {
        let doc = ts_doc("function run(a) {}\nfunction run(b, c) {}\nfunction run(d) {}");

        let record = analyze_function("run", &Language::TypeScript, &doc, 1).unwrap();
        assert_eq!(record.parameters(), ["b", "c"]);

        let lines = name_search_lines(5, 7);
        assert_eq!(lines, vec![5, 4, 3, 2, 6]);
        let lines = name_search_lines(0, 2);
        assert_eq!(lines, vec![0, 1]);
    }

    #[test]
    fn test_modifiers_in_selection_are_cleaned() {
        let doc = ts_doc("  private static async load(id: string): Promise<void> {");
        let record =
            analyze_function("private static async load", &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(record.name(), "load");
        assert_eq!(record.return_type(), "Promise<void>");
    }

    #[test]
    fn test_arrow_function_selection() {
        let text = "const arrowFunc = (a: number, b: number): number => a + b;";
        let doc = ts_doc(text);
        let record = analyze_function(text, &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(record.name(), "arrowFunc");
        assert_eq!(record.return_type(), "number");

        let by_name = analyze_function("arrowFunc", &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(by_name.name(), "arrowFunc");
        assert_eq!(by_name.name_position(), Some(6));
    }

    #[test]
    fn test_python_defaults_to_any() {
        let doc = TextDocument::new("/src/m.py", Language::Python, "def greet(name, greeting='hi'):\n    pass");
        let record = analyze_function("greet", &Language::Python, &doc, 0).unwrap();
        assert_eq!(record.parameters(), ["name", "greeting='hi'"]);
        assert_eq!(record.return_type(), "Any");
        assert_eq!(record.signature(), "greet(name, greeting='hi')");
    }

    #[test]
    fn test_java_method_by_name() {
        let doc = TextDocument::new(
            "/src/Calc.java",
            Language::Java,
            "public class Calc {\n    public static int add(int a, int b) {\n        return a + b;\n    }\n}",
        );
        let record = analyze_function("add", &Language::Java, &doc, 1).unwrap();
        assert_eq!(record.name(), "add");
        assert_eq!(record.return_type(), "int");
        assert_eq!(record.parameters(), ["int a", "int b"]);
        assert_eq!(record.signature(), "add(int a, int b): int");
    }

    #[test]
    fn test_javascript_return_type_is_void() {
        let doc = TextDocument::new(
            "/src/a.js",
            Language::JavaScript,
            "export async function fetchUser(id) {",
        );
        let record = analyze_function("fetchUser", &Language::JavaScript, &doc, 0).unwrap();
        assert_eq!(record.return_type(), "void");
        assert_eq!(record.parameters(), ["id"]);
    }

    #[test]
    fn test_embedded_definition_reports_its_own_line() {
        let block = "// helpers\n\nexport function helper(x: number): string {\n  return `${x}`;\n}";
        let doc = ts_doc(block);
        let record = analyze_function(block, &Language::TypeScript, &doc, 10).unwrap();
        assert_eq!(record.name(), "helper");
        assert_eq!(record.line_number(), 13);
    }

    #[test]
    fn test_selection_with_leading_call_uses_table_order() {
        let text = "run(); function helper(a) {}";
        let doc = ts_doc(text);
        let record = analyze_function(text, &Language::TypeScript, &doc, 0).unwrap();
        assert_eq!(record.name(), "helper");
        assert_eq!(record.parameters(), ["a"]);
        assert_eq!(record.line_number(), 1);
    }

    #[test]
    fn test_leading_blank_lines_shift_line_number() {
        let selected = "\n\n  function later() {}";
        let doc = ts_doc(selected);
        let record = analyze_function(selected, &Language::TypeScript, &doc, 4).unwrap();
        assert_eq!(record.name(), "later");
        assert_eq!(record.line_number(), 7);
    }

    #[test]
    fn test_misses_are_none() {
        let doc = ts_doc("let x = 1;\nconsole.log(x);");
        assert!(analyze_function("", &Language::TypeScript, &doc, 0).is_none());
        assert!(analyze_function("   ", &Language::TypeScript, &doc, 0).is_none());
        assert!(analyze_function("x", &Language::TypeScript, &doc, 0).is_none());
        assert!(analyze_function("= 1 +", &Language::TypeScript, &doc, 0).is_none());
    }

    #[test]
    fn test_cursor_past_end_does_not_panic() {
        let doc = ts_doc("function a() {}");
        let record = analyze_function("a", &Language::TypeScript, &doc, 2);
        assert_eq!(record.map(|r| r.line_number()), Some(1));
    }
}
