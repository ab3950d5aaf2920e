//! Heuristic usage search over workspace files
//!
//! Plain text matching: no parser, no index. Bounded by the file cap, the
//! per-file cap and the overall usage cap, checked in that order.

use regex::Regex;
use tracing::{debug, warn};

use crate::analysis::patterns::escape_for_literal_match;
use crate::analysis::record::SymbolRecord;
use crate::config::UsageSearchConfig;
use crate::finder::UsageExample;
use crate::finder::context::{ContextWindow, fixed_window};
use crate::io::file_search::FileSearch;
use crate::io::text_source::TextSource;

/// Matcher for call-like or reference-like occurrences of `name`.
///
/// The name must not continue an identifier or follow a `.` (property access),
/// and must be followed by `(`, `<`, `{`, `:` or the end of the text.
pub fn build_usage_matcher(name: &str) -> Option<Regex> {
    if name.is_empty() {
        return None;
    }
    let source = format!(
        r"(?:^|[^\w.])(?P<name>{})\s*(?:[(<{{:]|$)",
        escape_for_literal_match(name)
    );
    match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!("Cannot build usage matcher for {}: {}", name, e);
            None
        }
    }
}

/// Occurrences in one document, at most `limit`, one per line
pub fn scan_document<S: TextSource + ?Sized>(
    source: &S,
    matcher: &Regex,
    limit: usize,
    window: ContextWindow,
) -> Vec<UsageExample> {
    let mut usages: Vec<UsageExample> = Vec::new();
    if limit == 0 {
        return usages;
    }

    let mut last_line = None;
    for caps in matcher.captures_iter(source.text()) {
        let Some(name) = caps.name("name") else {
            continue;
        };
        let line = source.position_at(name.start()).line as usize;
        if last_line == Some(line) {
            continue;
        }
        last_line = Some(line);

        let code = source.line_at(line).unwrap_or_default().trim().to_string();
        usages.push(UsageExample {
            code,
            file_path: source.file_path().to_path_buf(),
            line_number: line as u32 + 1,
            context: fixed_window(source, line, window),
            language: Some(source.language().clone()),
        });

        if usages.len() >= limit {
            break;
        }
    }

    usages
}

/// Search the workspace for usages of `record`, skipping its defining file.
///
/// Enumeration failure yields no usages; an unreadable file contributes none.
pub async fn search_workspace(
    search: &dyn FileSearch,
    record: &SymbolRecord,
    config: &UsageSearchConfig,
) -> Vec<UsageExample> {
    let mut usages = Vec::new();
    let Some(matcher) = build_usage_matcher(record.name()) else {
        return usages;
    };

    let files = match search
        .find_files(&config.file_pattern, &config.exclude_pattern, config.max_files)
        .await
    {
        Ok(files) => files,
        Err(e) => {
            warn!(pattern = %config.file_pattern, "Workspace file enumeration failed: {}", e);
            return usages;
        }
    };

    let mut visited = 0usize;
    for path in files.iter().take(config.max_files) {
        if path.as_path() == record.file_path() {
            continue;
        }

        let remaining = config.max_usages.saturating_sub(usages.len());
        if remaining == 0 {
            break;
        }

        visited += 1;
        let document = match search.open_document(path).await {
            Ok(document) => document,
            Err(e) => {
                warn!(file = %path.display(), "Skipping unreadable file: {}", e);
                continue;
            }
        };

        let limit = remaining.min(config.max_usages_per_file);
        usages.extend(scan_document(&document, &matcher, limit, config.context_window()));
    }

    debug!(
        name = record.name(),
        files = files.len(),
        visited,
        found = usages.len(),
        "Heuristic usage search finished"
    );
    usages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::SymbolKind;
    use crate::io::file_search::{FileSearchError, MemoryFileSearch, MockFileSearch};
    use crate::io::text_source::{TextDocument, TextSourceError};
    use crate::language::Language;
    use std::path::{Path, PathBuf};

    fn record(name: &str, file: &str, line: u32) -> SymbolRecord {
        SymbolRecord::new(
            SymbolKind::Function,
            name,
            vec!["a".to_string()],
            "number",
            Language::TypeScript,
            file,
            line,
        )
    }

    #[test]
    fn test_usage_matcher_boundaries() {
        let re = build_usage_matcher("sum").unwrap();
        assert!(re.is_match("const x = sum(1, 2);"));
        assert!(re.is_match("sum(values)"));
        assert!(re.is_match("  return sum"));
        assert!(!re.is_match("let total = sum\nconsole.log(total);"));
        assert!(!re.is_match("export default sum\n"));
        assert!(re.is_match("<sum<number>>"));
        assert!(re.is_match("{ sum: 1 }"));
        assert!(!re.is_match("checksum(data)"));
        assert!(!re.is_match("math.sum(1)"));
        assert!(!re.is_match("sum_all(1)"));
        assert!(!re.is_match("sum + 1"));
        assert!(build_usage_matcher("").is_none());
    }

    #[test]
    fn test_scan_document_one_usage_per_line_and_limit() {
        let doc = TextDocument::new(
            "/ws/use.ts",
            Language::TypeScript,
            "import { add } from './math';\nadd(add(1, 2), 3);\nconst y = add(4);\nadd(5);",
        );
        let re = build_usage_matcher("add").unwrap();

        let all = scan_document(&doc, &re, 10, ContextWindow::default());
        let lines: Vec<u32> = all.iter().map(|u| u.line_number).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(all[1].code, "const y = add(4);");
        assert_eq!(all[1].language, Some(Language::TypeScript));

        let capped = scan_document(&doc, &re, 2, ContextWindow::default());
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_scan_document_ignores_name_at_line_end() {
        let doc = TextDocument::new(
            "/ws/use.ts",
            Language::TypeScript,
            "let total = sum\nconsole.log(total);\nsum(1);",
        );
        let re = build_usage_matcher("sum").unwrap();

        let usages = scan_document(&doc, &re, 10, ContextWindow::default());
        let lines: Vec<u32> = usages.iter().map(|u| u.line_number).collect();
        assert_eq!(lines, vec![3]);
    }

    #[tokio::test]
    async fn test_search_skips_defining_file() {
        let search = MemoryFileSearch::new("/ws")
            .with_file("/ws/math.ts", "export function add(a, b) {\n  return a + b;\n}\nadd(1, 2);")
            .with_file("/ws/app.ts", "const total = add(1, 2);");

        let usages = search_workspace(
            &search,
            &record("add", "/ws/math.ts", 1),
            &UsageSearchConfig::default(),
        )
        .await;

        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].file_path, PathBuf::from("/ws/app.ts"));
        assert_eq!(usages[0].line_number, 1);
        assert_eq!(usages[0].context, "const total = add(1, 2);");
    }

    #[tokio::test]
    async fn test_caps_on_large_workspace() {
        let body = (0..5).map(|i| format!("go({i});")).collect::<Vec<_>>().join("\n");
        let mut search = MemoryFileSearch::new("/ws");
        for i in 0..150 {
            search.insert(format!("/ws/f{i:03}.ts"), body.clone());
        }

        let usages = search_workspace(
            &search,
            &record("go", "/ws/def.ts", 1),
            &UsageSearchConfig::default(),
        )
        .await;

        assert_eq!(usages.len(), 10);
        // Three per file, in enumeration order
        let files: Vec<&Path> = usages.iter().map(|u| u.file_path.as_path()).collect();
        assert_eq!(files[0], Path::new("/ws/f000.ts"));
        assert_eq!(files[3], Path::new("/ws/f001.ts"));
        assert_eq!(files[9], Path::new("/ws/f003.ts"));
        assert_eq!(usages[2].line_number, 3);
    }

    #[tokio::test]
    async fn test_file_cap_limits_enumeration() {
        let mut search = MockFileSearch::new();
        search
            .expect_find_files()
            .withf(|_, _, limit| *limit == 100)
            .times(1)
            .returning(|_, _, limit| {
                Ok((0..limit).map(|i| PathBuf::from(format!("/ws/{i}.ts"))).collect())
            });
        search
            .expect_open_document()
            .times(100)
            .returning(|path| Ok(TextDocument::new(path, Language::TypeScript, "nothing here")));

        let usages = search_workspace(
            &search,
            &record("go", "/ws/def.ts", 1),
            &UsageSearchConfig::default(),
        )
        .await;
        assert!(usages.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_files_are_contained() {
        let mut search = MockFileSearch::new();
        search.expect_find_files().returning(|_, _, _| {
            Ok(vec![PathBuf::from("/ws/bad.ts"), PathBuf::from("/ws/good.ts")])
        });
        search.expect_open_document().returning(|path| {
            if path.ends_with("bad.ts") {
                Err(TextSourceError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                })
            } else {
                Ok(TextDocument::new(path, Language::TypeScript, "go(1);"))
            }
        });

        let usages = search_workspace(
            &search,
            &record("go", "/ws/def.ts", 1),
            &UsageSearchConfig::default(),
        )
        .await;
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].file_path, PathBuf::from("/ws/good.ts"));
    }

    #[tokio::test]
    async fn test_enumeration_failure_yields_nothing() {
        let mut search = MockFileSearch::new();
        search
            .expect_find_files()
            .returning(|_, _, _| Err(FileSearchError::Task("walker panicked".to_string())));

        let usages = search_workspace(
            &search,
            &record("go", "/ws/def.ts", 1),
            &UsageSearchConfig::default(),
        )
        .await;
        assert!(usages.is_empty());
    }
}
