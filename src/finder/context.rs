//! Context excerpts around a usage line
//!
//! Two policies:
//! - [`fixed_window`]: N lines before and after the usage.
//! - [`block_context`]: the enclosing declaration, found by scanning up for a
//!   declaration head and down for the brace that closes it. Falls back to the
//!   fixed window when no plausible block is found.
//!
//! Brace counting is textual; braces inside strings and comments count too.

use std::sync::OnceLock;

use regex::Regex;

use crate::io::text_source::TextSource;

/// Lines of context to show around a usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub before: usize,
    pub after: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            before: 2,
            after: 2,
        }
    }
}

/// Minimum number of lines past the usage a block must cover to be used
const MIN_LINES_PAST_USAGE: usize = 2;

fn join_lines<S: TextSource + ?Sized>(source: &S, first: usize, last: usize) -> String {
    (first..=last)
        .filter_map(|idx| source.line_at(idx))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `window.before` lines above through `window.after` lines below `line`
pub fn fixed_window<S: TextSource + ?Sized>(source: &S, line: usize, window: ContextWindow) -> String {
    let line_count = source.line_count();
    if line_count == 0 {
        return String::new();
    }
    let first = line.saturating_sub(window.before).min(line_count - 1);
    let last = (line + window.after).min(line_count - 1);
    join_lines(source, first, last)
}

fn declaration_head() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?(?:function\*?|const|let|var|class)\s+[A-Za-z_$]",
        )
        .expect("valid declaration head regex")
    })
}

fn arrow_body_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=>\s*\{").expect("valid arrow body regex"))
}

fn parenthesized_head() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\)\s*\{\s*$").expect("valid block head regex"))
}

fn control_flow_guard() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:\}\s*)?(?:else\s+)?(?:if|for|while)\b").expect("valid guard regex")
    })
}

/// Whether `line` looks like the first line of an enclosing declaration
pub fn is_block_start(line: &str) -> bool {
    if declaration_head().is_match(line) || arrow_body_open().is_match(line) {
        return true;
    }
    parenthesized_head().is_match(line) && !control_flow_guard().is_match(line)
}

/// Nearest block start above `line`, at most `scan_lines` lines up
fn find_block_start<S: TextSource + ?Sized>(source: &S, line: usize, scan_lines: usize) -> Option<usize> {
    let lowest = line.saturating_sub(scan_lines);
    (lowest..line)
        .rev()
        .find(|&idx| source.line_at(idx).is_some_and(is_block_start))
}

/// First line at or after `start` where the brace balance closes, scanning no
/// further than `limit`
fn find_block_end<S: TextSource + ?Sized>(source: &S, start: usize, limit: usize) -> Option<usize> {
    let mut balance: i64 = 0;
    let mut seen_open = false;

    for idx in start..=limit {
        let line = source.line_at(idx)?;
        for ch in line.chars() {
            match ch {
                '{' => {
                    balance += 1;
                    seen_open = true;
                }
                '}' => balance -= 1,
                _ => {}
            }
        }
        if seen_open && balance <= 0 {
            return Some(idx);
        }
    }
    None
}

/// Context for the usage on `line` (0-based): the enclosing block when one can
/// be found within `scan_lines`, else the fixed window
pub fn block_context<S: TextSource + ?Sized>(
    source: &S,
    line: usize,
    scan_lines: usize,
    window: ContextWindow,
) -> String {
    let line_count = source.line_count();
    if line >= line_count {
        return fixed_window(source, line, window);
    }

    let limit = (line + scan_lines).min(line_count - 1);
    let block = find_block_start(source, line, scan_lines)
        .and_then(|start| find_block_end(source, start, limit).map(|end| (start, end)));

    match block {
        Some((start, end)) if end >= line + MIN_LINES_PAST_USAGE => join_lines(source, start, end),
        _ => fixed_window(source, line, window),
    }
}
