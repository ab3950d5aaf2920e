//! Prompt construction for symbol explanations

use std::fmt::Write as _;

use crate::analysis::record::SymbolRecord;
use crate::finder::UsageExample;
use crate::io::text_source::{Selection, TextSource};

/// Selections shorter than this are widened before being sent as source
pub const MIN_SOURCE_EXCERPT_CHARS: usize = 100;
pub const EXPAND_LINES_BEFORE: usize = 5;
pub const EXPAND_LINES_AFTER: usize = 10;

pub const SYSTEM_PROMPT: &str = "You are a programming assistant who explains what functions do \
and how to use them. Keep answers short and practical.";

/// Selected source, widened to whole lines around the selection when it is short
pub fn source_excerpt<S: TextSource + ?Sized>(source: &S, selection: Selection) -> String {
    let selected = source.text_in(selection.into()).unwrap_or_default();
    if selected.chars().count() >= MIN_SOURCE_EXCERPT_CHARS {
        return selected;
    }

    let line_count = source.line_count();
    if line_count == 0 {
        return selected;
    }
    let first = (selection.start.line as usize).saturating_sub(EXPAND_LINES_BEFORE);
    let last = (selection.end.line as usize + EXPAND_LINES_AFTER).min(line_count - 1);
    (first..=last)
        .filter_map(|line| source.line_at(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User prompt for `record`, with up to `max_usages` real usage contexts
pub fn build_prompt(
    record: &SymbolRecord,
    source: Option<&str>,
    usages: &[UsageExample],
    max_usages: usize,
) -> String {
    let language = record.language().id();
    let mut prompt = format!(
        "Explain the following {} function/method and show how to use it.\n\n",
        language
    );
    let _ = writeln!(prompt, "Name: {}", record.name());
    let _ = writeln!(prompt, "Signature: {}", record.signature());
    let _ = writeln!(prompt, "Return type: {}", record.return_type());

    if !record.parameters().is_empty() {
        prompt.push_str("Parameters:\n");
        for parameter in record.parameters() {
            let _ = writeln!(prompt, "  - {}", parameter);
        }
    }

    if let Some(source) = source.filter(|s| !s.trim().is_empty()) {
        let _ = write!(prompt, "\nSource:\n```{}\n{}\n```\n", language, source);
    }

    let shown = &usages[..usages.len().min(max_usages)];
    if !shown.is_empty() {
        prompt.push_str("\nReal usages from this project:\n");
        for (index, usage) in shown.iter().enumerate() {
            let _ = write!(
                prompt,
                "\nExample {} (from {}:{}):\n```{}\n{}\n```\n",
                index + 1,
                usage.file_path.display(),
                usage.line_number,
                language,
                usage.context
            );
        }
    }

    prompt.push_str(&instructions(!shown.is_empty()));
    prompt
}

fn instructions(has_usages: bool) -> String {
    let mut text = String::from(
        "\nAnswer briefly, in two parts:\n\n\
         1. **What it is**:\n\
         \x20  - What the function does\n\
         \x20  - What each parameter means\n\
         \x20  - What the return value means\n\n\
         2. **How to use it**:\n\
         \x20  - A short, practical code example\n\
         \x20  - Show the call, its arguments and how the result is handled",
    );
    if has_usages {
        text.push_str("\n   - Follow the style of the real usages above");
    }
    text.push_str(
        "\n\nRequirements:\n\
         - Be concise\n\
         - The example must be usable as written",
    );
    text
}

/// Remove Markdown code fence lines from a complete response
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| match line.trim_start().strip_prefix("```") {
            Some(rest) => !rest.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
            None => true,
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
