//! Read-only text documents with line and position access
//!
//! [`TextSource`] is the document abstraction the analyzers and the usage
//! finder consume. [`TextDocument`] is the in-memory implementation: content is
//! normalized to UTF-8 with LF line endings, columns count characters.

use std::path::{Path, PathBuf};

use crate::io::file_system::FileSystemTrait;
use crate::language::Language;
use crate::symbol::location::{Position, Range};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TextSourceError {
    #[error("Position out of bounds: {pos:?}")]
    PositionOutOfBounds { pos: Position },

    #[error("Invalid range: start {start:?} after end {end:?}")]
    InvalidRange { start: Position, end: Position },

    #[error("Unsupported encoding in {path}: {reason}")]
    UnsupportedEncoding { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Selection
// ============================================================================

/// Selected range; an empty selection is a plain cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    pub fn cursor(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Selection> for Range {
    fn from(selection: Selection) -> Self {
        Range::new(selection.start, selection.end)
    }
}

// ============================================================================
// Text Source Trait
// ============================================================================

/// Read-only document access used by recognition and usage search
pub trait TextSource {
    fn file_path(&self) -> &Path;

    fn language(&self) -> &Language;

    fn line_count(&self) -> usize;

    /// Text of a 0-based line without its terminator
    fn line_at(&self, line: usize) -> Option<&str>;

    /// Whole document text
    fn text(&self) -> &str;

    /// Text covered by `range`
    fn text_in(&self, range: Range) -> Result<String, TextSourceError>;

    /// Position of a byte offset into [`TextSource::text`]; offsets past the end clamp
    fn position_at(&self, offset: usize) -> Position;

    fn selection(&self) -> Selection;

    /// Line the cursor (selection start) is on
    fn cursor_line(&self) -> usize {
        self.selection().start.line as usize
    }

    /// Identifier under `position`, if any
    fn word_at(&self, position: Position) -> Option<String> {
        let line = self.line_at(position.line as usize)?;
        let chars: Vec<char> = line.chars().collect();
        let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';

        let col = (position.column as usize).min(chars.len());
        let mut start = col;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = col;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }

        if start == end {
            return None;
        }
        Some(chars[start..end].iter().collect())
    }
}

// ============================================================================
// Text Document
// ============================================================================

#[derive(Debug, Clone)]
pub struct TextDocument {
    path: PathBuf,
    language: Language,
    content: String,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,
    selection: Selection,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, language: Language, content: impl Into<String>) -> Self {
        let content = normalize_line_endings(&content.into());
        let line_starts = build_line_index(&content);

        Self {
            path: path.into(),
            language,
            content,
            line_starts,
            selection: Selection::default(),
        }
    }

    /// Load a document through `filesystem`, inferring the language from the extension
    pub fn load<F: FileSystemTrait>(path: &Path, filesystem: &F) -> Result<Self, TextSourceError> {
        let bytes = filesystem.read(path).map_err(|source| TextSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = normalize_encoding(path, &bytes)?;
        Ok(Self::new(path, Language::from_path(path), content))
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_cursor(self, position: Position) -> Self {
        self.with_selection(Selection::cursor(position))
    }

    /// Selected text, or the identifier under the cursor when nothing is selected
    pub fn selected_text_or_word(&self) -> Option<String> {
        let selection = self.selection();
        if !selection.is_empty()
            && let Ok(text) = self.text_in(selection.into())
        {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        self.word_at(selection.start)
    }

    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.content.len(),
        };
        Some((start, end))
    }

    /// Byte offset of a position; the column may point one past the last character
    fn offset_of(&self, pos: Position) -> Result<usize, TextSourceError> {
        let (start, end) = self
            .line_bounds(pos.line as usize)
            .ok_or(TextSourceError::PositionOutOfBounds { pos })?;
        let line = &self.content[start..end];

        let col = pos.column as usize;
        match line.char_indices().nth(col) {
            Some((byte, _)) => Ok(start + byte),
            None if col == line.chars().count() => Ok(end),
            None => Err(TextSourceError::PositionOutOfBounds { pos }),
        }
    }
}

impl TextSource for TextDocument {
    fn file_path(&self) -> &Path {
        &self.path
    }

    fn language(&self) -> &Language {
        &self.language
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_at(&self, line: usize) -> Option<&str> {
        let (start, end) = self.line_bounds(line)?;
        Some(&self.content[start..end])
    }

    fn text(&self) -> &str {
        &self.content
    }

    fn text_in(&self, range: Range) -> Result<String, TextSourceError> {
        if range.end < range.start {
            return Err(TextSourceError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        let start = self.offset_of(range.start)?;
        let end = self.offset_of(range.end)?;
        Ok(self.content[start..end].to_string())
    }

    fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.content.len());
        while !self.content.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = self.content[self.line_starts[line]..offset].chars().count();

        Position::new(line as u32, column as u32)
    }

    fn selection(&self) -> Selection {
        self.selection
    }
}

// ============================================================================
// Content Normalization
// ============================================================================

fn build_line_index(content: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    for (idx, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push(idx + 1);
        }
    }
    line_starts
}

fn normalize_line_endings(content: &str) -> String {
    if content.contains('\r') {
        content.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        content.to_string()
    }
}

/// Decode file bytes: UTF-8 (BOM stripped), Latin-1 fallback, UTF-16 rejected
fn normalize_encoding(path: &Path, bytes: &[u8]) -> Result<String, TextSourceError> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return Ok(String::from_utf8_lossy(rest).into_owned());
    }

    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(TextSourceError::UnsupportedEncoding {
            path: path.to_path_buf(),
            reason: "UTF-16 encoding not supported".to_string(),
        });
    }

    match std::str::from_utf8(bytes) {
        Ok(content) => Ok(content.to_string()),
        // Latin-1 for legacy files
        Err(_) => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}
