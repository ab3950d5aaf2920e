//! Positions, ranges and file locations

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 0-based line and character column
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Rendered 1-based as `line:column`
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

impl From<lsp_types::Position> for Position {
    fn from(position: lsp_types::Position) -> Self {
        Self::new(position.line, position.character)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at `position`
    pub fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<lsp_types::Range> for Range {
    fn from(range: lsp_types::Range) -> Self {
        Self::new(range.start.into(), range.end.into())
    }
}

/// A range inside a specific file, as returned by reference providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub range: Range,
    pub file_path: PathBuf,
}

impl FileLocation {
    pub fn new(file_path: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            range,
            file_path: file_path.into(),
        }
    }

    /// 0-based line the location starts on
    pub fn start_line(&self) -> u32 {
        self.range.start.line
    }

    /// Whether this location starts on `line` (0-based) of `path`
    pub fn is_on_line(&self, path: &Path, line: u32) -> bool {
        self.file_path == path && self.start_line() == line
    }
}

/// `path:line:col`, `path:line:col-col` or `path:line:col-line:col`, 1-based
impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = self.range;
        write!(f, "{}:{}", self.file_path.display(), start)?;
        if self.range.is_empty() {
            Ok(())
        } else if start.line == end.line {
            write!(f, "-{}", end.column + 1)
        } else {
            write!(f, "-{}", end)
        }
    }
}

impl From<&lsp_types::Location> for FileLocation {
    fn from(location: &lsp_types::Location) -> Self {
        Self::new(location.uri.path().to_string(), location.range.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_formats() {
        let point = FileLocation::new("/src/a.ts", Range::point(Position::new(22, 4)));
        assert_eq!(point.to_string(), "/src/a.ts:23:5");

        let same_line = FileLocation::new(
            "/src/a.ts",
            Range::new(Position::new(22, 4), Position::new(22, 19)),
        );
        assert_eq!(same_line.to_string(), "/src/a.ts:23:5-20");

        let multi_line = FileLocation::new(
            "/src/a.ts",
            Range::new(Position::new(22, 4), Position::new(24, 9)),
        );
        assert_eq!(multi_line.to_string(), "/src/a.ts:23:5-25:10");
    }

    #[test]
    fn test_default_position_is_origin() {
        assert_eq!(Position::default(), Position::new(0, 0));
        assert!(Range::point(Position::default()).is_empty());
    }

    #[test]
    fn test_from_lsp_location() {
        let lsp = lsp_types::Location {
            uri: lsp_types::Uri::from_str("file:///work/src/app.ts").unwrap(),
            range: lsp_types::Range {
                start: lsp_types::Position {
                    line: 9,
                    character: 2,
                },
                end: lsp_types::Position {
                    line: 9,
                    character: 8,
                },
            },
        };
        let loc = FileLocation::from(&lsp);
        assert_eq!(loc.file_path, PathBuf::from("/work/src/app.ts"));
        assert_eq!(loc.range.start, Position::new(9, 2));
        assert!(loc.is_on_line(Path::new("/work/src/app.ts"), 9));
        assert!(!loc.is_on_line(Path::new("/work/src/app.ts"), 10));
    }
}
