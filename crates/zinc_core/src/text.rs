//! Source positions.
//!
//! Every syntax node carries a `SourcePos`: the file it came from and the
//! start/end line and column. Diagnostics print it as `file:line:col`.

use std::fmt;

/// Index of a source file in the session's file list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct FileId(pub u32);

/// A 1-based line/column pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for LineCol {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Where a syntax node sits in its source file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SourcePos {
    pub file: FileId,
    pub start: LineCol,
    pub end: LineCol,
}

impl SourcePos {
    #[inline]
    pub fn new(file: FileId, start: LineCol, end: LineCol) -> Self {
        debug_assert!(end >= start);
        Self { file, start, end }
    }

    /// A position on a single line.
    #[inline]
    pub fn line(file: FileId, line: u32, column: u32, end_column: u32) -> Self {
        Self::new(file, LineCol::new(line, column), LineCol::new(line, end_column))
    }

    /// Synthesized positions for compiler-generated nodes.
    #[inline]
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// A position covering both this one and `other` (same file assumed).
    pub fn union(&self, other: &SourcePos) -> SourcePos {
        SourcePos {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `lc` falls inside this position (inclusive bounds).
    pub fn contains(&self, lc: LineCol) -> bool {
        lc >= self.start && lc <= self.end
    }
}

impl fmt::Debug for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file.0, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

/// Maps byte offsets to line/column pairs. The JSON loader uses it when a
/// syntax dump carries byte offsets instead of explicit positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// 1-based line/column of a byte offset.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        LineCol::new(line as u32 + 1, offset - self.line_starts[line] + 1)
    }

    /// Position spanning the byte range `start..end`.
    pub fn pos(&self, file: FileId, start: u32, end: u32) -> SourcePos {
        SourcePos::new(file, self.line_col(start), self.line_col(end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_map() {
        let map = LineMap::new("line1\nline2\nline3");
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line_col(0), LineCol::new(1, 1));
        assert_eq!(map.line_col(5), LineCol::new(1, 6));
        assert_eq!(map.line_col(6), LineCol::new(2, 1));
        assert_eq!(map.line_col(8), LineCol::new(2, 3));
    }

    #[test]
    fn test_union_and_contains() {
        let a = SourcePos::line(FileId(0), 3, 4, 9);
        let b = SourcePos::line(FileId(0), 5, 1, 2);
        let u = a.union(&b);
        assert_eq!(u.start, LineCol::new(3, 4));
        assert_eq!(u.end, LineCol::new(5, 2));
        assert!(u.contains(LineCol::new(4, 80)));
        assert!(!a.contains(LineCol::new(3, 10)));
        assert_eq!(a.to_string(), "3:4");
    }
}
