//! Byte offset, line and column helpers over one version of a source buffer
//!
//! All offsets are byte offsets into UTF-8 text. Lines are 1-indexed, columns are
//! 1-indexed character counts from the start of the line.

use std::ops::Range;

/// Line table derived from a buffer. Rebuild it after every edit.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte range of each line's content, excluding the line terminator
    lines: Vec<Range<usize>>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;

        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                let end = if i > start && bytes[i - 1] == b'\r' { i - 1 } else { i };
                lines.push(start..end);
                start = i + 1;
            }
        }
        lines.push(start..text.len());

        Self {
            lines,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line containing `offset`. A newline byte belongs to the line it terminates.
    pub fn line_of(&self, offset: usize) -> Option<usize> {
        if offset > self.len {
            return None;
        }
        // lines[0] starts at 0, so the count is at least 1
        Some(self.lines.partition_point(|line| line.start <= offset))
    }

    /// Content range of a 1-indexed line
    pub fn line_range(&self, line: usize) -> Option<Range<usize>> {
        line.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .cloned()
    }
}

/// A buffer together with its line table, as seen by one detection pass.
#[derive(Debug, Clone)]
pub struct SourceView<'a> {
    text: &'a str,
    lines: LineIndex,
}

impl<'a> SourceView<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Substring by byte range. `None` when out of bounds or not on char boundaries.
    pub fn slice(&self, range: Range<usize>) -> Option<&'a str> {
        self.text.get(range)
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(offset).copied()
    }

    pub fn line_of(&self, offset: usize) -> Option<usize> {
        self.lines.line_of(offset)
    }

    pub fn line_range(&self, line: usize) -> Option<Range<usize>> {
        self.lines.line_range(line)
    }

    /// 1-indexed line and character column of `offset`
    pub fn line_and_column(&self, offset: usize) -> Option<(usize, usize)> {
        let line = self.lines.line_of(offset)?;
        let start = self.lines.line_range(line)?.start;
        let prefix = self.text.get(start..offset)?;
        Some((line, prefix.chars().count() + 1))
    }

    /// Leading whitespace of a line as a byte range plus its width in characters.
    /// `None` for lines that are blank or whitespace only.
    pub fn indentation(&self, line: usize) -> Option<(Range<usize>, usize)> {
        let range = self.line_range(line)?;
        let content = self.slice(range.clone())?;
        let (idx, _) = content.char_indices().find(|(_, c)| !c.is_whitespace())?;
        Some((range.start..range.start + idx, content[..idx].chars().count()))
    }
}

/// Replace `range` of `buffer` with `with`. Returns false, leaving the buffer untouched,
/// when the range does not map onto the buffer.
pub fn replace_range(buffer: &mut String, range: Range<usize>, with: &str) -> bool {
    if range.start > range.end
        || range.end > buffer.len()
        || !buffer.is_char_boundary(range.start)
        || !buffer.is_char_boundary(range.end)
    {
        return false;
    }
    buffer.replace_range(range, with);
    true
}

/// Insert `text` at `offset`. Same failure contract as [`replace_range`].
pub fn insert_at(buffer: &mut String, offset: usize, text: &str) -> bool {
    replace_range(buffer, offset..offset, text)
}

/// Terminator of the line whose content ends at `line_end`. The last line has none of its
/// own and takes the buffer's first one.
pub fn line_terminator(text: &str, line_end: usize) -> &'static str {
    let rest = text.get(line_end..).unwrap_or("");
    if rest.starts_with("\r\n") {
        return "\r\n";
    }
    if rest.starts_with('\n') {
        return "\n";
    }
    match text.find('\n') {
        Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

pub fn has_non_whitespace(text: &str) -> bool {
    text.chars().any(|c| !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_of(0), Some(1));
        assert_eq!(index.line_of(2), Some(1));
        assert_eq!(index.line_of(3), Some(2));
        assert_eq!(index.line_of(6), Some(3));
        assert_eq!(index.line_of(7), Some(4));
        assert_eq!(index.line_of(9), Some(4));
        assert_eq!(index.line_of(10), None);
    }

    #[test]
    fn test_line_range_excludes_terminator() {
        let index = LineIndex::new("ab\r\ncd");
        assert_eq!(index.line_range(1), Some(0..2));
        assert_eq!(index.line_range(2), Some(4..6));
        assert_eq!(index.line_range(0), None);
        assert_eq!(index.line_range(3), None);
    }

    #[test]
    fn test_line_and_column_counts_characters() {
        let view = SourceView::new("x\n  é}");
        // "é" is two bytes but one column
        assert_eq!(view.line_and_column(6), Some((2, 4)));
        assert_eq!(view.line_and_column(2), Some((2, 1)));
        // inside a multi-byte char
        assert_eq!(view.line_and_column(5), None);
    }

    #[test]
    fn test_indentation() {
        let view = SourceView::new("\tfoo\n    \n  bar");
        assert_eq!(view.indentation(1), Some((0..1, 1)));
        assert_eq!(view.indentation(2), None);
        assert_eq!(view.indentation(3), Some((10..12, 2)));
    }

    #[test]
    fn test_replace_and_insert() {
        let mut buffer = String::from("  }");
        assert!(replace_range(&mut buffer, 0..2, ""));
        assert_eq!(buffer, "}");
        assert!(insert_at(&mut buffer, 0, "\n"));
        assert_eq!(buffer, "\n}");
        assert!(!replace_range(&mut buffer, 1..5, "x"));
        assert_eq!(buffer, "\n}");
    }

    #[test]
    fn test_line_terminator() {
        assert_eq!(line_terminator("a\r\nb\nc", 1), "\r\n");
        assert_eq!(line_terminator("a\r\nb\nc", 4), "\n");
        // last line follows the first terminator in the buffer
        assert_eq!(line_terminator("a\r\nb", 4), "\r\n");
        assert_eq!(line_terminator("a\nb", 3), "\n");
        assert_eq!(line_terminator("ab", 2), "\n");
    }

    #[test]
    fn test_has_non_whitespace() {
        assert!(!has_non_whitespace(" \t "));
        assert!(has_non_whitespace("  x "));
    }
}
