use serde::{Deserialize, Serialize};

use super::{LineSpan, Position, Span};

/// Byte offset <-> line/column map for one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position {
            line: line + 1,
            column: offset - self.line_starts[line],
        }
    }

    /// Byte offset of a position, if it lies within the text.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let start = *self.line_starts.get(position.line.checked_sub(1)?)?;
        let line_end = self
            .line_starts
            .get(position.line)
            .copied()
            .unwrap_or(self.len + 1);
        let offset = start + position.column;
        (offset < line_end && offset <= self.len).then_some(offset)
    }

    pub fn line_span(&self, span: Span) -> LineSpan {
        LineSpan {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_line_based() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
        assert_eq!(index.position(2), Position { line: 1, column: 2 });
        assert_eq!(index.position(3), Position { line: 2, column: 0 });
        assert_eq!(index.position(7), Position { line: 4, column: 0 });
        assert_eq!(index.position(99), Position { line: 4, column: 2 });
    }

    #[test]
    fn test_offset_inverts_position() {
        let source = "class A {\n  int x;\n}\n";
        let index = LineIndex::new(source);
        for offset in 0..=source.len() {
            let pos = index.position(offset);
            assert_eq!(index.offset(pos), Some(offset), "offset {}", offset);
        }
        assert_eq!(index.offset(Position { line: 2, column: 40 }), None);
        assert_eq!(index.offset(Position { line: 0, column: 0 }), None);
    }
}
