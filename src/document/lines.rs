//! Byte-offset <-> (line, column) conversion, backed by a precomputed index
//! of line-start byte offsets. Built once per parse, invalidated by any
//! `Write`.

use super::point::Position;

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `starts[0] == 0`.
    starts: Vec<usize>,
    total_len: usize,
}

impl LineIndex {
    pub fn new(input: &[u8]) -> Self {
        let mut starts = vec![0usize];
        for (i, b) in input.iter().enumerate() {
            if *b == b'\n' {
                starts.push(i + 1);
            }
        }
        LineIndex {
            starts,
            total_len: input.len(),
        }
    }

    /// `offset -> (line, col)`. O(log n) via binary search over line starts.
    /// `col` is the byte distance from the line start, matching tree-sitter's
    /// own column units for non-UTF16 aware grammars.
    pub fn position_for_offset(&self, offset: usize) -> Position {
        let offset = offset.min(self.total_len);
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at - 1,
        };
        let col = offset - self.starts[line];
        Position::new(line as u32, col as u32)
    }

    /// `(line, col) -> offset`. O(1) given a valid line index.
    pub fn offset_for_position(&self, pos: Position) -> usize {
        let line = pos.line as usize;
        let Some(&line_start) = self.starts.get(line) else {
            return self.total_len;
        };
        let next_start = self
            .starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.total_len + 1);
        let line_end = next_start.saturating_sub(1).max(line_start);
        (line_start + pos.character as usize).min(line_end.max(line_start)).min(self.total_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_valid_offset() {
        let text = b"abc\ndef\nghi";
        let idx = LineIndex::new(text);
        for offset in 0..=text.len() {
            let pos = idx.position_for_offset(offset);
            let back = idx.offset_for_position(pos);
            assert_eq!(back, offset, "offset {offset} -> {pos:?} -> {back}");
        }
    }

    #[test]
    fn finds_correct_line_and_column() {
        let text = b"hello\nworld\n!";
        let idx = LineIndex::new(text);
        assert_eq!(idx.position_for_offset(0), Position::new(0, 0));
        assert_eq!(idx.position_for_offset(5), Position::new(0, 5));
        assert_eq!(idx.position_for_offset(6), Position::new(1, 0));
        assert_eq!(idx.position_for_offset(12), Position::new(2, 0));
    }

    #[test]
    fn handles_empty_input() {
        let idx = LineIndex::new(b"");
        assert_eq!(idx.position_for_offset(0), Position::new(0, 0));
        assert_eq!(idx.offset_for_position(Position::new(0, 0)), 0);
    }
}
