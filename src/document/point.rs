//! Position types shared between tree-sitter's coordinate space and LSP's.

use tower_lsp::lsp_types::{Position as LspPosition, Range as LspRange};
use tree_sitter::Point as TsPoint;

/// Zero-based `(row, column)` pair in tree-sitter's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub fn new(row: u32, column: u32) -> Self {
        Point { row, column }
    }
}

impl From<TsPoint> for Point {
    fn from(p: TsPoint) -> Self {
        Point {
            row: p.row as u32,
            column: p.column as u32,
        }
    }
}

impl From<Point> for TsPoint {
    fn from(p: Point) -> Self {
        TsPoint {
            row: p.row as usize,
            column: p.column as usize,
        }
    }
}

/// Zero-based `(line, character)` pair in LSP's coordinate space. Identical
/// representation to [`Point`], kept distinct at the type level so callers
/// can't accidentally mix tree-sitter and LSP coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

pub fn position_to_point(pos: Position) -> Point {
    Point::new(pos.line, pos.character)
}

pub fn point_to_position(pt: Point) -> Position {
    Position::new(pt.row, pt.column)
}

impl From<LspPosition> for Position {
    fn from(p: LspPosition) -> Self {
        Position::new(p.line, p.character)
    }
}

impl From<Position> for LspPosition {
    fn from(p: Position) -> Self {
        LspPosition::new(p.line, p.character)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

impl From<Range> for LspRange {
    fn from(r: Range) -> Self {
        LspRange::new(r.start.into(), r.end.into())
    }
}

pub fn node_range(node: tree_sitter::Node<'_>) -> Range {
    Range::new(
        point_to_position(node.start_position().into()),
        point_to_position(node.end_position().into()),
    )
}

pub fn before(a: Point, b: Point) -> bool {
    a < b
}

pub fn before_or_equal(a: Point, b: Point) -> bool {
    a <= b
}

pub fn after(a: Point, b: Point) -> bool {
    a > b
}

pub fn after_or_equal(a: Point, b: Point) -> bool {
    a >= b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_points_lexicographically_by_row_then_column() {
        assert!(before(Point::new(0, 5), Point::new(1, 0)));
        assert!(before(Point::new(2, 1), Point::new(2, 4)));
        assert!(!before(Point::new(2, 4), Point::new(2, 4)));
        assert!(before_or_equal(Point::new(2, 4), Point::new(2, 4)));
        assert!(after(Point::new(3, 0), Point::new(2, 999)));
    }

    #[test]
    fn position_and_point_are_field_renames() {
        let pos = Position::new(4, 7);
        let pt = position_to_point(pos);
        assert_eq!(pt.row, 4);
        assert_eq!(pt.column, 7);
        assert_eq!(point_to_position(pt), pos);
    }
}
