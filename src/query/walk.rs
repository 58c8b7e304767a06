//! Component C: reusable tree walks over a tree-sitter CST.

use tree_sitter::{Node, Tree};

use crate::document::point::Point;

/// Tri-state predicate result for [`find_child`]: skip the node's entire
/// subtree, accept the node as the match, or keep descending into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Skip,
    Match,
    Continue,
}

/// The smallest *named* descendant of `tree`'s root whose range covers `pt`.
pub fn named_node_at_position(tree: &Tree, pt: Point) -> Node<'_> {
    let ts_point = pt.into();
    let mut node = tree.root_node();
    loop {
        let mut advanced = false;
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                if point_in_range(ts_point, child) {
                    node = child;
                    advanced = true;
                    break;
                }
            }
        }
        if !advanced {
            return node;
        }
    }
}

/// Like [`named_node_at_position`] but also descends into unnamed children,
/// so punctuation like `.` can be found.
pub fn node_at_point(tree: &Tree, pt: Point) -> Node<'_> {
    let ts_point = pt.into();
    let mut node = tree.root_node();
    loop {
        let mut advanced = false;
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if point_in_range(ts_point, child) {
                    node = child;
                    advanced = true;
                    break;
                }
            }
        }
        if !advanced {
            return node;
        }
    }
}

fn point_in_range(pt: tree_sitter::Point, node: Node<'_>) -> bool {
    let start = node.start_position();
    let end = node.end_position();
    (pt >= start) && (pt < end || (pt == end && start == end))
}

/// Flattened in-order sequence of leaf (zero-child) descendants of `node`,
/// including `node` itself when it has no children.
pub fn leaf_nodes<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    collect_leaves(node, &mut out);
    out
}

fn collect_leaves<'a>(node: Node<'a>, out: &mut Vec<Node<'a>>) {
    if node.child_count() == 0 {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_leaves(child, out);
    }
}

/// Returns the first descendant of `node` (pre-order, including `node`
/// itself) for which `predicate` returns [`Descend::Match`]. A
/// [`Descend::Skip`] verdict prunes that node's subtree; [`Descend::Continue`]
/// keeps walking into its children.
pub fn find_child<'a, F>(node: Node<'a>, predicate: &mut F) -> Option<Node<'a>>
where
    F: FnMut(Node<'a>) -> Descend,
{
    match predicate(node) {
        Descend::Skip => None,
        Descend::Match => Some(node),
        Descend::Continue => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if let Some(found) = find_child(child, predicate) {
                    return Some(found);
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::{parse, Deadline};

    #[test]
    fn named_node_at_position_covers_the_point() {
        let src = b"def foo(a, b):\n    return a + b\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let node = named_node_at_position(&tree, Point::new(0, 4));
        assert!(node.start_position().row <= 0);
        assert!(node.end_position().row >= 0);
    }

    #[test]
    fn leaf_nodes_are_flattened_in_order() {
        let src = b"a = 1\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let leaves = leaf_nodes(tree.root_node());
        assert!(leaves.iter().any(|n| n.kind() == "identifier"));
        assert!(leaves.iter().any(|n| n.kind() == "integer"));
    }

    #[test]
    fn find_child_respects_skip_and_match() {
        let src = b"def foo():\n    x = 1\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let found = find_child(tree.root_node(), &mut |n| {
            if n.kind() == "parameters" {
                Descend::Skip
            } else if n.kind() == "identifier" {
                Descend::Match
            } else {
                Descend::Continue
            }
        });
        assert!(found.is_some());
    }
}
