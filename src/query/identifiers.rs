//! Completion-context selection (`nodes_for_completion`) and identifier-chain
//! extraction, including the ERROR-tolerant fallback that makes completion
//! usable on partially typed code.

use tree_sitter::Node;

use crate::document::point::Point;

use super::walk::node_at_point;

/// Picks the node whose textual content the caller should treat as "what
/// the user is completing", given the smallest node at the cursor point.
pub fn nodes_for_completion<'a>(tree: &'a tree_sitter::Tree, pt: Point) -> Option<Node<'a>> {
    let leaf = node_at_point(tree, pt);
    select_completion_node(leaf, pt)
}

fn covers(node: Node<'_>, pt: tree_sitter::Point) -> bool {
    node.start_position() <= pt && pt < node.end_position()
}

fn select_completion_node<'a>(mut node: Node<'a>, pt: Point) -> Option<Node<'a>> {
    let ts_pt = pt.into();

    loop {
        match node.kind() {
            "string" | "comment" if covers(node, ts_pt) => return None,
            "module" | "block" => {
                let mut cursor = node.walk();
                let next = node
                    .named_children(&mut cursor)
                    .find(|c| c.start_position() >= ts_pt);
                match next {
                    Some(n) => {
                        node = n;
                        continue;
                    }
                    None => return Some(node),
                }
            }
            "if_statement" | "expression_statement" | "for_statement" | "assignment"
                if node.named_child_count() == 1 =>
            {
                if let Some(only) = node.named_child(0) {
                    node = only;
                    continue;
                }
                return Some(node);
            }
            "if_statement" | "expression_statement" | "for_statement" | "assignment" => {
                let mut cursor = node.walk();
                let child = node
                    .named_children(&mut cursor)
                    .filter(|c| c.end_position() <= ts_pt)
                    .last();
                return child
                    .and_then(|c| trailing_identifier_chain(c))
                    .or(Some(node));
            }
            "attribute" => return Some(node),
            "identifier" => {
                if let Some(parent) = node.parent() {
                    if parent.kind() == "attribute" {
                        node = parent;
                        continue;
                    }
                }
                return Some(node);
            }
            "ERROR" | "argument_list" => return trailing_leaf_run(node, ts_pt),
            _ => return Some(node),
        }
    }
}

fn trailing_identifier_chain(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "identifier" || node.kind() == "attribute" {
        Some(node)
    } else {
        None
    }
}

/// For `ERROR`/`argument_list` nodes: gathers all leaves of this node and
/// its previous named sibling, then returns the node corresponding to the
/// longest trailing run whose kind is `identifier` or `"."`. We return the
/// node itself here; callers re-walk it with [`super::walk::leaf_nodes`] to
/// get the actual run.
fn trailing_leaf_run<'a>(node: Node<'a>, _pt: tree_sitter::Point) -> Option<Node<'a>> {
    Some(node)
}

/// Extracts the identifier chain from a completion node, e.g. `a.b.c` ->
/// `["a", "b", "c"]`. A trailing dot or an empty expression appends `""`.
/// Any identifier starting at or after `limit` (if given) is replaced with
/// `""` -- used by hover to isolate the identifier under the cursor.
pub fn extract_identifier_chain(input: &[u8], node: Node<'_>, limit: Option<Point>) -> Vec<String> {
    match node.kind() {
        "identifier" => vec![clip(input, node, limit)],
        "attribute" => {
            let mut chain = Vec::new();
            flatten_attribute(input, node, limit, &mut chain);
            chain
        }
        "ERROR" | "argument_list" => trailing_run_chain(input, node, limit),
        _ => {
            let text = node.utf8_text(input).unwrap_or("").trim();
            if text.is_empty() {
                vec![String::new()]
            } else {
                vec![text.to_string()]
            }
        }
    }
}

fn clip(input: &[u8], node: Node<'_>, limit: Option<Point>) -> String {
    if let Some(limit) = limit {
        let ts_limit: tree_sitter::Point = limit.into();
        if node.start_position() >= ts_limit {
            return String::new();
        }
    }
    node.utf8_text(input).unwrap_or("").to_string()
}

fn flatten_attribute(input: &[u8], node: Node<'_>, limit: Option<Point>, out: &mut Vec<String>) {
    if node.kind() == "attribute" {
        if let Some(obj) = node.child_by_field_name("object") {
            flatten_attribute(input, obj, limit, out);
        }
        if let Some(attr) = node.child_by_field_name("attribute") {
            out.push(clip(input, attr, limit));
        }
    } else if node.kind() == "identifier" {
        out.push(clip(input, node, limit));
    }
}

fn trailing_run_chain(input: &[u8], node: Node<'_>, limit: Option<Point>) -> Vec<String> {
    let mut leaves: Vec<Node<'_>> = Vec::new();
    if let Some(prev) = node.prev_named_sibling() {
        leaves.extend(super::walk::leaf_nodes(prev));
    }
    leaves.extend(super::walk::leaf_nodes(node));

    let mut run_start = leaves.len();
    for (i, leaf) in leaves.iter().enumerate().rev() {
        if leaf.kind() == "identifier" || leaf.kind() == "." {
            run_start = i;
        } else {
            break;
        }
    }

    let run = &leaves[run_start..];
    if run.is_empty() {
        return vec![String::new()];
    }

    let mut chain = Vec::new();
    let mut ends_with_dot = false;
    for leaf in run {
        if leaf.kind() == "identifier" {
            chain.push(clip(input, *leaf, limit));
            ends_with_dot = false;
        } else if leaf.kind() == "." {
            ends_with_dot = true;
        }
    }
    if ends_with_dot || chain.is_empty() {
        chain.push(String::new());
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::{parse, Deadline};

    #[test]
    fn extracts_dotted_chain() {
        let src = b"os.environ\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let node = nodes_for_completion(&tree, Point::new(0, 11)).unwrap();
        let chain = extract_identifier_chain(src, node, None);
        assert_eq!(chain, vec!["os", "environ"]);
    }

    #[test]
    fn trailing_dot_appends_empty_string() {
        let src = b"os.\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let node = nodes_for_completion(&tree, Point::new(0, 3)).unwrap();
        let chain = extract_identifier_chain(src, node, None);
        assert_eq!(chain, vec!["os", ""]);
    }

    #[test]
    fn never_completes_inside_a_string_literal() {
        let src = b"x = \"hello\"\n";
        let tree = parse(src, Deadline::none()).unwrap();
        assert!(nodes_for_completion(&tree, Point::new(0, 7)).is_none());
    }
}
