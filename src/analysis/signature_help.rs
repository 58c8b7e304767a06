//! §4.H.3: signature help.

use tower_lsp::lsp_types::{
    ParameterInformation, ParameterLabel, SignatureHelp, SignatureInformation,
};
use tree_sitter::Node;

use crate::document::document::Document;
use crate::document::point::Position;
use crate::document::symbol::Signature;
use crate::query::walk::node_at_point;

use super::resolve::{gather_candidates, resolve_expression_type};
use super::Analyzer;

struct CallContext {
    fn_name: String,
    positional: usize,
    current_keyword: Option<String>,
}

fn find_enclosing_call<'a>(mut node: Node<'a>) -> Option<(Node<'a>, Node<'a>)> {
    loop {
        if node.kind() == "call" {
            if let Some(args) = node.child_by_field_name("arguments") {
                return Some((node, args));
            }
        }
        // ERROR-tolerant in-progress call: `identifier` followed by `(`
        // with no matching close, living under an ERROR node.
        if node.kind() == "ERROR" {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            for pair in children.windows(2) {
                if pair[0].kind() == "identifier" && pair[1].kind() == "(" {
                    return Some((node, node));
                }
            }
        }
        node = node.parent()?;
    }
}

fn extract_call_context(doc: &Document, call: Node<'_>, args: Node<'_>, pos: Position) -> CallContext {
    let ts_point: tree_sitter::Point =
        crate::document::point::position_to_point(pos).into();

    let fn_name = call
        .child_by_field_name("function")
        .and_then(|f| f.utf8_text(&doc.input).ok())
        .unwrap_or("")
        .to_string();

    let mut positional = 0usize;
    let mut current_keyword = None;
    let mut any_keyword_seen = false;

    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.start_position() >= ts_point {
            break;
        }
        match child.kind() {
            "," => {
                if !any_keyword_seen {
                    positional += 1;
                }
            }
            "=" => {
                if let Some(prev) = child.prev_sibling() {
                    if prev.kind() == "identifier" {
                        current_keyword = prev.utf8_text(&doc.input).ok().map(str::to_string);
                        any_keyword_seen = true;
                    }
                }
            }
            "keyword_argument" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    current_keyword = name_node.utf8_text(&doc.input).ok().map(str::to_string);
                }
                any_keyword_seen = true;
            }
            _ => {}
        }
    }

    CallContext {
        fn_name,
        positional,
        current_keyword,
    }
}

fn resolve_signature(analyzer: &Analyzer, doc: &Document, node: Node<'_>, fn_name: &str) -> Option<Signature> {
    if let Some((before_dot, method_name)) = fn_name.rsplit_once('.') {
        let candidates = gather_candidates(doc, &analyzer.builtins, node);
        let object_chain: Vec<String> = before_dot.split('.').map(str::to_string).collect();
        if let Some(ty) = resolve_expression_type(doc, &analyzer.builtins, &candidates, &object_chain) {
            if let Some(class) = analyzer.builtins.types.get(&ty) {
                if let Some(sig) = class.find_method(method_name) {
                    return Some(sig.clone());
                }
            }
        }
        if let Some(sig) = analyzer.builtins.methods.get(method_name) {
            return Some(sig.clone());
        }
        return None;
    }

    // Enclosing blocks up to module root may define nested functions not
    // captured by `doc.signatures` (top-level only); check those first.
    let mut cur = node.parent();
    while let Some(n) = cur {
        if matches!(n.kind(), "block" | "module") {
            let nested = crate::query::extract::function_signatures_direct(&doc.input, n);
            if let Some(sig) = nested.get(fn_name) {
                return Some(sig.clone());
            }
        }
        cur = n.parent();
    }

    doc.signatures
        .get(fn_name)
        .or_else(|| analyzer.builtins.signatures.get(fn_name))
        .cloned()
}

pub fn signature_help(analyzer: &Analyzer, doc: &Document, pos: Position) -> Option<SignatureHelp> {
    let point = crate::document::point::position_to_point(pos);
    let node = node_at_point(&doc.tree, point);
    let (call, args) = find_enclosing_call(node)?;
    let ctx = extract_call_context(doc, call, args, pos);

    let sig = resolve_signature(analyzer, doc, node, &ctx.fn_name)?;

    let active_parameter = match &ctx.current_keyword {
        Some(kw) => sig.params.iter().position(|p| &p.name == kw).unwrap_or(0),
        None => ctx.positional,
    };
    let active_parameter = active_parameter.min(sig.params.len().saturating_sub(1));

    let parameters: Vec<ParameterInformation> = sig
        .params
        .iter()
        .map(|p| ParameterInformation {
            label: ParameterLabel::Simple(p.content.clone()),
            documentation: None,
        })
        .collect();

    let info = SignatureInformation {
        label: format!("{}{}", sig.name, sig.label()),
        documentation: None,
        parameters: Some(parameters),
        active_parameter: Some(active_parameter as u32),
    };

    Some(SignatureHelp {
        signatures: vec![info],
        active_signature: Some(0),
        active_parameter: Some(active_parameter as u32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Url;

    #[test]
    fn signature_help_mid_call_reports_active_parameter() {
        let src = b"def foo(a, b: str, c=None, d: int=5) -> List[str]:\n    pass\nfoo(1,,)\n".to_vec();
        let doc = Document::new(
            Url::parse("file:///test.star").unwrap(),
            src,
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let analyzer = Analyzer::new(&[]);
        let help = signature_help(&analyzer, &doc, Position::new(2, 7)).unwrap();
        assert_eq!(help.signatures.len(), 1);
        assert_eq!(
            help.signatures[0].label,
            "foo(a, b: str, c=None, d: int=5) -> List[str]"
        );
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn comma_after_keyword_argument_does_not_advance_positional_count() {
        let src = b"def local(command, quiet, env, dir):\n    pass\nlocal('x', env={}, )\n".to_vec();
        let doc = Document::new(
            Url::parse("file:///test.star").unwrap(),
            src,
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let analyzer = Analyzer::new(&[]);
        let help = signature_help(&analyzer, &doc, Position::new(2, 19)).unwrap();
        assert_eq!(help.active_parameter, Some(1));
    }
}
