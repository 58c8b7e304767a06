//! §4.H.1 / §4.H.2: completion and dot-member resolution.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::document::document::Document;
use crate::document::point::Position;
use crate::document::symbol::{Symbol, SymbolKind};
use crate::query::identifiers::{extract_identifier_chain, nodes_for_completion};
use crate::query::walk::node_at_point;

use super::resolve::{gather_candidates, members_for_type, resolve_expression_type};
use super::Analyzer;

/// Bookkeeping extracted by scanning a call's argument list up to the
/// cursor: which parameters have already been used, positionally or by
/// name.
#[derive(Debug, Default, Clone)]
pub struct CallArgs {
    pub fn_name: String,
    pub positional: usize,
    pub keywords_used: Vec<String>,
}

fn keyword_arg_context(doc: &Document, pos: Position) -> Option<CallArgs> {
    let ts_point: tree_sitter::Point = crate::document::point::position_to_point(pos).into();
    let node = node_at_point(&doc.tree, crate::document::point::position_to_point(pos));
    let mut cur = Some(node);
    while let Some(n) = cur {
        if n.kind() == "argument_list" {
            let call = n.parent()?;
            if call.kind() != "call" {
                cur = n.parent();
                continue;
            }
            let fn_name = call
                .child_by_field_name("function")
                .and_then(|f| f.utf8_text(&doc.input).ok())
                .unwrap_or("")
                .to_string();

            let mut args = CallArgs {
                fn_name,
                ..Default::default()
            };
            let mut cursor = n.walk();
            for child in n.children(&mut cursor) {
                if child.start_position() >= ts_point {
                    break;
                }
                match child.kind() {
                    "," => {
                        if args.keywords_used.is_empty() {
                            args.positional += 1;
                        }
                    }
                    "keyword_argument" => {
                        if let Some(name_node) = child.child_by_field_name("name") {
                            if let Ok(name) = name_node.utf8_text(&doc.input) {
                                args.keywords_used.push(name.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            return Some(args);
        }
        cur = n.parent();
    }
    None
}

fn keyword_completion_candidates(analyzer: &Analyzer, doc: &Document, args: &CallArgs) -> Vec<Symbol> {
    let sig = doc
        .signatures
        .get(&args.fn_name)
        .or_else(|| analyzer.builtins.signatures.get(&args.fn_name));
    let Some(sig) = sig else {
        return Vec::new();
    };
    sig.params
        .iter()
        .enumerate()
        .filter(|(i, p)| *i >= args.positional && !args.keywords_used.contains(&p.name))
        .map(|(_, p)| {
            let mut sym = Symbol::new(
                format!("{}=", p.name),
                SymbolKind::Variable,
                Default::default(),
            );
            sym.detail = p.doc.clone().unwrap_or_default();
            sym
        })
        .collect()
}

fn to_completion_item(sym: &Symbol) -> CompletionItem {
    let sort_text = if sym.name.ends_with('=') {
        format!("0{}", sym.name)
    } else {
        format!("1{}", sym.name)
    };
    CompletionItem {
        label: sym.name.clone(),
        kind: Some(kind_for_completion(sym.kind)),
        detail: sym.detail.lines().next().map(str::to_string),
        sort_text: Some(sort_text),
        ..Default::default()
    }
}

fn kind_for_completion(kind: SymbolKind) -> CompletionItemKind {
    kind.to_completion_kind()
}

pub fn completion(analyzer: &Analyzer, doc: &Document, pos: Position) -> Vec<CompletionItem> {
    let Some(node) = nodes_for_completion(&doc.tree, crate::document::point::position_to_point(pos))
    else {
        return Vec::new();
    };
    let chain = extract_identifier_chain(&doc.input, node, None);
    let point = crate::document::point::position_to_point(pos);
    let node_at_pos = node_at_point(&doc.tree, point);

    let mut candidates: Vec<Symbol> = Vec::new();

    if let Some(call_args) = keyword_arg_context(doc, pos) {
        candidates.extend(keyword_completion_candidates(analyzer, doc, &call_args));
    }

    candidates.extend(gather_candidates(doc, &analyzer.builtins, node_at_pos));

    let Some((last, prefix_chain)) = chain.split_last() else {
        return Vec::new();
    };

    let mut filtered = candidates.clone();
    for name in prefix_chain {
        let found = filtered
            .iter()
            .find(|s| &s.name == name)
            .cloned();
        let Some(found) = found else {
            filtered = Vec::new();
            break;
        };
        let resolved = super::resolve::resolve_binded(&filtered, &found).clone();
        filtered = resolved.children;
    }

    filtered.retain(|s| s.name.starts_with(last.as_str()));

    if filtered.is_empty() && (chain.len() >= 2 || chain.last().map(String::is_empty).unwrap_or(false)) {
        let object_chain = &chain[..chain.len() - 1];
        if let Some(ty) = resolve_expression_type(doc, &analyzer.builtins, &candidates, object_chain) {
            filtered = members_for_type(&analyzer.builtins, &ty);
            filtered.retain(|s| s.name.starts_with(last.as_str()));
        }
    }

    filtered.iter().map(to_completion_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::Builtins;
    use crate::document::document::Document;
    use tower_lsp::lsp_types::Url;

    fn analyzer_with_os_builtin() -> Analyzer {
        let mut builtins = Builtins::new();
        let mut os = Symbol::new("os", SymbolKind::Object, Default::default());
        os.children.push(Symbol::new(
            "environ",
            SymbolKind::Object,
            Default::default(),
        ));
        os.children.push(Symbol::new(
            "name",
            SymbolKind::String,
            Default::default(),
        ));
        builtins.symbols.push(os);
        Analyzer::with_builtins(builtins)
    }

    #[test]
    fn completes_members_after_dot() {
        let analyzer = analyzer_with_os_builtin();
        let doc = Document::new(
            Url::parse("file:///t.star").unwrap(),
            b"os.\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let items = completion(&analyzer, &doc, Position::new(0, 3));
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"environ"));
        assert!(labels.contains(&"name"));
    }

    #[test]
    fn keyword_arg_completion_excludes_already_bound_params() {
        let mut builtins = Builtins::new();
        builtins.signatures.insert(
            "local".to_string(),
            crate::document::symbol::Signature {
                name: "local".into(),
                params: vec![
                    crate::document::symbol::Parameter {
                        name: "command".into(),
                        ..Default::default()
                    },
                    crate::document::symbol::Parameter {
                        name: "quiet".into(),
                        ..Default::default()
                    },
                    crate::document::symbol::Parameter {
                        name: "env".into(),
                        ..Default::default()
                    },
                    crate::document::symbol::Parameter {
                        name: "dir".into(),
                        ..Default::default()
                    },
                ],
                return_type: None,
                docs: Default::default(),
            },
        );
        let analyzer = Analyzer::with_builtins(builtins);
        let doc = Document::new(
            Url::parse("file:///t.star").unwrap(),
            b"local('x', env={}, )\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let items = completion(&analyzer, &doc, Position::new(0, 19));
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"quiet="));
        assert!(labels.contains(&"dir="));
        assert!(!labels.contains(&"command="));
        assert!(!labels.contains(&"env="));
    }
}
