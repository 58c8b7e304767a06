//! §4.H.4: hover.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

use crate::document::document::Document;
use crate::document::point::{node_range, Position};
use crate::query::identifiers::{extract_identifier_chain, nodes_for_completion};
use crate::query::walk::node_at_point;

use super::resolve::{find_definition, gather_candidates};
use super::Analyzer;

fn format_docstring(symbol_name: &str, docs: &crate::document::docstring::Parsed) -> String {
    let mut out = String::new();
    if !docs.description.is_empty() {
        out.push_str(&docs.description);
    } else {
        out.push_str(symbol_name);
    }

    for block in &docs.fields {
        if block.fields.is_empty() {
            continue;
        }
        out.push_str("\n\n# Parameters\n");
        for field in &block.fields {
            out.push_str(&format!("{}: {}\n", field.name, field.text));
        }
    }

    for remark in &docs.remarks {
        if remark.title.eq_ignore_ascii_case("Returns") {
            out.push_str(&format!("\n\n# Returns\n{}", remark.text));
        }
    }

    out
}

pub fn hover(analyzer: &Analyzer, doc: &Document, pos: Position) -> Option<Hover> {
    let point = crate::document::point::position_to_point(pos);
    let node = nodes_for_completion(&doc.tree, point)?;
    let chain = extract_identifier_chain(&doc.input, node, Some(pos));

    let cursor_node = node_at_point(&doc.tree, point);
    let candidates = gather_candidates(doc, &analyzer.builtins, cursor_node);

    let symbol = find_definition(&candidates, &chain)?;

    let docs = doc
        .signatures
        .get(&symbol.name)
        .or_else(|| analyzer.builtins.signatures.get(&symbol.name))
        .map(|sig| sig.docs.clone());

    let contents = match docs {
        Some(docs) => format_docstring(&symbol.name, &docs),
        None if !symbol.detail.is_empty() => symbol.detail.clone(),
        None => symbol.name.clone(),
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: contents,
        }),
        range: Some(node_range(node).into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Url;

    #[test]
    fn hover_on_loaded_function_shows_its_docstring() {
        let dep = crate::document::document::Document::new(
            Url::parse("file:///dep.star").unwrap(),
            b"def foo():\n    \"\"\"foos\"\"\"\n    pass\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();

        let mut main = crate::document::document::Document::new(
            Url::parse("file:///main.star").unwrap(),
            b"load('dep.star', 'foo')\nfoo()\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let load_range = main.loads[0].range;
        let foo_symbol = dep.symbols.iter().find(|s| s.name == "foo").cloned();
        let foo_sig = dep.signatures.get("foo").cloned();
        main.extend_with_binding(load_range, "foo", foo_symbol.as_ref(), foo_sig.as_ref(), &dep.uri);

        let analyzer = Analyzer::new(&[]);
        let result = hover(&analyzer, &main, Position::new(1, 1));
        assert!(result.is_some());
    }
}
