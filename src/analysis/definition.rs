//! §4.H.5: go-to-definition.

use tower_lsp::lsp_types::{Location as LspLocation, Url};

use crate::document::document::Document;
use crate::document::point::Position;
use crate::query::identifiers::{extract_identifier_chain, nodes_for_completion};
use crate::query::walk::node_at_point;

use super::resolve::{find_definition, gather_candidates};
use super::Analyzer;

pub fn definition(analyzer: &Analyzer, doc: &Document, pos: Position) -> Vec<LspLocation> {
    let point = crate::document::point::position_to_point(pos);
    let Some(node) = nodes_for_completion(&doc.tree, point) else {
        return Vec::new();
    };
    let chain = extract_identifier_chain(&doc.input, node, Some(pos));

    let cursor_node = node_at_point(&doc.tree, point);
    let candidates = gather_candidates(doc, &analyzer.builtins, cursor_node);

    let Some(symbol) = find_definition(&candidates, &chain) else {
        return Vec::new();
    };

    let uri: Url = symbol.location.uri.clone().unwrap_or_else(|| doc.uri.clone());
    if symbol.location.uri.is_none() && symbol.location.range == Default::default() {
        // Builtins carry no location.
        return Vec::new();
    }

    vec![LspLocation {
        uri,
        range: symbol.location.range.into(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::document::Document;
    use tower_lsp::lsp_types::Url;

    #[test]
    fn resolves_local_variable_definition() {
        let doc = Document::new(
            Url::parse("file:///t.star").unwrap(),
            b"x = 1\nprint(x)\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let analyzer = Analyzer::new(&[]);
        let locs = definition(&analyzer, &doc, Position::new(1, 6));
        assert_eq!(locs.len(), 1);
    }

    #[test]
    fn builtins_have_no_definition_location() {
        let doc = Document::new(
            Url::parse("file:///t.star").unwrap(),
            b"print(1)\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let analyzer = Analyzer::new(&[]);
        let locs = definition(&analyzer, &doc, Position::new(0, 1));
        assert!(locs.is_empty());
    }
}
