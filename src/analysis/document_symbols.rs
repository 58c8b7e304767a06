//! §4.H.6: document symbols. Trivial projection of `doc.symbols` with the
//! document's own URI filled into every location.

use tower_lsp::lsp_types::DocumentSymbol;

use crate::document::document::Document;
use crate::document::symbol::Symbol;

fn to_lsp_symbol(symbol: &Symbol) -> DocumentSymbol {
    #[allow(deprecated)]
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: if symbol.detail.is_empty() {
            None
        } else {
            Some(symbol.detail.clone())
        },
        kind: symbol.kind.to_lsp(),
        tags: None,
        deprecated: None,
        range: symbol.location.range.into(),
        selection_range: symbol.selection_range.into(),
        children: if symbol.children.is_empty() {
            None
        } else {
            Some(symbol.children.iter().map(to_lsp_symbol).collect())
        },
    }
}

pub fn document_symbols(doc: &Document) -> Vec<DocumentSymbol> {
    doc.symbols.iter().map(to_lsp_symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Url;

    #[test]
    fn returns_one_entry_per_top_level_symbol() {
        let doc = Document::new(
            Url::parse("file:///t.star").unwrap(),
            b"a = 1\ndef foo():\n    pass\n".to_vec(),
            crate::document::parse::Deadline::none(),
        )
        .unwrap();
        let symbols = document_symbols(&doc);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "a");
        assert_eq!(symbols[1].name, "foo");
    }
}
