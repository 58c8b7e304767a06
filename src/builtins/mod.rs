//! Component G: the hierarchical namespace of preloaded symbols, functions
//! and types that the analyzer falls back to once a document's own symbols
//! are exhausted.

pub mod loader;
pub mod stdlib;

use std::collections::HashMap;

use tower_lsp::lsp_types::SignatureInformation;

use crate::document::symbol::{Class, Signature, Symbol};

#[derive(Debug, Clone, Default)]
pub struct Builtins {
    pub signatures: HashMap<String, Signature>,
    pub functions: HashMap<String, SignatureInformation>,
    pub methods: HashMap<String, Signature>,
    pub members: Vec<Symbol>,
    pub types: HashMap<String, Class>,
    pub symbols: Vec<Symbol>,
}

impl Builtins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
            && self.functions.is_empty()
            && self.methods.is_empty()
            && self.members.is_empty()
            && self.types.is_empty()
            && self.symbols.is_empty()
    }

    /// Merges `other` into `self`. Scalars (signature/type maps) overwrite
    /// by name, last write wins; list-shaped fields (symbols, members)
    /// append.
    pub fn update(&mut self, other: Builtins) {
        for (name, sig) in other.signatures {
            self.signatures.insert(name, sig);
        }
        for (name, info) in other.functions {
            self.functions.insert(name, info);
        }
        for (name, sig) in other.methods {
            self.methods.insert(name, sig);
        }
        self.members.extend(other.members);
        for (name, class) in other.types {
            self.types.insert(name, class);
        }
        self.symbols.extend(other.symbols);
    }

    pub fn find_method(&self, name: &str) -> Option<&Signature> {
        self.methods.get(name)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::point::Range;
    use crate::document::symbol::SymbolKind;

    #[test]
    fn update_overwrites_scalars_and_appends_lists() {
        let mut a = Builtins::new();
        a.symbols.push(Symbol::new("True", SymbolKind::Boolean, Range::default()));
        a.signatures.insert(
            "f".to_string(),
            Signature {
                name: "f".into(),
                params: vec![],
                return_type: None,
                docs: Default::default(),
            },
        );

        let mut b = Builtins::new();
        b.symbols.push(Symbol::new("False", SymbolKind::Boolean, Range::default()));
        b.signatures.insert(
            "f".to_string(),
            Signature {
                name: "f".into(),
                params: vec![Default::default()],
                return_type: None,
                docs: Default::default(),
            },
        );

        a.update(b);
        assert_eq!(a.symbols.len(), 2);
        assert_eq!(a.signatures["f"].params.len(), 1);
    }
}
