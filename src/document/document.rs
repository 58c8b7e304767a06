//! Component E: a parsed source file plus the indices derived from it.

use std::collections::HashMap;

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};
use tree_sitter::Tree;

use crate::query::extract::{self, is_load_call};
use crate::query::unquote::unquote;

use super::lines::LineIndex;
use super::parse::{self, Deadline, ParseError};
use super::point::{node_range, Range};
use super::symbol::{Location, Signature, Symbol, SymbolKind, SymbolTag};

#[derive(Debug, Clone)]
pub struct LoadBinding {
    pub alias: String,
    pub original: String,
}

#[derive(Debug, Clone)]
pub struct LoadStatement {
    pub file: String,
    pub bindings: Vec<LoadBinding>,
    pub range: Range,
    pub diagnostics: Vec<Diagnostic>,
}

/// A parsed source file plus everything [`crate::query::extract`] derives
/// from it. Cheap to [`Document::copy`]: the tree is duplicated (tree-sitter
/// trees support cheap structural sharing), the input bytes and indices are
/// shared/cloned by key.
#[derive(Clone)]
pub struct Document {
    pub uri: Url,
    pub input: Vec<u8>,
    pub tree: Tree,
    pub lines: LineIndex,
    pub signatures: HashMap<String, Signature>,
    pub symbols: Vec<Symbol>,
    pub loads: Vec<LoadStatement>,
    pub diagnostics: Vec<Diagnostic>,
}

fn diag(range: Range, severity: DiagnosticSeverity, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        range: range.into(),
        severity: Some(severity),
        message: message.into(),
        ..Default::default()
    }
}

/// Indefinite-article prefixed description of a node kind, e.g. `"an if
/// statement"`, used in the "load statement not allowed in <kind>" message.
fn article_for(kind: &str) -> String {
    let pretty = kind.replace('_', " ");
    let starts_vowel = pretty
        .chars()
        .next()
        .map(|c| "aeiou".contains(c.to_ascii_lowercase()))
        .unwrap_or(false);
    if starts_vowel {
        format!("an {pretty}")
    } else {
        format!("a {pretty}")
    }
}

impl Document {
    pub fn new(uri: Url, input: Vec<u8>, deadline: Deadline) -> Result<Self, ParseError> {
        let tree = parse::parse(&input, deadline)?;
        Ok(Self::from_tree(uri, input, tree))
    }

    pub fn from_tree(uri: Url, input: Vec<u8>, tree: Tree) -> Self {
        let lines = LineIndex::new(&input);
        let root = tree.root_node();

        let signatures = extract::function_signatures_direct(&input, root);
        let mut symbols = extract::document_symbols(&input, root);
        for sym in &mut symbols {
            sym.location.uri = Some(uri.clone());
        }
        let (loads, mut diagnostics) = collect_loads(&input, root);

        if root.has_error() {
            diagnostics.push(diag(
                node_range(root),
                DiagnosticSeverity::WARNING,
                "source has syntax errors; analysis may be incomplete",
            ));
        }

        Document {
            uri,
            input,
            tree,
            lines,
            signatures,
            symbols,
            loads,
            diagnostics,
        }
    }

    /// Shallow clone: duplicated tree, shared input, cloned derived indices.
    /// Mirrors the upstream `Copy()` contract -- callers never alias the
    /// document manager's cache.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Appends a symbol (and, if it names a function, a signature) imported
    /// from a dependency via a `load()` binding. Called by the document
    /// manager once the dependency has been resolved.
    pub fn extend_with_binding(
        &mut self,
        load_range: Range,
        alias: &str,
        original_symbol: Option<&Symbol>,
        original_signature: Option<&Signature>,
        exporting_uri: &Url,
    ) {
        let Some(original) = original_symbol else {
            self.loads
                .iter_mut()
                .find(|l| l.range == load_range)
                .map(|l| {
                    l.diagnostics.push(diag(
                        load_range,
                        DiagnosticSeverity::WARNING,
                        format!("symbol '{alias}' not found in {}", exporting_uri.path()),
                    ))
                });
            return;
        }

        let mut sym = original.clone();
        sym.name = alias.to_string();
        sym.location = Location {
            uri: Some(exporting_uri.clone()),
            range: load_range,
        };
        sym.tags.push(SymbolTag::Binded);
        if sym.detail.is_empty() {
            sym.detail = original.name.clone();
        }
        self.symbols.push(sym);

        if original.kind == SymbolKind::Function {
            if let Some(sig) = original_signature {
                self.signatures.insert(alias.to_string(), sig.clone());
            }
        }
    }

    pub fn diagnostics_with(&self, extra: Vec<Diagnostic>) -> Vec<Diagnostic> {
        let mut all = self.diagnostics.clone();
        for load in &self.loads {
            all.extend(load.diagnostics.clone());
        }
        all.extend(extra);
        all
    }
}

/// Walks up from a load `call` node to check it sits in an allowed
/// position: directly inside a `block`/`expression_statement` chain up to
/// the module root.
fn load_position_is_allowed(call: tree_sitter::Node<'_>, root: tree_sitter::Node<'_>) -> Option<String> {
    let mut node = call;
    loop {
        let Some(parent) = node.parent() else {
            return None;
        };
        if parent.id() == root.id() {
            return None;
        }
        match parent.kind() {
            "block" | "expression_statement" | "module" => {
                node = parent;
            }
            other => return Some(other.to_string()),
        }
    }
}

fn collect_loads(input: &[u8], root: tree_sitter::Node<'_>) -> (Vec<LoadStatement>, Vec<Diagnostic>) {
    let mut loads = Vec::new();
    let mut doc_diags = Vec::new();

    for call in extract::load_statements(root) {
        if !is_load_call(input, call) {
            continue;
        }
        let range = node_range(call);

        if let Some(bad_kind) = load_position_is_allowed(call, root) {
            doc_diags.push(diag(
                range,
                DiagnosticSeverity::ERROR,
                format!("load statement not allowed in {}", article_for(&bad_kind)),
            ));
            continue;
        }

        let Some(args) = call.child_by_field_name("arguments") else {
            continue;
        };

        let mut diagnostics = Vec::new();
        let mut positional_strings = Vec::new();
        let mut bindings = Vec::new();
        let mut file = None;

        let mut cursor = args.walk();
        for (i, arg) in args.named_children(&mut cursor).enumerate() {
            match arg.kind() {
                "string" => {
                    let value = unquote(input, arg);
                    if i == 0 {
                        file = Some(value);
                    } else {
                        positional_strings.push(value);
                    }
                }
                "keyword_argument" => {
                    let name = arg
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(input).ok())
                        .unwrap_or("")
                        .to_string();
                    match arg.child_by_field_name("value") {
                        Some(value_node) if value_node.kind() == "string" => {
                            bindings.push(LoadBinding {
                                alias: name,
                                original: unquote(input, value_node),
                            });
                        }
                        _ => diagnostics.push(diag(
                            node_range(arg),
                            DiagnosticSeverity::ERROR,
                            "load parameter must be a literal string",
                        )),
                    }
                }
                _ => {
                    if i == 0 {
                        diagnostics.push(diag(
                            node_range(arg),
                            DiagnosticSeverity::ERROR,
                            "load parameter must be a literal string",
                        ));
                    } else {
                        diagnostics.push(diag(
                            node_range(arg),
                            DiagnosticSeverity::ERROR,
                            "load parameter must be a literal string",
                        ));
                    }
                }
            }
        }

        for name in positional_strings {
            bindings.push(LoadBinding {
                alias: name.clone(),
                original: name,
            });
        }

        let Some(file) = file else {
            doc_diags.push(diag(
                range,
                DiagnosticSeverity::ERROR,
                "load parameter must be a literal string",
            ));
            continue;
        };

        if bindings.is_empty() {
            diagnostics.push(diag(
                range,
                DiagnosticSeverity::WARNING,
                "load statement has no bindings",
            ));
        }

        loads.push(LoadStatement {
            file,
            bindings,
            range,
            diagnostics,
        });
    }

    (loads, doc_diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///test.star").unwrap()
    }

    #[test]
    fn parses_loads_with_positional_and_keyword_bindings() {
        let src = b"load('dep.star', 'foo', bar='baz')\n".to_vec();
        let doc = Document::new(uri(), src, Deadline::none()).unwrap();
        assert_eq!(doc.loads.len(), 1);
        let load = &doc.loads[0];
        assert_eq!(load.file, "dep.star");
        assert_eq!(load.bindings.len(), 2);
        assert_eq!(load.bindings[0].alias, "foo");
        assert_eq!(load.bindings[0].original, "foo");
        assert_eq!(load.bindings[1].alias, "bar");
        assert_eq!(load.bindings[1].original, "baz");
    }

    #[test]
    fn load_inside_function_is_rejected() {
        let src = b"def f():\n    load('dep.star', 'foo')\n".to_vec();
        let doc = Document::new(uri(), src, Deadline::none()).unwrap();
        assert!(doc.loads.is_empty());
        assert!(doc
            .diagnostics
            .iter()
            .any(|d| d.message.contains("load statement not allowed")));
    }

    #[test]
    fn load_with_no_bindings_warns() {
        let src = b"load('dep.star')\n".to_vec();
        let doc = Document::new(uri(), src, Deadline::none()).unwrap();
        assert_eq!(doc.loads.len(), 1);
        assert!(doc.loads[0]
            .diagnostics
            .iter()
            .any(|d| d.message.contains("no bindings")));
    }
}
