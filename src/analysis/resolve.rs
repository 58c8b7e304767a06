//! Shared machinery behind completion, hover, signature help and
//! definition: candidate gathering, binded-symbol resolution, and the
//! dot-member type-propagation walk (§4.H.2 / §4.H.3 of the core design).

use tree_sitter::Node;

use crate::builtins::Builtins;
use crate::document::document::Document;
use crate::document::symbol::{Class, Symbol, SymbolKind};
use crate::query::extract;

/// Candidate symbols visible at `node`: local scope, then document-level
/// symbols, then builtins, de-duplicated by name with the earliest
/// (innermost-scope) entry winning.
pub fn gather_candidates(doc: &Document, builtins: &Builtins, node: Node<'_>) -> Vec<Symbol> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for sym in extract::symbols_in_scope(&doc.input, doc.tree.root_node(), node) {
        if seen.insert(sym.name.clone()) {
            out.push(sym);
        }
    }
    for sym in &doc.symbols {
        if seen.insert(sym.name.clone()) {
            out.push(sym.clone());
        }
    }
    for sym in &builtins.symbols {
        if seen.insert(sym.name.clone()) {
            out.push(sym.clone());
        }
    }
    out
}

/// If `sym` is tagged `Binded`, follows its `detail` (the aliased name) to
/// find the real symbol in `list`; otherwise returns `sym` unchanged.
pub fn resolve_binded<'a>(list: &'a [Symbol], sym: &'a Symbol) -> &'a Symbol {
    if sym.is_binded() {
        if let Some(target) = list.iter().find(|s| s.name == sym.detail) {
            return target;
        }
    }
    sym
}

pub fn find_by_name<'a>(list: &'a [Symbol], name: &str) -> Option<&'a Symbol> {
    list.iter().find(|s| s.name == name)
}

/// Looks up `chain[0]` in `candidates`, then descends into `.children` for
/// each subsequent identifier, applying binded resolution at each step.
/// Returns the symbol named by the last element of `chain`, if resolvable.
pub fn find_definition(candidates: &[Symbol], chain: &[String]) -> Option<Symbol> {
    if chain.is_empty() {
        return None;
    }
    let mut current_list = candidates.to_vec();
    let mut current: Option<Symbol> = None;

    for (i, name) in chain.iter().enumerate() {
        let found = find_by_name(&current_list, name)?;
        let resolved = resolve_binded(&current_list, found).clone();
        if i + 1 == chain.len() {
            return Some(resolved);
        }
        current_list = resolved.children.clone();
        current = Some(resolved);
    }
    current
}

/// Maps a Starlark runtime type name to its builtin `Class` members, or
/// `None` for scalar types (`bool`, `int`, `float`, `None`) which have no
/// members, or builtins' global method namespace as a last resort.
pub fn members_for_type<'a>(builtins: &'a Builtins, type_name: &str) -> Vec<Symbol> {
    if let Some(class) = builtins.types.get(type_name) {
        return class.members();
    }
    if matches!(type_name, "bool" | "int" | "float" | "None") {
        return Vec::new();
    }
    builtins.members.clone()
}

/// Resolves the Starlark type of `chain` (an object expression with the
/// trailing dot/member already stripped), following variable assignment
/// and call-return chains up to a small bound to avoid cycles.
pub fn resolve_expression_type(
    doc: &Document,
    builtins: &Builtins,
    candidates: &[Symbol],
    chain: &[String],
) -> Option<String> {
    let symbol = find_definition(candidates, chain)?;
    resolve_symbol_type(doc, builtins, candidates, &symbol, 0)
}

fn resolve_symbol_type(
    doc: &Document,
    builtins: &Builtins,
    candidates: &[Symbol],
    symbol: &Symbol,
    depth: usize,
) -> Option<String> {
    const MAX_DEPTH: usize = 5;
    if depth >= MAX_DEPTH {
        return None;
    }

    if symbol.kind != SymbolKind::Variable {
        return Some(kind_to_type_name(symbol.kind, &symbol.r#type));
    }

    if let Some(callee) = symbol.r#type.strip_suffix("()") {
        if let Some(sig) = doc
            .signatures
            .get(callee)
            .or_else(|| builtins.signatures.get(callee))
        {
            return sig.return_type.as_deref().map(normalise_type_alias);
        }
        return None;
    }

    if !symbol.r#type.is_empty() {
        if let Some(next) = find_by_name(candidates, &symbol.r#type) {
            return resolve_symbol_type(doc, builtins, candidates, next, depth + 1);
        }
        return Some(symbol.r#type.clone());
    }

    None
}

fn kind_to_type_name(kind: SymbolKind, type_field: &str) -> String {
    match kind {
        SymbolKind::String => "string".to_string(),
        SymbolKind::Array => "list".to_string(),
        SymbolKind::Object => {
            if type_field.is_empty() {
                "dict".to_string()
            } else {
                type_field.to_string()
            }
        }
        SymbolKind::Number => "int".to_string(),
        SymbolKind::Boolean => "bool".to_string(),
        SymbolKind::Null => "None".to_string(),
        _ => type_field.to_string(),
    }
}

fn normalise_type_alias(raw: &str) -> String {
    crate::document::symbol::SymbolKind::from_type_name(raw)
        .map(|(_, canon)| canon.to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[allow(dead_code)]
pub fn class_by_name<'a>(builtins: &'a Builtins, name: &str) -> Option<&'a Class> {
    builtins.types.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::point::Range;

    #[test]
    fn find_definition_follows_children_for_dotted_chain() {
        let mut os = Symbol::new("os", SymbolKind::Object, Range::default());
        os.children.push(Symbol::new("environ", SymbolKind::Object, Range::default()));
        let candidates = vec![os];

        let found = find_definition(&candidates, &["os".to_string(), "environ".to_string()]);
        assert_eq!(found.unwrap().name, "environ");
    }

    #[test]
    fn binded_symbol_redirects_to_its_target() {
        let target = Symbol::new("real_name", SymbolKind::Function, Range::default());
        let mut alias = Symbol::new("alias", SymbolKind::Function, Range::default());
        alias.detail = "real_name".to_string();
        alias.tags.push(crate::document::symbol::SymbolTag::Binded);
        let list = vec![target.clone(), alias];

        let resolved = resolve_binded(&list, &list[1]);
        assert_eq!(resolved.name, "real_name");
    }
}
