//! Component D: symbol and signature extraction from subtrees.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::document::docstring;
use crate::document::point::node_range;
use crate::document::symbol::{Class, Parameter, Signature, Symbol, SymbolKind};

use super::unquote::unquote;
use super::walk::Descend;

fn node_text<'a>(input: &'a [u8], node: Node<'_>) -> &'a str {
    node.utf8_text(input).unwrap_or("")
}

/// First string literal appearing as a standalone `expression_statement` at
/// the start of `body`, parsed as a docstring.
fn leading_docstring(input: &[u8], body: Node<'_>) -> docstring::Parsed {
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        if let Some(string_node) = stmt.named_child(0) {
            if string_node.kind() == "string" {
                return docstring::parse(&unquote(input, string_node));
            }
        }
        break;
    }
    docstring::Parsed::default()
}

fn parse_parameter(input: &[u8], node: Node<'_>, docs: &docstring::Parsed) -> Option<Parameter> {
    let content = node_text(input, node).to_string();
    match node.kind() {
        "identifier" => {
            let name = content.clone();
            if name == "self" {
                return None;
            }
            Some(Parameter {
                doc: docs.field_doc(&name).map(str::to_string),
                name,
                type_hint: None,
                default_value: None,
                content,
            })
        }
        "typed_parameter" => {
            let name = node
                .named_child(0)
                .map(|n| node_text(input, n).to_string())
                .unwrap_or_default();
            let type_hint = node
                .child_by_field_name("type")
                .map(|n| node_text(input, n).to_string());
            Some(Parameter {
                doc: docs.field_doc(&name).map(str::to_string),
                name,
                type_hint,
                default_value: None,
                content,
            })
        }
        "default_parameter" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(input, n).to_string())
                .unwrap_or_default();
            let default_value = node
                .child_by_field_name("value")
                .map(|n| node_text(input, n).to_string());
            Some(Parameter {
                doc: docs.field_doc(&name).map(str::to_string),
                name,
                type_hint: None,
                default_value,
                content,
            })
        }
        "typed_default_parameter" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(input, n).to_string())
                .unwrap_or_default();
            let type_hint = node
                .child_by_field_name("type")
                .map(|n| node_text(input, n).to_string());
            let default_value = node
                .child_by_field_name("value")
                .map(|n| node_text(input, n).to_string());
            Some(Parameter {
                doc: docs.field_doc(&name).map(str::to_string),
                name,
                type_hint,
                default_value,
                content,
            })
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => Some(Parameter {
            name: content.clone(),
            type_hint: None,
            default_value: None,
            doc: None,
            content,
        }),
        _ => None,
    }
}

fn signature_from_function(input: &[u8], func: Node<'_>) -> Option<Signature> {
    let name = func
        .child_by_field_name("name")
        .map(|n| node_text(input, n).to_string())?;
    let body = func.child_by_field_name("body");
    let docs = body
        .map(|b| leading_docstring(input, b))
        .unwrap_or_default();

    let mut params = Vec::new();
    if let Some(parameters) = func.child_by_field_name("parameters") {
        let mut cursor = parameters.walk();
        for child in parameters.named_children(&mut cursor) {
            if let Some(p) = parse_parameter(input, child, &docs) {
                params.push(p);
            }
        }
    }

    let return_type = func
        .child_by_field_name("return_type")
        .map(|n| node_text(input, n).to_string());

    Some(Signature {
        name,
        params,
        return_type,
        docs,
    })
}

/// `function_signatures_direct(doc, node)`: direct `function_definition`
/// children of `node`.
pub fn function_signatures_direct(input: &[u8], node: Node<'_>) -> HashMap<String, Signature> {
    let mut out = HashMap::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "function_definition" {
            if let Some(sig) = signature_from_function(input, child) {
                out.insert(sig.name.clone(), sig);
            }
        }
    }
    out
}

fn type_annotation_kind(input: &[u8], annotation: Node<'_>) -> (SymbolKind, String) {
    let text = node_text(input, annotation);
    match SymbolKind::from_type_name(text) {
        Some((kind, canon)) => (kind, canon.to_string()),
        None => (SymbolKind::Object, text.to_string()),
    }
}

fn rhs_kind(input: &[u8], rhs: Node<'_>) -> (SymbolKind, String) {
    match rhs.kind() {
        "string" => (SymbolKind::String, "string".to_string()),
        "list" | "list_comprehension" => (SymbolKind::Array, "list".to_string()),
        "dictionary" | "dictionary_comprehension" => (SymbolKind::Object, "dict".to_string()),
        "integer" => (SymbolKind::Number, "int".to_string()),
        "float" => (SymbolKind::Number, "float".to_string()),
        "true" | "false" => (SymbolKind::Boolean, "bool".to_string()),
        "none" => (SymbolKind::Null, "None".to_string()),
        "call" => {
            let callee = rhs
                .child_by_field_name("function")
                .map(|n| node_text(input, n).to_string())
                .unwrap_or_default();
            (SymbolKind::Variable, format!("{callee}()"))
        }
        _ => (SymbolKind::Variable, String::new()),
    }
}

/// Recognizes `name = struct(field1 = ..., field2 = ...)`: one `Field`
/// child per keyword argument, in source order. Consulted before the
/// generic call-RHS handling in `rhs_kind`, since `struct()` is Starlark's
/// idiomatic namespacing builtin rather than an arbitrary function call.
fn extract_struct(input: &[u8], rhs: Node<'_>) -> Option<Vec<Symbol>> {
    if rhs.kind() != "call" {
        return None;
    }
    let func = rhs.child_by_field_name("function")?;
    if node_text(input, func) != "struct" {
        return None;
    }
    let args = rhs.child_by_field_name("arguments")?;

    let mut fields = Vec::new();
    let mut cursor = args.walk();
    for arg in args.named_children(&mut cursor) {
        if arg.kind() != "keyword_argument" {
            continue;
        }
        let Some(name_node) = arg.child_by_field_name("name") else {
            continue;
        };
        let field_name = node_text(input, name_node).to_string();
        fields.push(Symbol::new(field_name, SymbolKind::Field, node_range(arg)));
    }
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Bare string literal immediately following a statement, for the
/// docstring-for-variable convention.
fn trailing_docstring(input: &[u8], stmt: Node<'_>) -> Option<String> {
    let next = stmt.next_named_sibling()?;
    if next.kind() != "expression_statement" {
        return None;
    }
    let string_node = next.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    Some(unquote(input, string_node))
}

fn symbol_from_assignment(input: &[u8], stmt: Node<'_>, assignment: Node<'_>) -> Option<Symbol> {
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = node_text(input, left).to_string();
    let range = node_range(stmt);

    let struct_fields = assignment
        .child_by_field_name("type")
        .is_none()
        .then(|| assignment.child_by_field_name("right"))
        .flatten()
        .and_then(|rhs| extract_struct(input, rhs));

    let (kind, ty, children) = if let Some(fields) = struct_fields {
        (SymbolKind::Struct, String::new(), fields)
    } else if let Some(annotation) = assignment.child_by_field_name("type") {
        let (kind, ty) = type_annotation_kind(input, annotation);
        (kind, ty, Vec::new())
    } else if let Some(rhs) = assignment.child_by_field_name("right") {
        let (kind, ty) = rhs_kind(input, rhs);
        (kind, ty, Vec::new())
    } else {
        (SymbolKind::Variable, String::new(), Vec::new())
    };

    let mut symbol = Symbol::new(name, kind, range);
    symbol.r#type = ty;
    symbol.location.range = range;
    symbol.selection_range = node_range(left);
    symbol.children = children;
    if let Some(doc) = trailing_docstring(input, stmt) {
        symbol.detail = doc;
    }
    Some(symbol)
}

fn symbol_from_function(input: &[u8], stmt: Node<'_>, func: Node<'_>) -> Option<Symbol> {
    let name_node = func.child_by_field_name("name")?;
    let name = node_text(input, name_node).to_string();
    let mut symbol = Symbol::new(name, SymbolKind::Function, node_range(stmt));
    symbol.selection_range = node_range(name_node);
    if let Some(sig) = signature_from_function(input, func) {
        symbol.detail = sig.docs.description.clone();
        symbol.r#type = sig.label();
    }
    Some(symbol)
}

/// `document_symbols(doc)`: one Symbol per top-level assignment or
/// `function_definition`, in source order.
pub fn document_symbols(input: &[u8], root: Node<'_>) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for stmt in root.named_children(&mut cursor) {
        match stmt.kind() {
            "function_definition" => {
                if let Some(sym) = symbol_from_function(input, stmt, stmt) {
                    out.push(sym);
                }
            }
            "expression_statement" => {
                if let Some(assignment) = stmt.named_child(0) {
                    if assignment.kind() == "assignment" {
                        if let Some(sym) = symbol_from_assignment(input, stmt, assignment) {
                            out.push(sym);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// `classes(doc, node)`: `class_definition` nodes, with fields and methods.
pub fn classes(input: &[u8], node: Node<'_>) -> Vec<Class> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "class_definition" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(input, name_node).to_string();
        let mut methods = Vec::new();
        let mut fields = Vec::new();
        if let Some(body) = child.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.named_children(&mut body_cursor) {
                match member.kind() {
                    "function_definition" => {
                        if let Some(mut sig) = signature_from_function(input, member) {
                            if sig.params.first().map(|p| p.name == "self").unwrap_or(false) {
                                sig.params.remove(0);
                            }
                            if !sig.name.starts_with('_') {
                                methods.push(sig);
                            }
                        }
                    }
                    "expression_statement" => {
                        if let Some(assignment) = member.named_child(0) {
                            if assignment.kind() == "assignment" {
                                if let Some(sym) = symbol_from_assignment(input, member, assignment) {
                                    fields.push(sym);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        out.push(Class {
            name,
            methods,
            fields,
        });
    }
    out
}

fn is_function_like(node: Node<'_>) -> bool {
    if node.kind() == "function_definition" {
        return true;
    }
    if node.kind() == "ERROR" {
        let first = node.named_child(0);
        let second = node.named_child(1);
        if let (Some(a), Some(b)) = (first, second) {
            return a.kind() == "identifier" && b.kind() == "parameters";
        }
    }
    false
}

pub fn is_module_scope(node: Node<'_>) -> bool {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if is_function_like(n) {
            return false;
        }
        cur = n.parent();
    }
    true
}

/// `sibling_symbols(doc, first_sibling, before)`: walks `next_named_sibling`
/// from `first_sibling`, stopping once a sibling is not before `before`.
pub fn sibling_symbols(
    input: &[u8],
    first_sibling: Node<'_>,
    before: Option<Node<'_>>,
) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cur = Some(first_sibling);
    while let Some(stmt) = cur {
        if let Some(limit) = before {
            if stmt.start_byte() >= limit.start_byte() {
                break;
            }
        }
        match stmt.kind() {
            "function_definition" => {
                if let Some(sym) = symbol_from_function(input, stmt, stmt) {
                    out.push(sym);
                }
            }
            "expression_statement" => {
                if let Some(assignment) = stmt.named_child(0) {
                    if assignment.kind() == "assignment" {
                        if let Some(sym) = symbol_from_assignment(input, stmt, assignment) {
                            out.push(sym);
                        }
                    }
                }
            }
            _ => {}
        }
        cur = stmt.next_named_sibling();
    }
    out
}

fn block_first_statement(node: Node<'_>) -> Option<Node<'_>> {
    node.named_child(0)
}

/// `symbols_in_scope(doc, node)`: siblings before `node` in the enclosing
/// block, plus every enclosing function's parameters and all of that
/// function's earlier siblings, up to module scope.
pub fn symbols_in_scope(input: &[u8], root: Node<'_>, node: Node<'_>) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut cur = node;

    loop {
        // Walk up to the enclosing block (or module root) and collect
        // siblings defined before `cur`.
        let mut block = cur;
        while let Some(parent) = block.parent() {
            if parent.kind() == "block" || parent.id() == root.id() {
                block = parent;
                break;
            }
            block = parent;
        }
        if let Some(first) = block_first_statement(block) {
            out.extend(sibling_symbols(input, first, Some(cur)));
        }

        // Find the nearest enclosing function_definition (or ERROR acting
        // as one) above `cur`.
        let mut func = None;
        let mut search = cur.parent();
        while let Some(n) = search {
            if is_function_like(n) {
                func = Some(n);
                break;
            }
            if n.id() == root.id() {
                break;
            }
            search = n.parent();
        }

        let Some(func_node) = func else {
            break;
        };

        if func_node.kind() == "function_definition" {
            if let Some(parameters) = func_node.child_by_field_name("parameters") {
                let docs = func_node
                    .child_by_field_name("body")
                    .map(|b| leading_docstring(input, b))
                    .unwrap_or_default();
                let mut pc = parameters.walk();
                for p in parameters.named_children(&mut pc) {
                    if let Some(param) = parse_parameter(input, p, &docs) {
                        let mut sym = Symbol::new(
                            param.name.clone(),
                            SymbolKind::Variable,
                            node_range(p),
                        );
                        sym.r#type = param.type_hint.clone().unwrap_or_default();
                        out.push(sym);
                    }
                }
            }
        }

        // All earlier siblings of the enclosing function itself.
        if let Some(parent) = func_node.parent() {
            if let Some(first) = block_first_statement(parent) {
                out.extend(sibling_symbols(input, first, Some(func_node)));
            }
        }

        if is_module_scope(func_node) {
            break;
        }
        cur = func_node;
    }

    out
}

/// `load_statements(input, tree)`: every `call` whose function is the
/// identifier `load`.
pub fn load_statements(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut finder = |n: Node<'_>| -> Descend {
        if n.kind() == "call" {
            if let Some(func) = n.child_by_field_name("function") {
                if func.kind() == "identifier" {
                    return Descend::Match;
                }
            }
        }
        Descend::Continue
    };
    collect_all_matches(root, &mut finder, &mut out);
    out
}

fn collect_all_matches<'a, F>(node: Node<'a>, predicate: &mut F, out: &mut Vec<Node<'a>>)
where
    F: FnMut(Node<'a>) -> Descend,
{
    match predicate(node) {
        Descend::Skip => {}
        Descend::Match => out.push(node),
        Descend::Continue => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_all_matches(child, predicate, out);
            }
        }
    }
}

pub fn is_load_call(input: &[u8], node: Node<'_>) -> bool {
    node.kind() == "call"
        && node
            .child_by_field_name("function")
            .map(|f| node_text(input, f) == "load")
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::{parse, Deadline};

    #[test]
    fn struct_call_produces_struct_symbol_with_field_children() {
        let src = b"x = struct(a=1, b=2)\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let symbols = document_symbols(src, tree.root_node());
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "x");
        assert_eq!(symbols[0].kind, SymbolKind::Struct);
        assert_eq!(symbols[0].children.len(), 2);
        assert_eq!(symbols[0].children[0].name, "a");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Field);
        assert_eq!(symbols[0].children[1].name, "b");
    }

    #[test]
    fn extracts_top_level_function_signature() {
        let src = b"def foo(a, b: str, c=None, d: int=5) -> List[str]:\n    \"\"\"does stuff\"\"\"\n    pass\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let sigs = function_signatures_direct(src, tree.root_node());
        let sig = sigs.get("foo").unwrap();
        assert_eq!(sig.params.len(), 4);
        assert_eq!(sig.return_type.as_deref(), Some("List[str]"));
        assert_eq!(sig.label(), "(a, b: str, c=None, d: int=5) -> List[str]");
        assert_eq!(sig.docs.description, "does stuff");
    }

    #[test]
    fn document_symbols_classify_assignment_kinds() {
        let src = b"a = \"x\"\nb = [1, 2]\nc = foo()\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let symbols = document_symbols(src, tree.root_node());
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].kind, SymbolKind::String);
        assert_eq!(symbols[1].kind, SymbolKind::Array);
        assert_eq!(symbols[2].kind, SymbolKind::Variable);
        assert_eq!(symbols[2].r#type, "foo()");
    }

    #[test]
    fn trailing_string_becomes_variable_docstring() {
        let src = b"x = 1\n\"the doc\"\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let symbols = document_symbols(src, tree.root_node());
        assert_eq!(symbols[0].detail, "the doc");
    }

    #[test]
    fn classes_collect_fields_and_methods_dropping_self_and_private() {
        let src = b"class Acl:\n    name: str\n    def grant(self, role):\n        pass\n    def _priv(self):\n        pass\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let classes = classes(src, tree.root_node());
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].fields.len(), 1);
        assert_eq!(classes[0].methods.len(), 1);
        assert_eq!(classes[0].methods[0].params.len(), 1);
        assert_eq!(classes[0].methods[0].params[0].name, "role");
    }

    #[test]
    fn finds_load_calls() {
        let src = b"load('dep.star', 'foo')\nfoo()\n";
        let tree = parse(src, Deadline::none()).unwrap();
        let loads = load_statements(tree.root_node());
        assert_eq!(loads.len(), 1);
        assert!(is_load_call(src, loads[0]));
    }
}
