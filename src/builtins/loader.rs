//! Walks a stub-file directory tree and turns it into a [`super::Builtins`]
//! namespace, treating the tree as a Python-package-like module hierarchy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;

use crate::document::document::Document;
use crate::document::parse::Deadline;
use crate::document::point::Range;
use crate::document::symbol::{Symbol, SymbolKind};
use crate::query::extract;

use super::Builtins;

fn stub_uri(path: &Path) -> Url {
    Url::from_file_path(path)
        .unwrap_or_else(|_| Url::parse("file:///builtin-stub.py").unwrap())
}

/// Parses a single stub file and produces the `Builtins` contributed by it
/// directly (not yet folded under a module symbol).
fn load_file_flat(path: &Path) -> std::io::Result<Builtins> {
    let bytes = std::fs::read(path)?;
    let doc = Document::new(stub_uri(path), bytes, Deadline::none())
        .unwrap_or_else(|_| Document::from_tree(stub_uri(path), Vec::new(), empty_tree()));

    let mut builtins = Builtins::new();
    for (name, sig) in &doc.signatures {
        builtins.signatures.insert(name.clone(), sig.clone());
        builtins.methods.insert(name.clone(), sig.clone());
    }
    for class in extract::classes(&doc.input, doc.tree.root_node()) {
        builtins.types.insert(class.name.clone(), class);
    }
    let stub_symbols: Vec<Symbol> = doc.symbols.into_iter().map(clear_location).collect();
    builtins.members.extend(stub_symbols.iter().cloned());
    builtins.symbols.extend(stub_symbols);
    Ok(builtins)
}

/// Builtins carry no definition location regardless of the stub file they
/// were read from.
pub(in crate::builtins) fn clear_location(mut sym: Symbol) -> Symbol {
    sym.location.uri = None;
    sym.location.range = Range::default();
    sym.children = sym.children.into_iter().map(clear_location).collect();
    sym
}

fn empty_tree() -> tree_sitter::Tree {
    crate::document::parse::parse(b"", Deadline::none()).expect("empty source always parses")
}

/// Re-qualifies the flat contributions of a single file `foo.py` (or
/// directory `foo/`) as children of a module symbol named `foo`: functions
/// become Method children, everything else becomes Field children.
fn as_module_symbol(name: &str, flat: &Builtins) -> Symbol {
    let mut module = Symbol::new(name, SymbolKind::Object, Range::default());
    module.r#type = "module".to_string();
    for sym in &flat.symbols {
        let mut child = sym.clone();
        child.kind = match sym.kind {
            SymbolKind::Function => SymbolKind::Method,
            _ => SymbolKind::Field,
        };
        module.children.push(child);
    }
    module
}

/// Walks `root` (a file or directory), collecting per-path contributions
/// and merging them longest-path-first so a child module is complete
/// before it is folded into its parent's module symbol.
pub fn load_tree(root: &Path) -> std::io::Result<Builtins> {
    let mut per_path: HashMap<PathBuf, Builtins> = HashMap::new();
    collect(root, &mut per_path)?;

    let mut paths: Vec<PathBuf> = per_path.keys().cloned().collect();
    paths.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    let mut merged = Builtins::new();
    let mut module_symbols: HashMap<PathBuf, Symbol> = HashMap::new();

    for path in &paths {
        let flat = per_path.remove(path).unwrap();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut combined = flat.clone();
        let dir_children: Vec<(PathBuf, Symbol)> = module_symbols
            .iter()
            .filter(|(child_path, _)| child_path.parent() == Some(path.as_path()))
            .map(|(p, s)| (p.clone(), s.clone()))
            .collect();
        for (child_path, child_symbol) in &dir_children {
            combined.symbols.push(child_symbol.clone());
            module_symbols.remove(child_path);
        }

        if path == root {
            merged.update(combined);
        } else {
            let module_sym = as_module_symbol(&stem, &combined);
            module_symbols.insert(path.clone(), module_sym);
        }
    }

    for (_, sym) in module_symbols {
        merged.symbols.push(sym.clone());
        merged.members.push(sym);
    }

    Ok(merged)
}

fn collect(path: &Path, out: &mut HashMap<PathBuf, Builtins>) -> std::io::Result<()> {
    if path.is_dir() {
        let mut dir_builtins = Builtins::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let child = entry.path();
            if child.is_dir() {
                collect(&child, out)?;
            } else if child.extension().map(|e| e == "py").unwrap_or(false) {
                if child.file_name().map(|n| n == "__init__.py").unwrap_or(false) {
                    dir_builtins.update(load_file_flat(&child)?);
                } else {
                    out.insert(child.clone(), load_file_flat(&child)?);
                }
            }
        }
        out.insert(path.to_path_buf(), dir_builtins);
    } else {
        out.insert(path.to_path_buf(), load_file_flat(path)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn merges_module_file_into_directory_symbol() {
        let dir = std::env::temp_dir().join(format!(
            "starlark_lsp_builtins_test_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let sub = dir.join("os.py");
        let mut f = std::fs::File::create(&sub).unwrap();
        writeln!(f, "environ = {{}}\nname = \"posix\"\n").unwrap();
        drop(f);

        let builtins = load_tree(&dir).unwrap();
        let os_symbol = builtins.symbols.iter().find(|s| s.name == "os");
        assert!(os_symbol.is_some());
        assert_eq!(os_symbol.unwrap().children.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
