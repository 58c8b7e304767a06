//! Embedded baseline stub: Starlark's built-in functions plus the
//! `True`/`False`/`None` constants, installed into every [`super::Builtins`]
//! table at analyzer construction time so a document with no configured
//! stub directories still gets useful completions.

use tower_lsp::lsp_types::Url;

use crate::document::document::Document;
use crate::document::parse::Deadline;
use crate::query::extract;

use super::loader::clear_location;
use super::Builtins;

/// A Python-subset rendering of the handful of Starlark builtins that show
/// up in nearly every `BUILD`/`.star` file. Not exhaustive -- a real
/// deployment supplies its own stub directories via
/// [`crate::analysis::Analyzer`]'s constructor options and those are
/// merged on top of this baseline.
const STDLIB_STUB: &str = r#"
True = True
False = False
None = None

def len(x):
    """Returns the number of elements in a sequence or the length of a string."""
    pass

def print(*args, sep=" "):
    """Writes the given arguments, converted to strings, to the standard error file descriptor."""
    pass

def range(start, stop=None, step=1):
    """Returns a list of integers from start to stop, incrementing by step."""
    pass

def str(x):
    """Converts any value into a string."""
    pass

def int(x, base=10):
    """Converts a value into an int."""
    pass

def bool(x=False):
    """Converts any value into a Boolean."""
    pass

def list(x=[]):
    """Creates a list from the elements of its argument."""
    pass

def dict(pairs=[]):
    """Creates a dict from an optional positional argument and an optional set of keyword arguments."""
    pass

def enumerate(x, start=0):
    """Returns a list of (index, value) pairs, one per element in the input sequence."""
    pass

def sorted(x, key=None, reverse=False):
    """Returns a new sorted list containing the elements of the given iterable sequence."""
    pass

def zip(*args):
    """Returns a list of tuples, where the i-th tuple contains the i-th element from each of the argument sequences."""
    pass

def load(path, *names):
    """Loads symbols from another Starlark file."""
    pass

def struct(**kwargs):
    """Creates a struct whose fields are the given keyword arguments."""
    pass

def fail(*args, sep=" "):
    """Causes execution to fail with the given error message."""
    pass

def getattr(x, name, default=None):
    """Returns the value of the named attribute of x, or default if absent."""
    pass

def hasattr(x, name):
    """Reports whether x has an attribute of the given name."""
    pass

def type(x):
    """Returns a string describing the type of its operand."""
    pass
"#;

pub fn load() -> Builtins {
    let uri = Url::parse("embedded:///stdlib.py").unwrap_or_else(|_| {
        Url::parse("file:///stdlib.py").expect("static fallback URI is valid")
    });
    let tree =
        crate::document::parse::parse(STDLIB_STUB.as_bytes(), Deadline::none()).expect("embedded stub always parses");
    let doc = Document::from_tree(uri, STDLIB_STUB.as_bytes().to_vec(), tree);

    let mut builtins = Builtins::new();
    for (name, sig) in &doc.signatures {
        builtins.signatures.insert(name.clone(), sig.clone());
    }
    for class in extract::classes(&doc.input, doc.tree.root_node()) {
        builtins.types.insert(class.name.clone(), class);
    }
    let stub_symbols: Vec<_> = doc.symbols.into_iter().map(clear_location).collect();
    builtins.members.extend(stub_symbols.iter().cloned());
    builtins.symbols.extend(stub_symbols);
    builtins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_core_starlark_builtins() {
        let builtins = load();
        assert!(builtins.signatures.contains_key("len"));
        assert!(builtins.signatures.contains_key("struct"));
        assert!(builtins.symbols.iter().any(|s| s.name == "True"));
        assert!(builtins.symbols.iter().any(|s| s.name == "None"));
    }
}
