//! Component H: request handlers. Each is a pure function of
//! `(Document, position)` that never throws -- when context can't be
//! resolved they return an empty/null response.

pub mod completion;
pub mod definition;
pub mod document_symbols;
pub mod hover;
pub mod resolve;
pub mod signature_help;

use std::path::PathBuf;

use crate::builtins::{loader, stdlib, Builtins};

/// Holds the read-only builtins table. Constructed once at startup and
/// shared (read-only) across all request handlers.
pub struct Analyzer {
    pub builtins: Builtins,
}

impl Analyzer {
    /// Builds an analyzer with the embedded Starlark stdlib stub merged
    /// with every stub directory in `stub_paths`, later entries overriding
    /// earlier ones.
    pub fn new(stub_paths: &[PathBuf]) -> Self {
        let mut builtins = stdlib::load();
        for path in stub_paths {
            if let Ok(loaded) = loader::load_tree(path) {
                builtins.update(loaded);
            }
        }
        Analyzer { builtins }
    }

    pub fn with_builtins(builtins: Builtins) -> Self {
        Analyzer { builtins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_embedded_stdlib_when_no_stubs_given() {
        let analyzer = Analyzer::new(&[]);
        assert!(!analyzer.builtins.is_empty());
    }
}
