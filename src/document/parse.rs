//! Component A: wraps the tree-sitter parser. Starlark is parsed as a Python
//! subset, matching the upstream implementation's choice of grammar.

use std::time::{Duration, Instant};

use thiserror::Error;
use tree_sitter::{Parser, Tree};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to set tree-sitter language: {0}")]
    Language(String),
    #[error("parse cancelled or timed out")]
    Cancelled,
}

/// Cancellable deadline for a parse. Tree-sitter polls a cancellation flag
/// periodically while parsing; we approximate that with a wall-clock
/// deadline checked via `Parser::set_timeout_micros`.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub timeout: Duration,
}

impl Deadline {
    pub fn none() -> Self {
        Deadline {
            timeout: Duration::from_secs(0),
        }
    }
}

fn new_parser() -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .map_err(|e| ParseError::Language(e.to_string()))?;
    Ok(parser)
}

/// Parses `input` into a syntax tree. Grammatical errors are carried inside
/// the tree as ERROR nodes, not returned as failures: this can only fail if
/// the parser itself can't be constructed or is cancelled before finishing.
pub fn parse(input: &[u8], deadline: Deadline) -> Result<Tree, ParseError> {
    let mut parser = new_parser()?;
    if !deadline.timeout.is_zero() {
        parser.set_timeout_micros(deadline.timeout.as_micros() as u64);
    }
    let start = Instant::now();
    let tree = parser.parse(input, None);
    match tree {
        Some(tree) => Ok(tree),
        None => {
            if !deadline.timeout.is_zero() && start.elapsed() >= deadline.timeout {
                Err(ParseError::Cancelled)
            } else {
                Err(ParseError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_source() {
        let tree = parse(b"def foo(a, b):\n    return a + b\n", Deadline::none()).unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn carries_syntax_errors_as_error_nodes_not_failures() {
        let tree = parse(b"def foo(a, b:\n    pass\n", Deadline::none()).unwrap();
        assert!(tree.root_node().has_error());
    }
}
