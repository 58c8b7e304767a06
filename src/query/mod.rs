pub mod extract;
pub mod identifiers;
pub mod unquote;
pub mod walk;
