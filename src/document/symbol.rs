//! Core data model (spec.md §3): `Signature`, `Parameter`, `Symbol`,
//! `Class`, and the kinds they carry.

use tower_lsp::lsp_types::{CompletionItemKind, SymbolKind as LspSymbolKind, Url};

use super::docstring::Parsed as Docstring;
use super::point::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Method,
    Field,
    String,
    Array,
    Object,
    Number,
    Boolean,
    Null,
    Struct,
}

impl SymbolKind {
    pub fn to_lsp(self) -> LspSymbolKind {
        match self {
            SymbolKind::Variable => LspSymbolKind::VARIABLE,
            SymbolKind::Function => LspSymbolKind::FUNCTION,
            SymbolKind::Method => LspSymbolKind::METHOD,
            SymbolKind::Field => LspSymbolKind::FIELD,
            SymbolKind::String => LspSymbolKind::STRING,
            SymbolKind::Array => LspSymbolKind::ARRAY,
            SymbolKind::Object => LspSymbolKind::OBJECT,
            SymbolKind::Number => LspSymbolKind::NUMBER,
            SymbolKind::Boolean => LspSymbolKind::BOOLEAN,
            SymbolKind::Null => LspSymbolKind::NULL,
            SymbolKind::Struct => LspSymbolKind::STRUCT,
        }
    }

    pub fn to_completion_kind(self) -> CompletionItemKind {
        match self {
            SymbolKind::Function => CompletionItemKind::FUNCTION,
            SymbolKind::Method => CompletionItemKind::METHOD,
            SymbolKind::Field => CompletionItemKind::FIELD,
            SymbolKind::String => CompletionItemKind::VALUE,
            SymbolKind::Array | SymbolKind::Object | SymbolKind::Struct => {
                CompletionItemKind::STRUCT
            }
            SymbolKind::Number => CompletionItemKind::VALUE,
            SymbolKind::Boolean | SymbolKind::Null => CompletionItemKind::KEYWORD,
            SymbolKind::Variable => CompletionItemKind::VARIABLE,
        }
    }

    /// Maps a Starlark/Python scalar keyword or well-known builtin type
    /// alias (as seen in PEP-484-style stub annotations) to a symbol kind
    /// and canonical type name. Used both for annotated-assignment symbol
    /// extraction and for dot-completion type propagation.
    pub fn from_type_name(name: &str) -> Option<(SymbolKind, &'static str)> {
        // Strip a subscripted generic (`List[str]` -> `List`).
        let base = name.split('[').next().unwrap_or(name).trim();
        let entry = match base {
            "str" | "string" | "String" => (SymbolKind::String, "string"),
            "list" | "List" => (SymbolKind::Array, "list"),
            "dict" | "Dict" | "dictionary" => (SymbolKind::Object, "dict"),
            "int" | "Int" | "integer" => (SymbolKind::Number, "int"),
            "float" | "Float" => (SymbolKind::Number, "float"),
            "bool" | "Bool" | "boolean" => (SymbolKind::Boolean, "bool"),
            "None" | "NoneType" => (SymbolKind::Null, "None"),
            _ => return None,
        };
        Some(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<String>,
    pub default_value: Option<String>,
    /// Raw textual form used as the parameter's label, e.g. `a: int = 5`.
    pub content: String,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<String>,
    pub docs: Docstring,
}

impl Signature {
    pub fn label(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.return_type {
            Some(rt) => format!("({params}) -> {rt}"),
            None => format!("({params})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTag {
    Binded,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub uri: Option<Url>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub detail: String,
    pub kind: SymbolKind,
    pub location: Location,
    pub selection_range: Range,
    pub children: Vec<Symbol>,
    pub tags: Vec<SymbolTag>,
    /// Free-form: a known scalar keyword, a class name, or `"fname()"`
    /// denoting "result of calling `fname`".
    pub r#type: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: Range) -> Self {
        Symbol {
            name: name.into(),
            detail: String::new(),
            kind,
            location: Location {
                uri: None,
                range,
            },
            selection_range: range,
            children: Vec::new(),
            tags: Vec::new(),
            r#type: String::new(),
        }
    }

    pub fn is_binded(&self) -> bool {
        self.tags.contains(&SymbolTag::Binded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub methods: Vec<Signature>,
    pub fields: Vec<Symbol>,
}

impl Class {
    pub fn members(&self) -> Vec<Symbol> {
        let mut members: Vec<Symbol> = self.fields.clone();
        for method in &self.methods {
            let mut sym = Symbol::new(
                method.name.clone(),
                SymbolKind::Method,
                Range::default(),
            );
            sym.detail = method.label();
            members.push(sym);
        }
        members
    }

    pub fn find_method(&self, name: &str) -> Option<&Signature> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::new(
            super::point::Position::new(0, 0),
            super::point::Position::new(0, 0),
        )
    }
}
