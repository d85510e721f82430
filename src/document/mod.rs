//! Typed operation documents.
//!
//! A [`Document`] is the structured form of a GraphQL operation: one root
//! field with arguments and a nested selection set. The cache walks the
//! selection set to normalize and denormalize results; the server walks it to
//! project responses. Text parsing is not supported, documents are built in
//! code (see [`catalog`]).

pub mod catalog;

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Read-only operation.
    Query,
    /// Operation that writes.
    Mutation,
}

impl OperationKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

/// An argument value: a `$variable` reference or an inline literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    /// Name of a declared variable, without `$`.
    Variable(String),
    /// Inline value.
    Literal(Value),
}

/// A declared operation variable (`$filter: AuthorFilter!`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDef {
    /// Name without `$`.
    pub name: String,
    /// GraphQL type, e.g. `ID!`.
    pub type_name: String,
}

/// A selected field, optionally with arguments and a sub-selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as sent to the server.
    pub name: String,
    /// Arguments in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<(String, ArgValue)>,
    /// Sub-selection; empty for scalars.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<Field>,
    /// Resolved locally by the cache (`@client`), never sent to the server.
    #[serde(default)]
    pub client_only: bool,
}

impl Field {
    /// A leaf field.
    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            selection: Vec::new(),
            client_only: false,
        }
    }

    /// A field with a sub-selection.
    #[must_use]
    pub fn object(name: impl Into<String>, selection: Vec<Field>) -> Self {
        Self {
            selection,
            ..Self::scalar(name)
        }
    }

    /// A locally resolved leaf field.
    #[must_use]
    pub fn client(name: impl Into<String>) -> Self {
        Self {
            client_only: true,
            ..Self::scalar(name)
        }
    }

    /// Adds an argument bound to `$variable`.
    #[must_use]
    pub fn with_variable_arg(mut self, name: impl Into<String>, variable: impl Into<String>) -> Self {
        self.args.push((name.into(), ArgValue::Variable(variable.into())));
        self
    }

    /// Adds an inline literal argument.
    #[must_use]
    pub fn with_literal_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.push((name.into(), ArgValue::Literal(value)));
        self
    }

    /// Returns true if the field selects sub-fields.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Resolves arguments against `variables`.
    ///
    /// Arguments bound to variables that are absent (or the variables value
    /// is not an object) are omitted rather than sent as `null`.
    #[must_use]
    pub fn resolve_args(&self, variables: &Value) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, arg) in &self.args {
            match arg {
                ArgValue::Literal(v) => {
                    out.insert(name.clone(), v.clone());
                }
                ArgValue::Variable(var) => {
                    if let Some(v) = variables.get(var) {
                        out.insert(name.clone(), v.clone());
                    }
                }
            }
        }
        out
    }

    /// The key under which this field is stored in a cache record.
    ///
    /// Fields without (resolved) arguments use their bare name; otherwise the
    /// arguments are appended as sorted-key JSON: `authors({"filter":{}})`.
    #[must_use]
    pub fn store_field_name(&self, variables: &Value) -> String {
        let args = self.resolve_args(variables);
        if args.is_empty() {
            return self.name.clone();
        }
        format!("{}({})", self.name, Value::Object(args))
    }

    fn print_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}{}", self.name);
        if !self.args.is_empty() {
            let rendered: Vec<String> = self
                .args
                .iter()
                .map(|(name, arg)| match arg {
                    ArgValue::Variable(var) => format!("{name}: ${var}"),
                    ArgValue::Literal(v) => format!("{name}: {v}"),
                })
                .collect();
            let _ = write!(out, "({})", rendered.join(", "));
        }
        if self.client_only {
            out.push_str(" @client");
        }
        if self.has_selection() {
            out.push_str(" {\n");
            for child in &self.selection {
                child.print_into(out, depth + 1);
            }
            let _ = writeln!(out, "{indent}}}");
        } else {
            out.push('\n');
        }
    }
}

/// A complete operation with a single root field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Operation name; also the mock lookup key.
    pub name: String,
    /// Query or mutation.
    pub kind: OperationKind,
    /// Declared variables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDef>,
    /// The single root field.
    pub root: Field,
}

impl Document {
    /// Creates a query document.
    #[must_use]
    pub fn query(name: impl Into<String>, root: Field) -> Self {
        Self {
            name: name.into(),
            kind: OperationKind::Query,
            variables: Vec::new(),
            root,
        }
    }

    /// Creates a mutation document.
    #[must_use]
    pub fn mutation(name: impl Into<String>, root: Field) -> Self {
        Self {
            name: name.into(),
            kind: OperationKind::Mutation,
            variables: Vec::new(),
            root,
        }
    }

    /// Declares an operation variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.variables.push(VariableDef {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Returns true for mutations.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self.kind, OperationKind::Mutation)
    }

    /// Renders the document as GraphQL text.
    #[must_use]
    pub fn print(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{} {}", self.kind.keyword(), self.name);
        if !self.variables.is_empty() {
            let vars: Vec<String> = self
                .variables
                .iter()
                .map(|v| format!("${}: {}", v.name, v.type_name))
                .collect();
            let _ = write!(out, "({})", vars.join(", "));
        }
        out.push_str(" {\n");
        self.root.print_into(&mut out, 1);
        out.push_str("}\n");
        out
    }

    /// BLAKE3 digest of the printed text, used as a persisted-query id.
    #[must_use]
    pub fn hash(&self) -> String {
        blake3::hash(self.print().as_bytes()).to_hex().to_string()
    }
}
