//! The query/mutation-to-Cypher translation engine.
//!
//! The GraphQL execution engine (an external collaborator) resolves a root
//! field and hands us a [`ResolutionContext`]: the return type, the selected
//! fields with their arguments, variable values, and ambient request values.
//! [`translate`] turns that into exactly one parameterized Cypher statement —
//! a pure, synchronous computation with no I/O and no shared mutable state,
//! safe to call from concurrently-executing resolvers.

pub mod ctx;
pub mod errors;
pub mod filter;
pub mod mutation;
pub mod query;
pub mod selection;

use log::debug;
use serde_json::{Map, Value};

use crate::schema::SchemaCatalog;
use crate::values::ParameterBag;

use ctx::TranslationContext;
use errors::TranslationError;

/// Root operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Mutation,
}

/// One argument value as it appears in the query document: either a literal
/// or a reference to an operation variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Literal(Value),
    Variable(String),
}

impl ArgValue {
    /// Resolve against the operation's variable values.
    pub fn resolve(&self, variables: &Map<String, Value>) -> Result<Value, TranslationError> {
        match self {
            ArgValue::Literal(v) => Ok(v.clone()),
            ArgValue::Variable(name) => variables
                .get(name)
                .cloned()
                .ok_or_else(|| TranslationError::UnknownVariable { name: name.clone() }),
        }
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Literal(v)
    }
}

/// An inline/named fragment inside a selection set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    /// Concrete type the fragment narrows to (`... on Actor`).
    pub type_condition: String,
    pub selections: Vec<Selection>,
}

/// One requested field, with arguments and a nested selection set.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub alias: Option<String>,
    pub args: Vec<(String, ArgValue)>,
    pub selections: Vec<Selection>,
    pub fragments: Vec<Fragment>,
}

impl Selection {
    pub fn new(name: impl Into<String>) -> Self {
        Selection {
            name: name.into(),
            alias: None,
            args: Vec::new(),
            selections: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<(String, ArgValue)>) -> Self {
        self.args = args;
        self
    }

    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }

    pub fn with_fragments(mut self, fragments: Vec<Fragment>) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The key this field projects under (alias, or the field name).
    pub fn output_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Resolve one argument, if supplied.
    pub fn arg(
        &self,
        name: &str,
        variables: &Map<String, Value>,
    ) -> Result<Option<Value>, TranslationError> {
        match self.args.iter().find(|(n, _)| n == name) {
            Some((_, value)) => value.resolve(variables).map(Some),
            None => Ok(None),
        }
    }

    /// All arguments resolved, in declaration order, minus the ones the
    /// translator consumes itself (`names` lists those to skip).
    pub fn args_except(
        &self,
        names: &[&str],
        variables: &Map<String, Value>,
    ) -> Result<Vec<(String, Value)>, TranslationError> {
        let mut out = Vec::new();
        for (name, value) in &self.args {
            if names.contains(&name.as_str()) {
                continue;
            }
            out.push((name.clone(), value.resolve(variables)?));
        }
        Ok(out)
    }
}

/// Everything the execution engine resolved about one root field.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub operation: Operation,
    /// The root field itself: name, arguments, selection set.
    pub field: Selection,
    /// Name of the schema type the root field returns (payload types
    /// included for mutations).
    pub return_type: String,
    /// Operation variable values.
    pub variable_values: Map<String, Value>,
    /// Ambient values merged into every statement under `$cypherParams`.
    pub cypher_params: Option<Value>,
}

impl ResolutionContext {
    pub fn query(field: Selection, return_type: impl Into<String>) -> Self {
        ResolutionContext {
            operation: Operation::Query,
            field,
            return_type: return_type.into(),
            variable_values: Map::new(),
            cypher_params: None,
        }
    }

    pub fn mutation(field: Selection, return_type: impl Into<String>) -> Self {
        ResolutionContext {
            operation: Operation::Mutation,
            field,
            return_type: return_type.into(),
            variable_values: Map::new(),
            cypher_params: None,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variable_values = variables;
        self
    }

    pub fn with_cypher_params(mut self, params: Value) -> Self {
        self.cypher_params = Some(params);
        self
    }
}

/// The translation result: one statement, one parameter bag, opaque to the
/// caller. Re-translating the same context yields a byte-identical pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub statement: String,
    pub parameters: ParameterBag,
}

/// Translate one resolved root field into a single Cypher statement.
pub fn translate(
    catalog: &SchemaCatalog,
    resolution: &ResolutionContext,
) -> Result<CypherStatement, TranslationError> {
    let mut ctx = TranslationContext::new(catalog, resolution.cypher_params.clone());
    let statement = match resolution.operation {
        Operation::Query => query::translate_query(&mut ctx, resolution)?,
        Operation::Mutation => mutation::translate_mutation(&mut ctx, resolution)?,
    };
    let parameters = ctx.into_bag();
    debug!(
        "translated `{}` -> {} (params: {})",
        resolution.field.name,
        statement,
        Value::from(parameters.clone())
    );
    Ok(CypherStatement {
        statement,
        parameters,
    })
}
