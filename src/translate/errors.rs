//! Translation-time error taxonomy.
//!
//! Every failure here is a programming or schema error surfaced immediately;
//! nothing at this layer is transient, so nothing is retried. Variants carry
//! the offending field/type so the message alone locates the problem.

use thiserror::Error;

use crate::schema::GraphSchemaError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error(transparent)]
    Schema(#[from] GraphSchemaError),
    #[error("Unsupported argument on `{field}`: {reason}")]
    UnsupportedArgument { field: String, reason: String },
    #[error("Mutation field `{field}` matches no recognized naming convention and carries no @cypher or @MutationMeta directive")]
    UnrecognizedMutation { field: String },
    #[error("Malformed filter value for `{field}`: {reason}")]
    MalformedFilter { field: String, reason: String },
    #[error("Value `{value}` cannot be encoded as a 64-bit integer without precision loss")]
    IntegerOverflow { value: String },
    #[error("Missing required argument `{argument}` on `{field}`")]
    MissingArgument { field: String, argument: String },
    #[error("Query references undefined variable `${name}`")]
    UnknownVariable { name: String },
}
