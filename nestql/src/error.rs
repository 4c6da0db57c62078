use crate::grammar;
use thiserror::Error;

/// A filter request that cannot be resolved against the schema.
///
/// These describe problems with the caller's request, never with the storage backend. In silent
/// mode the resolver skips the offending field instead of returning them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no operator found in filter; available operators: {}", .available.join(", "))]
    NoOperatorMatch { available: Vec<String> },

    #[error("field `{field}` is not filterable on `{model}`; available fields: {}", .available.join(", "))]
    FieldNotSupported { field: String, model: String, available: Vec<String> },

    #[error("operator `{operator}` is not allowed on field `{field}`; allowed operators: {}", .available.join(", "))]
    OperatorNotSupported { field: String, operator: String, available: Vec<String> },

    #[error("operator `{operator}` is not applied to any field")]
    OperatorWithoutField { operator: String },

    #[error("invalid operand for `{operator}`: {reason}")]
    InvalidOperand { operator: String, reason: String },

    #[error("filter nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// A failure reported by a query backend. Never swallowed by silent mode.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>);

impl StorageError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self { Self(Box::new(err)) }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model `{0}` is not part of the schema")]
    UnknownModel(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResolveError {
    pub fn is_validation(&self) -> bool { matches!(self, ResolveError::Validation(_)) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("model `{0}` is declared twice")]
    DuplicateModel(String),

    #[error("relation `{model}.{relation}` targets unknown model `{target}`")]
    UnknownTarget { model: String, relation: String, target: String },

    #[error("morph marker `{marker}` maps to unknown model `{model}`")]
    UnknownMorphModel { marker: String, model: String },

    #[error("model registered as `{key}` is named `{name}`")]
    NameMismatch { key: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("operator token `{0}` must be non-empty and start with `$`")]
    InvalidToken(String),

    #[error("operator token `{0}` registered twice")]
    DuplicateToken(String),
}

/// Errors from the query-string front end
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    SyntaxError(String),
    #[error("Expected {expected}, got {got:?}")]
    UnexpectedRule { expected: &'static str, got: grammar::Rule },
    #[error("Invalid UTF-8 in {0}")]
    InvalidEncoding(String),
    #[error("Conflicting assignments to `{0}`")]
    Conflict(String),
    #[error("Key `{key}` nests deeper than {limit} segments")]
    TooDeep { key: String, limit: usize },
}

impl From<pest::error::Error<grammar::Rule>> for ParseError {
    fn from(err: pest::error::Error<grammar::Rule>) -> Self { ParseError::SyntaxError(err.to_string()) }
}
