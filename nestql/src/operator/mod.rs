//! Operator strategies: one small unit per comparison operator, each turning a validated
//! `(column, values)` pair into exactly one predicate.

mod comparison;
mod null;
mod pattern;
mod range;
mod registry;
mod set;

pub use comparison::{CaseSensitiveEqual, Compare};
pub use null::NullCheck;
pub use pattern::PatternMatch;
pub use range::Range;
pub use registry::{Group, OperatorKind, OperatorRegistry, RegistryBuilder};
pub use set::Membership;

use crate::ast::{Literal, Predicate};
use crate::error::ValidationError;

pub const EQ: &str = "$eq";
pub const EQC: &str = "$eqc";
pub const NE: &str = "$ne";
pub const LT: &str = "$lt";
pub const LTE: &str = "$lte";
pub const GT: &str = "$gt";
pub const GTE: &str = "$gte";
pub const IN: &str = "$in";
pub const NOT_IN: &str = "$notIn";
pub const CONTAINS: &str = "$contains";
pub const CONTAINSC: &str = "$containsc";
pub const NOT_CONTAINS: &str = "$notContains";
pub const NOT_CONTAINSC: &str = "$notContainsc";
pub const STARTS_WITH: &str = "$startsWith";
pub const STARTS_WITHC: &str = "$startsWithc";
pub const ENDS_WITH: &str = "$endsWith";
pub const ENDS_WITHC: &str = "$endsWithc";
pub const NULL: &str = "$null";
pub const NOT_NULL: &str = "$notNull";
pub const BETWEEN: &str = "$between";
pub const NOT_BETWEEN: &str = "$notBetween";
pub const OR: &str = "$or";
pub const AND: &str = "$and";

/// Builds the predicate for one operator token.
///
/// Implementations only ever produce parameterized predicates; values are carried as
/// [`Literal`]s and never spliced into SQL text.
pub trait Operator: Send + Sync {
    fn token(&self) -> &str;

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError>;
}

pub(crate) fn invalid_operand(operator: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidOperand { operator: operator.to_string(), reason: reason.into() }
}

pub(crate) fn require_values<'a>(operator: &str, values: &'a [Literal]) -> Result<&'a [Literal], ValidationError> {
    if values.is_empty() {
        return Err(invalid_operand(operator, "at least one value is required"));
    }
    Ok(values)
}
