use super::{require_values, Operator, EQC};
use crate::ast::{Collation, ComparisonOperator, Literal, Predicate};
use crate::error::ValidationError;

/// Plain binary comparison. Several values are ANDed: `{$gt: [1, 3]}` means `> 1 AND > 3`.
pub struct Compare {
    token: &'static str,
    operator: ComparisonOperator,
}

impl Compare {
    pub const fn new(token: &'static str, operator: ComparisonOperator) -> Self { Self { token, operator } }
}

impl Operator for Compare {
    fn token(&self) -> &str { self.token }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        let values = require_values(self.token, values)?;
        Ok(Predicate::all(values.iter().map(|value| Predicate::compare(column, self.operator, value.clone()))))
    }
}

/// Equality that ignores the column collation and compares bytes exactly.
pub struct CaseSensitiveEqual;

impl Operator for CaseSensitiveEqual {
    fn token(&self) -> &str { EQC }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        let values = require_values(EQC, values)?;
        Ok(Predicate::all(values.iter().map(|value| Predicate::Comparison {
            column: column.to_string(),
            operator: ComparisonOperator::Equal,
            value: value.clone(),
            collation: Collation::Binary,
        })))
    }
}
