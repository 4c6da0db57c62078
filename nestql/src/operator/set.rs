use super::{require_values, Operator, IN, NOT_IN};
use crate::ast::{Literal, Predicate};
use crate::error::ValidationError;

/// `$in` / `$notIn`
pub struct Membership {
    negated: bool,
}

impl Membership {
    pub const fn any_of() -> Self { Self { negated: false } }
    pub const fn none_of() -> Self { Self { negated: true } }
}

impl Operator for Membership {
    fn token(&self) -> &str {
        if self.negated {
            NOT_IN
        } else {
            IN
        }
    }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        let values = require_values(self.token(), values)?;
        Ok(Predicate::In { column: column.to_string(), values: values.to_vec(), negated: self.negated })
    }
}
