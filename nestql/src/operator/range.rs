use super::{invalid_operand, Compare, Operator, BETWEEN, GT, GTE, LT, LTE, NOT_BETWEEN};
use crate::ast::{ComparisonOperator, Literal, Predicate};
use crate::error::ValidationError;

/// `$between` / `$notBetween`, composed from the lower and upper bound comparisons.
pub struct Range {
    negated: bool,
}

impl Range {
    pub const fn between() -> Self { Self { negated: false } }
    pub const fn not_between() -> Self { Self { negated: true } }
}

impl Operator for Range {
    fn token(&self) -> &str {
        if self.negated {
            NOT_BETWEEN
        } else {
            BETWEEN
        }
    }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        let [lower, upper] = values else {
            return Err(invalid_operand(self.token(), format!("expected exactly 2 values, got {}", values.len())));
        };
        if self.negated {
            let below = Compare::new(LT, ComparisonOperator::LessThan).build(column, std::slice::from_ref(lower))?;
            let above = Compare::new(GT, ComparisonOperator::GreaterThan).build(column, std::slice::from_ref(upper))?;
            Ok(below.or(above))
        } else {
            let from = Compare::new(GTE, ComparisonOperator::GreaterThanOrEqual).build(column, std::slice::from_ref(lower))?;
            let to = Compare::new(LTE, ComparisonOperator::LessThanOrEqual).build(column, std::slice::from_ref(upper))?;
            Ok(from.and(to))
        }
    }
}
