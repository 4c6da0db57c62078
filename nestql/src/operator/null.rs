use super::{Operator, NOT_NULL, NULL};
use crate::ast::{Literal, Predicate};
use crate::error::ValidationError;

/// `$null` / `$notNull`. A falsy value flips the check, so `{$null: false}` behaves like `$notNull`.
pub struct NullCheck {
    expect_null: bool,
}

impl NullCheck {
    pub const fn is_null() -> Self { Self { expect_null: true } }
    pub const fn is_not_null() -> Self { Self { expect_null: false } }

    fn check(&self, column: &str, flag: bool) -> Predicate {
        let is_null = Predicate::IsNull(column.to_string());
        if flag == self.expect_null {
            is_null
        } else {
            is_null.negate()
        }
    }
}

fn truthy(value: &Literal) -> bool {
    match value {
        Literal::Bool(b) => *b,
        Literal::I64(i) => *i != 0,
        Literal::F64(f) => *f != 0.0,
        Literal::String(s) => !matches!(s.to_ascii_lowercase().as_str(), "" | "0" | "false"),
        Literal::Null => true,
    }
}

impl Operator for NullCheck {
    fn token(&self) -> &str {
        if self.expect_null {
            NULL
        } else {
            NOT_NULL
        }
    }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        if values.is_empty() {
            return Ok(self.check(column, true));
        }
        Ok(Predicate::all(values.iter().map(|value| self.check(column, truthy(value)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_false_flips_check() {
        let null = NullCheck::is_null();
        assert_eq!(null.build("deleted_at", &[Literal::String("false".into())]).unwrap(), Predicate::IsNull("deleted_at".into()).negate());
        assert_eq!(null.build("deleted_at", &[Literal::Bool(true)]).unwrap(), Predicate::IsNull("deleted_at".into()));
    }

    #[test]
    fn test_not_null_without_values() {
        assert_eq!(NullCheck::is_not_null().build("email", &[]).unwrap(), Predicate::IsNull("email".into()).negate());
    }
}
