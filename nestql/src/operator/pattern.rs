use super::{invalid_operand, require_values, Operator};
use crate::ast::{Literal, PatternKind, Predicate};
use crate::error::ValidationError;

/// Substring, prefix and suffix matching, optionally case-sensitive and/or negated.
pub struct PatternMatch {
    token: &'static str,
    kind: PatternKind,
    case_sensitive: bool,
    negated: bool,
}

impl PatternMatch {
    pub const fn new(token: &'static str, kind: PatternKind) -> Self { Self { token, kind, case_sensitive: false, negated: false } }

    pub const fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub const fn negated(mut self) -> Self {
        self.negated = true;
        self
    }
}

impl Operator for PatternMatch {
    fn token(&self) -> &str { self.token }

    fn build(&self, column: &str, values: &[Literal]) -> Result<Predicate, ValidationError> {
        let values = require_values(self.token, values)?;
        let mut predicates = Vec::with_capacity(values.len());
        for value in values {
            let value = match value {
                Literal::String(s) => s.clone(),
                Literal::I64(i) => i.to_string(),
                Literal::F64(f) => f.to_string(),
                Literal::Bool(_) | Literal::Null => return Err(invalid_operand(self.token, format!("cannot match a pattern against {}", value))),
            };
            predicates.push(Predicate::Pattern {
                column: column.to_string(),
                kind: self.kind,
                value,
                case_sensitive: self.case_sensitive,
                negated: self.negated,
            });
        }
        Ok(Predicate::all(predicates))
    }
}
