use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::ast::{ComparisonOperator, PatternKind};
use crate::error::RegistryError;

/// How the branches of a logical group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    All,
    Any,
}

#[derive(Clone)]
pub enum OperatorKind {
    Strategy(Arc<dyn Operator>),
    Group(Group),
}

impl std::fmt::Debug for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorKind::Strategy(op) => write!(f, "Strategy({})", op.token()),
            OperatorKind::Group(group) => write!(f, "Group({:?})", group),
        }
    }
}

/// Maps operator tokens to strategies. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: BTreeMap<String, OperatorKind>,
}

impl OperatorRegistry {
    pub fn builder() -> RegistryBuilder { RegistryBuilder::default() }

    /// The built-in operator set.
    pub fn standard() -> Self {
        let built = Self::builder()
            .register(Compare::new(EQ, ComparisonOperator::Equal))
            .register(CaseSensitiveEqual)
            .register(Compare::new(NE, ComparisonOperator::NotEqual))
            .register(Compare::new(LT, ComparisonOperator::LessThan))
            .register(Compare::new(LTE, ComparisonOperator::LessThanOrEqual))
            .register(Compare::new(GT, ComparisonOperator::GreaterThan))
            .register(Compare::new(GTE, ComparisonOperator::GreaterThanOrEqual))
            .register(Membership::any_of())
            .register(Membership::none_of())
            .register(PatternMatch::new(CONTAINS, PatternKind::Contains))
            .register(PatternMatch::new(CONTAINSC, PatternKind::Contains).case_sensitive())
            .register(PatternMatch::new(NOT_CONTAINS, PatternKind::Contains).negated())
            .register(PatternMatch::new(NOT_CONTAINSC, PatternKind::Contains).case_sensitive().negated())
            .register(PatternMatch::new(STARTS_WITH, PatternKind::StartsWith))
            .register(PatternMatch::new(STARTS_WITHC, PatternKind::StartsWith).case_sensitive())
            .register(PatternMatch::new(ENDS_WITH, PatternKind::EndsWith))
            .register(PatternMatch::new(ENDS_WITHC, PatternKind::EndsWith).case_sensitive())
            .register(NullCheck::is_null())
            .register(NullCheck::is_not_null())
            .register(Range::between())
            .register(Range::not_between())
            .group(OR, Group::Any)
            .group(AND, Group::All)
            .build();
        match built {
            Ok(registry) => registry,
            Err(err) => unreachable!("built-in operator set is consistent: {}", err),
        }
    }

    pub fn resolve(&self, token: &str) -> Option<&OperatorKind> { self.operators.get(token) }

    pub fn is_known(&self, token: &str) -> bool { self.operators.contains_key(token) }

    pub fn known_tokens(&self) -> impl Iterator<Item = &str> { self.operators.keys().map(String::as_str) }
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, OperatorKind)>,
}

impl RegistryBuilder {
    pub fn register(mut self, operator: impl Operator + 'static) -> Self {
        self.entries.push((operator.token().to_string(), OperatorKind::Strategy(Arc::new(operator))));
        self
    }

    pub fn group(mut self, token: &str, group: Group) -> Self {
        self.entries.push((token.to_string(), OperatorKind::Group(group)));
        self
    }

    pub fn build(self) -> Result<OperatorRegistry, RegistryError> {
        let mut operators = BTreeMap::new();
        for (token, kind) in self.entries {
            if token.len() < 2 || !token.starts_with('$') {
                return Err(RegistryError::InvalidToken(token));
            }
            if operators.contains_key(&token) {
                return Err(RegistryError::DuplicateToken(token));
            }
            operators.insert(token, kind);
        }
        Ok(OperatorRegistry { operators })
    }
}
