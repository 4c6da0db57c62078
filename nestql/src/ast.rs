use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,              // =
    NotEqual,           // <>
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    LessThan,           // <
    LessThanOrEqual,    // <=
}

/// Collation applied to a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Collation {
    /// Whatever the column / engine default is (often case-insensitive).
    #[default]
    Default,
    /// Byte-exact comparison regardless of the column collation.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Contains,
    StartsWith,
    EndsWith,
}

/// A concrete target of a polymorphic relation: the stored type marker and the model it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphType {
    pub marker: String,
    pub model: String,
}

/// Predicate tree produced by the resolver.
///
/// Column names are unqualified; they refer to the model in scope, which changes inside
/// `Exists` and `ExistsMorph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Comparison {
        column: String,
        operator: ComparisonOperator,
        value: Literal,
        collation: Collation,
    },
    In {
        column: String,
        values: Vec<Literal>,
        negated: bool,
    },
    Pattern {
        column: String,
        kind: PatternKind,
        value: String,
        case_sensitive: bool,
        negated: bool,
    },
    IsNull(String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    /// At least one row related through `relation` satisfies `predicate`.
    Exists {
        relation: String,
        predicate: Box<Predicate>,
    },
    /// At least one row of any listed concrete type, related through the polymorphic `relation`,
    /// satisfies `predicate`.
    ExistsMorph {
        relation: String,
        types: Vec<MorphType>,
        predicate: Box<Predicate>,
    },
    True,
    False,
}

impl Predicate {
    pub fn compare(column: impl Into<String>, operator: ComparisonOperator, value: Literal) -> Self {
        Predicate::Comparison { column: column.into(), operator, value, collation: Collation::Default }
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (left, right) => Predicate::And(Box::new(left), Box::new(right)),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::False, p) | (p, Predicate::False) => p,
            (left, right) => Predicate::Or(Box::new(left), Box::new(right)),
        }
    }

    pub fn negate(self) -> Self { Predicate::Not(Box::new(self)) }

    /// AND all predicates together. An empty iterator yields `True`.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self { predicates.into_iter().fold(Predicate::True, Predicate::and) }

    /// OR all predicates together. An empty iterator yields `False`.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self { predicates.into_iter().fold(Predicate::False, Predicate::or) }

    /// Deepest relation nesting in the tree.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::Exists { predicate, .. } | Predicate::ExistsMorph { predicate, .. } => 1 + predicate.depth(),
            Predicate::And(left, right) | Predicate::Or(left, right) => left.depth().max(right.depth()),
            Predicate::Not(inner) => inner.depth(),
            _ => 0,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::I64(i) => write!(f, "{}", i),
            Literal::F64(v) => write!(f, "{}", v),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(column: &str, value: i64) -> Predicate { Predicate::compare(column, ComparisonOperator::Equal, Literal::I64(value)) }

    #[test]
    fn test_and_drops_true() {
        assert_eq!(Predicate::True.and(eq("a", 1)), eq("a", 1));
        assert_eq!(eq("a", 1).and(Predicate::True), eq("a", 1));
        assert_eq!(Predicate::all(vec![]), Predicate::True);
    }

    #[test]
    fn test_or_drops_false() {
        assert_eq!(Predicate::any(vec![eq("a", 1)]), eq("a", 1));
        assert_eq!(Predicate::any(vec![]), Predicate::False);
        assert_eq!(Predicate::any(vec![eq("a", 1), eq("b", 2)]), Predicate::Or(Box::new(eq("a", 1)), Box::new(eq("b", 2))));
    }

    #[test]
    fn test_depth_counts_relation_wrappers() {
        let nested = Predicate::Exists {
            relation: "a".into(),
            predicate: Box::new(Predicate::Exists { relation: "b".into(), predicate: Box::new(eq("c", 5)) }),
        };
        assert_eq!(nested.depth(), 2);
        assert_eq!(eq("c", 5).depth(), 0);
    }
}
