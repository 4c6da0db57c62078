use crate::ast::{Literal, Predicate};
use crate::error::StorageError;
use crate::schema::ModelDescriptor;

/// The query being shaped by the resolver.
///
/// A query is exclusively owned by one resolution at a time; every pushed predicate is ANDed with
/// the ones already present.
pub trait FilterQuery {
    /// Name of the model this query selects.
    fn model(&self) -> &str;

    fn push(&mut self, predicate: Predicate);

    fn predicates(&self) -> &[Predicate];

    /// Distinct values currently stored in `column` of `model`. Used to enumerate the concrete
    /// types behind a polymorphic relation.
    fn distinct_values(&self, model: &ModelDescriptor, column: &str) -> Result<Vec<Literal>, StorageError>;
}

/// Collects the predicates of one `$or` / `$and` branch, delegating lookups to the outer query.
pub(crate) struct BranchQuery<'q> {
    outer: &'q dyn FilterQuery,
    predicates: Vec<Predicate>,
}

impl<'q> BranchQuery<'q> {
    pub fn new(outer: &'q dyn FilterQuery) -> Self { Self { outer, predicates: Vec::new() } }

    pub fn into_predicates(self) -> Vec<Predicate> { self.predicates }
}

impl FilterQuery for BranchQuery<'_> {
    fn model(&self) -> &str { self.outer.model() }

    fn push(&mut self, predicate: Predicate) { self.predicates.push(predicate); }

    fn predicates(&self) -> &[Predicate] { &self.predicates }

    fn distinct_values(&self, model: &ModelDescriptor, column: &str) -> Result<Vec<Literal>, StorageError> { self.outer.distinct_values(model, column) }
}
