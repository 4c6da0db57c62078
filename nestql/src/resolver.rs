//! Walks a nested filter request, validates every step against the schema, and turns each
//! terminal `(column, operator, values)` triple into a predicate wrapped in the relation scopes
//! it was reached through.
//!
//! A request such as `{"author": {"posts": {"views": {"$gt": 10}}}}` is resolved top-down: each
//! non-operator key is validated on the model in scope and, if it names a relation, the scope
//! switches to the related model. When an operator key is reached, the enclosing key is the
//! column. The leaf predicate is then wrapped innermost-first, producing
//! `Exists(author, Exists(posts, views > 10))`.
//!
//! All resolution state lives in [`Scope`] values on the call stack, so a single [`Resolver`] can
//! be shared freely between concurrent requests.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ast::{MorphType, Predicate};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, ValidationError};
use crate::operator::{Group, Operator, OperatorKind, OperatorRegistry};
use crate::query::{BranchQuery, FilterQuery};
use crate::schema::{AllowedOperators, ModelDescriptor, Schema};
use crate::value::{self, FilterRequest};

/// Outcome of looking for an operator token along the first path of a request.
#[derive(Debug, PartialEq)]
enum OperatorSearch<'v> {
    Found(&'v str),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Relation,
    Column,
}

/// One step of the descent. Scopes link to their parent, so the chain from the innermost scope
/// back to the root is the field path.
struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    field: Option<&'a str>,
    kind: ScopeKind,
    /// Models in scope. More than one after passing through a polymorphic relation.
    models: Vec<&'a ModelDescriptor>,
}

impl<'a> Scope<'a> {
    fn root(model: &'a ModelDescriptor) -> Self { Self { parent: None, field: None, kind: ScopeKind::Root, models: vec![model] } }

    fn model_name(&self) -> String { self.models.iter().map(|m| m.name()).collect::<Vec<_>>().join("|") }

    fn declaring(&self, field: &str) -> Vec<&'a ModelDescriptor> { self.models.iter().copied().filter(|m| m.is_filterable(field)).collect() }

    fn available_fields(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.models.iter().flat_map(|m| m.filterable_fields()).collect();
        names.into_iter().map(str::to_string).collect()
    }
}

pub struct Resolver {
    schema: Arc<Schema>,
    registry: Arc<OperatorRegistry>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(schema: Arc<Schema>, registry: Arc<OperatorRegistry>, config: ResolverConfig) -> Self { Self { schema, registry, config } }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn registry(&self) -> &OperatorRegistry { &self.registry }

    pub fn config(&self) -> &ResolverConfig { &self.config }

    /// Apply every top-level field of `request` to `query`, in request order.
    pub fn apply_request<Q: FilterQuery>(&self, query: &mut Q, request: &FilterRequest) -> Result<(), ResolveError> {
        for (field, value) in request {
            self.apply(query, field, value)?;
        }
        Ok(())
    }

    /// Apply one top-level filter field to `query`.
    ///
    /// In strict mode the first validation error aborts the call; predicates pushed before it stay
    /// on the query. In silent mode invalid fields are skipped. Storage errors always propagate.
    pub fn apply<Q: FilterQuery>(&self, query: &mut Q, field: &str, value: &Value) -> Result<(), ResolveError> {
        let query: &mut dyn FilterQuery = query;
        let model = self.schema.model(query.model()).ok_or_else(|| ResolveError::UnknownModel(query.model().to_string()))?;
        debug!(model = model.name(), field, "applying filter");

        let found: Result<&str, ResolveError> = match self.find_operator(field, value) {
            OperatorSearch::Found(token) => Ok(token),
            OperatorSearch::NotFound => Err(self.no_operator_match().into()),
        };
        if self.safe(found)?.is_none() {
            return Ok(());
        }

        let root = Scope::root(model);
        self.safe(self.resolve(query, &root, field, value, 0))?;
        Ok(())
    }

    /// Follow the first entry at each level until an operator token is found or the value runs out.
    fn find_operator<'v>(&self, field: &'v str, value: &'v Value) -> OperatorSearch<'v> {
        let mut key = Some(field);
        let mut current = value;
        loop {
            if let Some(token) = key.filter(|k| self.registry.is_known(k)) {
                return OperatorSearch::Found(token);
            }
            (key, current) = match current {
                Value::Object(map) => match map.iter().next() {
                    Some((k, v)) => (Some(k.as_str()), v),
                    None => return OperatorSearch::NotFound,
                },
                Value::Array(items) => match items.first() {
                    Some(v) => (None, v),
                    None => return OperatorSearch::NotFound,
                },
                _ => return OperatorSearch::NotFound,
            };
        }
    }

    /// Error boundary for one filter-application step. Returns `None` for a validation error
    /// swallowed in silent mode.
    fn safe<T>(&self, result: Result<T, ResolveError>) -> Result<Option<T>, ResolveError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ResolveError::Validation(err)) if self.config.silent => {
                warn!(error = %err, "skipping invalid filter");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `depth` counts every nested step taken so far, relations and groups alike.
    fn resolve(&self, query: &mut dyn FilterQuery, scope: &Scope<'_>, field: &str, value: &Value, depth: usize) -> Result<(), ResolveError> {
        if depth > self.config.max_depth {
            return Err(ValidationError::DepthExceeded { limit: self.config.max_depth }.into());
        }
        // An operator token always wins over a field of the same name.
        match self.registry.resolve(field) {
            Some(OperatorKind::Strategy(operator)) => self.apply_operator(query, scope, operator.as_ref(), value),
            Some(OperatorKind::Group(group)) => self.apply_group(query, scope, *group, value, depth),
            None => self.descend(query, scope, field, value, depth),
        }
    }

    /// `field` is a relation or a column; resolve each nested entry in its scope.
    fn descend(&self, query: &mut dyn FilterQuery, scope: &Scope<'_>, field: &str, value: &Value, depth: usize) -> Result<(), ResolveError> {
        // Validated even when nothing is nested below it.
        let child = self.enter(scope, field)?;
        let entries = value::entries(value).ok_or_else(|| self.no_operator_match())?;
        for (sub_field, sub_value) in entries {
            if let Some(OperatorKind::Strategy(_)) = self.registry.resolve(sub_field) {
                if self.safe(check_operator(&scope.models, field, sub_field).map_err(ResolveError::from))?.is_none() {
                    continue;
                }
            }
            self.safe(self.resolve(query, &child, sub_field, sub_value, depth + 1))?;
        }
        Ok(())
    }

    /// Validate `field` on the models in scope and build the scope below it.
    fn enter<'a>(&'a self, scope: &'a Scope<'a>, field: &'a str) -> Result<Scope<'a>, ValidationError> {
        let declaring = scope.declaring(field);
        if declaring.is_empty() {
            return Err(ValidationError::FieldNotSupported { field: field.to_string(), model: scope.model_name(), available: scope.available_fields() });
        }
        if scope.kind == ScopeKind::Column {
            // A column can only be followed by operators.
            return Err(ValidationError::FieldNotSupported { field: field.to_string(), model: scope.model_name(), available: Vec::new() });
        }

        let mut targets: Vec<&ModelDescriptor> = Vec::new();
        for model in &declaring {
            if let Some(relation) = model.relation_named(field) {
                for target in self.schema.relation_targets(relation) {
                    if !targets.iter().any(|t| t.name() == target.name()) {
                        targets.push(target);
                    }
                }
            }
        }

        let (kind, models) = if targets.is_empty() { (ScopeKind::Column, declaring) } else { (ScopeKind::Relation, targets) };
        Ok(Scope { parent: Some(scope), field: Some(field), kind, models })
    }

    fn apply_operator(&self, query: &mut dyn FilterQuery, scope: &Scope<'_>, operator: &dyn Operator, value: &Value) -> Result<(), ResolveError> {
        let (Some(field), ScopeKind::Column) = (scope.field, scope.kind) else {
            return Err(ValidationError::OperatorWithoutField { operator: operator.token().to_string() }.into());
        };
        let column = scope.models.first().map(|m| m.column(field)).unwrap_or(field);
        let operands = value::operands(operator.token(), value)?;
        let leaf = operator.build(column, &operands)?;
        debug!(column, operator = operator.token(), "built leaf predicate");

        let predicate = self.unwind(&*query, scope, leaf)?;
        query.push(predicate);
        Ok(())
    }

    /// Wrap `predicate` in the relation scopes above the column scope, innermost first.
    fn unwind(&self, query: &dyn FilterQuery, column_scope: &Scope<'_>, mut predicate: Predicate) -> Result<Predicate, ResolveError> {
        // Fields below the relation being wrapped, outermost first, ending with the column.
        let mut below: Vec<&str> = column_scope.field.into_iter().collect();
        let mut node = column_scope.parent;

        while let Some(scope) = node {
            let (Some(relation), ScopeKind::Relation, Some(owner_scope)) = (scope.field, scope.kind, scope.parent) else { break };
            let owners = owner_scope.declaring(relation);
            let polymorphic = owners.iter().any(|m| m.relation_named(relation).is_some_and(|r| r.is_polymorphic()));

            predicate = if polymorphic {
                self.wrap_morph(query, &owners, relation, &below, predicate)?
            } else {
                Predicate::Exists { relation: relation.to_string(), predicate: Box::new(predicate) }
            };
            debug!(relation, polymorphic, "wrapped relation scope");

            below.insert(0, relation);
            node = Some(owner_scope);
        }
        Ok(predicate)
    }

    /// Fan a predicate out over the concrete types currently stored behind a polymorphic relation.
    /// Types that cannot reach `below` are dropped; with none left the relation matches nothing.
    fn wrap_morph(&self, query: &dyn FilterQuery, owners: &[&ModelDescriptor], relation: &str, below: &[&str], predicate: Predicate) -> Result<Predicate, ResolveError> {
        let mut types: Vec<MorphType> = Vec::new();
        for owner in owners {
            let Some(morph) = owner.relation_named(relation) else { continue };
            for (marker, model) in self.schema.concrete_types(owner, morph, query)? {
                if !self.schema.declares_path(model, below) {
                    debug!(relation, model = model.name(), "dropping morph type without filtered field");
                    continue;
                }
                if !types.iter().any(|t| t.marker == marker) {
                    types.push(MorphType { marker, model: model.name().to_string() });
                }
            }
        }

        if types.is_empty() {
            return Ok(Predicate::False);
        }
        Ok(Predicate::ExistsMorph { relation: relation.to_string(), types, predicate: Box::new(predicate) })
    }

    /// `$or` / `$and`: resolve each branch in the current scope and combine the results.
    fn apply_group(&self, query: &mut dyn FilterQuery, scope: &Scope<'_>, group: Group, value: &Value, depth: usize) -> Result<(), ResolveError> {
        let branches = value::branches(value).ok_or_else(|| self.no_operator_match())?;
        let mut combined = Vec::with_capacity(branches.len());
        for branch in branches {
            let entries = value::entries(branch).ok_or_else(|| self.no_operator_match())?;
            let mut collected = BranchQuery::new(&*query);
            for (field, sub_value) in entries {
                if let (Some(column), ScopeKind::Column, Some(OperatorKind::Strategy(_))) = (scope.field, scope.kind, self.registry.resolve(field)) {
                    if self.safe(check_operator(&scope.models, column, field).map_err(ResolveError::from))?.is_none() {
                        continue;
                    }
                }
                self.safe(self.resolve(&mut collected, scope, field, sub_value, depth + 1))?;
            }
            let predicates = collected.into_predicates();
            if !predicates.is_empty() {
                combined.push(Predicate::all(predicates));
            }
        }

        if combined.is_empty() {
            return Ok(());
        }
        query.push(match group {
            Group::Any => Predicate::any(combined),
            Group::All => Predicate::all(combined),
        });
        Ok(())
    }

    fn no_operator_match(&self) -> ValidationError { ValidationError::NoOperatorMatch { available: self.registry.known_tokens().map(str::to_string).collect() } }
}

/// Reject `operator` when `field` restricts its operators and the restriction excludes it.
fn check_operator(models: &[&ModelDescriptor], field: &str, operator: &str) -> Result<(), ValidationError> {
    let mut available = BTreeSet::new();
    for allowed in models.iter().filter_map(|m| m.allowed_operators(field)) {
        match allowed {
            AllowedOperators::All => return Ok(()),
            AllowedOperators::Only(tokens) if tokens.contains(operator) => return Ok(()),
            AllowedOperators::Only(tokens) => available.extend(tokens.iter().cloned()),
        }
    }
    Err(ValidationError::OperatorNotSupported { field: field.to_string(), operator: operator.to_string(), available: available.into_iter().collect() })
}
