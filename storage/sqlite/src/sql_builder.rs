//! SQL builder for SQLite queries
//!
//! Converts nestql predicates to SQLite-compatible SQL WHERE clauses. The root model is aliased
//! `t0`; every relation hop opens a correlated `EXISTS` subquery with the next alias.

use nestql::ast::{Collation, ComparisonOperator, MorphType, PatternKind};
use nestql::{Literal, ModelDescriptor, Predicate, Relation, Schema};
use rusqlite::types::Value;
use thiserror::Error;

use crate::value::to_sql;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlGenerationError {
    #[error("model `{0}` is not part of the schema")]
    UnknownModel(String),
    #[error("model `{model}` has no relation `{relation}`")]
    UnknownRelation { model: String, relation: String },
    #[error("polymorphic relation `{0}` needs its concrete types")]
    MorphWithoutTypes(String),
    #[error("relation `{0}` is not polymorphic")]
    NotPolymorphic(String),
}

/// The model a predicate is evaluated against, and the alias it is bound to.
#[derive(Debug, Clone, Copy)]
struct Frame<'s> {
    alias: usize,
    model: &'s ModelDescriptor,
}

/// SQL builder for SQLite queries
pub struct SqlBuilder<'s> {
    schema: &'s Schema,
    sql: String,
    params: Vec<Value>,
    next_alias: usize,
}

impl<'s> SqlBuilder<'s> {
    pub fn new(schema: &'s Schema) -> Self { Self { schema, sql: String::new(), params: Vec::new(), next_alias: 1 } }

    fn push_sql(&mut self, s: &str) { self.sql.push_str(s); }

    fn push_param(&mut self, value: Value) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn push_column(&mut self, frame: Frame<'s>, column: &str) { self.push_sql(&format!(r#"t{}."{}""#, frame.alias, escape_identifier(column))); }

    /// `SELECT <columns> FROM <table> AS t0 WHERE <predicate>`
    pub fn select(mut self, model: &str, columns: &[&str], predicate: &Predicate) -> Result<(String, Vec<Value>), SqlGenerationError> {
        let model = self.model(model)?;
        let fields_clause = columns.iter().map(|column| format!(r#"t0."{}""#, escape_identifier(column))).collect::<Vec<_>>().join(", ");
        self.push_sql(&format!(r#"SELECT {} FROM "{}" AS t0 WHERE "#, fields_clause, escape_identifier(model.table())));
        self.predicate(Frame { alias: 0, model }, predicate)?;
        Ok((self.sql, self.params))
    }

    /// Just the WHERE clause, with `t0` standing for `model`.
    pub fn where_clause(mut self, model: &str, predicate: &Predicate) -> Result<(String, Vec<Value>), SqlGenerationError> {
        let model = self.model(model)?;
        self.predicate(Frame { alias: 0, model }, predicate)?;
        Ok((self.sql, self.params))
    }

    fn model(&self, name: &str) -> Result<&'s ModelDescriptor, SqlGenerationError> {
        self.schema.model(name).ok_or_else(|| SqlGenerationError::UnknownModel(name.to_string()))
    }

    fn relation(&self, frame: Frame<'s>, name: &str) -> Result<&'s Relation, SqlGenerationError> {
        frame.model.relation_named(name).ok_or_else(|| SqlGenerationError::UnknownRelation { model: frame.model.name().to_string(), relation: name.to_string() })
    }

    fn predicate(&mut self, frame: Frame<'s>, predicate: &Predicate) -> Result<(), SqlGenerationError> {
        match predicate {
            Predicate::Comparison { column, operator: operator @ (ComparisonOperator::Equal | ComparisonOperator::NotEqual), value: Literal::Null, .. } => {
                self.push_column(frame, column);
                self.push_sql(if *operator == ComparisonOperator::Equal { " IS NULL" } else { " IS NOT NULL" });
            }
            Predicate::Comparison { column, operator, value, collation } => {
                self.push_column(frame, column);
                self.push_sql(&format!(" {} ", comparison_op_to_sql(operator)));
                self.push_param(to_sql(value));
                if *collation == Collation::Binary {
                    self.push_sql(" COLLATE BINARY");
                }
            }
            Predicate::In { values, negated, .. } if values.is_empty() => {
                self.push_sql(if *negated { "1=1" } else { "1=0" });
            }
            Predicate::In { column, values, negated } => {
                self.push_column(frame, column);
                self.push_sql(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.push_param(to_sql(value));
                }
                self.push_sql(")");
            }
            Predicate::Pattern { column, kind, value, case_sensitive, negated } => {
                self.push_column(frame, column);
                if *negated {
                    self.push_sql(" NOT");
                }
                // LIKE folds ASCII case; GLOB never does.
                if *case_sensitive {
                    self.push_sql(" GLOB ");
                    self.push_param(Value::Text(glob_pattern(*kind, value)));
                } else {
                    self.push_sql(" LIKE ");
                    self.push_param(Value::Text(like_pattern(*kind, value)));
                    self.push_sql(r" ESCAPE '\'");
                }
            }
            Predicate::IsNull(column) => {
                self.push_column(frame, column);
                self.push_sql(" IS NULL");
            }
            Predicate::And(left, right) => {
                self.predicate(frame, left)?;
                self.push_sql(" AND ");
                self.predicate(frame, right)?;
            }
            Predicate::Or(left, right) => {
                self.push_sql("(");
                self.predicate(frame, left)?;
                self.push_sql(" OR ");
                self.predicate(frame, right)?;
                self.push_sql(")");
            }
            Predicate::Not(pred) => {
                self.push_sql("NOT (");
                self.predicate(frame, pred)?;
                self.push_sql(")");
            }
            Predicate::Exists { relation, predicate } => self.exists(frame, relation, predicate)?,
            Predicate::ExistsMorph { relation, types, predicate } => self.exists_morph(frame, relation, types, predicate)?,
            Predicate::True => {
                self.push_sql("1=1");
            }
            Predicate::False => {
                self.push_sql("1=0");
            }
        }
        Ok(())
    }

    /// Open `EXISTS (SELECT 1 FROM <table> AS tN WHERE ` and return the frame for `tN`.
    fn subquery(&mut self, model: &'s ModelDescriptor) -> Frame<'s> {
        let frame = Frame { alias: self.next_alias, model };
        self.next_alias += 1;
        self.push_sql(&format!(r#"EXISTS (SELECT 1 FROM "{}" AS t{} WHERE "#, escape_identifier(model.table()), frame.alias));
        frame
    }

    fn exists(&mut self, frame: Frame<'s>, relation: &str, predicate: &Predicate) -> Result<(), SqlGenerationError> {
        // (target, key on the target, key on the owner, type column on the target)
        let (target, inner_key, outer_key, type_column) = match self.relation(frame, relation)? {
            Relation::BelongsTo { target, foreign_key, owner_key } => (target, owner_key, foreign_key, None),
            Relation::HasMany { target, foreign_key, local_key } => (target, foreign_key, local_key, None),
            Relation::MorphMany { target, type_column, id_column, local_key } => (target, id_column, local_key, Some(type_column)),
            Relation::MorphTo { .. } => return Err(SqlGenerationError::MorphWithoutTypes(relation.to_string())),
        };
        let target = self.model(target)?;

        let child = self.subquery(target);
        self.push_column(child, inner_key);
        self.push_sql(" = ");
        self.push_column(frame, outer_key);
        if let Some(type_column) = type_column {
            self.push_sql(" AND ");
            self.push_column(child, type_column);
            self.push_sql(" = ");
            self.push_param(Value::Text(self.schema.marker_for(frame.model.name()).to_string()));
        }
        self.push_sql(" AND ");
        self.predicate(child, predicate)?;
        self.push_sql(")");
        Ok(())
    }

    fn exists_morph(&mut self, frame: Frame<'s>, relation: &str, types: &[MorphType], predicate: &Predicate) -> Result<(), SqlGenerationError> {
        let Relation::MorphTo { type_column, id_column, .. } = self.relation(frame, relation)? else {
            return Err(SqlGenerationError::NotPolymorphic(relation.to_string()));
        };
        if types.is_empty() {
            self.push_sql("1=0");
            return Ok(());
        }

        if types.len() > 1 {
            self.push_sql("(");
        }
        for (i, morph) in types.iter().enumerate() {
            if i > 0 {
                self.push_sql(" OR ");
            }
            let target = self.model(&morph.model)?;
            self.push_sql("(");
            self.push_column(frame, type_column);
            self.push_sql(" = ");
            self.push_param(Value::Text(morph.marker.clone()));
            self.push_sql(" AND ");
            let child = self.subquery(target);
            self.push_column(child, target.key());
            self.push_sql(" = ");
            self.push_column(frame, id_column);
            self.push_sql(" AND ");
            self.predicate(child, predicate)?;
            self.push_sql("))");
        }
        if types.len() > 1 {
            self.push_sql(")");
        }
        Ok(())
    }
}

pub(crate) fn escape_identifier(name: &str) -> String { name.replace('"', "\"\"") }

fn comparison_op_to_sql(op: &ComparisonOperator) -> &'static str {
    match op {
        ComparisonOperator::Equal => "=",
        ComparisonOperator::NotEqual => "<>",
        ComparisonOperator::GreaterThan => ">",
        ComparisonOperator::GreaterThanOrEqual => ">=",
        ComparisonOperator::LessThan => "<",
        ComparisonOperator::LessThanOrEqual => "<=",
    }
}

/// LIKE pattern with `\` as the escape character.
fn like_pattern(kind: PatternKind, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    match kind {
        PatternKind::Contains => format!("%{escaped}%"),
        PatternKind::StartsWith => format!("{escaped}%"),
        PatternKind::EndsWith => format!("%{escaped}"),
    }
}

/// GLOB has no escape character; metacharacters are wrapped in a one-character class.
fn glob_pattern(kind: PatternKind, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            c => escaped.push(c),
        }
    }
    match kind {
        PatternKind::Contains => format!("*{escaped}*"),
        PatternKind::StartsWith => format!("{escaped}*"),
        PatternKind::EndsWith => format!("*{escaped}"),
    }
}
