use nestql::{FilterQuery, Literal, ModelDescriptor, Predicate, Schema, StorageError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use crate::error::SqliteError;
use crate::sql_builder::{escape_identifier, SqlBuilder};
use crate::value::from_sql;

/// A filter over one model's table, rendered and executed against a borrowed connection.
pub struct SqliteQuery<'c> {
    conn: &'c Connection,
    schema: &'c Schema,
    model: String,
    predicates: Vec<Predicate>,
}

impl<'c> SqliteQuery<'c> {
    pub fn new(conn: &'c Connection, schema: &'c Schema, model: impl Into<String>) -> Self { Self { conn, schema, model: model.into(), predicates: Vec::new() } }

    /// Every pushed predicate, ANDed.
    pub fn predicate(&self) -> Predicate { Predicate::all(self.predicates.iter().cloned()) }

    pub fn to_sql(&self, columns: &[&str]) -> Result<(String, Vec<Value>), SqliteError> {
        Ok(SqlBuilder::new(self.schema).select(&self.model, columns, &self.predicate())?)
    }

    /// Primary keys of the matching rows, in key order.
    pub fn fetch_keys(&self) -> Result<Vec<Literal>, SqliteError> {
        let model = self.descriptor()?;
        let (mut sql, params) = self.to_sql(&[model.key()])?;
        sql.push_str(&format!(r#" ORDER BY t0."{}""#, escape_identifier(model.key())));
        self.query_column(&sql, &params)
    }

    pub fn count(&self) -> Result<usize, SqliteError> {
        let model = self.descriptor()?;
        let (sql, params) = self.to_sql(&[model.key()])?;
        let sql = format!("SELECT COUNT(*) FROM ({sql})");
        debug!(%sql, "counting rows");
        let count: i64 = self.conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn descriptor(&self) -> Result<&'c ModelDescriptor, SqliteError> { self.schema.model(&self.model).ok_or_else(|| SqliteError::UnknownModel(self.model.clone())) }

    fn query_column(&self, sql: &str, params: &[Value]) -> Result<Vec<Literal>, SqliteError> {
        debug!(%sql, params = params.len(), "executing query");
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, Value>(0))?;
        let values: Result<Vec<Literal>, rusqlite::Error> = rows.map(|row| row.map(from_sql)).collect();
        Ok(values?)
    }
}

impl FilterQuery for SqliteQuery<'_> {
    fn model(&self) -> &str { &self.model }

    fn push(&mut self, predicate: Predicate) {
        debug!(model = %self.model, ?predicate, "adding predicate");
        self.predicates.push(predicate);
    }

    fn predicates(&self) -> &[Predicate] { &self.predicates }

    fn distinct_values(&self, model: &ModelDescriptor, column: &str) -> Result<Vec<Literal>, StorageError> {
        let column = escape_identifier(column);
        let sql = format!(r#"SELECT DISTINCT "{column}" FROM "{}" ORDER BY "{column}""#, escape_identifier(model.table()));
        Ok(self.query_column(&sql, &[])?)
    }
}
