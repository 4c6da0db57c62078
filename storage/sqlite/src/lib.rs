//! SQLite backend for nestql
//!
//! [`SqliteQuery`] collects the predicates produced by a [`nestql::Resolver`] and renders them as
//! a single `SELECT` with correlated `EXISTS` subqueries for every relation hop. Type markers of
//! polymorphic relations are read from the live table through the same connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use nestql_sqlite::{open, SqliteConfig, SqliteQuery};
//!
//! let conn = open(&SqliteConfig::Memory)?;
//! let mut query = SqliteQuery::new(&conn, schema.clone(), "post");
//! resolver.apply_request(&mut query, &request)?;
//! let ids = query.fetch_keys()?;
//! ```

mod connection;
mod error;
mod query;
pub mod sql_builder;
mod value;

pub use connection::{open, SqliteConfig};
pub use error::SqliteError;
pub use query::SqliteQuery;
pub use sql_builder::{SqlBuilder, SqlGenerationError};
pub use value::{from_sql, to_sql};
