//! nestql - resolve nested, untrusted filter requests into query predicates
//!
//! A filter request maps field names to operator expressions, and may nest through relations:
//!
//! ```json
//! { "author": { "name": { "$eq": "Ada" } }, "views": { "$gt": 100 } }
//! ```
//!
//! The [`Resolver`] validates every field and operator against a [`Schema`], builds the leaf
//! predicate with the matching [`operator::Operator`] strategy, and wraps it in one
//! [`Predicate::Exists`] per relation it was reached through. Polymorphic relations fan out over
//! the concrete types actually stored (see [`Predicate::ExistsMorph`]).
//!
//! The resulting [`Predicate`] tree is handed to a [`FilterQuery`] implementation, which owns
//! rendering and execution (see the `nestql-sqlite` crate).
//!
//! # Example
//!
//! ```rust,ignore
//! let schema = Arc::new(Schema::builder().model(ModelDescriptor::new("post", "posts").field("title")).build()?);
//! let resolver = Resolver::new(schema, Arc::new(OperatorRegistry::standard()), ResolverConfig::strict());
//! let request = parser::parse_query_string("filters[title][$contains]=rust", "filters")?;
//! resolver.apply_request(&mut query, &request)?;
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod grammar;
pub mod operator;
pub mod parser;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod value;

pub use ast::{Literal, Predicate};
pub use config::ResolverConfig;
pub use error::{ResolveError, StorageError, ValidationError};
pub use operator::OperatorRegistry;
pub use query::FilterQuery;
pub use resolver::Resolver;
pub use schema::{ModelDescriptor, Relation, Schema};
pub use value::FilterRequest;
