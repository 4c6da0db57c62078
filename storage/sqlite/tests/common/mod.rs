use std::str::FromStr;
use std::sync::Arc;

use nestql::schema::Relation;
use nestql::{Literal, ModelDescriptor, OperatorRegistry, Resolver, ResolverConfig, Schema};
use nestql_sqlite::{SqliteConfig, SqliteQuery};
use rusqlite::Connection;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub fn schema() -> Arc<Schema> {
    let schema = Schema::builder()
        .model(ModelDescriptor::new("user", "users").field("name").renamed("email", "email_address").relation("posts", Relation::has_many("post", "author_id")))
        .model(
            ModelDescriptor::new("post", "posts")
                .field("title")
                .field("slug")
                .restricted("views", ["$eq", "$gt", "$lt", "$between", "$notBetween"])
                .relation("author", Relation::belongs_to("user", "author_id"))
                .relation("comments", Relation::morph_many("comment", "commentable")),
        )
        .model(ModelDescriptor::new("video", "videos").field("url").field("duration").relation("comments", Relation::morph_many("comment", "commentable")))
        .model(ModelDescriptor::new("comment", "comments").field("body").relation("commentable", Relation::morph_to("commentable", ["post", "video"])))
        .build()
        .unwrap();
    Arc::new(schema)
}

#[allow(unused)]
pub fn resolver(config: ResolverConfig) -> Resolver { Resolver::new(schema(), Arc::new(OperatorRegistry::standard()), config) }

/// In-memory database with a few users, their posts, videos and comments on both.
#[allow(unused)]
pub fn database() -> anyhow::Result<Connection> {
    let conn = nestql_sqlite::open(&SqliteConfig::Memory)?;
    conn.execute_batch(
        r#"
        CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email_address TEXT);
        CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT NOT NULL, slug TEXT COLLATE NOCASE, views INTEGER NOT NULL, author_id INTEGER REFERENCES users(id));
        CREATE TABLE videos (id INTEGER PRIMARY KEY, url TEXT NOT NULL, duration INTEGER NOT NULL);
        CREATE TABLE comments (id INTEGER PRIMARY KEY, body TEXT NOT NULL, commentable_type TEXT NOT NULL, commentable_id INTEGER NOT NULL);

        INSERT INTO users VALUES (1, 'Ada', 'ada@example.com'), (2, 'Grace', 'grace@example.com'), (3, 'Linus', NULL);
        INSERT INTO posts VALUES (1, 'Rust ownership', 'abc', 120, 1), (2, 'SQL joins', 'ABC', 40, 2), (3, 'Discounts: 100% off', 'xyz', 5, 1);
        INSERT INTO videos VALUES (1, 'https://videos.example/1', 300), (2, 'https://videos.example/2', 45);
        INSERT INTO comments VALUES
            (1, 'great', 'post', 1),
            (2, 'meh', 'post', 2),
            (3, 'nice video', 'video', 1),
            (4, 'GREAT', 'post', 2),
            (5, 'short', 'video', 2);
        "#,
    )?;
    Ok(conn)
}

/// Keys of the `model` rows matching `request`.
#[allow(unused)]
pub fn filter(conn: &Connection, resolver: &Resolver, model: &str, request: serde_json::Value) -> anyhow::Result<Vec<i64>> {
    let mut query = SqliteQuery::new(conn, resolver.schema(), model);
    let request = request.as_object().cloned().unwrap_or_default();
    resolver.apply_request(&mut query, &request)?;
    keys(&query)
}

#[allow(unused)]
pub fn keys(query: &SqliteQuery<'_>) -> anyhow::Result<Vec<i64>> {
    Ok(query
        .fetch_keys()?
        .into_iter()
        .map(|key| match key {
            Literal::I64(id) => id,
            other => panic!("unexpected key {other:?}"),
        })
        .collect())
}
