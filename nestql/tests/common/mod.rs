use std::str::FromStr;

use nestql::{FilterQuery, Literal, ModelDescriptor, Predicate, StorageError};
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

/// Collects predicates in memory; type markers are supplied up front.
pub struct MemoryQuery {
    model: String,
    markers: Vec<Literal>,
    predicates: Vec<Predicate>,
}

impl MemoryQuery {
    pub fn new(model: &str) -> Self { Self { model: model.to_string(), markers: Vec::new(), predicates: Vec::new() } }

    #[allow(unused)]
    pub fn with_markers(mut self, markers: &[&str]) -> Self {
        self.markers = markers.iter().map(|m| Literal::String(m.to_string())).collect();
        self
    }
}

impl FilterQuery for MemoryQuery {
    fn model(&self) -> &str { &self.model }

    fn push(&mut self, predicate: Predicate) { self.predicates.push(predicate); }

    fn predicates(&self) -> &[Predicate] { &self.predicates }

    fn distinct_values(&self, _model: &ModelDescriptor, _column: &str) -> Result<Vec<Literal>, StorageError> { Ok(self.markers.clone()) }
}
