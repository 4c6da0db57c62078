//! Conversions between nestql literals and SQLite values

use nestql::Literal;
use rusqlite::types::Value;

/// Bind value for a literal. Booleans are stored as integers.
pub fn to_sql(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::Text(s.clone()),
        Literal::I64(i) => Value::Integer(*i),
        Literal::F64(f) => Value::Real(*f),
        Literal::Bool(b) => Value::Integer(if *b { 1 } else { 0 }),
        Literal::Null => Value::Null,
    }
}

/// Literal for a value read back from SQLite. Blobs are read as lossy UTF-8 text.
pub fn from_sql(value: Value) -> Literal {
    match value {
        Value::Null => Literal::Null,
        Value::Integer(i) => Literal::I64(i),
        Value::Real(f) => Literal::F64(f),
        Value::Text(s) => Literal::String(s),
        Value::Blob(b) => Literal::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_is_stored_as_integer() {
        assert_eq!(to_sql(&Literal::Bool(true)), Value::Integer(1));
        assert_eq!(to_sql(&Literal::Bool(false)), Value::Integer(0));
    }

    #[test]
    fn test_blob_reads_as_text() {
        assert_eq!(from_sql(Value::Blob(b"post".to_vec())), Literal::String("post".into()));
        assert_eq!(from_sql(Value::Null), Literal::Null);
    }
}
