//! Reading operands and nested entries out of a FilterRequest.

use serde_json::Value;

use crate::ast::Literal;
use crate::error::ValidationError;
use crate::operator::invalid_operand;

/// A caller-supplied filter: field or operator -> scalar, list, or nested request.
pub type FilterRequest = serde_json::Map<String, Value>;

pub fn literal(value: &Value) -> Option<Literal> {
    Some(match value {
        Value::Null => Literal::Null,
        Value::Bool(b) => Literal::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Literal::I64(i),
            None => Literal::F64(n.as_f64()?),
        },
        Value::String(s) => Literal::String(s.clone()),
        Value::Array(_) | Value::Object(_) => return None,
    })
}

/// Flatten the value given to an operator into its list of operands. Maps are read by value, so
/// `{"0": "a", "1": "b"}` and `["a", "b"]` are equivalent.
pub fn operands(operator: &str, value: &Value) -> Result<Vec<Literal>, ValidationError> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        scalar => vec![scalar],
    };
    items.into_iter().map(|item| literal(item).ok_or_else(|| invalid_operand(operator, "nested values are not allowed here"))).collect()
}

/// The `(field, value)` pairs nested under a field. Lists contribute the entries of each of their
/// maps. `None` if a scalar is found where a nested request was expected.
pub fn entries(value: &Value) -> Option<Vec<(&str, &Value)>> {
    let mut all = Vec::new();
    let mut pending = vec![value];
    while let Some(next) = pending.pop() {
        match next {
            Value::Object(map) => all.extend(map.iter().map(|(k, v)| (k.as_str(), v))),
            Value::Array(items) => pending.extend(items.iter().rev()),
            _ => return None,
        }
    }
    Some(all)
}

/// The branches of a `$or` / `$and` group.
pub fn branches(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => Some(map.values().collect()),
        _ => None,
    }
}
