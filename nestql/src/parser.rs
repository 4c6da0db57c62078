//! Turns bracket-notation query strings into [`FilterRequest`]s.
//!
//! `filters[author][name][$eq]=Ada&filters[tags][$in][]=rust&filters[tags][$in][]=sql` becomes
//! `{"author": {"name": {"$eq": "Ada"}}, "tags": {"$in": ["rust", "sql"]}}`. All values stay strings.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use pest::Parser;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::grammar::{QueryStringParser, Rule};
use crate::value::FilterRequest;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    Append,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Segment::Append;
        }
        match raw.parse::<usize>() {
            Ok(index) if raw.bytes().all(|b| b.is_ascii_digit()) => Segment::Index(index),
            _ => Segment::Key(raw.to_string()),
        }
    }
}

/// Keys nested deeper than this are rejected by [`parse_query_string`].
pub const DEFAULT_MAX_SEGMENTS: usize = 64;

/// Collect every parameter nested under `root_key` into a filter request.
pub fn parse_query_string(input: &str, root_key: &str) -> Result<FilterRequest, ParseError> { parse_query_string_with_limit(input, root_key, DEFAULT_MAX_SEGMENTS) }

/// Like [`parse_query_string`], rejecting keys with more than `max_segments` bracket segments.
pub fn parse_query_string_with_limit(input: &str, root_key: &str, max_segments: usize) -> Result<FilterRequest, ParseError> {
    let input = input.strip_prefix('?').unwrap_or(input);
    let mut root = Value::Object(Map::new());

    for pair in QueryStringParser::parse(Rule::QueryString, input)? {
        match pair.as_rule() {
            Rule::Pair => {}
            Rule::EOI => continue,
            other => return Err(ParseError::UnexpectedRule { expected: "Pair", got: other }),
        }
        let mut inner = pair.into_inner();
        let raw_key = inner.next().map(|p| p.as_str()).unwrap_or_default();
        let raw_value = inner.next().map(|p| p.as_str()).unwrap_or_default();

        let key = decode(raw_key)?;
        let (name, path) = parse_key(&key)?;
        if name != root_key || path.is_empty() {
            continue;
        }
        if path.len() > max_segments {
            return Err(ParseError::TooDeep { key, limit: max_segments });
        }
        insert(&mut root, &path, Value::String(decode(raw_value)?), &key)?;
    }

    match root {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::Conflict(root_key.to_string())),
    }
}

fn decode(raw: &str) -> Result<String, ParseError> {
    let raw: Cow<'_, str> = if raw.contains('+') { Cow::Owned(raw.replace('+', " ")) } else { Cow::Borrowed(raw) };
    let decoded = percent_decode_str(&raw).decode_utf8().map_err(|_| ParseError::InvalidEncoding(raw.to_string()))?;
    Ok(decoded.into_owned())
}

fn parse_key(key: &str) -> Result<(String, Vec<Segment>), ParseError> {
    let mut name = None;
    let mut path = Vec::new();
    for pair in QueryStringParser::parse(Rule::KeyPath, key)? {
        match pair.as_rule() {
            Rule::Name => name = Some(pair.as_str().to_string()),
            Rule::Index => path.push(Segment::parse(pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default())),
            Rule::EOI => {}
            other => return Err(ParseError::UnexpectedRule { expected: "Name or Index", got: other }),
        }
    }
    let name = name.ok_or(ParseError::UnexpectedRule { expected: "Name", got: Rule::EOI })?;
    Ok((name, path))
}

fn insert(root: &mut Value, path: &[Segment], value: Value, key: &str) -> Result<(), ParseError> {
    let mut slot = root;
    for segment in path {
        if slot.is_null() {
            *slot = match segment {
                Segment::Key(_) => Value::Object(Map::new()),
                Segment::Index(_) | Segment::Append => Value::Array(Vec::new()),
            };
        }
        // Named keys and sparse indices turn a list into a map keyed by position.
        let sparse = match (&*slot, segment) {
            (Value::Array(_), Segment::Key(_)) => true,
            (Value::Array(items), Segment::Index(index)) => *index > items.len(),
            _ => false,
        };
        if sparse {
            if let Value::Array(items) = slot.take() {
                *slot = Value::Object(items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect());
            }
        }

        slot = match (slot, segment) {
            (Value::Object(map), Segment::Key(k)) => map.entry(k.clone()).or_insert(Value::Null),
            (Value::Object(map), Segment::Index(index)) => map.entry(index.to_string()).or_insert(Value::Null),
            (Value::Object(map), Segment::Append) => {
                let next = map.keys().filter_map(|k| k.parse::<usize>().ok()).max().map_or(0, |last| last + 1);
                map.entry(next.to_string()).or_insert(Value::Null)
            }
            (Value::Array(items), Segment::Append) => {
                items.push(Value::Null);
                let last = items.len() - 1;
                &mut items[last]
            }
            (Value::Array(items), Segment::Index(index)) => {
                if *index == items.len() {
                    items.push(Value::Null);
                }
                &mut items[*index]
            }
            _ => return Err(ParseError::Conflict(key.to_string())),
        };
    }
    assign(slot, value, key)
}

fn assign(slot: &mut Value, value: Value, key: &str) -> Result<(), ParseError> {
    match slot {
        Value::Null => *slot = value,
        Value::String(_) => {
            let previous = slot.take();
            *slot = Value::Array(vec![previous, value]);
        }
        Value::Array(items) if items.iter().all(Value::is_string) => items.push(value),
        _ => return Err(ParseError::Conflict(key.to_string())),
    }
    Ok(())
}
