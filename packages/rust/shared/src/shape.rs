//! Response-shape strategies for JSON payloads with loose schemas.
//!
//! External services do not always agree on where the interesting part of a
//! response lives. Callers describe the possible locations as an ordered list
//! of [`Strategy`] values; [`resolve`] tries them in order and reports which
//! one matched, so the fallback chain can be tested against fixture payloads
//! without any network involved.

use serde_json::Value;

/// One named way of pulling a `T` out of a response body.
pub struct Strategy<T> {
    name: &'static str,
    extract: fn(&Value) -> Option<T>,
}

impl<T> Strategy<T> {
    pub const fn new(name: &'static str, extract: fn(&Value) -> Option<T>) -> Self {
        Self { name, extract }
    }

    /// Strategy name for tracing.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply this strategy alone. `None` means it declined.
    pub fn apply(&self, body: &Value) -> Option<T> {
        (self.extract)(body)
    }
}

/// Value produced by the first strategy that did not decline.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub strategy: &'static str,
    pub value: T,
}

/// Try `strategies` in priority order and return the first match.
pub fn resolve<T>(body: &Value, strategies: &[Strategy<T>]) -> Option<Resolved<T>> {
    strategies.iter().find_map(|strategy| {
        strategy.apply(body).map(|value| Resolved {
            strategy: strategy.name(),
            value,
        })
    })
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Value under `key` when `body` is an object and the value is truthy.
pub fn truthy_key<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| is_truthy(v))
}

/// Truthy scalar rendered as a string (strings verbatim, others as JSON).
pub fn truthy_string(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}
