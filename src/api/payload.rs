use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional-field accessor over a raw API response.
///
/// Steam responses omit fields freely; a missing optional field is never an
/// error here. `get`/`has` take dotted paths (`"game.availableGameStats"`)
/// and traverse nested objects without raising on absent segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload(Value);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Resolve a dotted path against nested objects. `None` as soon as any
    /// segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Integer at `path`. Steam sometimes serializes numbers as strings
    /// ("required_age": "18"), so a parseable string counts.
    pub fn u64_at(&self, path: &str) -> Option<u64> {
        let value = self.get(path)?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }

    pub fn f64_at(&self, path: &str) -> Option<f64> {
        let value = self.get(path)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// The object or value at `path` as its own payload.
    pub fn child(&self, path: &str) -> Option<Payload> {
        self.get(path).cloned().map(Payload)
    }

    /// Elements of the array at `path`; empty when the path or array is
    /// absent. Use [`Payload::array_opt`] when absence must stay visible.
    pub fn array_at(&self, path: &str) -> Vec<Payload> {
        self.array_opt(path).unwrap_or_default()
    }

    pub fn array_opt(&self, path: &str) -> Option<Vec<Payload>> {
        let items = self.get(path)?.as_array()?;
        Some(items.iter().cloned().map(Payload).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
