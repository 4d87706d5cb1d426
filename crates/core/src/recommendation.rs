//! Recommendation payload returned by the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque recommendation returned by `POST /api/recommend`.
///
/// The payload is passed through unchanged to whatever renders it. The
/// accessors below only peek at well-known top-level fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RecommendationResult(pub Value);

impl RecommendationResult {
    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Soft warning, e.g. when too few assets survived filtering.
    pub fn warning(&self) -> Option<&str> {
        self.0.get("warning").and_then(Value::as_str)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn risk_profile(&self) -> Option<&Value> {
        self.0.get("risk_profile")
    }
}

impl From<Value> for RecommendationResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
