//! Field validation for untyped JSON request bodies
//!
//! Request bodies arrive as `serde_json::Value` so that a single pass can
//! report every problem at once (a typed deserializer stops at the first).
//! Each accessor returns `Some` only for a valid value and records a message
//! otherwise; `finish` turns the collected state into a `Result`.

use crate::error::ValidationErrors;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;

/// Collects validation problems while reading fields from a JSON object
pub struct FieldValidator<'a> {
    body: Option<&'a Map<String, Value>>,
    errors: ValidationErrors,
}

impl<'a> FieldValidator<'a> {
    pub fn new(body: &'a Value) -> Self {
        let mut errors = ValidationErrors::new();
        let body = body.as_object();
        if body.is_none() {
            errors.push("Request body must be a JSON object");
        }
        Self { body, errors }
    }

    /// Raw field access; JSON `null` counts as absent
    pub fn field(&self, name: &str) -> Option<&'a Value> {
        self.body
            .and_then(|body| body.get(name))
            .filter(|value| !value.is_null())
    }

    /// A required, non-blank string, returned trimmed
    pub fn required_text(&mut self, name: &str, message: &str) -> Option<String> {
        match self.field(name).and_then(Value::as_str).map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.to_string()),
            _ => {
                self.errors.push(message);
                None
            }
        }
    }

    /// A required integer greater than zero
    pub fn positive_integer(&mut self, name: &str, message: &str) -> Option<i64> {
        match self.field(name).and_then(Value::as_i64) {
            Some(value) if value > 0 => Some(value),
            _ => {
                self.errors.push(message);
                None
            }
        }
    }

    /// A required finite number greater than zero; fractions are allowed
    pub fn positive_number(&mut self, name: &str, message: &str) -> Option<f64> {
        match self.field(name).and_then(Value::as_f64) {
            Some(value) if value.is_finite() && value > 0.0 => Some(value),
            _ => {
                self.errors.push(message);
                None
            }
        }
    }

    /// A required integer inside `range`, with distinct messages for a
    /// missing field and an out-of-range or non-integer one
    pub fn integer_in(
        &mut self,
        name: &str,
        range: RangeInclusive<i64>,
        missing: &str,
        invalid: &str,
    ) -> Option<i64> {
        let Some(value) = self.field(name) else {
            self.errors.push(missing);
            return None;
        };
        match value.as_i64() {
            Some(number) if range.contains(&number) => Some(number),
            _ => {
                self.errors.push(invalid);
                None
            }
        }
    }

    /// Record a problem found by custom checks
    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation. `build` runs only when no problem was recorded and
    /// assembles the payload from the values returned by the accessors.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or_else(|| ValidationErrors::from("Invalid request body"))
    }
}
