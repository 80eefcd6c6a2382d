/// Core error types for Encore
use thiserror::Error;

/// Every human-readable problem found while validating a request body.
///
/// Displays as the messages joined with `", "`, which is the text clients
/// see in the `error` field of a 400 response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    /// Create an empty error list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more problem
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Append the problems from another list
    pub fn extend(&mut self, other: impl IntoIterator<Item = String>) {
        self.0.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ValidationErrors {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

impl From<&str> for ValidationErrors {
    fn from(message: &str) -> Self {
        Self(vec![message.to_string()])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("Title is required");
        errors.push("Genre is required");

        assert_eq!(errors.to_string(), "Title is required, Genre is required");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn extend_keeps_order() {
        let mut errors = ValidationErrors::from("Valid track number is required");
        errors.extend(vec!["Album not found".to_string()]);

        assert_eq!(
            errors.messages(),
            &["Valid track number is required", "Album not found"]
        );
    }
}
