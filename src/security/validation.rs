//! Per-field validation results.
//!
//! The `validate` entry point reports every problem it finds rather than
//! stopping at the first one, so callers can fix a configuration in one pass.

use serde::{Deserialize, Serialize};

/// A problem with a single configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Configuration key the error applies to
    pub field: String,

    /// Human-readable description
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of validating a configuration map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the configuration passed every check
    pub valid: bool,

    /// Errors found, in the order the checks ran
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ValidateResponse {
    /// A passing result.
    pub fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    /// Check if a specific field failed.
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<FieldError>,
}

impl ValidationBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Record the error of a failed check, if any.
    pub fn check<E: std::fmt::Display>(&mut self, field: &str, result: Result<(), E>) {
        if let Err(e) = result {
            self.add_error(field, e.to_string());
        }
    }

    /// Whether any error has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Finish and produce the response.
    pub fn build(self) -> ValidateResponse {
        ValidateResponse { valid: self.errors.is_empty(), errors: self.errors }
    }
}
