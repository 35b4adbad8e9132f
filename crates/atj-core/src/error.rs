//! Unified error types for the ATJ workspace
//!
//! Model construction is all-or-nothing: every problem with the supplied
//! tables is reported through [`AtjError`] before a single constraint is
//! written. Solver outcomes (infeasible, unbounded, ...) are *not* errors and
//! never travel through this type.
//!
//! # Example
//!
//! ```
//! use atj_core::{AtjError, AtjResult};
//!
//! fn lookup_rate(code: &str) -> AtjResult<f64> {
//!     Err(AtjError::missing("conversions", code))
//! }
//!
//! let err = lookup_rate("jui_to_et").unwrap_err();
//! assert!(err.to_string().contains("jui_to_et"));
//! ```

use thiserror::Error;

/// Unified error type for all ATJ operations.
#[derive(Error, Debug)]
pub enum AtjError {
    /// I/O errors (case files, output directories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A table has no row for a key the model needs
    #[error("Configuration error: no entry for `{key}` in {table}")]
    MissingEntry { table: String, key: String },

    /// A table references an entity that is not part of the entity set
    #[error("Configuration error: {table} references unknown entity `{entity}`")]
    UnknownEntity { table: String, entity: String },

    /// The same entity name appears twice where names must be unique
    #[error("Configuration error: duplicate entity `{entity}` in {table}")]
    DuplicateEntity { table: String, entity: String },

    /// Any other inconsistency between input tables
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value is present but physically meaningless (negative, NaN, ...)
    #[error("Validation error: `{key}` {message}")]
    InvalidValue { key: String, message: String },

    /// Internal consistency checks on the formulation itself
    #[error("Formulation error: {0}")]
    Formulation(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl AtjError {
    pub fn missing(table: impl Into<String>, key: impl Into<String>) -> Self {
        AtjError::MissingEntry {
            table: table.into(),
            key: key.into(),
        }
    }

    pub fn unknown_entity(table: impl Into<String>, entity: impl Into<String>) -> Self {
        AtjError::UnknownEntity {
            table: table.into(),
            entity: entity.into(),
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        AtjError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the input tables rather than the formulation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AtjError::MissingEntry { .. }
                | AtjError::UnknownEntity { .. }
                | AtjError::DuplicateEntity { .. }
                | AtjError::Config(_)
        )
    }
}

/// Convenience type alias for Results using AtjError.
pub type AtjResult<T> = Result<T, AtjError>;

impl From<anyhow::Error> for AtjError {
    fn from(err: anyhow::Error) -> Self {
        AtjError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for AtjError {
    fn from(err: serde_json::Error) -> Self {
        AtjError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for AtjError {
    fn from(err: serde_yaml::Error) -> Self {
        AtjError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_names_table_and_key() {
        let err = AtjError::missing("distances.mill_mill", "Usina A -> Usina B");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("distances.mill_mill"));
        assert!(msg.contains("Usina A -> Usina B"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_value_is_not_configuration() {
        let err = AtjError::invalid("mills.Usina A.capacity", "must be non-negative, got -3");
        assert!(err.to_string().starts_with("Validation error"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AtjError = io_err.into();
        assert!(matches!(err, AtjError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> AtjResult<()> {
            Err(AtjError::Formulation("breakpoints must be at least 2".into()))
        }

        fn outer() -> AtjResult<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert!(err.to_string().contains("breakpoints"));
    }
}
