//! Non-fatal findings collected while resolving a case.
//!
//! Hard failures (missing rows, unknown entities, negative capacities) abort
//! model construction through [`crate::AtjError`]. Anything that is merely
//! unusual, such as an airport with zero demand or a case without refineries,
//! is recorded here as a [`Warning`] so callers can log or print it next to
//! the model statistics.
//!
//! # Example
//!
//! ```
//! use atj_core::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.warn_about("demand", "zero jet fuel demand", "airport GRU");
//!
//! assert_eq!(diag.len(), 1);
//! assert!(diag.to_string().contains("GRU"));
//! ```

use std::fmt;

use serde::Serialize;

/// One unusual input that did not stop the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Grouping key: "capacity", "demand" or "topology"
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Warnings gathered for one case, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, category: &str, message: &str) {
        self.warnings.push(Warning {
            category: category.to_string(),
            message: message.to_string(),
            entity: None,
        });
    }

    pub fn warn_about(&mut self, category: &str, message: &str, entity: &str) {
        self.warnings.push(Warning {
            category: category.to_string(),
            message: message.to_string(),
            entity: Some(entity.to_string()),
        });
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Warning> {
        self.warnings.iter().filter(move |w| w.category == category)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.warnings.len() {
            0 => writeln!(f, "Diagnostics: no warnings")?,
            1 => writeln!(f, "Diagnostics: 1 warning")?,
            n => writeln!(f, "Diagnostics: {} warnings", n)?,
        }
        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }
        Ok(())
    }
}
