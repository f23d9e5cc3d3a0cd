//! Compilation errors.
//!
//! Advisory notes never end up here; they are plain [`Diagnostic`]s carried
//! by the plans. Everything in this module halts compilation.

use std::fmt;

use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Compiler result type
pub type Result<T> = std::result::Result<T, CompileError>;

/// Structured compilation failures
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("data model violation on '{name}': {reason}")]
    DataModelViolation { name: String, reason: String },

    #[error("{0}")]
    UnresolvedReference(UnresolvedReport),

    #[error("configuration violation in {record}: {reason}")]
    ConfigurationViolation { record: &'static str, reason: String },
}

impl CompileError {
    pub(crate) fn data_model(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::DataModelViolation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(record: &'static str, reason: impl Into<String>) -> Self {
        CompileError::ConfigurationViolation {
            record,
            reason: reason.into(),
        }
    }
}

/// Every unresolved reference found in one validation walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnresolvedReport {
    pub issues: Vec<Diagnostic>,
}

impl UnresolvedReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Names of the unresolved symbols, in discovery order.
    pub fn symbols(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|d| d.symbol.as_deref())
            .collect()
    }
}

impl fmt::Display for UnresolvedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unresolved reference(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue.message)?;
        }
        Ok(())
    }
}

/// Reject zero in a configuration record field.
pub(crate) fn require_positive(record: &'static str, field: &str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(CompileError::config(
            record,
            format!("{} must be positive", field),
        ));
    }
    Ok(value)
}

/// Reject a blank name in a configuration record field.
pub(crate) fn require_name(record: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CompileError::config(
            record,
            format!("{} must not be blank", field),
        ));
    }
    Ok(())
}
