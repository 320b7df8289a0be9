//! Error types for the lane-flow simulation

use thiserror::Error;

/// Errors raised by the simulation core.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// A configuration parameter is out of range. Nothing is clamped.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfiguration {
        /// Name of the offending parameter
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A world invariant no longer holds after an update.
    /// Indicates a defect in the update engine, not bad input.
    #[error("consistency violation: {reason}")]
    ConsistencyViolation { reason: String },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        SimError::ConsistencyViolation {
            reason: reason.into(),
        }
    }

    /// Name of the rejected parameter, if this is a configuration error
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SimError::InvalidConfiguration { field, .. } => Some(field),
            SimError::ConsistencyViolation { .. } => None,
        }
    }
}
