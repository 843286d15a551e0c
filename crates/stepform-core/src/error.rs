//! Error types for the form engine
//!
//! Provides error handling for:
//! - Engine construction (step plan, schema, defaults)
//! - Step navigation gates
//! - Submission
//! - Wizard definition loading

use stepform_render::RenderError;
use stepform_schema::{DescriptorError, FieldErrors, SchemaError, ValueError};

/// Engine construction and mutation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    /// A form needs at least one step
    #[error("form has no steps")]
    NoSteps,

    /// A field is assigned to two steps
    #[error("field '{path}' assigned to step {first} and step {second}")]
    DuplicateField {
        path: String,
        first: usize,
        second: usize,
    },

    /// Schema synthesis failed
    #[error("schema synthesis failed: {0}")]
    Schema(#[from] SchemaError),

    /// Supplied schema does not cover exactly the descriptor set
    #[error("schema override does not match fields (missing: {missing:?}, extra: {extra:?})")]
    SchemaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// Value rejected by the tree
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Uploads applied to a field that is not a file field
    #[error("field '{0}' is not a file field")]
    NotAFileField(String),

    /// Widget construction failed
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

impl FormError {
    /// Whether the error comes from building the engine rather than using it
    #[inline]
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::NoSteps | Self::DuplicateField { .. } | Self::Schema(_) | Self::SchemaMismatch { .. }
        )
    }
}

/// Why `next` or `go_to_step` did not move
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepGateError {
    /// Current step has failing fields
    #[error("step {step} has {} invalid field(s): {errors}", errors.len())]
    Invalid { step: usize, errors: FieldErrors },

    /// A submission is in flight
    #[error("submission in progress")]
    Submitting,

    /// Jumping forward skips validation and is not allowed
    #[error("cannot jump forward from step {current} to step {target}")]
    Forward { current: usize, target: usize },

    /// Target step does not exist
    #[error("step {target} out of range (form has {count} steps)")]
    OutOfRange { target: usize, count: usize },
}

impl StepGateError {
    /// Field errors carried by an `Invalid` gate
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

/// Submission failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// Submit is only reachable at the last step
    #[error("submit is only available at the last step (current {current}, last {last})")]
    NotAtFinalStep { current: usize, last: usize },

    /// Another submission has not settled yet
    #[error("submission already in progress")]
    InFlight,

    /// Full-form validation failed; the handler was not called
    #[error("form has {n} invalid field(s): {0}", n = .0.len())]
    Invalid(FieldErrors),

    /// Server refused the data
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// Transport failed before an answer arrived
    #[error("transport error: {0}")]
    Transport(String),
}

impl SubmitError {
    /// Whether the user may reasonably try again unchanged
    ///
    /// The engine never retries on its own.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InFlight)
    }

    /// Whether the submit handler was invoked and failed
    #[inline]
    #[must_use]
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Transport(_))
    }
}

/// Wizard definition and telemetry setup errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not toml, yaml, yml or json
    #[error("unsupported definition format {0:?} (expected toml, yaml, yml or json)")]
    UnsupportedFormat(String),

    /// Document does not parse
    #[error("invalid {format} definition: {reason}")]
    Parse { format: &'static str, reason: String },

    /// Field definition is inconsistent
    #[error("invalid field: {0}")]
    Field(#[from] DescriptorError),

    /// Default value does not fit its field
    #[error("invalid default: {0}")]
    Value(#[from] ValueError),

    /// Subscriber could not be installed
    #[error("tracing setup failed: {0}")]
    Telemetry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_classified() {
        assert!(FormError::NoSteps.is_construction_error());
        assert!(FormError::SchemaMismatch {
            missing: vec!["title".into()],
            extra: vec![]
        }
        .is_construction_error());
        assert!(!FormError::NotAFileField("title".into()).is_construction_error());
    }

    #[test]
    fn submit_error_retryable() {
        assert!(SubmitError::Transport("timeout".into()).is_retryable());
        assert!(!SubmitError::Rejected("duplicate dataset".into()).is_retryable());
        assert!(!SubmitError::Invalid(FieldErrors::new()).is_retryable());
        assert!(SubmitError::Rejected("x".into()).is_handler_failure());
        assert!(!SubmitError::InFlight.is_handler_failure());
    }
}
