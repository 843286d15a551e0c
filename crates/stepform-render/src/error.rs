//! Error types for field rendering
//!
//! Covers:
//! - Registry dispatch failures (missing search provider, shape mismatch)
//! - Widget input rejected before it reaches the value tree
//! - Remote search failures

use stepform_schema::{ValueError, ValueShape};

/// Rendering and widget interaction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// Write through the binding was rejected
    #[error("binding rejected value: {0}")]
    Binding(#[from] ValueError),

    /// Bound value does not have the shape the kind stores
    #[error("field '{path}': bound value is {actual}, widget expects {expected}")]
    ShapeMismatch {
        path: String,
        expected: ValueShape,
        actual: ValueShape,
    },

    /// Remote combobox without a registered provider
    #[error("field '{0}': remote search requires a registered provider")]
    MissingSearchProvider(String),

    /// Chosen value is not among the options on offer
    #[error("field '{path}': '{value}' is not an available option")]
    UnknownOption { path: String, value: String },

    /// Number input could not be parsed
    #[error("field '{path}': '{input}' is not a number")]
    InvalidNumber { path: String, input: String },

    /// Date is disabled in the picker
    #[error("field '{path}': {date} is outside the selectable range")]
    DateDisabled { path: String, date: chrono::NaiveDate },
}

/// Remote search failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Provider could not answer
    #[error("search failed: {0}")]
    Failed(String),

    /// Provider is temporarily unreachable
    #[error("search service unavailable")]
    Unavailable,
}

/// Result alias for widget operations
pub type RenderResult<T> = Result<T, RenderError>;
