//! Stepform Schema
//!
//! Field descriptors, typed form values and validation schema synthesis.
//!
//! # Overview
//!
//! - **FieldDescriptor**: declarative spec of one field, one closed [`FieldKind`] per variant
//! - **FormValueTree**: leaf values keyed by [`FieldPath`]
//! - **SchemaSynthesizer**: derives a [`ValidationSchema`] from defaults and descriptors
//!
//! # Example
//!
//! ```rust
//! use stepform_schema::{FieldDescriptor, FieldKind, FormValueTree, SchemaSynthesizer};
//!
//! let descriptors = vec![
//!     FieldDescriptor::parse("title", FieldKind::text(), "Title").unwrap().required(),
//! ];
//! let defaults = FormValueTree::new().with("title", "").unwrap();
//!
//! let schema = SchemaSynthesizer::new().synthesize(&defaults, &descriptors).unwrap();
//! let errors = schema.validate(&defaults).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod path;
pub mod rules;
pub mod synthesize;
pub mod value;

// Re-exports
pub use descriptor::{
    ChipProps, ComboboxProps, DateProps, DescriptorError, FieldDescriptor, FieldKind, FieldOption,
    FileProps, NumberProps, Orientation, RadioProps, SearchMode, SelectProps, Splitter, TextProps,
    TextareaProps,
};
pub use path::{FieldPath, PathError};
pub use rules::{Check, CustomCheckFn, ErrorCode, FieldError, FieldErrors, FieldRule, ValidationSchema};
pub use synthesize::{default_date_floor, extension_of, SchemaError, SchemaSynthesizer};
pub use value::{FieldValue, FileValue, FormValueTree, ValueError, ValueShape, DATE_FORMAT};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and validating forms
    pub use crate::{
        Check, FieldDescriptor, FieldErrors, FieldKind, FieldOption, FieldPath, FieldValue,
        FormValueTree, SchemaSynthesizer, ValidationSchema,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
