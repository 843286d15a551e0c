//! Stepform Core
//!
//! The step-gated form engine:
//! - Partitions field descriptors into ordered steps
//! - Gates forward navigation on the current step's validation
//! - Runs full validation before handing the value tree to a submit handler
//! - Guards against double submission and keeps data when submission fails
//! - Loads wizard definitions from TOML, YAML or JSON
//!
//! # Example
//!
//! ```rust
//! use stepform_core::{submit_fn, FormEngine, Step};
//! use stepform_schema::{FieldDescriptor, FieldKind, FieldPath, FormValueTree};
//!
//! # tokio_test::block_on(async {
//! let title = FieldDescriptor::parse("title", FieldKind::text(), "Title")?.required();
//! let steps = vec![Step::new("Basics").with_field(title), Step::new("Review")];
//! let defaults = FormValueTree::new().with("title", "")?;
//! let engine = FormEngine::builder(steps, defaults, submit_fn(|_data| async { Ok(()) })).build()?;
//!
//! assert!(engine.next().is_err());
//! engine.set_value(&FieldPath::parse("title")?, "Rainfall")?;
//! assert_eq!(engine.next(), Ok(1));
//! engine.submit().await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod step;
pub mod submit;
pub mod telemetry;

// Re-exports
pub use config::{EngineConfig, ValidationMode, DEFAULT_SUBMISSION_ERROR};
pub use definition::{DefinitionFormat, FieldDefinition, StepDefinition, Wizard, WizardDefinition};
pub use engine::{FormEngine, FormEngineBuilder};
pub use error::{ConfigError, FormError, StepGateError, SubmitError};
pub use step::{Step, StepController, StepPlan};
pub use submit::{submit_fn, FnSubmitHandler, SubmitHandler};
pub use telemetry::{init_tracing, LogFormat};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building forms
    pub use crate::{
        EngineConfig, FormEngine, FormError, Step, StepGateError, SubmitError, SubmitHandler, ValidationMode,
        WizardDefinition,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
