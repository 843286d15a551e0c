//! Stepform Render
//!
//! Bound, two-way field widgets for every field kind.
//!
//! # Overview
//!
//! - **FieldRendererRegistry**: exhaustive kind → widget dispatch
//! - **FieldHandle**: a binding scoped to one path; widgets cannot reach other fields
//! - **RemoteSearch**: debounced combobox search guarded by a generation counter
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stepform_render::{FieldBinding, FieldRendererRegistry, LocalBinding, Widget};
//! use stepform_schema::{ChipProps, FieldDescriptor, FieldKind, FormValueTree};
//!
//! let tags = FieldDescriptor::parse("tags", FieldKind::Chip(ChipProps::default()), "Tags").unwrap();
//! let binding = LocalBinding::new(FormValueTree::new().with("tags", Vec::<String>::new()).unwrap());
//!
//! let mut field = FieldRendererRegistry::default()
//!     .render(&tags, binding.clone() as Arc<dyn FieldBinding>)
//!     .unwrap();
//! if let Widget::Chip(chips) = field.widget_mut() {
//!     chips.input("a,a,b").unwrap();
//! }
//! field.blur().unwrap();
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod error;
pub mod registry;
pub mod search;
pub mod view;
pub mod widgets;

// Re-exports
pub use binding::{FieldBinding, FieldHandle, LocalBinding};
pub use error::{RenderError, RenderResult, SearchError};
pub use registry::{FieldRendererRegistry, RenderConfig};
pub use search::{RemoteSearch, SearchProvider, SearchSnapshot, DEFAULT_DEBOUNCE};
pub use view::{InputType, OptionView, RenderedField, WidgetView};
pub use widgets::{
    CheckboxInput, ChipInput, Combobox, DatePicker, FieldWidget, FileList, Key, NumberInput, RadioGroup,
    SelectInput, TextArea, TextInput, Widget,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for rendering fields
    pub use crate::{
        FieldBinding, FieldHandle, FieldRendererRegistry, FieldWidget, RenderConfig, RenderError,
        RenderedField, SearchProvider, Widget, WidgetView,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
