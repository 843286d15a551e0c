//! Widget view models
//!
//! A rendered field is plain data: whatever front end draws it (terminal, web
//! bridge, snapshot test) reads a [`RenderedField`] and feeds events back into
//! the widget.

use chrono::NaiveDate;
use serde::Serialize;
use stepform_schema::{FieldOption, FieldPath, FileValue, Orientation};

/// Flavor of a single-line input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Plain text
    Text,
    /// Email address
    Email,
    /// Secret, masked unless revealed
    Password,
}

/// One option as presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// Stored value
    pub value: String,
    /// Display label
    pub label: String,
    /// Currently part of the field value
    pub selected: bool,
}

impl OptionView {
    pub(crate) fn from_option(option: &FieldOption, selected: bool) -> Self {
        Self {
            value: option.value.clone(),
            label: option.label.clone(),
            selected,
        }
    }
}

/// Kind-specific view state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetView {
    /// Single-line input
    TextLine {
        /// Current text
        value: String,
        /// Input flavor
        input_type: InputType,
        /// Characters hidden
        masked: bool,
    },
    /// Number input
    Number {
        /// Current number
        value: Option<f64>,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
        /// Step for increment controls
        step: f64,
    },
    /// Multi-line input
    TextArea {
        /// Current text
        value: String,
        /// Visible rows
        rows: u16,
    },
    /// Native single select
    Select {
        /// Options with selection state
        options: Vec<OptionView>,
    },
    /// Boolean flag
    Checkbox {
        /// Checked state
        checked: bool,
    },
    /// Radio group
    Radio {
        /// Options with selection state
        options: Vec<OptionView>,
        /// Layout
        orientation: Orientation,
    },
    /// Date picker
    Date {
        /// Selected date
        value: Option<NaiveDate>,
        /// First enabled date
        min: NaiveDate,
        /// Last enabled date
        max: NaiveDate,
    },
    /// Filterable choice
    Combobox {
        /// Search text
        query: String,
        /// Options matching the query
        options: Vec<OptionView>,
        /// Selected values, in selection order
        selected: Vec<String>,
        /// List valued
        multiple: bool,
        /// Dropdown open
        open: bool,
        /// Remote search in flight
        loading: bool,
        /// Last remote search failure
        search_error: Option<String>,
    },
    /// Token list
    Chips {
        /// Committed tokens
        chips: Vec<String>,
        /// Uncommitted input text
        buffer: String,
        /// No more tokens accepted
        at_capacity: bool,
    },
    /// File drop zone
    Files {
        /// Files currently in the value
        files: Vec<FileValue>,
        /// Accepted extensions
        accept: Vec<String>,
        /// Several files allowed
        multiple: bool,
    },
}

/// A field widget plus its message slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    /// Field path
    pub path: FieldPath,
    /// Label
    pub label: String,
    /// Placeholder
    pub placeholder: Option<String>,
    /// Required marker
    pub required: bool,
    /// Kind-specific state
    pub view: WidgetView,
    /// Inline validation message
    pub message: Option<String>,
}
