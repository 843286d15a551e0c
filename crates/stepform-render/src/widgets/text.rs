//! String inputs: text, email, password, textarea

use crate::binding::FieldHandle;
use crate::error::RenderResult;
use crate::view::{InputType, WidgetView};
use stepform_schema::FieldValue;

/// Single-line input
///
/// Email format is checked by the schema, not here. The password visibility
/// toggle is widget-local and never part of the form value.
#[derive(Debug, Clone)]
pub struct TextInput {
    handle: FieldHandle,
    input_type: InputType,
    revealed: bool,
}

impl TextInput {
    pub(crate) fn new(handle: FieldHandle, input_type: InputType) -> Self {
        Self {
            handle,
            input_type,
            revealed: false,
        }
    }

    /// Replace the text
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn input(&mut self, text: impl Into<String>) -> RenderResult<()> {
        self.handle.set(FieldValue::Text(text.into()))
    }

    /// Flip password visibility; no-op for other input types
    pub fn toggle_visibility(&mut self) {
        if self.input_type == InputType::Password {
            self.revealed = !self.revealed;
        }
    }

    /// Whether characters are currently hidden
    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.input_type == InputType::Password && !self.revealed
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::TextLine {
            value: self.handle.value().as_text().unwrap_or_default().to_string(),
            input_type: self.input_type,
            masked: self.is_masked(),
        }
    }
}

/// Multi-line input
#[derive(Debug, Clone)]
pub struct TextArea {
    handle: FieldHandle,
    rows: u16,
}

impl TextArea {
    pub(crate) fn new(handle: FieldHandle, rows: u16) -> Self {
        Self { handle, rows }
    }

    /// Replace the text
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn input(&mut self, text: impl Into<String>) -> RenderResult<()> {
        self.handle.set(FieldValue::Text(text.into()))
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::TextArea {
            value: self.handle.value().as_text().unwrap_or_default().to_string(),
            rows: self.rows,
        }
    }
}
