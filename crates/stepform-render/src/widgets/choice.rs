//! Fixed-option widgets: single select, radio group, checkbox

use crate::binding::FieldHandle;
use crate::error::{RenderError, RenderResult};
use crate::view::{OptionView, WidgetView};
use stepform_schema::{FieldOption, FieldValue, Orientation};

fn choose_from(handle: &FieldHandle, options: &[FieldOption], value: &str) -> RenderResult<()> {
    if !options.iter().any(|o| o.value == value) {
        return Err(RenderError::UnknownOption {
            path: handle.path().to_string(),
            value: value.to_string(),
        });
    }
    handle.set(FieldValue::Text(value.to_string()))
}

fn option_views(handle: &FieldHandle, options: &[FieldOption]) -> Vec<OptionView> {
    let current = handle.value();
    options
        .iter()
        .map(|o| OptionView::from_option(o, current.as_text() == Some(o.value.as_str())))
        .collect()
}

/// Single select over a fixed option list
#[derive(Debug, Clone)]
pub struct SelectInput {
    handle: FieldHandle,
    options: Vec<FieldOption>,
}

impl SelectInput {
    pub(crate) fn new(handle: FieldHandle, options: Vec<FieldOption>) -> Self {
        Self { handle, options }
    }

    /// Select an option by value
    ///
    /// # Errors
    /// Returns `UnknownOption` if the value is not offered
    pub fn choose(&mut self, value: &str) -> RenderResult<()> {
        choose_from(&self.handle, &self.options, value)
    }

    /// Reset to no selection
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn clear(&mut self) -> RenderResult<()> {
        self.handle.set(FieldValue::Text(String::new()))
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Select {
            options: option_views(&self.handle, &self.options),
        }
    }
}

/// Mutually exclusive choice
#[derive(Debug, Clone)]
pub struct RadioGroup {
    handle: FieldHandle,
    options: Vec<FieldOption>,
    orientation: Orientation,
}

impl RadioGroup {
    pub(crate) fn new(handle: FieldHandle, options: Vec<FieldOption>, orientation: Orientation) -> Self {
        Self {
            handle,
            options,
            orientation,
        }
    }

    /// Select an option by value
    ///
    /// # Errors
    /// Returns `UnknownOption` if the value is not offered
    pub fn choose(&mut self, value: &str) -> RenderResult<()> {
        choose_from(&self.handle, &self.options, value)
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Radio {
            options: option_views(&self.handle, &self.options),
            orientation: self.orientation,
        }
    }
}

/// Boolean flag
#[derive(Debug, Clone)]
pub struct CheckboxInput {
    handle: FieldHandle,
}

impl CheckboxInput {
    pub(crate) fn new(handle: FieldHandle) -> Self {
        Self { handle }
    }

    /// Set checked state
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn set(&mut self, checked: bool) -> RenderResult<()> {
        self.handle.set(FieldValue::Bool(checked))
    }

    /// Flip checked state
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn toggle(&mut self) -> RenderResult<()> {
        let checked = self.is_checked();
        self.set(!checked)
    }

    /// Current state
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.handle.value().as_bool().unwrap_or(false)
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Checkbox {
            checked: self.is_checked(),
        }
    }
}
