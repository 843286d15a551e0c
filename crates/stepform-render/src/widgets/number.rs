//! Number input with input-side bounds

use crate::binding::FieldHandle;
use crate::error::{RenderError, RenderResult};
use crate::view::WidgetView;
use stepform_schema::{FieldValue, NumberProps};

/// Numeric input
///
/// Bounds are enforced here by clamping as well as by the schema.
#[derive(Debug, Clone)]
pub struct NumberInput {
    handle: FieldHandle,
    props: NumberProps,
}

impl NumberInput {
    pub(crate) fn new(handle: FieldHandle, props: NumberProps) -> Self {
        Self { handle, props }
    }

    /// Parse typed text; blank clears the value
    ///
    /// # Errors
    /// Returns `InvalidNumber` for unparsable text
    pub fn input(&mut self, text: &str) -> RenderResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return self.handle.set(FieldValue::Null);
        }
        let n: f64 = text.parse().map_err(|_| RenderError::InvalidNumber {
            path: self.handle.path().to_string(),
            input: text.to_string(),
        })?;
        self.set(n)
    }

    /// Set a number, clamped to the bounds
    ///
    /// # Errors
    /// Returns `InvalidNumber` for NaN
    pub fn set(&mut self, n: f64) -> RenderResult<()> {
        if n.is_nan() {
            return Err(RenderError::InvalidNumber {
                path: self.handle.path().to_string(),
                input: "NaN".to_string(),
            });
        }
        self.handle.set(FieldValue::Number(self.clamp(n)))
    }

    /// Increase by one step, starting from the lower bound (or zero)
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn step_up(&mut self) -> RenderResult<()> {
        let current = self.current();
        self.set(current + self.step())
    }

    /// Decrease by one step
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn step_down(&mut self) -> RenderResult<()> {
        let current = self.current();
        self.set(current - self.step())
    }

    fn current(&self) -> f64 {
        self.handle
            .value()
            .as_number()
            .unwrap_or_else(|| self.props.min.unwrap_or(0.0))
    }

    fn step(&self) -> f64 {
        self.props.step.filter(|s| *s > 0.0).unwrap_or(1.0)
    }

    fn clamp(&self, n: f64) -> f64 {
        let n = self.props.min.map_or(n, |min| n.max(min));
        self.props.max.map_or(n, |max| n.min(max))
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Number {
            value: self.handle.value().as_number(),
            min: self.props.min,
            max: self.props.max,
            step: self.step(),
        }
    }
}
