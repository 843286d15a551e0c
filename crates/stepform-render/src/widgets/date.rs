//! Date picker

use crate::binding::FieldHandle;
use crate::error::{RenderError, RenderResult};
use crate::view::WidgetView;
use chrono::NaiveDate;
use stepform_schema::FieldValue;

/// Calendar input over an inclusive enabled range
#[derive(Debug, Clone)]
pub struct DatePicker {
    handle: FieldHandle,
    min: NaiveDate,
    max: NaiveDate,
}

impl DatePicker {
    pub(crate) fn new(handle: FieldHandle, min: NaiveDate, max: NaiveDate) -> Self {
        Self { handle, min, max }
    }

    /// Whether the day is greyed out
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        date < self.min || date > self.max
    }

    /// Pick a day
    ///
    /// # Errors
    /// Returns `DateDisabled` for days outside the range
    pub fn pick(&mut self, date: NaiveDate) -> RenderResult<()> {
        if self.is_disabled(date) {
            return Err(RenderError::DateDisabled {
                path: self.handle.path().to_string(),
                date,
            });
        }
        self.handle.set(FieldValue::Date(date))
    }

    /// Clear the selection
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn clear(&mut self) -> RenderResult<()> {
        self.handle.set(FieldValue::Null)
    }

    /// Enabled range
    #[must_use]
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.min, self.max)
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        WidgetView::Date {
            value: self.handle.value().as_date(),
            min: self.min,
            max: self.max,
        }
    }
}
