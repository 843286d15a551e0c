//! Per-kind field widgets
//!
//! Every widget holds a [`FieldHandle`] for its own path and nothing else.

mod chip;
mod choice;
mod combobox;
mod date;
mod file;
mod number;
mod text;

pub use chip::{ChipInput, Key};
pub use choice::{CheckboxInput, RadioGroup, SelectInput};
pub use combobox::Combobox;
pub(crate) use combobox::OptionSource;
pub use date::DatePicker;
pub use file::FileList;
pub use number::NumberInput;
pub use text::{TextArea, TextInput};

use crate::binding::FieldHandle;
use crate::error::RenderResult;
use crate::view::{RenderedField, WidgetView};
use stepform_schema::FieldPath;

/// A bound widget of any kind
#[derive(Debug)]
pub enum Widget {
    /// text / email / password
    Text(TextInput),
    /// number
    Number(NumberInput),
    /// textarea
    TextArea(TextArea),
    /// plain single select
    Select(SelectInput),
    /// checkbox
    Checkbox(CheckboxInput),
    /// radio
    Radio(RadioGroup),
    /// date
    Date(DatePicker),
    /// combobox, and select with `multiple` or `searchable`
    Combobox(Combobox),
    /// chip
    Chip(ChipInput),
    /// file
    File(FileList),
}

impl Widget {
    fn handle(&self) -> &FieldHandle {
        match self {
            Self::Text(w) => w.handle(),
            Self::Number(w) => w.handle(),
            Self::TextArea(w) => w.handle(),
            Self::Select(w) => w.handle(),
            Self::Checkbox(w) => w.handle(),
            Self::Radio(w) => w.handle(),
            Self::Date(w) => w.handle(),
            Self::Combobox(w) => w.handle(),
            Self::Chip(w) => w.handle(),
            Self::File(w) => w.handle(),
        }
    }

    /// Path the widget is bound to
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        self.handle().path()
    }

    /// Kind-specific view state
    #[must_use]
    pub fn view(&self) -> WidgetView {
        match self {
            Self::Text(w) => w.view(),
            Self::Number(w) => w.view(),
            Self::TextArea(w) => w.view(),
            Self::Select(w) => w.view(),
            Self::Checkbox(w) => w.view(),
            Self::Radio(w) => w.view(),
            Self::Date(w) => w.view(),
            Self::Combobox(w) => w.view(),
            Self::Chip(w) => w.view(),
            Self::File(w) => w.view(),
        }
    }

    /// Focus left the widget
    ///
    /// Commits pending chip text, closes dropdowns and marks the field touched.
    ///
    /// # Errors
    /// Propagates binding rejection of a pending chip commit
    pub fn blur(&mut self) -> RenderResult<()> {
        match self {
            Self::Chip(w) => return w.blur(),
            Self::Combobox(w) => {
                w.blur();
                return Ok(());
            }
            _ => {}
        }
        self.handle().touch();
        Ok(())
    }
}

/// A widget plus the descriptor metadata it renders with
#[derive(Debug)]
pub struct FieldWidget {
    pub(crate) label: String,
    pub(crate) placeholder: Option<String>,
    pub(crate) required: bool,
    pub(crate) widget: Widget,
}

impl FieldWidget {
    /// Current view plus message slot
    #[must_use]
    pub fn render(&self) -> RenderedField {
        RenderedField {
            path: self.widget.path().clone(),
            label: self.label.clone(),
            placeholder: self.placeholder.clone(),
            required: self.required,
            view: self.widget.view(),
            message: self.widget.handle().message(),
        }
    }

    /// Underlying widget
    #[inline]
    #[must_use]
    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// Underlying widget, for event dispatch
    #[inline]
    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    /// Consume into the widget
    #[inline]
    #[must_use]
    pub fn into_widget(self) -> Widget {
        self.widget
    }

    /// Path the widget is bound to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        self.widget.path()
    }

    /// See [`Widget::blur`]
    ///
    /// # Errors
    /// Same as [`Widget::blur`]
    pub fn blur(&mut self) -> RenderResult<()> {
        self.widget.blur()
    }
}
