//! Kind → widget dispatch
//!
//! [`FieldRendererRegistry::render`] is one exhaustive `match` over
//! [`FieldKind`]; adding a kind fails to compile until it has a widget.

use crate::binding::{FieldBinding, FieldHandle};
use crate::error::{RenderError, RenderResult};
use crate::search::{RemoteSearch, SearchProvider, DEFAULT_DEBOUNCE};
use crate::view::InputType;
use crate::widgets::{
    CheckboxInput, ChipInput, Combobox, DatePicker, FieldWidget, FileList, NumberInput, OptionSource,
    RadioGroup, SelectInput, TextArea, TextInput, Widget,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stepform_schema::{default_date_floor, FieldDescriptor, FieldKind, FieldPath, SearchMode};

/// Renderer settings shared by every field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Lower date bound when a date field sets none
    pub date_floor: NaiveDate,
    /// Upper date bound when a date field sets none; `None` reads the clock
    pub today: Option<NaiveDate>,
    /// Remote search debounce when a combobox sets none
    pub debounce: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            date_floor: default_date_floor(),
            today: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl RenderConfig {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Builds bound widgets from descriptors
#[derive(Default)]
pub struct FieldRendererRegistry {
    config: RenderConfig,
    providers: HashMap<FieldPath, Arc<dyn SearchProvider>>,
}

impl fmt::Debug for FieldRendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRendererRegistry")
            .field("config", &self.config)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FieldRendererRegistry {
    /// Create registry
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            providers: HashMap::new(),
        }
    }

    /// Register the search provider of a remote combobox
    pub fn register_search(&mut self, path: FieldPath, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(path, provider);
    }

    /// Builder-style [`FieldRendererRegistry::register_search`]
    #[must_use]
    pub fn with_search(mut self, path: FieldPath, provider: Arc<dyn SearchProvider>) -> Self {
        self.register_search(path, provider);
        self
    }

    /// Whether a provider is registered for `path`
    #[must_use]
    pub fn has_search(&self, path: &FieldPath) -> bool {
        self.providers.contains_key(path)
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Build the widget for a descriptor, bound to its own path only
    ///
    /// # Errors
    /// - `ShapeMismatch` if the bound value does not fit the kind
    /// - `MissingSearchProvider` for a remote combobox without a provider
    pub fn render(&self, descriptor: &FieldDescriptor, binding: Arc<dyn FieldBinding>) -> RenderResult<FieldWidget> {
        let handle = FieldHandle::new(descriptor.path.clone(), binding);
        let expected = descriptor.kind.shape();
        if let Some(actual) = handle.value().shape() {
            if actual != expected {
                return Err(RenderError::ShapeMismatch {
                    path: descriptor.path.to_string(),
                    expected,
                    actual,
                });
            }
        }

        let widget = match &descriptor.kind {
            FieldKind::Text(_) => Widget::Text(TextInput::new(handle, InputType::Text)),
            FieldKind::Email(_) => Widget::Text(TextInput::new(handle, InputType::Email)),
            FieldKind::Password(_) => Widget::Text(TextInput::new(handle, InputType::Password)),
            FieldKind::Number(props) => Widget::Number(NumberInput::new(handle, props.clone())),
            FieldKind::Textarea(props) => Widget::TextArea(TextArea::new(handle, props.rows)),
            FieldKind::Select(props) if props.multiple || props.searchable => Widget::Combobox(Combobox::new(
                handle,
                props.options.clone(),
                props.multiple,
                OptionSource::Local,
            )),
            FieldKind::Select(props) => Widget::Select(SelectInput::new(handle, props.options.clone())),
            FieldKind::Checkbox => Widget::Checkbox(CheckboxInput::new(handle)),
            FieldKind::Radio(props) => {
                Widget::Radio(RadioGroup::new(handle, props.options.clone(), props.orientation))
            }
            FieldKind::Date(props) => Widget::Date(DatePicker::new(
                handle,
                props.min.unwrap_or(self.config.date_floor),
                props.max.unwrap_or_else(|| self.config.today()),
            )),
            FieldKind::Combobox(props) => {
                let source = match &props.search {
                    SearchMode::Local => OptionSource::Local,
                    SearchMode::Remote { debounce_ms } => {
                        let provider = self
                            .providers
                            .get(&descriptor.path)
                            .ok_or_else(|| RenderError::MissingSearchProvider(descriptor.path.to_string()))?;
                        let debounce = debounce_ms.map_or(self.config.debounce, Duration::from_millis);
                        OptionSource::Remote(RemoteSearch::new(Arc::clone(provider), debounce))
                    }
                };
                Widget::Combobox(Combobox::new(handle, props.options.clone(), props.multiple, source))
            }
            FieldKind::Chip(props) => Widget::Chip(ChipInput::new(handle, props.clone())),
            FieldKind::File(props) => Widget::File(FileList::new(handle, props.clone())),
        };

        tracing::trace!(path = %descriptor.path, kind = descriptor.kind.name(), "rendered field");
        Ok(FieldWidget {
            label: descriptor.label.clone(),
            placeholder: descriptor.placeholder.clone(),
            required: descriptor.required,
            widget,
        })
    }

    /// Render several descriptors against one binding
    ///
    /// # Errors
    /// Returns the first rendering failure
    pub fn render_all<'a>(
        &self,
        descriptors: impl IntoIterator<Item = &'a FieldDescriptor>,
        binding: &Arc<dyn FieldBinding>,
    ) -> RenderResult<Vec<FieldWidget>> {
        descriptors
            .into_iter()
            .map(|d| self.render(d, Arc::clone(binding)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::LocalBinding;
    use crate::view::WidgetView;
    use stepform_schema::{
        ChipProps, ComboboxProps, DateProps, FieldOption, FieldValue, FileProps, FormValueTree, NumberProps,
        RadioProps, SelectProps, TextProps, TextareaProps,
    };

    fn options() -> Vec<FieldOption> {
        vec![FieldOption::new("a", "Alpha"), FieldOption::new("b", "Beta")]
    }

    fn bind(descriptors: &[FieldDescriptor]) -> Arc<dyn FieldBinding> {
        let mut tree = FormValueTree::new();
        for d in descriptors {
            tree.insert(d.path.clone(), d.default.clone()).unwrap();
        }
        LocalBinding::new(tree)
    }

    fn descriptor(path: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor::parse(path, kind, path).unwrap()
    }

    #[test]
    fn every_kind_dispatches() {
        let descriptors = vec![
            descriptor("t", FieldKind::text()),
            descriptor("e", FieldKind::Email(TextProps::default())),
            descriptor("p", FieldKind::Password(TextProps::default())),
            descriptor("n", FieldKind::Number(NumberProps::default())),
            descriptor("ta", FieldKind::Textarea(TextareaProps::default())),
            descriptor(
                "s",
                FieldKind::Select(SelectProps {
                    options: options(),
                    ..SelectProps::default()
                }),
            ),
            descriptor("c", FieldKind::Checkbox),
            descriptor(
                "r",
                FieldKind::Radio(RadioProps {
                    options: options(),
                    ..RadioProps::default()
                }),
            ),
            descriptor("d", FieldKind::Date(DateProps::default())),
            descriptor(
                "cb",
                FieldKind::Combobox(ComboboxProps {
                    options: options(),
                    ..ComboboxProps::default()
                }),
            ),
            descriptor("ch", FieldKind::Chip(ChipProps::default())),
            descriptor("f", FieldKind::File(FileProps::default())),
        ];
        let binding = bind(&descriptors);
        let registry = FieldRendererRegistry::default();
        let widgets = registry.render_all(&descriptors, &binding).unwrap();

        let names: Vec<&str> = widgets
            .iter()
            .map(|w| match w.widget() {
                Widget::Text(_) => "text",
                Widget::Number(_) => "number",
                Widget::TextArea(_) => "textarea",
                Widget::Select(_) => "select",
                Widget::Checkbox(_) => "checkbox",
                Widget::Radio(_) => "radio",
                Widget::Date(_) => "date",
                Widget::Combobox(_) => "combobox",
                Widget::Chip(_) => "chip",
                Widget::File(_) => "file",
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "text", "text", "text", "number", "textarea", "select", "checkbox", "radio", "date", "combobox",
                "chip", "file"
            ]
        );
    }

    #[test]
    fn searchable_or_multiple_select_uses_combobox() {
        for (multiple, searchable) in [(true, false), (false, true), (true, true)] {
            let d = descriptor(
                "license",
                FieldKind::Select(SelectProps {
                    options: options(),
                    multiple,
                    searchable,
                }),
            );
            let widget = FieldRendererRegistry::default()
                .render(&d, bind(std::slice::from_ref(&d)))
                .unwrap();
            let WidgetView::Combobox { multiple: m, .. } = widget.render().view else {
                panic!("expected combobox for multiple={multiple} searchable={searchable}");
            };
            assert_eq!(m, multiple);
        }
    }

    #[test]
    fn remote_combobox_requires_provider() {
        let d = descriptor(
            "org",
            FieldKind::Combobox(ComboboxProps {
                search: SearchMode::Remote { debounce_ms: None },
                ..ComboboxProps::default()
            }),
        );
        let err = FieldRendererRegistry::default()
            .render(&d, bind(std::slice::from_ref(&d)))
            .unwrap_err();
        assert_eq!(err, RenderError::MissingSearchProvider("org".into()));
    }

    #[test]
    fn bound_value_shape_checked() {
        let d = descriptor("rows", FieldKind::Number(NumberProps::default()));
        let binding: Arc<dyn FieldBinding> = LocalBinding::new(FormValueTree::new().with("rows", "ten").unwrap());
        let err = FieldRendererRegistry::default().render(&d, binding).unwrap_err();
        assert!(matches!(err, RenderError::ShapeMismatch { .. }));
    }

    #[test]
    fn date_range_uses_config_defaults() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let registry = FieldRendererRegistry::new(RenderConfig {
            today: Some(today),
            ..RenderConfig::default()
        });
        let d = descriptor("collected", FieldKind::Date(DateProps::default()));
        let widget = registry.render(&d, bind(std::slice::from_ref(&d))).unwrap();
        let Widget::Date(picker) = widget.widget() else {
            panic!("expected date picker");
        };
        assert_eq!(picker.range(), (default_date_floor(), today));
    }

    #[test]
    fn rendered_field_carries_message_slot() {
        let d = FieldDescriptor::parse("title", FieldKind::text(), "Title")
            .unwrap()
            .required()
            .with_placeholder("Dataset title");
        let local = LocalBinding::new(FormValueTree::new().with("title", "").unwrap());
        local.set_message(&d.path, Some("Title is required".into()));

        let mut widget = FieldRendererRegistry::default().render(&d, local.clone()).unwrap();
        if let Widget::Text(input) = widget.widget_mut() {
            input.input("Rainfall").unwrap();
        }
        widget.blur().unwrap();

        let rendered = widget.render();
        assert_eq!(rendered.message.as_deref(), Some("Title is required"));
        assert_eq!(rendered.placeholder.as_deref(), Some("Dataset title"));
        assert!(rendered.required);
        assert!(local.is_touched(&d.path));
        assert_eq!(local.values().get(&d.path), Some(&FieldValue::from("Rainfall")));
    }
}
