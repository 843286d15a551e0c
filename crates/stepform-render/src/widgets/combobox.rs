//! Filterable single or multi choice

use crate::binding::FieldHandle;
use crate::error::{RenderError, RenderResult};
use crate::search::RemoteSearch;
use crate::view::{OptionView, WidgetView};
use stepform_schema::{FieldOption, FieldValue};

/// Where visible options come from
#[derive(Debug)]
pub(crate) enum OptionSource {
    /// Case-insensitive substring filter over labels
    Local,
    /// Debounced caller-supplied search
    Remote(RemoteSearch),
}

/// Combobox / multi-select
///
/// Selections are keyed by option value. Labels of remotely found options are
/// remembered once chosen so the selection still renders after the result list
/// changes.
#[derive(Debug)]
pub struct Combobox {
    handle: FieldHandle,
    options: Vec<FieldOption>,
    multiple: bool,
    source: OptionSource,
    query: String,
    open: bool,
    known: Vec<FieldOption>,
}

impl Combobox {
    pub(crate) fn new(handle: FieldHandle, options: Vec<FieldOption>, multiple: bool, source: OptionSource) -> Self {
        Self {
            handle,
            known: options.clone(),
            options,
            multiple,
            source,
            query: String::new(),
            open: false,
        }
    }

    /// Update the search text and open the list
    ///
    /// For remote sources this schedules a debounced search and must run inside
    /// a tokio runtime.
    pub fn input(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.open = true;
        if let OptionSource::Remote(search) = &mut self.source {
            search.query(self.query.clone());
        }
    }

    /// Options matching the current query
    #[must_use]
    pub fn visible_options(&self) -> Vec<FieldOption> {
        match &self.source {
            OptionSource::Local => {
                let needle = self.query.to_lowercase();
                self.options
                    .iter()
                    .filter(|o| needle.is_empty() || o.label.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
            OptionSource::Remote(search) => {
                let snapshot = search.snapshot();
                if snapshot.published == 0 {
                    self.options.clone()
                } else {
                    snapshot.results
                }
            }
        }
    }

    /// Select an option; in multiple mode, toggle it
    ///
    /// # Errors
    /// Returns `UnknownOption` if the value is neither visible nor already known
    pub fn choose(&mut self, value: &str) -> RenderResult<()> {
        let option = self
            .visible_options()
            .into_iter()
            .chain(self.known.iter().cloned())
            .find(|o| o.value == value)
            .ok_or_else(|| RenderError::UnknownOption {
                path: self.handle.path().to_string(),
                value: value.to_string(),
            })?;

        if !self.known.iter().any(|o| o.value == option.value) {
            self.known.push(option.clone());
        }

        if self.multiple {
            let mut selected = self.selected();
            match selected.iter().position(|v| *v == option.value) {
                Some(pos) => {
                    selected.remove(pos);
                }
                None => selected.push(option.value),
            }
            self.handle.set(FieldValue::List(selected))
        } else {
            self.open = false;
            self.query.clear();
            self.handle.set(FieldValue::Text(option.value))
        }
    }

    /// Drop one selected value
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn remove(&mut self, value: &str) -> RenderResult<()> {
        if self.multiple {
            let selected: Vec<String> = self.selected().into_iter().filter(|v| v != value).collect();
            self.handle.set(FieldValue::List(selected))
        } else if self.handle.value().as_text() == Some(value) {
            self.clear()
        } else {
            Ok(())
        }
    }

    /// Clear the whole selection
    ///
    /// # Errors
    /// Propagates binding rejection
    pub fn clear(&mut self) -> RenderResult<()> {
        let empty = if self.multiple {
            FieldValue::List(Vec::new())
        } else {
            FieldValue::Text(String::new())
        };
        self.handle.set(empty)
    }

    /// Selected values in selection order
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        match self.handle.value() {
            FieldValue::List(items) => items,
            FieldValue::Text(s) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        }
    }

    /// Label of a known option
    #[must_use]
    pub fn label_of(&self, value: &str) -> Option<&str> {
        self.known.iter().find(|o| o.value == value).map(|o| o.label.as_str())
    }

    /// Whether a remote search is pending
    #[must_use]
    pub fn is_loading(&self) -> bool {
        match &self.source {
            OptionSource::Local => false,
            OptionSource::Remote(search) => search.snapshot().loading,
        }
    }

    pub(crate) fn blur(&mut self) {
        self.open = false;
        if let OptionSource::Remote(search) = &mut self.source {
            search.cancel();
        }
        self.handle.touch();
    }

    pub(crate) fn handle(&self) -> &FieldHandle {
        &self.handle
    }

    pub(crate) fn view(&self) -> WidgetView {
        let selected = self.selected();
        let options = self
            .visible_options()
            .iter()
            .map(|o| OptionView::from_option(o, selected.contains(&o.value)))
            .collect();
        let search_error = match &self.source {
            OptionSource::Local => None,
            OptionSource::Remote(search) => search.snapshot().error,
        };
        WidgetView::Combobox {
            query: self.query.clone(),
            options,
            selected,
            multiple: self.multiple,
            open: self.open,
            loading: self.is_loading(),
            search_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::LocalBinding;
    use crate::error::SearchError;
    use crate::search::SearchProvider;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use stepform_schema::{FieldPath, FormValueTree};

    fn formats() -> Vec<FieldOption> {
        vec![
            FieldOption::new("csv", "Comma separated"),
            FieldOption::new("json", "JSON"),
            FieldOption::new("parquet", "Apache Parquet"),
        ]
    }

    fn local(multiple: bool) -> (Combobox, Arc<LocalBinding>) {
        let initial = if multiple {
            FieldValue::List(Vec::new())
        } else {
            FieldValue::Text(String::new())
        };
        let binding = LocalBinding::new(FormValueTree::new().with("format", initial).unwrap());
        let handle = binding.handle(FieldPath::parse("format").unwrap());
        (Combobox::new(handle, formats(), multiple, OptionSource::Local), binding)
    }

    #[test]
    fn local_filter_matches_label_substring() {
        let (mut combo, _) = local(false);
        let values = |combo: &Combobox| -> Vec<String> {
            combo.visible_options().into_iter().map(|o| o.value).collect()
        };

        combo.input("PARQ");
        assert_eq!(values(&combo), vec!["parquet"]);

        // "Comma separated" contains "par" too; order follows the option list
        combo.input("par");
        assert_eq!(values(&combo), vec!["csv", "parquet"]);

        combo.input("");
        assert_eq!(values(&combo).len(), 3);
    }

    #[test]
    fn single_choice_closes_and_stores_scalar() {
        let (mut combo, binding) = local(false);
        combo.input("js");
        combo.choose("json").unwrap();
        assert_eq!(
            binding.values().get(&FieldPath::parse("format").unwrap()),
            Some(&FieldValue::from("json"))
        );
        assert!(matches!(combo.view(), WidgetView::Combobox { open: false, .. }));
    }

    #[test]
    fn multiple_choice_toggles_in_order() {
        let (mut combo, _) = local(true);
        combo.choose("parquet").unwrap();
        combo.choose("csv").unwrap();
        assert_eq!(combo.selected(), vec!["parquet", "csv"]);
        combo.choose("parquet").unwrap();
        assert_eq!(combo.selected(), vec!["csv"]);
        combo.remove("csv").unwrap();
        assert!(combo.selected().is_empty());
    }

    #[test]
    fn filtered_out_value_rejected_unless_known() {
        let (mut combo, _) = local(false);
        combo.input("json");
        // Static options stay known even when filtered out
        assert!(combo.choose("csv").is_ok());
        assert!(matches!(combo.choose("xlsx"), Err(RenderError::UnknownOption { .. })));
    }

    struct Orgs;

    #[async_trait]
    impl SearchProvider for Orgs {
        async fn search(&self, query: &str) -> Result<Vec<FieldOption>, SearchError> {
            // Shorter queries are slower, so an older query would finish last
            let delay = 1_000 / query.len().max(1) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![FieldOption::new(format!("org-{query}"), format!("Org {query}"))])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn remote_renders_only_latest_query() {
        let binding = LocalBinding::new(FormValueTree::new().with("org", "").unwrap());
        let search = RemoteSearch::new(Arc::new(Orgs), Duration::from_millis(300));
        let mut combo = Combobox::new(
            binding.handle(FieldPath::parse("org").unwrap()),
            Vec::new(),
            false,
            OptionSource::Remote(search),
        );

        combo.input("ab");
        combo.input("abc");
        assert!(combo.is_loading());
        tokio::time::sleep(Duration::from_secs(2)).await;

        let WidgetView::Combobox { options, loading, .. } = combo.view() else {
            panic!("expected combobox view");
        };
        assert!(!loading);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, "org-abc");

        combo.choose("org-abc").unwrap();
        assert_eq!(combo.label_of("org-abc"), Some("Org abc"));
    }
}
