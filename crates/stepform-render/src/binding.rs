//! Value bindings between widgets and the form state
//!
//! Widgets never touch the value tree directly. Each widget owns a [`FieldHandle`]
//! scoped to exactly one path; every read and write goes through the
//! [`FieldBinding`] the form engine supplies.

use crate::error::RenderResult;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use stepform_schema::{FieldPath, FieldValue, FormValueTree, ValueError};

/// Source of field values, setter and touch notifications
pub trait FieldBinding: Send + Sync {
    /// Current value of a field
    fn value(&self, path: &FieldPath) -> Option<FieldValue>;

    /// Write a field value
    ///
    /// # Errors
    /// Returns error if the path is untracked or the value has the wrong shape
    fn set_value(&self, path: &FieldPath, value: FieldValue) -> Result<(), ValueError>;

    /// Mark a field as touched (blurred at least once)
    fn touch(&self, path: &FieldPath);

    /// Inline message for the field, if any
    fn message(&self, path: &FieldPath) -> Option<String>;
}

/// Binding restricted to a single field
#[derive(Clone)]
pub struct FieldHandle {
    path: FieldPath,
    binding: Arc<dyn FieldBinding>,
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle").field("path", &self.path).finish_non_exhaustive()
    }
}

impl FieldHandle {
    /// Scope a binding to one path
    #[inline]
    #[must_use]
    pub fn new(path: FieldPath, binding: Arc<dyn FieldBinding>) -> Self {
        Self { path, binding }
    }

    /// Path this handle is scoped to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Current value, `Null` if absent
    #[must_use]
    pub fn value(&self) -> FieldValue {
        self.binding.value(&self.path).unwrap_or(FieldValue::Null)
    }

    /// Write the value
    ///
    /// # Errors
    /// Propagates the binding's rejection
    pub fn set(&self, value: FieldValue) -> RenderResult<()> {
        self.binding.set_value(&self.path, value)?;
        Ok(())
    }

    /// Mark touched
    #[inline]
    pub fn touch(&self) {
        self.binding.touch(&self.path);
    }

    /// Inline message slot
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.binding.message(&self.path)
    }
}

/// Standalone binding over an owned value tree
///
/// Used where widgets run without a form engine: previews, the CLI, tests.
#[derive(Debug, Default)]
pub struct LocalBinding {
    tree: Mutex<FormValueTree>,
    touched: Mutex<IndexSet<FieldPath>>,
    messages: Mutex<HashMap<FieldPath, String>>,
}

impl LocalBinding {
    /// Bind over a tree
    #[must_use]
    pub fn new(tree: FormValueTree) -> Arc<Self> {
        Arc::new(Self {
            tree: Mutex::new(tree),
            ..Self::default()
        })
    }

    /// Snapshot of the values
    #[must_use]
    pub fn values(&self) -> FormValueTree {
        self.tree.lock().clone()
    }

    /// Whether a field was touched
    #[must_use]
    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.touched.lock().contains(path)
    }

    /// Set or clear the inline message of a field
    pub fn set_message(&self, path: &FieldPath, message: Option<String>) {
        let mut messages = self.messages.lock();
        match message {
            Some(m) => {
                messages.insert(path.clone(), m);
            }
            None => {
                messages.remove(path);
            }
        }
    }

    /// Handle scoped to `path`
    #[must_use]
    pub fn handle(self: &Arc<Self>, path: FieldPath) -> FieldHandle {
        FieldHandle::new(path, Arc::clone(self) as Arc<dyn FieldBinding>)
    }
}

impl FieldBinding for LocalBinding {
    fn value(&self, path: &FieldPath) -> Option<FieldValue> {
        self.tree.lock().get(path).cloned()
    }

    fn set_value(&self, path: &FieldPath, value: FieldValue) -> Result<(), ValueError> {
        self.tree.lock().set(path, value).map(|_| ())
    }

    fn touch(&self, path: &FieldPath) {
        self.touched.lock().insert(path.clone());
    }

    fn message(&self, path: &FieldPath) -> Option<String> {
        self.messages.lock().get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> FormValueTree {
        FormValueTree::new()
            .with("title", "")
            .unwrap()
            .with("summary", "kept")
            .unwrap()
    }

    #[test]
    fn handle_writes_only_its_path() {
        let binding = LocalBinding::new(tree());
        let title = binding.handle(FieldPath::parse("title").unwrap());

        title.set(FieldValue::from("Rainfall")).unwrap();

        let values = binding.values();
        assert_eq!(values.get(&FieldPath::parse("title").unwrap()), Some(&FieldValue::from("Rainfall")));
        assert_eq!(values.get(&FieldPath::parse("summary").unwrap()), Some(&FieldValue::from("kept")));
    }

    #[test]
    fn handle_on_untracked_path_is_rejected() {
        let binding = LocalBinding::new(tree());
        let ghost = binding.handle(FieldPath::parse("ghost").unwrap());
        assert!(ghost.set(FieldValue::from("x")).is_err());
        assert_eq!(ghost.value(), FieldValue::Null);
    }

    #[test]
    fn touch_and_message() {
        let binding = LocalBinding::new(tree());
        let path = FieldPath::parse("title").unwrap();
        let handle = binding.handle(path.clone());

        assert!(!binding.is_touched(&path));
        handle.touch();
        assert!(binding.is_touched(&path));

        binding.set_message(&path, Some("Title is required".into()));
        assert_eq!(handle.message().as_deref(), Some("Title is required"));
        binding.set_message(&path, None);
        assert_eq!(handle.message(), None);
    }
}
