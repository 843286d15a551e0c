//! Form values and the value tree
//!
//! [`FormValueTree`] is the single mutable resource of a form: an ordered map from
//! [`FieldPath`] to a primitive or array [`FieldValue`]. It serializes to a nested
//! JSON object keyed by path segments.

use crate::path::{FieldPath, PathError};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

/// Wire format of date values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Runtime shape of a value, used to match values against field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Single-line or multi-line string
    Text,
    /// Floating-point number
    Number,
    /// Boolean flag
    Bool,
    /// Calendar date
    Date,
    /// Ordered list of strings
    List,
    /// Ordered list of encoded files
    Files,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Date => "date",
            Self::List => "list",
            Self::Files => "files",
        };
        f.write_str(name)
    }
}

/// An encoded file ready for inclusion in the submitted data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValue {
    /// Opaque upload id
    pub id: String,
    /// Original file name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// `data:` URL with the base64 payload
    pub data_url: String,
}

/// Value of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value selected or entered
    Null,
    /// Checkbox state
    Bool(bool),
    /// Numeric input
    Number(f64),
    /// Any string-valued input
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Multi-select, chips
    List(Vec<String>),
    /// Uploaded files
    Files(Vec<FileValue>),
}

impl FieldValue {
    /// Shape of the value, `None` for [`FieldValue::Null`]
    #[must_use]
    pub fn shape(&self) -> Option<ValueShape> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueShape::Bool),
            Self::Number(_) => Some(ValueShape::Number),
            Self::Text(_) => Some(ValueShape::Text),
            Self::Date(_) => Some(ValueShape::Date),
            Self::List(_) => Some(ValueShape::List),
            Self::Files(_) => Some(ValueShape::Files),
        }
    }

    /// Whether the value counts as "not provided"
    ///
    /// `false` is a provided boolean; only null, empty strings and empty lists are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Files(files) => files.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::Date(_) => false,
        }
    }

    /// Empty value of the given shape
    #[must_use]
    pub fn empty_of(shape: ValueShape) -> Self {
        match shape {
            ValueShape::Text => Self::Text(String::new()),
            ValueShape::Bool => Self::Bool(false),
            ValueShape::List => Self::List(Vec::new()),
            ValueShape::Files => Self::Files(Vec::new()),
            ValueShape::Number | ValueShape::Date => Self::Null,
        }
    }

    /// Borrow as string
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as boolean
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as date
    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow as string list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as file list
    #[inline]
    #[must_use]
    pub fn as_files(&self) -> Option<&[FileValue]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    /// Convert to JSON
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(JsonValue::Null, JsonValue::Number),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
            Self::List(items) => {
                JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
            }
            Self::Files(files) => serde_json::to_value(files).unwrap_or(JsonValue::Null),
        }
    }

    /// Convert a JSON leaf without shape information
    ///
    /// Dates arrive as strings; use [`FieldValue::coerce`] to give them their shape.
    ///
    /// # Errors
    /// Returns error for objects and for arrays mixing strings and objects
    pub fn from_json(value: &JsonValue, path: &FieldPath) -> Result<Self, ValueError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                ValueError::Unsupported {
                    path: path.to_string(),
                    actual: n.to_string(),
                }
            }),
            JsonValue::String(s) => Ok(Self::Text(s.clone())),
            JsonValue::Array(items) if items.iter().all(JsonValue::is_object) && !items.is_empty() => {
                serde_json::from_value(value.clone())
                    .map(Self::Files)
                    .map_err(|e| ValueError::Unsupported {
                        path: path.to_string(),
                        actual: e.to_string(),
                    })
            }
            JsonValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s.clone()),
                    JsonValue::Number(n) => Ok(n.to_string()),
                    JsonValue::Bool(b) => Ok(b.to_string()),
                    other => Err(ValueError::Unsupported {
                        path: path.to_string(),
                        actual: other.to_string(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            JsonValue::Object(_) => Err(ValueError::Unsupported {
                path: path.to_string(),
                actual: value.to_string(),
            }),
        }
    }

    /// Reinterpret the value as the given shape
    ///
    /// Only lossless conversions are performed: date strings become dates, an empty
    /// string becomes null for numbers and dates, and an empty list is accepted as an
    /// empty file list. Null is accepted for every shape.
    ///
    /// # Errors
    /// Returns [`ValueError::ShapeMismatch`] when no conversion applies
    pub fn coerce(self, shape: ValueShape, path: &FieldPath) -> Result<Self, ValueError> {
        if self.shape().map_or(true, |s| s == shape) {
            return Ok(self);
        }
        match (self, shape) {
            (Self::Text(s), ValueShape::Date | ValueShape::Number) if s.is_empty() => Ok(Self::Null),
            (Self::Text(s), ValueShape::Date) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Self::Date)
                .map_err(|_| ValueError::ShapeMismatch {
                    path: path.to_string(),
                    expected: shape,
                    actual: s,
                }),
            (Self::List(items), ValueShape::Files) if items.is_empty() => Ok(Self::Files(Vec::new())),
            (other, _) => Err(ValueError::ShapeMismatch {
                path: path.to_string(),
                expected: shape,
                actual: format!("{other:?}"),
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Ordered map from field path to value
///
/// Leaves never overlap: no path is a prefix of another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValueTree {
    values: IndexMap<FieldPath, FieldValue>,
}

impl FormValueTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new leaf
    ///
    /// # Errors
    /// - `ValueError::Duplicate` if the path is already present
    /// - `ValueError::Overlapping` if the path is a prefix of (or prefixed by) an existing leaf
    pub fn insert(&mut self, path: FieldPath, value: FieldValue) -> Result<(), ValueError> {
        if self.values.contains_key(&path) {
            return Err(ValueError::Duplicate(path.to_string()));
        }
        if let Some(existing) = self.values.keys().find(|k| k.overlaps(&path)) {
            return Err(ValueError::Overlapping {
                path: path.to_string(),
                existing: existing.to_string(),
            });
        }
        self.values.insert(path, value);
        Ok(())
    }

    /// Builder-style [`FormValueTree::insert`]
    ///
    /// # Errors
    /// Same as [`FormValueTree::insert`], plus malformed paths
    pub fn with(mut self, path: &str, value: impl Into<FieldValue>) -> Result<Self, ValueError> {
        self.insert(FieldPath::parse(path)?, value.into())?;
        Ok(self)
    }

    /// Replace the value of an existing leaf
    ///
    /// The key set is fixed after construction; unknown paths are rejected.
    ///
    /// # Errors
    /// Returns `ValueError::UnknownField` for untracked paths
    pub fn set(&mut self, path: &FieldPath, value: FieldValue) -> Result<FieldValue, ValueError> {
        match self.values.get_mut(path) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(ValueError::UnknownField(path.to_string())),
        }
    }

    /// Get value by path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.values.get(path)
    }

    /// Check if path is tracked
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.values.contains_key(path)
    }

    /// Iterate over tracked paths in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &FieldPath> {
        self.values.keys()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldValue)> {
        self.values.iter()
    }

    /// Number of leaves
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if tree has no leaves
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flatten a nested JSON object into a tree
    ///
    /// Nested objects become path segments; every non-object value is a leaf.
    ///
    /// # Errors
    /// Returns error if the root is not an object, a key is not a valid segment,
    /// or a leaf cannot be represented
    pub fn from_json(value: &JsonValue) -> Result<Self, ValueError> {
        let JsonValue::Object(map) = value else {
            return Err(ValueError::NotAnObject);
        };
        let mut tree = Self::new();
        flatten_into(&mut tree, None, map)?;
        Ok(tree)
    }

    /// Nest the tree back into a JSON object
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut root = JsonMap::new();
        for (path, value) in &self.values {
            let mut cursor = &mut root;
            let segments = path.segments();
            for seg in &segments[..segments.len() - 1] {
                let entry = cursor
                    .entry(seg.clone())
                    .or_insert_with(|| JsonValue::Object(JsonMap::new()));
                if !entry.is_object() {
                    *entry = JsonValue::Object(JsonMap::new());
                }
                let JsonValue::Object(next) = entry else {
                    unreachable!("entry was just made an object");
                };
                cursor = next;
            }
            cursor.insert(path.leaf().to_string(), value.to_json());
        }
        JsonValue::Object(root)
    }
}

fn flatten_into(
    tree: &mut FormValueTree,
    prefix: Option<&FieldPath>,
    map: &JsonMap<String, JsonValue>,
) -> Result<(), ValueError> {
    for (key, value) in map {
        let path = match prefix {
            Some(p) => p.child(key.as_str())?,
            None => FieldPath::parse(key)?,
        };
        match value {
            JsonValue::Object(inner) if !inner.is_empty() => flatten_into(tree, Some(&path), inner)?,
            JsonValue::Object(_) => return Err(ValueError::EmptyGroup(path.to_string())),
            leaf => {
                let v = FieldValue::from_json(leaf, &path)?;
                tree.insert(path, v)?;
            }
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a FormValueTree {
    type Item = (&'a FieldPath, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, FieldPath, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Errors building or mutating a value tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Path is malformed
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Root of the JSON document is not an object
    #[error("value tree must be a JSON object")]
    NotAnObject,

    /// Nested object with no leaves
    #[error("empty group at '{0}'")]
    EmptyGroup(String),

    /// Path inserted twice
    #[error("duplicate field '{0}'")]
    Duplicate(String),

    /// Path overlaps an existing leaf
    #[error("field '{path}' overlaps existing field '{existing}'")]
    Overlapping { path: String, existing: String },

    /// Path not tracked by this tree
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Value does not fit the expected shape
    #[error("field '{path}': expected {expected}, got {actual}")]
    ShapeMismatch {
        path: String,
        expected: ValueShape,
        actual: String,
    },

    /// JSON value with no form representation
    #[error("field '{path}': unsupported value {actual}")]
    Unsupported { path: String, actual: String },
}
