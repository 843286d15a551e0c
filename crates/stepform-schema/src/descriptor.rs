//! Declarative field descriptors
//!
//! A [`FieldDescriptor`] names a leaf of the value tree and carries a [`FieldKind`].
//! Each kind is a closed variant holding exactly the properties that are legal for
//! it, so renderers and the schema synthesizer dispatch with an exhaustive `match`.

use crate::path::FieldPath;
use crate::value::{FieldValue, ValueShape};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One `{value, label}` entry of a choice field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stored value
    pub value: String,
    /// Display label
    pub label: String,
}

impl FieldOption {
    /// Create option
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Length and pattern bounds shared by string kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    /// Minimum length in characters
    pub min_length: Option<usize>,
    /// Maximum length in characters
    pub max_length: Option<usize>,
    /// Regular expression the whole value must match
    pub pattern: Option<String>,
}

/// Multi-line text properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextareaProps {
    /// Minimum length in characters
    pub min_length: Option<usize>,
    /// Maximum length in characters
    pub max_length: Option<usize>,
    /// Visible rows
    pub rows: u16,
}

impl Default for TextareaProps {
    fn default() -> Self {
        Self {
            min_length: None,
            max_length: None,
            rows: 4,
        }
    }
}

/// Numeric bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberProps {
    /// Inclusive lower bound
    pub min: Option<f64>,
    /// Inclusive upper bound
    pub max: Option<f64>,
    /// Input step
    pub step: Option<f64>,
}

/// Single-select properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectProps {
    /// Ordered options
    pub options: Vec<FieldOption>,
    /// Allow several values (rendered by the combobox)
    pub multiple: bool,
    /// Allow filtering (rendered by the combobox)
    pub searchable: bool,
}

/// Layout of a radio group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Options stacked
    #[default]
    Vertical,
    /// Options in a row
    Horizontal,
}

/// Radio group properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioProps {
    /// Ordered options
    pub options: Vec<FieldOption>,
    /// Presentation-only layout
    pub orientation: Orientation,
}

/// Date bounds
///
/// Absent bounds fall back to the synthesizer defaults (1900-01-01 .. today).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateProps {
    /// Earliest selectable date
    pub min: Option<NaiveDate>,
    /// Latest selectable date
    pub max: Option<NaiveDate>,
}

/// Where combobox options come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SearchMode {
    /// Substring filter over option labels
    #[default]
    Local,
    /// Caller-supplied asynchronous search, debounced
    Remote {
        /// Debounce window; `None` uses the registry default
        #[serde(default)]
        debounce_ms: Option<u64>,
    },
}

/// Combobox properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboboxProps {
    /// Static options (also the initial list for remote search)
    pub options: Vec<FieldOption>,
    /// Value is an ordered list instead of a scalar
    pub multiple: bool,
    /// Option source
    pub search: SearchMode,
}

/// A key or character that commits the buffered chip text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Splitter {
    /// A literal character typed into the input
    Char(char),
    /// The Enter key
    Enter,
}

impl FromStr for Splitter {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("enter") {
            return Ok(Self::Enter);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::Char(c)),
            _ => Err(DescriptorError::InvalidSplitter(s.to_string())),
        }
    }
}

impl TryFrom<String> for Splitter {
    type Error = DescriptorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Splitter> for String {
    fn from(s: Splitter) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Splitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Enter => f.write_str("Enter"),
        }
    }
}

/// Chip / tag list properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipProps {
    /// Keys and characters that commit a token
    pub splitters: Vec<Splitter>,
    /// Keep repeated tokens
    pub allow_duplicates: bool,
    /// Maximum number of tokens
    pub max_items: Option<usize>,
}

impl Default for ChipProps {
    fn default() -> Self {
        Self {
            splitters: vec![Splitter::Char(','), Splitter::Char(' '), Splitter::Enter],
            allow_duplicates: false,
            max_items: None,
        }
    }
}

/// File field properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProps {
    /// Allowed extensions without the dot; empty allows all
    pub accept: Vec<String>,
    /// Size ceiling per file
    pub max_size_bytes: Option<u64>,
    /// Allow several files
    pub multiple: bool,
}

/// Kind of a field together with its kind-specific properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text(TextProps),
    /// Single-line text with email format
    Email(TextProps),
    /// Single-line text, masked
    Password(TextProps),
    /// Number input
    Number(NumberProps),
    /// Multi-line text
    Textarea(TextareaProps),
    /// Choice from options
    Select(SelectProps),
    /// Boolean flag
    Checkbox,
    /// Mutually exclusive choice
    Radio(RadioProps),
    /// Calendar date
    Date(DateProps),
    /// Filterable single or multi choice
    Combobox(ComboboxProps),
    /// Ordered string tokens
    Chip(ChipProps),
    /// Uploaded files
    File(FileProps),
}

impl FieldKind {
    /// Plain text with no bounds
    #[inline]
    #[must_use]
    pub fn text() -> Self {
        Self::Text(TextProps::default())
    }

    /// Value shape this kind stores
    #[must_use]
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Text(_) | Self::Email(_) | Self::Password(_) | Self::Textarea(_) | Self::Radio(_) => {
                ValueShape::Text
            }
            Self::Select(props) if props.multiple => ValueShape::List,
            Self::Select(_) => ValueShape::Text,
            Self::Combobox(props) if props.multiple => ValueShape::List,
            Self::Combobox(_) => ValueShape::Text,
            Self::Number(_) => ValueShape::Number,
            Self::Checkbox => ValueShape::Bool,
            Self::Date(_) => ValueShape::Date,
            Self::Chip(_) => ValueShape::List,
            Self::File(_) => ValueShape::Files,
        }
    }

    /// Short name as used in definitions
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Email(_) => "email",
            Self::Password(_) => "password",
            Self::Number(_) => "number",
            Self::Textarea(_) => "textarea",
            Self::Select(_) => "select",
            Self::Checkbox => "checkbox",
            Self::Radio(_) => "radio",
            Self::Date(_) => "date",
            Self::Combobox(_) => "combobox",
            Self::Chip(_) => "chip",
            Self::File(_) => "file",
        }
    }

    /// Options of choice kinds
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        match self {
            Self::Select(props) => &props.options,
            Self::Radio(props) => &props.options,
            Self::Combobox(props) => &props.options,
            _ => &[],
        }
    }
}

/// Declarative spec of one form field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Path into the value tree
    pub path: FieldPath,
    /// Kind and kind-specific constraints
    pub kind: FieldKind,
    /// Display label
    pub label: String,
    /// Input placeholder
    pub placeholder: Option<String>,
    /// Whether an empty value is rejected
    pub required: bool,
    /// Initial value, shaped like `kind`
    pub default: FieldValue,
}

impl FieldDescriptor {
    /// Create a descriptor with the empty default for its kind
    #[must_use]
    pub fn new(path: FieldPath, kind: FieldKind, label: impl Into<String>) -> Self {
        let default = FieldValue::empty_of(kind.shape());
        Self {
            path,
            kind,
            label: label.into(),
            placeholder: None,
            required: false,
            default,
        }
    }

    /// Parse the path and create a descriptor
    ///
    /// # Errors
    /// Returns error if `path` is malformed
    pub fn parse(path: &str, kind: FieldKind, label: impl Into<String>) -> Result<Self, DescriptorError> {
        Ok(Self::new(FieldPath::parse(path)?, kind, label))
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// With placeholder
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// With default value
    ///
    /// # Errors
    /// Returns `DescriptorError::DefaultShapeMismatch` if the value does not fit `kind`
    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Result<Self, DescriptorError> {
        self.default = default.into();
        self.validate()?;
        Ok(self)
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// - default's shape differs from the kind's shape
    /// - a choice kind has no options (remote comboboxes excepted) or repeats a value
    /// - numeric or date bounds are inverted
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let expected = self.kind.shape();
        if let Some(actual) = self.default.shape() {
            if actual != expected {
                return Err(DescriptorError::DefaultShapeMismatch {
                    path: self.path.to_string(),
                    expected,
                    actual,
                });
            }
        }

        let needs_options = match &self.kind {
            FieldKind::Select(_) | FieldKind::Radio(_) => true,
            FieldKind::Combobox(props) => props.search == SearchMode::Local,
            _ => false,
        };
        let options = self.kind.options();
        if needs_options && options.is_empty() {
            return Err(DescriptorError::NoOptions(self.path.to_string()));
        }
        for (i, opt) in options.iter().enumerate() {
            if options[..i].iter().any(|o| o.value == opt.value) {
                return Err(DescriptorError::DuplicateOption {
                    path: self.path.to_string(),
                    value: opt.value.clone(),
                });
            }
        }

        match &self.kind {
            FieldKind::Number(NumberProps {
                min: Some(min),
                max: Some(max),
                ..
            }) if min > max => Err(DescriptorError::InvertedBounds(self.path.to_string())),
            FieldKind::Date(DateProps {
                min: Some(min),
                max: Some(max),
            }) if min > max => Err(DescriptorError::InvertedBounds(self.path.to_string())),
            FieldKind::Text(p) | FieldKind::Email(p) | FieldKind::Password(p)
                if matches!((p.min_length, p.max_length), (Some(lo), Some(hi)) if lo > hi) =>
            {
                Err(DescriptorError::InvertedBounds(self.path.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Errors in a descriptor definition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    /// Malformed path
    #[error("invalid path: {0}")]
    Path(#[from] crate::path::PathError),

    /// Default value has the wrong shape
    #[error("field '{path}': default is {actual}, kind expects {expected}")]
    DefaultShapeMismatch {
        path: String,
        expected: ValueShape,
        actual: ValueShape,
    },

    /// Choice field without options
    #[error("field '{0}': choice kind requires options")]
    NoOptions(String),

    /// Two options share a value
    #[error("field '{path}': duplicate option value '{value}'")]
    DuplicateOption { path: String, value: String },

    /// min > max
    #[error("field '{0}': lower bound exceeds upper bound")]
    InvertedBounds(String),

    /// Splitter is neither a single character nor `Enter`
    #[error("invalid chip splitter '{0}'")]
    InvalidSplitter(String),
}
