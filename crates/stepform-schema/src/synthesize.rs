//! Schema synthesis
//!
//! Derives a [`ValidationSchema`] from a defaults tree and the descriptor set. Rule
//! construction is an explicit mapping from [`FieldKind`] to checks; the default's
//! runtime shape is only compared against the kind, never used to guess a rule.

use crate::descriptor::{DescriptorError, FieldDescriptor, FieldKind, SearchMode, TextProps};
use crate::path::FieldPath;
use crate::rules::{Check, FieldRule, ValidationSchema};
use crate::value::{FieldValue, FormValueTree, ValueShape};
use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;

/// Earliest date accepted when a date field sets no lower bound
#[must_use]
pub fn default_date_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

const FUTURE_DATE_MESSAGE: &str = "Date cannot be in the future";

/// Pure, deterministic schema builder
#[derive(Debug, Clone)]
pub struct SchemaSynthesizer {
    date_floor: NaiveDate,
    today: Option<NaiveDate>,
}

impl Default for SchemaSynthesizer {
    fn default() -> Self {
        Self {
            date_floor: default_date_floor(),
            today: None,
        }
    }
}

impl SchemaSynthesizer {
    /// Create synthesizer with default date bounds
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix "today" instead of reading the local clock
    #[inline]
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Override the lower date bound used when a field sets none
    #[inline]
    #[must_use]
    pub fn with_date_floor(mut self, floor: NaiveDate) -> Self {
        self.date_floor = floor;
        self
    }

    /// Upper date bound used when a field sets none, as of now
    ///
    /// Without a fixed "today" the synthesized rule reads the clock on every
    /// validation instead of keeping this value.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Lower date bound used when a field sets none
    #[inline]
    #[must_use]
    pub fn date_floor(&self) -> NaiveDate {
        self.date_floor
    }

    /// Build the schema
    ///
    /// The resulting key set equals the key set of `defaults`, in the same order.
    ///
    /// # Errors
    /// - `UnmatchedDefault` when a default has no descriptor
    /// - `MissingDefault` when a descriptor has no default
    /// - `DuplicateDescriptor`, `Descriptor`, `DefaultShapeMismatch`, `InvalidPattern`
    pub fn synthesize(
        &self,
        defaults: &FormValueTree,
        descriptors: &[FieldDescriptor],
    ) -> Result<ValidationSchema, SchemaError> {
        let mut by_path: IndexMap<&FieldPath, &FieldDescriptor> = IndexMap::new();
        for descriptor in descriptors {
            descriptor.validate()?;
            if by_path.insert(&descriptor.path, descriptor).is_some() {
                return Err(SchemaError::DuplicateDescriptor(descriptor.path.to_string()));
            }
        }

        let mut schema = ValidationSchema::new();
        for (path, value) in defaults {
            let Some(descriptor) = by_path.get(path) else {
                return Err(SchemaError::UnmatchedDefault(path.to_string()));
            };
            check_default_shape(descriptor, value)?;
            schema.insert(self.rule_for(descriptor)?);
        }

        if let Some(missing) = by_path.keys().find(|p| !defaults.contains(p)) {
            return Err(SchemaError::MissingDefault(missing.to_string()));
        }

        tracing::debug!(fields = schema.len(), "synthesized validation schema");
        Ok(schema)
    }

    /// Rule for a single descriptor
    ///
    /// # Errors
    /// Returns `InvalidPattern` if a text pattern does not compile
    pub fn rule_for(&self, descriptor: &FieldDescriptor) -> Result<FieldRule, SchemaError> {
        let mut rule = FieldRule::new(descriptor.path.clone(), descriptor.kind.shape());
        rule.optional = !descriptor.required;

        if descriptor.required {
            // For strings this is the min-length-1 rule; for lists and files, non-empty;
            // for checkboxes, checked.
            rule.checks.push(Check::Required {
                message: format!("{} is required", descriptor.label),
            });
        }

        match &descriptor.kind {
            FieldKind::Text(props) | FieldKind::Password(props) => {
                push_text_checks(&mut rule, props, &descriptor.path)?;
            }
            FieldKind::Email(props) => {
                push_text_checks(&mut rule, props, &descriptor.path)?;
                rule.checks.push(Check::Email);
            }
            FieldKind::Textarea(props) => {
                push_lengths(&mut rule, props.min_length, props.max_length);
            }
            FieldKind::Number(props) => {
                if let Some(min) = props.min {
                    rule.checks.push(Check::MinValue(min));
                }
                if let Some(max) = props.max {
                    rule.checks.push(Check::MaxValue(max));
                }
            }
            FieldKind::Select(_) | FieldKind::Radio(_) => {
                rule.checks.push(Check::OneOf(option_values(&descriptor.kind)));
            }
            FieldKind::Combobox(props) => {
                if props.search == SearchMode::Local {
                    rule.checks.push(Check::OneOf(option_values(&descriptor.kind)));
                }
            }
            FieldKind::Checkbox => {}
            FieldKind::Date(props) => {
                let floor = props.min.unwrap_or(self.date_floor);
                let before_message = if props.min.is_some() {
                    format!("Date must be on or after {floor}")
                } else {
                    format!("Date cannot be before {floor}")
                };
                rule.checks.push(Check::NotBefore {
                    date: floor,
                    message: before_message,
                });

                rule.checks.push(match (props.max, self.today) {
                    (Some(max), _) => Check::NotAfter {
                        date: max,
                        message: format!("Date must be on or before {max}"),
                    },
                    (None, Some(today)) => Check::NotAfter {
                        date: today,
                        message: FUTURE_DATE_MESSAGE.to_string(),
                    },
                    // Read at validation time so a long-lived form follows the clock
                    (None, None) => Check::NotInFuture {
                        message: FUTURE_DATE_MESSAGE.to_string(),
                    },
                });
            }
            FieldKind::Chip(props) => {
                if let Some(max) = props.max_items {
                    rule.checks.push(Check::MaxItems(max));
                }
            }
            FieldKind::File(props) => {
                if !props.multiple {
                    rule.checks.push(Check::MaxItems(1));
                }
                if let Some(limit) = props.max_size_bytes {
                    rule.checks.push(Check::custom("max_size", move |value| {
                        match value.as_files().unwrap_or(&[]).iter().find(|f| f.size > limit) {
                            Some(f) => Err(format!("File too large: {}", f.name)),
                            None => Ok(()),
                        }
                    }));
                }
                if !props.accept.is_empty() {
                    let accept: Vec<String> = props.accept.iter().map(|e| e.to_ascii_lowercase()).collect();
                    rule.checks.push(Check::custom("accept", move |value| {
                        let bad = value
                            .as_files()
                            .unwrap_or(&[])
                            .iter()
                            .find(|f| !accept.contains(&extension_of(&f.name)));
                        match bad {
                            Some(f) => Err(format!("File type not allowed: {}", f.name)),
                            None => Ok(()),
                        }
                    }));
                }
            }
        }

        Ok(rule)
    }
}

fn push_text_checks(rule: &mut FieldRule, props: &TextProps, path: &FieldPath) -> Result<(), SchemaError> {
    push_lengths(rule, props.min_length, props.max_length);
    if let Some(pattern) = &props.pattern {
        let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| SchemaError::InvalidPattern {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        rule.checks.push(Check::Pattern(re));
    }
    Ok(())
}

fn push_lengths(rule: &mut FieldRule, min: Option<usize>, max: Option<usize>) {
    if let Some(min) = min {
        rule.checks.push(Check::MinLength(min));
    }
    if let Some(max) = max {
        rule.checks.push(Check::MaxLength(max));
    }
}

fn option_values(kind: &FieldKind) -> Vec<String> {
    kind.options().iter().map(|o| o.value.clone()).collect()
}

fn check_default_shape(descriptor: &FieldDescriptor, value: &FieldValue) -> Result<(), SchemaError> {
    let expected = descriptor.kind.shape();
    match value.shape() {
        Some(actual) if actual != expected => Err(SchemaError::DefaultShapeMismatch {
            path: descriptor.path.to_string(),
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Lower-cased extension of a file name, without the dot
#[must_use]
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Errors raised while synthesizing a schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Descriptor is internally inconsistent
    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Two descriptors share a path
    #[error("duplicate descriptor for '{0}'")]
    DuplicateDescriptor(String),

    /// A default value has no descriptor
    #[error("default for '{0}' has no matching descriptor")]
    UnmatchedDefault(String),

    /// A descriptor has no default value
    #[error("descriptor '{0}' has no default value")]
    MissingDefault(String),

    /// Default value shape differs from the descriptor kind
    #[error("default for '{path}' is {actual}, kind expects {expected}")]
    DefaultShapeMismatch {
        path: String,
        expected: ValueShape,
        actual: ValueShape,
    },

    /// Pattern constraint does not compile
    #[error("invalid pattern for '{path}': {reason}")]
    InvalidPattern { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DateProps, FieldOption, FileProps, NumberProps, SelectProps};
    use crate::rules::ErrorCode;
    use crate::value::FileValue;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn synth() -> SchemaSynthesizer {
        SchemaSynthesizer::new().with_today(today())
    }

    fn defaults_of(descriptors: &[FieldDescriptor]) -> FormValueTree {
        let mut tree = FormValueTree::new();
        for d in descriptors {
            tree.insert(d.path.clone(), d.default.clone()).unwrap();
        }
        tree
    }

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn key_set_follows_defaults() {
        let descriptors = vec![
            FieldDescriptor::parse("title", FieldKind::text(), "Title").unwrap().required(),
            FieldDescriptor::parse("rows", FieldKind::Number(NumberProps::default()), "Rows").unwrap(),
        ];
        let defaults = defaults_of(&descriptors);
        let schema = synth().synthesize(&defaults, &descriptors).unwrap();

        let keys: Vec<_> = schema.keys().cloned().collect();
        let expected: Vec<_> = defaults.keys().cloned().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn unmatched_default_is_hard_error() {
        let descriptors = vec![FieldDescriptor::parse("title", FieldKind::text(), "Title").unwrap()];
        let defaults = defaults_of(&descriptors).with("legacy", "x").unwrap();
        let err = synth().synthesize(&defaults, &descriptors).unwrap_err();
        assert_eq!(err, SchemaError::UnmatchedDefault("legacy".into()));
    }

    #[test]
    fn missing_default_is_hard_error() {
        let descriptors = vec![
            FieldDescriptor::parse("title", FieldKind::text(), "Title").unwrap(),
            FieldDescriptor::parse("notes", FieldKind::text(), "Notes").unwrap(),
        ];
        let defaults = FormValueTree::new().with("title", "").unwrap();
        let err = synth().synthesize(&defaults, &descriptors).unwrap_err();
        assert_eq!(err, SchemaError::MissingDefault("notes".into()));
    }

    #[test]
    fn default_shape_checked_against_kind() {
        let descriptors = vec![FieldDescriptor::parse("rows", FieldKind::Number(NumberProps::default()), "Rows").unwrap()];
        let defaults = FormValueTree::new().with("rows", "ten").unwrap();
        let err = synth().synthesize(&defaults, &descriptors).unwrap_err();
        assert!(matches!(err, SchemaError::DefaultShapeMismatch { .. }));
    }

    #[test]
    fn required_text_rejects_empty() {
        let descriptors = vec![FieldDescriptor::parse("title", FieldKind::text(), "Title").unwrap().required()];
        let defaults = defaults_of(&descriptors);
        let schema = synth().synthesize(&defaults, &descriptors).unwrap();

        let errors = schema.validate(&defaults).unwrap_err();
        assert_eq!(errors.len(), 1);
        let err = errors.get(&path("title")).unwrap();
        assert_eq!(err.code, ErrorCode::Required);
        assert_eq!(err.message, "Title is required");
    }

    #[test]
    fn email_kind_adds_format_check() {
        let descriptors = vec![FieldDescriptor::parse(
            "contact",
            FieldKind::Email(TextProps::default()),
            "Contact",
        )
        .unwrap()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();

        let tree = FormValueTree::new().with("contact", "not-an-email").unwrap();
        let errors = schema.validate(&tree).unwrap_err();
        assert_eq!(errors.get(&path("contact")).unwrap().code, ErrorCode::InvalidEmail);

        // Optional and empty passes
        let empty = FormValueTree::new().with("contact", "").unwrap();
        assert!(schema.validate(&empty).is_ok());
    }

    #[test]
    fn date_defaults_to_floor_and_today() {
        let descriptors = vec![FieldDescriptor::parse("collected", FieldKind::Date(DateProps::default()), "Collected").unwrap()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();

        let early = FormValueTree::new()
            .with("collected", NaiveDate::from_ymd_opt(1899, 12, 31).unwrap())
            .unwrap();
        let err = schema.validate(&early).unwrap_err();
        let e = err.get(&path("collected")).unwrap();
        assert_eq!(e.code, ErrorCode::TooEarly);
        assert_eq!(e.message, "Date cannot be before 1900-01-01");

        let future = FormValueTree::new()
            .with("collected", today().succ_opt().unwrap())
            .unwrap();
        let err = schema.validate(&future).unwrap_err();
        assert_eq!(err.get(&path("collected")).unwrap().message, "Date cannot be in the future");

        let ok = FormValueTree::new().with("collected", today()).unwrap();
        assert!(schema.validate(&ok).is_ok());
    }

    #[test]
    fn pattern_anchors_whole_value() {
        let descriptors = vec![FieldDescriptor::parse(
            "slug",
            FieldKind::Text(TextProps {
                pattern: Some("[a-z-]+".into()),
                ..TextProps::default()
            }),
            "Slug",
        )
        .unwrap()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();
        let ok = FormValueTree::new().with("slug", "weather-data").unwrap();
        let bad = FormValueTree::new().with("slug", "Weather data").unwrap();
        assert!(schema.validate(&ok).is_ok());
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn invalid_pattern_reported() {
        let descriptors = vec![FieldDescriptor::parse(
            "slug",
            FieldKind::Text(TextProps {
                pattern: Some("[".into()),
                ..TextProps::default()
            }),
            "Slug",
        )
        .unwrap()];
        let err = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn select_restricted_to_options() {
        let descriptors = vec![FieldDescriptor::parse(
            "license",
            FieldKind::Select(SelectProps {
                options: vec![FieldOption::new("mit", "MIT")],
                ..SelectProps::default()
            }),
            "License",
        )
        .unwrap()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();
        let bad = FormValueTree::new().with("license", "gpl").unwrap();
        assert_eq!(
            schema.validate(&bad).unwrap_err().get(&path("license")).unwrap().code,
            ErrorCode::InvalidChoice
        );
    }

    #[test]
    fn single_file_field_checks_count_and_extension() {
        let descriptors = vec![FieldDescriptor::parse(
            "data",
            FieldKind::File(FileProps {
                accept: vec!["csv".into()],
                max_size_bytes: None,
                multiple: false,
            }),
            "Data",
        )
        .unwrap()
        .required()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();

        let file = |name: &str| FileValue {
            id: name.into(),
            name: name.into(),
            size: 1,
            data_url: String::new(),
        };
        let mut tree = defaults_of(&descriptors);
        assert_eq!(schema.validate(&tree).unwrap_err().len(), 1);

        tree.set(&path("data"), FieldValue::Files(vec![file("a.xls")])).unwrap();
        let err = schema.validate(&tree).unwrap_err();
        assert_eq!(err.get(&path("data")).unwrap().message, "File type not allowed: a.xls");

        tree.set(&path("data"), FieldValue::Files(vec![file("a.csv"), file("b.csv")])).unwrap();
        assert_eq!(
            schema.validate(&tree).unwrap_err().get(&path("data")).unwrap().code,
            ErrorCode::TooMany
        );

        tree.set(&path("data"), FieldValue::Files(vec![file("a.CSV")])).unwrap();
        assert!(schema.validate(&tree).is_ok());
    }

    #[test]
    fn file_field_enforces_size_ceiling() {
        let descriptors = vec![FieldDescriptor::parse(
            "data",
            FieldKind::File(FileProps {
                accept: vec!["csv".into()],
                max_size_bytes: Some(10 * 1024 * 1024),
                multiple: true,
            }),
            "Data",
        )
        .unwrap()];
        let schema = synth().synthesize(&defaults_of(&descriptors), &descriptors).unwrap();

        let file = |name: &str, size: u64| FileValue {
            id: name.into(),
            name: name.into(),
            size,
            data_url: String::new(),
        };
        let mut tree = defaults_of(&descriptors);
        tree.set(
            &path("data"),
            FieldValue::Files(vec![file("small.csv", 1024), file("big.csv", 15 * 1024 * 1024)]),
        )
        .unwrap();
        let err = schema.validate(&tree).unwrap_err();
        assert_eq!(err.get(&path("data")).unwrap().message, "File too large: big.csv");

        tree.set(&path("data"), FieldValue::Files(vec![file("exact.csv", 10 * 1024 * 1024)]))
            .unwrap();
        assert!(schema.validate(&tree).is_ok());
    }

    #[test]
    fn unfixed_today_is_read_when_validating() {
        let descriptors = vec![FieldDescriptor::parse("collected", FieldKind::Date(DateProps::default()), "Collected").unwrap()];
        let schema = SchemaSynthesizer::new()
            .synthesize(&defaults_of(&descriptors), &descriptors)
            .unwrap();
        let rule = schema.rule(&path("collected")).unwrap();
        assert!(rule.checks.iter().any(|c| matches!(c, Check::NotInFuture { .. })));
        assert!(!rule.checks.iter().any(|c| matches!(c, Check::NotAfter { .. })));

        let now = chrono::Local::now().date_naive();
        let ok = FormValueTree::new().with("collected", now.pred_opt().unwrap()).unwrap();
        assert!(schema.validate(&ok).is_ok());
        let future = FormValueTree::new()
            .with("collected", now + chrono::Days::new(2))
            .unwrap();
        assert_eq!(
            schema.validate(&future).unwrap_err().get(&path("collected")).unwrap().message,
            "Date cannot be in the future"
        );
    }

    #[test]
    fn extension_of_handles_missing_dot() {
        assert_eq!(extension_of("data.CSV"), "csv");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("README"), "");
    }
}
