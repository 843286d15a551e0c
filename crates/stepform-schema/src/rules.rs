//! Executable validation rules
//!
//! A [`ValidationSchema`] holds one [`FieldRule`] per tracked path. Rules are
//! declarative lists of [`Check`]s evaluated in order; the first failing check
//! produces the field's single [`FieldError`]. Failures are values, never panics.

use crate::path::FieldPath;
use crate::value::{FieldValue, FormValueTree, ValueShape};
use chrono::NaiveDate;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// Caller-supplied predicate for custom checks
pub type CustomCheckFn = Arc<dyn Fn(&FieldValue) -> Result<(), String> + Send + Sync>;

/// Machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Value has the wrong shape
    InvalidType,
    /// Empty value on a required field
    Required,
    /// String too short
    TooShort,
    /// String too long
    TooLong,
    /// Not an email address
    InvalidEmail,
    /// Pattern did not match
    PatternMismatch,
    /// Number below minimum
    TooSmall,
    /// Number above maximum
    TooLarge,
    /// Date before lower bound
    TooEarly,
    /// Date after upper bound
    TooLate,
    /// Value not among the options
    InvalidChoice,
    /// Too many list items
    TooMany,
    /// Custom predicate failed
    Custom,
}

/// One declarative check
#[derive(Clone)]
pub enum Check {
    /// Non-empty value; for checkboxes, checked
    Required {
        /// Failure message
        message: String,
    },
    /// Minimum string length in characters
    MinLength(usize),
    /// Maximum string length in characters
    MaxLength(usize),
    /// Email format
    Email,
    /// Whole-value regular expression
    Pattern(Regex),
    /// Inclusive numeric lower bound
    MinValue(f64),
    /// Inclusive numeric upper bound
    MaxValue(f64),
    /// Date must not precede the bound
    NotBefore {
        /// Earliest accepted date
        date: NaiveDate,
        /// Failure message
        message: String,
    },
    /// Date must not follow the bound
    NotAfter {
        /// Latest accepted date
        date: NaiveDate,
        /// Failure message
        message: String,
    },
    /// Date must not follow the local date at validation time
    NotInFuture {
        /// Failure message
        message: String,
    },
    /// Scalar or every list item must be one of these values
    OneOf(Vec<String>),
    /// Maximum list length
    MaxItems(usize),
    /// Caller-supplied predicate
    Custom {
        /// Name shown in debug output
        name: String,
        /// Predicate returning the failure message
        check: CustomCheckFn,
    },
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { .. } => f.write_str("Required"),
            Self::MinLength(n) => write!(f, "MinLength({n})"),
            Self::MaxLength(n) => write!(f, "MaxLength({n})"),
            Self::Email => f.write_str("Email"),
            Self::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Self::MinValue(n) => write!(f, "MinValue({n})"),
            Self::MaxValue(n) => write!(f, "MaxValue({n})"),
            Self::NotBefore { date, .. } => write!(f, "NotBefore({date})"),
            Self::NotAfter { date, .. } => write!(f, "NotAfter({date})"),
            Self::NotInFuture { .. } => f.write_str("NotInFuture"),
            Self::OneOf(values) => write!(f, "OneOf({values:?})"),
            Self::MaxItems(n) => write!(f, "MaxItems({n})"),
            Self::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

impl Check {
    /// Wrap a closure as a custom check
    #[must_use]
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Evaluate against a non-empty value of the right shape
    fn apply(&self, value: &FieldValue) -> Result<(), (ErrorCode, String)> {
        match self {
            Self::Required { message } => {
                let missing = value.is_empty() || value.as_bool() == Some(false);
                fail_if(missing, ErrorCode::Required, || message.clone())
            }
            Self::MinLength(min) => {
                let len = text_len(value);
                fail_if(len < *min, ErrorCode::TooShort, || {
                    format!("Must be at least {min} characters")
                })
            }
            Self::MaxLength(max) => {
                let len = text_len(value);
                fail_if(len > *max, ErrorCode::TooLong, || {
                    format!("Must be at most {max} characters")
                })
            }
            Self::Email => {
                let ok = value.as_text().map_or(false, |s| EMAIL_RE.is_match(s));
                fail_if(!ok, ErrorCode::InvalidEmail, || "Invalid email address".to_string())
            }
            Self::Pattern(re) => {
                let ok = value.as_text().map_or(false, |s| re.is_match(s));
                fail_if(!ok, ErrorCode::PatternMismatch, || "Invalid format".to_string())
            }
            Self::MinValue(min) => {
                let n = value.as_number().unwrap_or(f64::NAN);
                fail_if(n.is_nan() || n < *min, ErrorCode::TooSmall, || {
                    format!("Must be at least {min}")
                })
            }
            Self::MaxValue(max) => {
                let n = value.as_number().unwrap_or(f64::NAN);
                fail_if(n.is_nan() || n > *max, ErrorCode::TooLarge, || {
                    format!("Must be at most {max}")
                })
            }
            Self::NotBefore { date, message } => {
                let early = value.as_date().map_or(false, |d| d < *date);
                fail_if(early, ErrorCode::TooEarly, || message.clone())
            }
            Self::NotAfter { date, message } => {
                let late = value.as_date().map_or(false, |d| d > *date);
                fail_if(late, ErrorCode::TooLate, || message.clone())
            }
            Self::NotInFuture { message } => {
                let today = chrono::Local::now().date_naive();
                let late = value.as_date().map_or(false, |d| d > today);
                fail_if(late, ErrorCode::TooLate, || message.clone())
            }
            Self::OneOf(allowed) => {
                let ok = match value {
                    FieldValue::Text(s) => allowed.contains(s),
                    FieldValue::List(items) => items.iter().all(|i| allowed.contains(i)),
                    _ => false,
                };
                fail_if(!ok, ErrorCode::InvalidChoice, || "Select a valid option".to_string())
            }
            Self::MaxItems(max) => {
                let len = match value {
                    FieldValue::List(items) => items.len(),
                    FieldValue::Files(files) => files.len(),
                    _ => 0,
                };
                fail_if(len > *max, ErrorCode::TooMany, || {
                    format!("At most {max} items allowed")
                })
            }
            Self::Custom { check, .. } => check(value).map_err(|msg| (ErrorCode::Custom, msg)),
        }
    }
}

fn text_len(value: &FieldValue) -> usize {
    value.as_text().map_or(0, |s| s.chars().count())
}

fn fail_if(
    failed: bool,
    code: ErrorCode,
    message: impl FnOnce() -> String,
) -> Result<(), (ErrorCode, String)> {
    if failed {
        Err((code, message()))
    } else {
        Ok(())
    }
}

/// Structured failure of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Failing field
    pub path: FieldPath,
    /// Failure category
    pub code: ErrorCode,
    /// Inline message
    pub message: String,
}

/// Ordered per-field errors; at most one entry per path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(IndexMap<FieldPath, FieldError>);

impl FieldErrors {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, replacing any previous error for the path
    pub fn insert(&mut self, error: FieldError) {
        self.0.insert(error.path.clone(), error);
    }

    /// Drop the error for a path
    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldError> {
        self.0.shift_remove(path)
    }

    /// Drop errors for the given paths
    pub fn clear_paths<'a>(&mut self, paths: impl IntoIterator<Item = &'a FieldPath>) {
        for path in paths {
            self.0.shift_remove(path);
        }
    }

    /// Merge another set in, later entries winning
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Get error by path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldError> {
        self.0.get(path)
    }

    /// Number of failing fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No failures
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in field order
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.values()
    }

    /// Failing paths
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.keys()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .values()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Validation rule of a single field
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Field the rule belongs to
    pub path: FieldPath,
    /// Shape the value must have
    pub shape: ValueShape,
    /// Empty values pass without running checks
    pub optional: bool,
    /// Ordered checks
    pub checks: Vec<Check>,
}

impl FieldRule {
    /// Create an optional rule with no checks
    #[inline]
    #[must_use]
    pub fn new(path: FieldPath, shape: ValueShape) -> Self {
        Self {
            path,
            shape,
            optional: true,
            checks: Vec::new(),
        }
    }

    /// Append a check
    #[inline]
    #[must_use]
    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Validate one value
    ///
    /// # Errors
    /// Returns the first failing check as a [`FieldError`]
    pub fn validate(&self, value: &FieldValue) -> Result<(), FieldError> {
        let fail = |(code, message): (ErrorCode, String)| FieldError {
            path: self.path.clone(),
            code,
            message,
        };

        if let Some(actual) = value.shape() {
            if actual != self.shape {
                return Err(fail((ErrorCode::InvalidType, format!("Expected {}", self.shape))));
            }
        }

        let required = self.checks.iter().any(|c| matches!(c, Check::Required { .. }));
        if value.is_empty() && self.optional && !required {
            return Ok(());
        }

        for check in &self.checks {
            check.apply(value).map_err(fail)?;
            if value.is_empty() {
                // Only presence is meaningful for an empty value
                break;
            }
        }
        Ok(())
    }
}

/// Derived rule set over a form
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    rules: IndexMap<FieldPath, FieldRule>,
}

impl ValidationSchema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a rule
    pub fn insert(&mut self, rule: FieldRule) {
        self.rules.insert(rule.path.clone(), rule);
    }

    /// Append a check to an existing rule
    ///
    /// Returns `false` if no rule exists for the path.
    pub fn with_check(&mut self, path: &FieldPath, check: Check) -> bool {
        match self.rules.get_mut(path) {
            Some(rule) => {
                rule.checks.push(check);
                true
            }
            None => false,
        }
    }

    /// Get rule by path
    #[inline]
    #[must_use]
    pub fn rule(&self, path: &FieldPath) -> Option<&FieldRule> {
        self.rules.get(path)
    }

    /// Paths covered by this schema, in order
    pub fn keys(&self) -> impl Iterator<Item = &FieldPath> {
        self.rules.keys()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if schema has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a single field of the tree
    ///
    /// A path without a rule, or missing from the tree, is reported as an
    /// `InvalidType` failure rather than silently accepted.
    ///
    /// # Errors
    /// Returns the field's error
    pub fn validate_field(&self, path: &FieldPath, tree: &FormValueTree) -> Result<(), FieldError> {
        let Some(rule) = self.rules.get(path) else {
            return Err(FieldError {
                path: path.clone(),
                code: ErrorCode::InvalidType,
                message: "Field has no validation rule".to_string(),
            });
        };
        rule.validate(tree.get(path).unwrap_or(&FieldValue::Null))
    }

    /// Validate a subset of fields
    ///
    /// # Errors
    /// Returns every failing field of the subset, in subset order
    pub fn validate_fields<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a FieldPath>,
        tree: &FormValueTree,
    ) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for path in paths {
            if let Err(e) = self.validate_field(path, tree) {
                errors.insert(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate every field
    ///
    /// # Errors
    /// Returns every failing field
    pub fn validate(&self, tree: &FormValueTree) -> Result<(), FieldErrors> {
        self.validate_fields(self.rules.keys(), tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn required() -> Check {
        Check::Required {
            message: "Title is required".into(),
        }
    }

    #[test]
    fn optional_empty_skips_checks() {
        let rule = FieldRule::new(path("summary"), ValueShape::Text).with_check(Check::MinLength(10));
        assert!(rule.validate(&FieldValue::from("")).is_ok());
        assert!(rule.validate(&FieldValue::from("short")).is_err());
    }

    #[test]
    fn required_reports_single_error() {
        let rule = FieldRule::new(path("title"), ValueShape::Text)
            .with_check(required())
            .with_check(Check::MinLength(1))
            .with_check(Check::MaxLength(5));
        let err = rule.validate(&FieldValue::from("")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Required);
        assert_eq!(err.message, "Title is required");

        let err = rule.validate(&FieldValue::from("too long")).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooLong);
    }

    #[test]
    fn shape_mismatch_is_invalid_type() {
        let rule = FieldRule::new(path("rows"), ValueShape::Number);
        let err = rule.validate(&FieldValue::from("12")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidType);
    }

    #[test]
    fn email_check() {
        let rule = FieldRule::new(path("email"), ValueShape::Text).with_check(Check::Email);
        assert!(rule.validate(&FieldValue::from("ada@example.org")).is_ok());
        assert!(rule.validate(&FieldValue::from("ada@")).is_err());
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let rule = FieldRule::new(path("terms"), ValueShape::Bool).with_check(Check::Required {
            message: "Accept the terms".into(),
        });
        assert!(rule.validate(&FieldValue::Bool(false)).is_err());
        assert!(rule.validate(&FieldValue::Bool(true)).is_ok());
    }

    #[test]
    fn one_of_checks_every_list_item() {
        let rule = FieldRule::new(path("formats"), ValueShape::List)
            .with_check(Check::OneOf(vec!["csv".into(), "json".into()]));
        assert!(rule.validate(&FieldValue::List(vec!["csv".into()])).is_ok());
        assert!(rule
            .validate(&FieldValue::List(vec!["csv".into(), "xls".into()]))
            .is_err());
    }

    #[test]
    fn custom_check_message_surfaces() {
        let rule = FieldRule::new(path("doi"), ValueShape::Text).with_check(Check::custom("doi", |v| {
            match v.as_text() {
                Some(s) if s.starts_with("10.") => Ok(()),
                _ => Err("DOI must start with 10.".to_string()),
            }
        }));
        let err = rule.validate(&FieldValue::from("abc")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Custom);
        assert_eq!(err.message, "DOI must start with 10.");
    }

    #[test]
    fn schema_reports_untracked_path() {
        let schema = ValidationSchema::new();
        let tree = FormValueTree::new();
        let err = schema.validate_field(&path("ghost"), &tree).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidType);
    }
}
