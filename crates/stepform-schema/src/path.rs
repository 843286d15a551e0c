//! Field paths for addressing leaves of a form value tree
//!
//! Provides [`FieldPath`], the dot-separated key every descriptor, value and rule
//! is registered under.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of a field inside the form value tree
///
/// # Examples
/// - `["title"]` → `title`
/// - `["license", "name"]` → `license.name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from already validated segments
    ///
    /// # Errors
    /// Returns error if the list is empty or a segment is malformed
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for seg in &segments {
            validate_segment(seg)?;
        }
        Ok(Self(segments))
    }

    /// Parse a dot-separated path
    ///
    /// # Errors
    /// Same as [`FromStr`]
    #[inline]
    pub fn parse(s: &str) -> Result<Self, PathError> {
        s.parse()
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a field path has at least one segment
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get last segment
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Get parent path (if nested)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning new path
    ///
    /// # Errors
    /// Returns error if the segment is malformed
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut new = self.clone();
        new.0.push(segment);
        Ok(new)
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `license` is prefix of `license.name`
    /// - `license` is NOT prefix of `licenses`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if paths overlap (one is prefix of other)
    ///
    /// Two leaves of one tree must never overlap: `a` cannot be both a value and
    /// the parent of `a.b`.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn validate_segment(seg: &str) -> Result<(), PathError> {
    if seg.is_empty() {
        Err(PathError::EmptySegment)
    } else if seg.contains(|c: char| !c.is_alphanumeric() && c != '_') {
        Err(PathError::InvalidSegment(seg.to_string()))
    } else {
        Ok(())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| validate_segment(seg).map(|()| seg.to_string()))
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path has no segments
    #[error("field path is empty")]
    Empty,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_str_valid() {
        let path: FieldPath = "license.name".parse().unwrap();
        assert_eq!(path.segments(), &["license", "name"]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.leaf(), "name");
    }

    #[test]
    fn path_from_str_empty() {
        let result: Result<FieldPath, _> = "".parse();
        assert_eq!(result, Err(PathError::Empty));
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<FieldPath, _> = "a..b".parse();
        assert_eq!(result, Err(PathError::EmptySegment));
    }

    #[test]
    fn path_from_str_invalid_chars() {
        let result: Result<FieldPath, _> = "a.b-c".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn path_parent_and_child() {
        let path = FieldPath::parse("license").unwrap();
        assert!(path.parent().is_none());

        let child = path.child("name").unwrap();
        assert_eq!(child.to_string(), "license.name");
        assert_eq!(child.parent(), Some(path));
    }

    #[test]
    fn path_overlaps() {
        let a = FieldPath::parse("a.b").unwrap();
        let b = FieldPath::parse("a.b.c").unwrap();
        let c = FieldPath::parse("a.x").unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn path_serde_as_string() {
        let path = FieldPath::parse("authors.primary").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"authors.primary\"");

        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
