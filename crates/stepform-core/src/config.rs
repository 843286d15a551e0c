//! Engine configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stepform_render::RenderConfig;
use stepform_schema::{default_date_floor, SchemaSynthesizer};

/// Default banner shown when the submit handler fails
pub const DEFAULT_SUBMISSION_ERROR: &str = "Submission failed. Please try again.";

/// When field-level validation runs outside of `next` and `submit`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Every value change
    OnChange,
    /// Every blur
    OnBlur,
    /// Only when navigating or submitting
    #[default]
    OnSubmit,
    /// First blur, then every change
    OnTouched,
    /// Blur and change
    All,
}

impl ValidationMode {
    /// Whether a value change of a field with the given touched state validates it
    #[must_use]
    pub fn validates_on_change(self, touched: bool) -> bool {
        match self {
            Self::OnChange | Self::All => true,
            Self::OnTouched => touched,
            Self::OnBlur | Self::OnSubmit => false,
        }
    }

    /// Whether a blur validates the field
    #[must_use]
    pub fn validates_on_blur(self) -> bool {
        matches!(self, Self::OnBlur | Self::OnTouched | Self::All)
    }
}

/// Form engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Validation trigger outside of navigation
    pub validation_mode: ValidationMode,
    /// Banner text surfaced when submission fails
    pub submission_error_message: String,
    /// Earliest date accepted when a date field sets no minimum
    pub date_floor: NaiveDate,
    /// Fixed "today"
    ///
    /// `None` reads the local clock: the schema on every validation and the date
    /// picker on every render, so a form left open past midnight accepts the new day.
    pub today: Option<NaiveDate>,
    /// Remote search debounce in milliseconds
    pub search_debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::default(),
            submission_error_message: DEFAULT_SUBMISSION_ERROR.to_string(),
            date_floor: default_date_floor(),
            today: None,
            search_debounce_ms: 300,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With validation mode
    #[inline]
    #[must_use]
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// With submission error banner
    #[inline]
    #[must_use]
    pub fn with_submission_error(mut self, message: impl Into<String>) -> Self {
        self.submission_error_message = message.into();
        self
    }

    /// With a fixed "today"
    #[inline]
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// With date floor
    #[inline]
    #[must_use]
    pub fn with_date_floor(mut self, floor: NaiveDate) -> Self {
        self.date_floor = floor;
        self
    }

    /// With search debounce
    #[inline]
    #[must_use]
    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Synthesizer honoring the date settings
    #[must_use]
    pub fn synthesizer(&self) -> SchemaSynthesizer {
        let synthesizer = SchemaSynthesizer::new().with_date_floor(self.date_floor);
        match self.today {
            Some(today) => synthesizer.with_today(today),
            None => synthesizer,
        }
    }

    /// Renderer settings
    #[must_use]
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            date_floor: self.date_floor,
            today: self.today,
            debounce: Duration::from_millis(self.search_debounce_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.validation_mode, ValidationMode::OnSubmit);
        assert_eq!(config.submission_error_message, DEFAULT_SUBMISSION_ERROR);
        assert_eq!(config.render_config().debounce, Duration::from_millis(300));
    }

    #[test]
    fn partial_config_deserializes() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"validation_mode":"on_touched","today":"2024-06-01"}"#).unwrap();
        assert_eq!(config.validation_mode, ValidationMode::OnTouched);
        assert_eq!(config.synthesizer().today(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(config.date_floor, default_date_floor());
    }

    #[test]
    fn mode_triggers() {
        assert!(ValidationMode::OnChange.validates_on_change(false));
        assert!(!ValidationMode::OnTouched.validates_on_change(false));
        assert!(ValidationMode::OnTouched.validates_on_change(true));
        assert!(!ValidationMode::OnSubmit.validates_on_blur());
        assert!(ValidationMode::All.validates_on_blur());
    }
}
