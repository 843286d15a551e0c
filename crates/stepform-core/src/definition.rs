//! Wizard definitions
//!
//! A [`WizardDefinition`] is the serialized form of a wizard: ordered steps of
//! field definitions plus optional engine settings. The format is picked from the
//! file extension (`toml`, `yaml`/`yml`, `json`).
//!
//! ```toml
//! [engine]
//! validation_mode = "on_touched"
//!
//! [[steps]]
//! title = "Basics"
//!
//! [[steps.fields]]
//! path = "title"
//! label = "Title"
//! kind = "text"
//! required = true
//! max_length = 120
//! ```
//!
//! Date values are written as quoted `YYYY-MM-DD` strings in every format.

use crate::config::EngineConfig;
use crate::engine::{FormEngine, FormEngineBuilder};
use crate::error::{ConfigError, FormError};
use crate::step::Step;
use crate::submit::SubmitHandler;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use stepform_schema::{DescriptorError, FieldDescriptor, FieldKind, FieldPath, FieldValue, FormValueTree};

/// Serialization format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    /// TOML document
    Toml,
    /// YAML document
    Yaml,
    /// JSON document
    Json,
}

impl DefinitionFormat {
    /// Pick the format from a file extension
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` for any other extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }

    /// Lower-case name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// One field as written in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Dot path into the value tree
    pub path: String,
    /// Display label
    pub label: String,
    /// Input placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Reject empty values
    #[serde(default)]
    pub required: bool,
    /// Initial value; the kind's empty value when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// `kind` tag plus kind-specific properties
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Turn into a checked descriptor
    ///
    /// # Errors
    /// Returns error for a malformed path, a default that does not fit the kind,
    /// or inconsistent kind properties
    pub fn to_descriptor(&self) -> Result<FieldDescriptor, ConfigError> {
        let path = FieldPath::parse(&self.path).map_err(DescriptorError::from)?;
        let mut descriptor = FieldDescriptor::new(path, self.kind.clone(), self.label.clone());
        descriptor.placeholder.clone_from(&self.placeholder);
        descriptor.required = self.required;
        if let Some(raw) = &self.default {
            let value = FieldValue::from_json(raw, &descriptor.path)?;
            descriptor.default = value.coerce(self.kind.shape(), &descriptor.path)?;
        }
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// One step as written in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Heading
    pub title: String,
    /// Explanatory text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in display order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Serialized wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardDefinition {
    /// Wizard name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered steps
    pub steps: Vec<StepDefinition>,
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl WizardDefinition {
    /// Load from a file, picking the format from its extension
    ///
    /// # Errors
    /// `UnsupportedFormat`, `Io` or `Parse`
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = DefinitionFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let definition = Self::from_str(&content, format)?;
        tracing::debug!(path = %path.display(), format = format.name(), steps = definition.steps.len(), "loaded wizard definition");
        Ok(definition)
    }

    /// Parse a document
    ///
    /// # Errors
    /// Returns `Parse` with the deserializer's message
    pub fn from_str(content: &str, format: DefinitionFormat) -> Result<Self, ConfigError> {
        let parsed = match format {
            DefinitionFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            DefinitionFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DefinitionFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| ConfigError::Parse {
            format: format.name(),
            reason,
        })
    }

    /// Resolve into steps, defaults and engine settings
    ///
    /// # Errors
    /// Returns the first invalid field or overlapping path
    pub fn compile(&self) -> Result<Wizard, ConfigError> {
        let mut defaults = FormValueTree::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for step_def in &self.steps {
            let mut step = Step::new(step_def.title.clone());
            step.description.clone_from(&step_def.description);
            for field in &step_def.fields {
                let descriptor = field.to_descriptor()?;
                defaults.insert(descriptor.path.clone(), descriptor.default.clone())?;
                step = step.with_field(descriptor);
            }
            steps.push(step);
        }
        Ok(Wizard {
            title: self.title.clone(),
            steps,
            defaults,
            config: self.engine.clone(),
        })
    }
}

/// Compiled wizard, ready to build an engine
#[derive(Debug, Clone)]
pub struct Wizard {
    /// Wizard name
    pub title: Option<String>,
    /// Ordered steps
    pub steps: Vec<Step>,
    /// Initial value tree
    pub defaults: FormValueTree,
    /// Engine settings
    pub config: EngineConfig,
}

impl Wizard {
    /// Engine builder preloaded with this wizard
    #[must_use]
    pub fn builder(self, handler: Arc<dyn SubmitHandler>) -> FormEngineBuilder {
        FormEngine::builder(self.steps, self.defaults, handler).with_config(self.config)
    }

    /// Build the engine directly
    ///
    /// # Errors
    /// See [`FormEngineBuilder::build`]
    pub fn build_engine(self, handler: Arc<dyn SubmitHandler>) -> Result<FormEngine, FormError> {
        self.builder(handler).build()
    }
}
