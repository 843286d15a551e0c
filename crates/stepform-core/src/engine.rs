//! Form engine facade
//!
//! [`FormEngine`] composes the step plan, the synthesized schema, the renderer
//! registry and the submit handler around the single mutable value tree.
//!
//! # State
//! - The value tree persists across navigation; values are never step-scoped
//! - Field errors are a projection of the last validation run, keyed by path
//! - At most one submission is in flight; `next` is refused while it is
//!
//! Widgets write through the engine's [`FieldBinding`] implementation, so every
//! mutation is shape-checked and observed by the validation mode.

use crate::config::EngineConfig;
use crate::error::{FormError, StepGateError, SubmitError};
use crate::step::{Step, StepController, StepPlan};
use crate::submit::SubmitHandler;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stepform_render::{FieldBinding, FieldRendererRegistry, FieldWidget, SearchProvider};
use stepform_schema::{
    FieldDescriptor, FieldError, FieldErrors, FieldKind, FieldPath, FieldValue, FormValueTree,
    ValidationSchema, ValueError,
};
use stepform_upload::UploadSession;

/// Builder for [`FormEngine`]
pub struct FormEngineBuilder {
    steps: Vec<Step>,
    defaults: FormValueTree,
    handler: Arc<dyn SubmitHandler>,
    schema: Option<ValidationSchema>,
    config: EngineConfig,
    searches: Vec<(FieldPath, Arc<dyn SearchProvider>)>,
}

impl fmt::Debug for FormEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngineBuilder")
            .field("steps", &self.steps.len())
            .field("defaults", &self.defaults.len())
            .field("schema_override", &self.schema.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FormEngineBuilder {
    /// Use an externally supplied schema instead of synthesizing one
    ///
    /// Its field set must equal the descriptor set.
    #[must_use]
    pub fn with_schema(mut self, schema: ValidationSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the search provider of a remote combobox
    #[must_use]
    pub fn with_search(mut self, path: FieldPath, provider: Arc<dyn SearchProvider>) -> Self {
        self.searches.push((path, provider));
        self
    }

    /// Validate the plan and defaults, derive the schema, build the engine
    ///
    /// # Errors
    /// - `NoSteps`, `DuplicateField` for a bad partition
    /// - `Value` when a default cannot take its field's shape
    /// - `Schema` when defaults and descriptors disagree
    /// - `SchemaMismatch` when an override does not cover exactly the descriptor set
    pub fn build(self) -> Result<FormEngine, FormError> {
        let plan = StepPlan::new(self.steps)?;
        let defaults = coerce_defaults(&plan, self.defaults)?;

        let descriptors: Vec<FieldDescriptor> = plan.descriptors().cloned().collect();
        let synthesized = self.config.synthesizer().synthesize(&defaults, &descriptors)?;
        let schema = match self.schema {
            Some(schema) => {
                check_override(&plan, &schema)?;
                schema
            }
            None => synthesized,
        };

        let mut registry = FieldRendererRegistry::new(self.config.render_config());
        for (path, provider) in self.searches {
            registry.register_search(path, provider);
        }

        tracing::debug!(
            steps = plan.len(),
            fields = schema.len(),
            mode = ?self.config.validation_mode,
            "form engine built"
        );

        Ok(FormEngine {
            state: Mutex::new(FormState {
                values: defaults.clone(),
                errors: FieldErrors::new(),
                touched: IndexSet::new(),
                controller: StepController::new(plan, schema),
                submission_error: None,
            }),
            defaults,
            registry,
            handler: self.handler,
            config: self.config,
            submitting: AtomicBool::new(false),
        })
    }
}

fn coerce_defaults(plan: &StepPlan, defaults: FormValueTree) -> Result<FormValueTree, FormError> {
    let mut coerced = FormValueTree::new();
    for (path, value) in &defaults {
        let value = match plan.descriptor(path) {
            Some(descriptor) => value.clone().coerce(descriptor.kind.shape(), path)?,
            // Left for synthesis to reject as unmatched
            None => value.clone(),
        };
        coerced.insert(path.clone(), value)?;
    }
    Ok(coerced)
}

fn check_override(plan: &StepPlan, schema: &ValidationSchema) -> Result<(), FormError> {
    let fields: BTreeSet<String> = plan.paths().map(ToString::to_string).collect();
    let keys: BTreeSet<String> = schema.keys().map(ToString::to_string).collect();
    if fields == keys {
        return Ok(());
    }
    Err(FormError::SchemaMismatch {
        missing: fields.difference(&keys).cloned().collect(),
        extra: keys.difference(&fields).cloned().collect(),
    })
}

struct FormState {
    values: FormValueTree,
    errors: FieldErrors,
    touched: IndexSet<FieldPath>,
    controller: StepController,
    submission_error: Option<String>,
}

impl FormState {
    fn revalidate(&mut self, path: &FieldPath) {
        match self.controller.schema().validate_field(path, &self.values) {
            Ok(()) => {
                self.errors.remove(path);
            }
            Err(error) => self.errors.insert(error),
        }
    }
}

/// Clears the in-flight flag when the submission settles or is dropped
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Multi-step form engine
pub struct FormEngine {
    config: EngineConfig,
    defaults: FormValueTree,
    registry: FieldRendererRegistry,
    handler: Arc<dyn SubmitHandler>,
    state: Mutex<FormState>,
    submitting: AtomicBool,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("current_step", &self.current_step_index())
            .field("step_count", &self.step_count())
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

impl FormEngine {
    /// Start building an engine
    #[must_use]
    pub fn builder(steps: Vec<Step>, defaults: FormValueTree, handler: Arc<dyn SubmitHandler>) -> FormEngineBuilder {
        FormEngineBuilder {
            steps,
            defaults,
            handler,
            schema: None,
            config: EngineConfig::default(),
            searches: Vec::new(),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- navigation ----

    /// Validate the current step and advance on success
    ///
    /// On failure the step's errors replace whatever was shown for its fields and
    /// the index stays put. At the last step a passing check does not move.
    ///
    /// # Errors
    /// - `StepGateError::Submitting` while a submission is in flight
    /// - `StepGateError::Invalid` with the failing fields
    pub fn next(&self) -> Result<usize, StepGateError> {
        if self.is_submitting() {
            return Err(StepGateError::Submitting);
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let step_paths: Vec<FieldPath> = state.controller.current_step().paths().cloned().collect();
        state.errors.clear_paths(&step_paths);
        let result = state.controller.next(&state.values);
        if let Err(StepGateError::Invalid { errors, .. }) = &result {
            state.errors.extend(errors.clone());
        }
        result
    }

    /// Step back; never validates
    pub fn previous(&self) -> usize {
        self.state.lock().controller.previous()
    }

    /// Jump back to an earlier step; never validates
    ///
    /// # Errors
    /// `Forward` for a later step, `OutOfRange` for a missing one
    pub fn go_to_step(&self, index: usize) -> Result<usize, StepGateError> {
        self.state.lock().controller.go_to(index)
    }

    // ---- submission ----

    /// Validate every field and hand the tree to the submit handler
    ///
    /// A failing handler sets [`FormEngine::submission_error`] to the configured
    /// message; the data and the step index are kept and nothing is retried.
    ///
    /// # Errors
    /// - `InFlight` if another submission has not settled
    /// - `NotAtFinalStep` before the last step
    /// - `Invalid` when full validation fails; the handler is not called
    /// - the handler's own error
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let Some(_in_flight) = SubmitGuard::acquire(&self.submitting) else {
            tracing::debug!("submit ignored, already in flight");
            return Err(SubmitError::InFlight);
        };

        let data = {
            let mut state = self.state.lock();
            if !state.controller.is_last() {
                return Err(SubmitError::NotAtFinalStep {
                    current: state.controller.current_index(),
                    last: state.controller.step_count() - 1,
                });
            }
            state.submission_error = None;
            if let Err(errors) = state.controller.validate_all(&state.values) {
                tracing::debug!(errors = errors.len(), "submit blocked by validation");
                state.errors = errors.clone();
                return Err(SubmitError::Invalid(errors));
            }
            state.errors = FieldErrors::new();
            state.values.clone()
        };

        tracing::info!(fields = data.len(), "submitting form");
        match self.handler.submit(data).await {
            Ok(()) => {
                tracing::info!("form submitted");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "form submission failed");
                self.state.lock().submission_error = Some(self.config.submission_error_message.clone());
                Err(error)
            }
        }
    }

    /// Whether a submission is in flight
    #[inline]
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Banner text of the last failed submission
    #[must_use]
    pub fn submission_error(&self) -> Option<String> {
        self.state.lock().submission_error.clone()
    }

    // ---- step state ----

    /// Current step index
    #[must_use]
    pub fn current_step_index(&self) -> usize {
        self.state.lock().controller.current_index()
    }

    /// Number of steps
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.state.lock().controller.step_count()
    }

    /// Current step
    #[must_use]
    pub fn current_step(&self) -> Step {
        self.state.lock().controller.current_step().clone()
    }

    /// Descriptors of the current step
    #[must_use]
    pub fn current_step_fields(&self) -> Vec<FieldDescriptor> {
        self.state.lock().controller.current_step().fields.clone()
    }

    /// Whether the current step would pass `next`, computed against live values
    #[must_use]
    pub fn is_current_step_valid(&self) -> bool {
        let state = self.state.lock();
        state.controller.validate_current(&state.values).is_ok()
    }

    /// Whether the current step is the last one
    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.state.lock().controller.is_last()
    }

    /// Fraction of steps completed, in `[0, 1)`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let state = self.state.lock();
        state.controller.current_index() as f64 / state.controller.step_count() as f64
    }

    /// Descriptor of a field
    #[must_use]
    pub fn descriptor(&self, path: &FieldPath) -> Option<FieldDescriptor> {
        self.state.lock().controller.plan().descriptor(path).cloned()
    }

    // ---- values ----

    /// Write a field value
    ///
    /// The value is coerced to the field's shape. Depending on the validation mode
    /// the field is revalidated; a field already showing an error always is.
    ///
    /// # Errors
    /// `Value` for untracked paths or values that do not fit the field
    pub fn set_value(&self, path: &FieldPath, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.write(path, value.into())?;
        Ok(())
    }

    fn write(&self, path: &FieldPath, value: FieldValue) -> Result<(), ValueError> {
        let mut state = self.state.lock();
        let shape = state
            .controller
            .plan()
            .descriptor(path)
            .map(|d| d.kind.shape())
            .ok_or_else(|| ValueError::UnknownField(path.to_string()))?;
        let value = value.coerce(shape, path)?;
        state.values.set(path, value)?;

        let touched = state.touched.contains(path);
        if self.config.validation_mode.validates_on_change(touched) || state.errors.get(path).is_some() {
            state.revalidate(path);
        }
        Ok(())
    }

    /// Mark a field as blurred
    pub fn touch(&self, path: &FieldPath) {
        let mut state = self.state.lock();
        if !state.controller.plan().paths().any(|p| p == path) {
            return;
        }
        state.touched.insert(path.clone());
        if self.config.validation_mode.validates_on_blur() {
            state.revalidate(path);
        }
    }

    /// Whether a field was blurred at least once
    #[must_use]
    pub fn is_touched(&self, path: &FieldPath) -> bool {
        self.state.lock().touched.contains(path)
    }

    /// Snapshot of the value tree
    #[must_use]
    pub fn values(&self) -> FormValueTree {
        self.state.lock().values.clone()
    }

    /// Value of one field
    #[must_use]
    pub fn value(&self, path: &FieldPath) -> Option<FieldValue> {
        self.state.lock().values.get(path).cloned()
    }

    /// Errors currently shown
    #[must_use]
    pub fn errors(&self) -> FieldErrors {
        self.state.lock().errors.clone()
    }

    /// Error shown for one field
    #[must_use]
    pub fn error_for(&self, path: &FieldPath) -> Option<FieldError> {
        self.state.lock().errors.get(path).cloned()
    }

    /// Restore defaults, clear errors and touched state, return to the first step
    ///
    /// # Errors
    /// `Submitting` while a submission is in flight
    pub fn reset(&self) -> Result<(), StepGateError> {
        if self.is_submitting() {
            return Err(StepGateError::Submitting);
        }
        let mut state = self.state.lock();
        state.values = self.defaults.clone();
        state.errors = FieldErrors::new();
        state.touched.clear();
        state.controller.reset();
        state.submission_error = None;
        Ok(())
    }

    // ---- uploads ----

    /// Copy an upload session's completed files into a file field
    ///
    /// Files keep the session's insertion order. Items still encoding, or in
    /// error, are not included.
    ///
    /// # Errors
    /// - `NotAFileField` if `path` is not a file field
    /// - `Value` if the path is untracked
    pub fn apply_uploads(&self, path: &FieldPath, session: &UploadSession) -> Result<usize, FormError> {
        match self.descriptor(path) {
            Some(FieldDescriptor {
                kind: FieldKind::File(_),
                ..
            }) => {}
            Some(_) => return Err(FormError::NotAFileField(path.to_string())),
            None => return Err(ValueError::UnknownField(path.to_string()).into()),
        }
        let files = session.completed_files();
        let count = files.len();
        self.write(path, FieldValue::Files(files))?;
        tracing::debug!(%path, files = count, "applied uploads");
        Ok(count)
    }

    // ---- rendering ----

    /// Widget for one field, bound to this engine
    ///
    /// # Errors
    /// `Value` for untracked paths; `Render` when the widget cannot be built
    pub fn render_field(self: &Arc<Self>, path: &FieldPath) -> Result<FieldWidget, FormError> {
        let descriptor = self
            .descriptor(path)
            .ok_or_else(|| ValueError::UnknownField(path.to_string()))?;
        let binding: Arc<dyn FieldBinding> = Arc::clone(self) as Arc<dyn FieldBinding>;
        Ok(self.registry.render(&descriptor, binding)?)
    }

    /// Widgets of the current step, in display order
    ///
    /// # Errors
    /// Returns the first rendering failure
    pub fn render_current_step(self: &Arc<Self>) -> Result<Vec<FieldWidget>, FormError> {
        let fields = self.current_step_fields();
        let binding: Arc<dyn FieldBinding> = Arc::clone(self) as Arc<dyn FieldBinding>;
        Ok(self.registry.render_all(&fields, &binding)?)
    }
}

impl FieldBinding for FormEngine {
    fn value(&self, path: &FieldPath) -> Option<FieldValue> {
        FormEngine::value(self, path)
    }

    fn set_value(&self, path: &FieldPath, value: FieldValue) -> Result<(), ValueError> {
        self.write(path, value)
    }

    fn touch(&self, path: &FieldPath) {
        FormEngine::touch(self, path);
    }

    fn message(&self, path: &FieldPath) -> Option<String> {
        self.state.lock().errors.get(path).map(|e| e.message.clone())
    }
}
