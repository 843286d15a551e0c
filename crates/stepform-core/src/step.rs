//! Steps and step-gated navigation
//!
//! A [`StepPlan`] partitions the descriptor set into ordered [`Step`]s, each field
//! in exactly one step. The [`StepController`] walks the plan: moving forward
//! validates only the current step, moving back never validates. The controller
//! reads the value tree; it never writes it.

use crate::error::{FormError, StepGateError};
use indexmap::IndexMap;
use stepform_schema::{FieldDescriptor, FieldErrors, FieldPath, FormValueTree, ValidationSchema};

/// A named, ordered subset of fields
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Heading
    pub title: String,
    /// Optional explanatory text
    pub description: Option<String>,
    /// Fields shown on this step, in display order
    pub fields: Vec<FieldDescriptor>,
}

impl Step {
    /// Create an empty step
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Paths of this step's fields
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.fields.iter().map(|f| &f.path)
    }
}

/// Validated partition of the descriptor set into steps
#[derive(Debug, Clone)]
pub struct StepPlan {
    steps: Vec<Step>,
    owner: IndexMap<FieldPath, usize>,
}

impl StepPlan {
    /// Build a plan
    ///
    /// # Errors
    /// - `FormError::NoSteps` for an empty list
    /// - `FormError::DuplicateField` when a path appears twice, in one step or across steps
    pub fn new(steps: Vec<Step>) -> Result<Self, FormError> {
        if steps.is_empty() {
            return Err(FormError::NoSteps);
        }
        let mut owner = IndexMap::new();
        for (index, step) in steps.iter().enumerate() {
            for path in step.paths() {
                if let Some(first) = owner.insert(path.clone(), index) {
                    return Err(FormError::DuplicateField {
                        path: path.to_string(),
                        first,
                        second: index,
                    });
                }
            }
        }
        Ok(Self { steps, owner })
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a plan has at least one step
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step at `index`
    #[inline]
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// All descriptors in step order
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    /// Descriptor of a path
    #[must_use]
    pub fn descriptor(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        let index = *self.owner.get(path)?;
        self.steps[index].fields.iter().find(|f| &f.path == path)
    }

    /// Index of the step owning a path
    #[inline]
    #[must_use]
    pub fn step_of(&self, path: &FieldPath) -> Option<usize> {
        self.owner.get(path).copied()
    }

    /// Every tracked path, in step order
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.owner.keys()
    }

    /// Value tree assembled from the descriptors' own defaults
    ///
    /// # Errors
    /// Returns error if two paths overlap
    pub fn defaults(&self) -> Result<FormValueTree, FormError> {
        let mut tree = FormValueTree::new();
        for descriptor in self.descriptors() {
            tree.insert(descriptor.path.clone(), descriptor.default.clone())?;
        }
        Ok(tree)
    }
}

/// Integer step index in `[0, N-1]` gated by per-step validation
#[derive(Debug, Clone)]
pub struct StepController {
    plan: StepPlan,
    schema: ValidationSchema,
    index: usize,
}

impl StepController {
    /// Start at the first step
    #[must_use]
    pub fn new(plan: StepPlan, schema: ValidationSchema) -> Self {
        Self {
            plan,
            schema,
            index: 0,
        }
    }

    /// Current step index
    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.plan.len()
    }

    /// Current step
    #[must_use]
    pub fn current_step(&self) -> &Step {
        &self.plan.steps()[self.index]
    }

    /// Whether the current step is the last one
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.plan.len()
    }

    /// Underlying plan
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    /// Validation rules
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// Validate the current step's fields only
    ///
    /// # Errors
    /// Returns the failing fields of the current step
    pub fn validate_current(&self, tree: &FormValueTree) -> Result<(), FieldErrors> {
        self.schema.validate_fields(self.current_step().paths(), tree)
    }

    /// Validate every field
    ///
    /// # Errors
    /// Returns every failing field
    pub fn validate_all(&self, tree: &FormValueTree) -> Result<(), FieldErrors> {
        self.schema.validate(tree)
    }

    /// Advance if the current step validates
    ///
    /// At the last step a passing validation leaves the index unchanged.
    ///
    /// # Errors
    /// Returns `StepGateError::Invalid` with the step's failures; the index is untouched
    pub fn next(&mut self, tree: &FormValueTree) -> Result<usize, StepGateError> {
        if let Err(errors) = self.validate_current(tree) {
            tracing::debug!(step = self.index, errors = errors.len(), "step gate closed");
            return Err(StepGateError::Invalid {
                step: self.index,
                errors,
            });
        }
        let from = self.index;
        self.index = (self.index + 1).min(self.plan.len() - 1);
        tracing::debug!(from, to = self.index, "step advanced");
        Ok(self.index)
    }

    /// Step back without validating
    pub fn previous(&mut self) -> usize {
        let from = self.index;
        self.index = self.index.saturating_sub(1);
        tracing::debug!(from, to = self.index, "step back");
        self.index
    }

    /// Jump back to an earlier (or the current) step without validating
    ///
    /// # Errors
    /// - `OutOfRange` when the target does not exist
    /// - `Forward` when the target lies ahead of the current step
    pub fn go_to(&mut self, target: usize) -> Result<usize, StepGateError> {
        if target >= self.plan.len() {
            return Err(StepGateError::OutOfRange {
                target,
                count: self.plan.len(),
            });
        }
        if target > self.index {
            return Err(StepGateError::Forward {
                current: self.index,
                target,
            });
        }
        self.index = target;
        Ok(target)
    }

    /// Back to the first step
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepform_schema::{FieldKind, SchemaSynthesizer};

    fn text(path: &str) -> FieldDescriptor {
        FieldDescriptor::parse(path, FieldKind::text(), path).unwrap()
    }

    fn plan() -> StepPlan {
        StepPlan::new(vec![
            Step::new("Basics").with_field(text("title").required()),
            Step::new("Details").with_field(text("summary")),
            Step::new("Review"),
        ])
        .unwrap()
    }

    fn controller() -> (StepController, FormValueTree) {
        let plan = plan();
        let defaults = plan.defaults().unwrap();
        let descriptors: Vec<_> = plan.descriptors().cloned().collect();
        let schema = SchemaSynthesizer::new().synthesize(&defaults, &descriptors).unwrap();
        (StepController::new(plan, schema), defaults)
    }

    #[test]
    fn plan_rejects_empty_and_duplicates() {
        assert_eq!(StepPlan::new(vec![]).unwrap_err(), FormError::NoSteps);

        let err = StepPlan::new(vec![
            Step::new("A").with_field(text("title")),
            Step::new("B").with_field(text("title")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            FormError::DuplicateField {
                path: "title".into(),
                first: 0,
                second: 1
            }
        );
    }

    #[test]
    fn plan_lookup() {
        let plan = plan();
        let summary = FieldPath::parse("summary").unwrap();
        assert_eq!(plan.step_of(&summary), Some(1));
        assert_eq!(plan.descriptor(&summary).map(|d| d.label.as_str()), Some("summary"));
        assert_eq!(plan.paths().count(), 2);
    }

    #[test]
    fn next_is_gated_and_clamped() {
        let (mut ctl, mut tree) = controller();
        let err = ctl.next(&tree).unwrap_err();
        assert_eq!(ctl.current_index(), 0);
        assert_eq!(err.field_errors().map(FieldErrors::len), Some(1));

        tree.set(&FieldPath::parse("title").unwrap(), "A".into()).unwrap();
        assert_eq!(ctl.next(&tree), Ok(1));
        assert_eq!(ctl.next(&tree), Ok(2));
        assert!(ctl.is_last());
        assert_eq!(ctl.next(&tree), Ok(2));
    }

    #[test]
    fn previous_and_go_to_never_validate() {
        let (mut ctl, mut tree) = controller();
        tree.set(&FieldPath::parse("title").unwrap(), "A".into()).unwrap();
        ctl.next(&tree).unwrap();
        ctl.next(&tree).unwrap();

        tree.set(&FieldPath::parse("title").unwrap(), "".into()).unwrap();
        assert_eq!(ctl.previous(), 1);
        assert_eq!(ctl.go_to(0), Ok(0));
        assert_eq!(ctl.previous(), 0);
        assert_eq!(ctl.go_to(2), Err(StepGateError::Forward { current: 0, target: 2 }));
        assert_eq!(ctl.go_to(7), Err(StepGateError::OutOfRange { target: 7, count: 3 }));
    }
}
