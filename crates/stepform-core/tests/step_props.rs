//! Property tests for step partitions and gating

use proptest::prelude::*;
use std::collections::BTreeSet;
use stepform_core::{FormEngine, FormError, Step, StepPlan};
use stepform_schema::{FieldDescriptor, FieldKind, FieldPath, FormValueTree, TextProps};
use stepform_test_utils::{path, RecordingSubmitHandler};

fn text(name: &str) -> FieldDescriptor {
    FieldDescriptor::parse(name, FieldKind::text(), name).unwrap()
}

/// Assign each name to the step given by the matching entry of `owners`
fn partition(names: &[String], owners: &[usize], step_count: usize) -> Vec<Step> {
    let mut steps: Vec<Step> = (0..step_count).map(|i| Step::new(format!("Step {i}"))).collect();
    for (name, owner) in names.iter().zip(owners.iter().cycle()) {
        let step = &mut steps[owner % step_count];
        step.fields.push(text(name));
    }
    steps
}

proptest! {
    #[test]
    fn prop_partition_covers_each_field_once(
        names in proptest::collection::btree_set("[a-z]{1,8}", 1..20),
        owners in proptest::collection::vec(0..6usize, 1..20),
        step_count in 1..6usize,
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let plan = StepPlan::new(partition(&names, &owners, step_count)).unwrap();

        let mut seen = Vec::new();
        for step in plan.steps() {
            seen.extend(step.paths().map(ToString::to_string));
        }
        prop_assert_eq!(seen.len(), names.len());
        let seen: BTreeSet<String> = seen.into_iter().collect();
        let expected: BTreeSet<String> = names.iter().cloned().collect();
        prop_assert_eq!(seen, expected);

        for (index, step) in plan.steps().iter().enumerate() {
            for p in step.paths() {
                prop_assert_eq!(plan.step_of(p), Some(index));
            }
        }
    }

    #[test]
    fn prop_repeated_field_rejected(
        names in proptest::collection::btree_set("[a-z]{1,8}", 1..10),
        step_count in 1..4usize,
        pick in 0..10usize,
        into in 0..4usize,
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let mut steps = partition(&names, &[0, 1, 2, 3], step_count);
        let repeated = &names[pick % names.len()];
        steps[into % step_count].fields.push(text(repeated));

        let err = StepPlan::new(steps).unwrap_err();
        prop_assert!(
            matches!(err, FormError::DuplicateField { ref path, .. } if path == repeated),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn prop_next_never_passes_invalid_title(title in "[a-z]{0,12}") {
        let bounded = FieldDescriptor::parse(
            "title",
            FieldKind::Text(TextProps { min_length: Some(3), max_length: Some(8), pattern: None }),
            "Title",
        )
        .unwrap()
        .required();
        let steps = vec![Step::new("A").with_field(bounded), Step::new("B")];
        let defaults = FormValueTree::new().with("title", title.as_str()).unwrap();
        let engine = FormEngine::builder(steps, defaults, RecordingSubmitHandler::new().shared())
            .build()
            .unwrap();

        let valid = (3..=8).contains(&title.chars().count());
        let moved = engine.next().is_ok();
        prop_assert_eq!(moved, valid);
        prop_assert_eq!(engine.current_step_index(), usize::from(valid));
        prop_assert_eq!(engine.error_for(&path("title")).is_some(), !valid);
    }

    #[test]
    fn prop_previous_never_records_errors(backs in 1..6usize) {
        let steps = vec![
            Step::new("A").with_field(text("a").required()),
            Step::new("B").with_field(text("b").required()),
        ];
        let defaults = FormValueTree::new().with("a", "x").and_then(|t| t.with("b", "")).unwrap();
        let engine = FormEngine::builder(steps, defaults, RecordingSubmitHandler::new().shared())
            .build()
            .unwrap();
        engine.next().unwrap();
        engine.set_value(&FieldPath::parse("a").unwrap(), "").unwrap();
        for _ in 0..backs {
            engine.previous();
        }
        prop_assert_eq!(engine.current_step_index(), 0);
        prop_assert!(engine.errors().is_empty());
    }
}
