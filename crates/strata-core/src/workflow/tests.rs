use super::PlanArena;
use crate::{
    error::StrataError,
    models::{CommandParameter, CompositePlan, ParameterRef, Plan, PlanId, Value},
};

fn arena_with_steps() -> (PlanArena, PlanId, PlanId, PlanId) {
    let mut arena = PlanArena::new();
    let prepare = arena
        .add_plan(Plan::new("prepare", "python prepare.py"))
        .expect("valid plan");
    arena
        .create_parameter(prepare, CommandParameter::input("raw", "raw.csv"))
        .expect("unique");
    arena
        .create_parameter(prepare, CommandParameter::output("clean", "clean.csv"))
        .expect("unique");

    let train = arena
        .add_plan(Plan::new("train", "python train.py"))
        .expect("valid plan");
    arena
        .create_parameter(train, CommandParameter::input("data", "data.csv"))
        .expect("unique");
    arena
        .create_parameter(train, CommandParameter::parameter("epochs", 10))
        .expect("unique");
    arena
        .create_parameter(train, CommandParameter::output("model", "model.bin"))
        .expect("unique");

    let pipeline = arena
        .add_composite(CompositePlan::new("pipeline"))
        .expect("valid composite");
    arena.add_step(pipeline, prepare).expect("acyclic");
    arena.add_step(pipeline, train).expect("acyclic");

    (arena, pipeline, prepare, train)
}

#[test]
fn test_plan_names_are_validated_and_unique() {
    let mut arena = PlanArena::new();
    arena
        .add_plan(Plan::new("train", "python train.py"))
        .expect("valid plan");

    let duplicate = arena.add_plan(Plan::new("train", "other"));
    assert!(matches!(duplicate, Err(StrataError::InvalidInput { .. })));

    let illegal = arena.add_composite(CompositePlan::new("bad name"));
    assert!(matches!(illegal, Err(StrataError::InvalidInput { .. })));
    assert_eq!(arena.len(), 1);
}

#[test]
fn test_create_parameter_rejects_duplicates() {
    let (mut arena, pipeline, prepare, _) = arena_with_steps();

    let result = arena.create_parameter(prepare, CommandParameter::parameter("clean", "x"));
    assert!(matches!(
        result,
        Err(StrataError::DuplicateParameterName { ref name, .. }) if name == "clean"
    ));

    let on_composite = arena.create_parameter(pipeline, CommandParameter::parameter("p", 1));
    assert!(matches!(on_composite, Err(StrataError::InvalidInput { .. })));
}

#[test]
fn test_add_step_rejects_cycles() {
    let (mut arena, pipeline, _, _) = arena_with_steps();
    let outer = arena
        .add_composite(CompositePlan::new("outer"))
        .expect("valid composite");
    arena.add_step(outer, pipeline).expect("acyclic");

    let self_step = arena.add_step(outer, outer);
    assert!(matches!(self_step, Err(StrataError::CyclicWorkflow { .. })));

    let transitive = arena.add_step(pipeline, outer);
    assert!(matches!(transitive, Err(StrataError::CyclicWorkflow { .. })));

    assert!(arena.contains(outer, pipeline));
    assert!(!arena.contains(pipeline, outer));
}

#[test]
fn test_add_step_rejects_repeated_step() {
    let (mut arena, pipeline, prepare, _) = arena_with_steps();

    let result = arena.add_step(pipeline, prepare);

    assert!(matches!(result, Err(StrataError::InvalidInput { .. })));
}

#[test]
fn test_shared_step_is_not_copied() {
    let (mut arena, pipeline, _, train) = arena_with_steps();
    let retrain = arena
        .add_composite(CompositePlan::new("retrain"))
        .expect("valid composite");
    arena.add_step(retrain, train).expect("acyclic");

    assert_eq!(arena.parents_of(train).len(), 2);
    let names: Vec<&str> = arena
        .leaf_plans(pipeline)
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["prepare", "train"]);
    assert_eq!(arena.leaf_parameters(retrain).len(), 3);
}

#[test]
fn test_add_mapping_validation() {
    let (mut arena, pipeline, prepare, train) = arena_with_steps();

    let mapping = arena
        .add_mapping(
            pipeline,
            "dataset",
            vec![ParameterRef::parameter(prepare, "raw")],
            Some(Value::from("raw-v2.csv")),
        )
        .expect("valid mapping");
    assert_eq!(mapping, ParameterRef::mapping(pipeline, "dataset"));

    let duplicate = arena.add_mapping(
        pipeline,
        "dataset",
        vec![ParameterRef::parameter(train, "epochs")],
        None,
    );
    assert!(matches!(
        duplicate,
        Err(StrataError::DuplicateParameterName { .. })
    ));

    let unknown = arena.add_mapping(
        pipeline,
        "lr",
        vec![ParameterRef::parameter(train, "learning_rate")],
        None,
    );
    assert!(matches!(unknown, Err(StrataError::ParameterNotFound { .. })));
}

#[test]
fn test_add_link_direction() {
    let (mut arena, pipeline, prepare, train) = arena_with_steps();

    let from_input = arena.add_link(
        pipeline,
        ParameterRef::parameter(prepare, "raw"),
        vec![ParameterRef::parameter(train, "data")],
    );
    assert!(matches!(
        from_input,
        Err(StrataError::InvalidLinkDirection { .. })
    ));

    let into_output = arena.add_link(
        pipeline,
        ParameterRef::parameter(prepare, "clean"),
        vec![ParameterRef::parameter(train, "model")],
    );
    assert!(matches!(
        into_output,
        Err(StrataError::InvalidLinkDirection { .. })
    ));

    arena
        .add_link(
            pipeline,
            ParameterRef::parameter(prepare, "clean"),
            vec![ParameterRef::parameter(train, "data")],
        )
        .expect("output to input is valid");
}

#[test]
fn test_add_link_rejects_cycles() {
    let (mut arena, pipeline, prepare, train) = arena_with_steps();
    arena
        .add_link(
            pipeline,
            ParameterRef::parameter(prepare, "clean"),
            vec![ParameterRef::parameter(train, "data")],
        )
        .expect("valid link");

    let back = arena.add_link(
        pipeline,
        ParameterRef::parameter(train, "model"),
        vec![ParameterRef::parameter(prepare, "raw")],
    );
    assert!(matches!(back, Err(StrataError::CyclicWorkflow { .. })));

    let self_link = arena.add_link(
        pipeline,
        ParameterRef::parameter(train, "model"),
        vec![ParameterRef::parameter(train, "epochs")],
    );
    assert!(matches!(self_link, Err(StrataError::CyclicWorkflow { .. })));
}

#[test]
fn test_add_link_requires_direct_children() {
    let (mut arena, pipeline, prepare, train) = arena_with_steps();
    let outer = arena
        .add_composite(CompositePlan::new("outer"))
        .expect("valid composite");
    arena.add_step(outer, pipeline).expect("acyclic");

    let result = arena.add_link(
        outer,
        ParameterRef::parameter(prepare, "clean"),
        vec![ParameterRef::parameter(train, "data")],
    );

    assert!(matches!(result, Err(StrataError::ParameterNotFound { .. })));
}

#[test]
fn test_mapping_over_outputs_is_a_link_source() {
    let (mut arena, pipeline, prepare, train) = arena_with_steps();
    let outer = arena
        .add_composite(CompositePlan::new("outer"))
        .expect("valid composite");
    let evaluate = arena
        .add_plan(Plan::new("evaluate", "python evaluate.py"))
        .expect("valid plan");
    arena
        .create_parameter(evaluate, CommandParameter::input("model", "model.bin"))
        .expect("unique");
    arena.add_step(outer, pipeline).expect("acyclic");
    arena.add_step(outer, evaluate).expect("acyclic");

    let outputs = arena
        .add_mapping(
            pipeline,
            "artifacts",
            vec![ParameterRef::parameter(train, "model")],
            None,
        )
        .expect("valid mapping");
    let mixed = arena
        .add_mapping(
            pipeline,
            "mixed",
            vec![
                ParameterRef::parameter(train, "model"),
                ParameterRef::parameter(prepare, "raw"),
            ],
            None,
        )
        .expect("valid mapping");

    arena
        .add_link(
            outer,
            outputs,
            vec![ParameterRef::parameter(evaluate, "model")],
        )
        .expect("mapping rooted in outputs is a valid source");

    let from_mixed = arena.add_link(
        outer,
        mixed,
        vec![ParameterRef::parameter(evaluate, "model")],
    );
    assert!(matches!(
        from_mixed,
        Err(StrataError::InvalidLinkDirection { .. })
    ));
}

#[test]
fn test_invalidate_frees_name() {
    let (mut arena, pipeline, _, _) = arena_with_steps();

    arena.invalidate(pipeline).expect("known plan");

    assert!(arena.get_by_name("pipeline").is_none());
    assert!(arena.get(pipeline).is_some());
    arena
        .add_composite(CompositePlan::new("pipeline"))
        .expect("name is free again");
}

#[test]
fn test_find_by_name_or_id() {
    let (mut arena, pipeline, prepare, _) = arena_with_steps();

    assert_eq!(arena.find("prepare").map(|p| p.id()).ok(), Some(prepare));
    assert_eq!(
        arena.find(&pipeline.0.to_string()).map(|p| p.id()).ok(),
        Some(pipeline)
    );

    arena.invalidate(pipeline).expect("known plan");
    assert!(arena.find("pipeline").is_err());
    assert_eq!(
        arena.find(&pipeline.0.to_string()).map(|p| p.id()).ok(),
        Some(pipeline)
    );

    match arena.find("999").unwrap_err() {
        StrataError::PlanNotFound { reference } => assert_eq!(reference, "999"),
        other => panic!("Expected PlanNotFound, got {other:?}"),
    }
}
