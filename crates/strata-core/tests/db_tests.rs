use jiff::Timestamp;
use strata_core::{
    models::{
        AbstractPlan, ActivityId, CommandParameter, CompositePlan, NewActivity, ParameterRef,
        Plan, PlanId,
    },
    Database, Gateway, PlanArena, StrataError,
};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

/// A composite with one step and a mapping, registered in an arena so that
/// ids are assigned.
fn sample_arena() -> (PlanArena, PlanId, PlanId) {
    let mut arena = PlanArena::new();
    let plan = Plan::new("clean", "python clean.py")
        .with_description("Drop broken rows")
        .with_parameter(CommandParameter::input("raw", "raw.csv").with_position(1))
        .expect("Failed to add input")
        .with_parameter(CommandParameter::output("out", "clean.csv").with_prefix("--out="))
        .expect("Failed to add output");
    let clean = arena.add_plan(plan).expect("Failed to add plan");
    let group = arena
        .add_composite(CompositePlan::new("group"))
        .expect("Failed to add composite");
    arena.add_step(group, clean).expect("Failed to add step");
    arena
        .add_mapping(
            group,
            "data",
            vec![ParameterRef::parameter(clean, "raw")],
            Some("default.csv".into()),
        )
        .expect("Failed to add mapping");
    (arena, clean, group)
}

fn save_arena(db: &mut Database, arena: &PlanArena) {
    let plans: Vec<AbstractPlan> = arena.iter().cloned().collect();
    db.save_all(&plans).expect("Failed to save plans");
}

#[test]
fn test_database_initialization() {
    let (temp_file, _db) = create_test_db();

    assert!(temp_file.path().exists());
}

#[test]
fn test_reopen_keeps_schema_and_data() {
    let (temp_file, mut db) = create_test_db();
    let (arena, clean, _) = sample_arena();
    save_arena(&mut db, &arena);
    drop(db);

    let db = Database::new(temp_file.path()).expect("Failed to reopen database");

    assert!(db.get_plan(clean).expect("Failed to query").is_some());
}

#[test]
fn test_plan_round_trip() {
    let (_temp_file, mut db) = create_test_db();
    let (arena, clean, group) = sample_arena();
    save_arena(&mut db, &arena);

    let stored = db
        .get_by_id(clean)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert_eq!(Some(&stored), arena.get(clean));

    let stored = db
        .get_by_name("group")
        .expect("Failed to get plan")
        .expect("Composite should exist");
    let composite = stored.as_composite().expect("Should be a composite");
    assert_eq!(composite.id, group);
    assert_eq!(composite.steps, vec![clean]);
    assert_eq!(
        composite.mapping("data").and_then(|m| m.default_value.clone()),
        Some("default.csv".into())
    );
}

#[test]
fn test_runtime_values_are_not_stored() {
    let (_temp_file, mut db) = create_test_db();
    let (mut arena, clean, group) = sample_arena();
    arena
        .resolve(group, &Default::default())
        .expect("Failed to resolve");
    save_arena(&mut db, &arena);

    let loaded = db.load_arena().expect("Failed to load arena");
    let plan = loaded
        .get(clean)
        .and_then(AbstractPlan::as_plan)
        .expect("Plan should exist");

    assert!(!plan.parameter("raw").expect("raw").actual_value_set());
}

#[test]
fn test_invalidated_plans_free_their_name() {
    let (_temp_file, mut db) = create_test_db();
    let (mut arena, clean, group) = sample_arena();
    arena.invalidate(group).expect("Failed to invalidate");
    save_arena(&mut db, &arena);

    assert!(db.get_by_name("group").expect("Failed to query").is_none());
    let removed = db
        .get_plan(group)
        .expect("Failed to query")
        .expect("Removed plans keep their row");
    assert!(removed.invalidated_at().is_some());

    let mut arena = db.load_arena().expect("Failed to load arena");
    let replacement = arena
        .add_composite(CompositePlan::new("group"))
        .expect("Name should be free again");
    arena.add_step(replacement, clean).expect("Failed to add step");
    db.save(arena.get(replacement).expect("Replacement exists"))
        .expect("Failed to save replacement");

    assert_eq!(db.list_plans(false).expect("Failed to list").len(), 2);
    assert_eq!(db.list_plans(true).expect("Failed to list").len(), 3);
}

#[test]
fn test_duplicate_active_names_are_rejected() {
    let (_temp_file, mut db) = create_test_db();
    let (arena, _, _) = sample_arena();
    save_arena(&mut db, &arena);

    let mut impostor = Plan::new("clean", "true");
    impostor.id = PlanId(99);
    let result = db.save(&AbstractPlan::from(impostor));

    assert!(matches!(result, Err(StrataError::Database { .. })));
}

#[test]
fn test_activity_round_trip() {
    let (_temp_file, mut db) = create_test_db();
    let (arena, clean, _) = sample_arena();
    save_arena(&mut db, &arena);

    let start: Timestamp = "2024-05-01T08:00:00Z".parse().expect("valid timestamp");
    let end: Timestamp = "2024-05-01T08:05:00Z".parse().expect("valid timestamp");
    let first = db
        .add_activity(
            &NewActivity::new(clean, start, end)
                .with_usages(["raw.csv"])
                .with_generations(["clean.csv"]),
        )
        .expect("Failed to add activity");
    let second = db
        .add_activity(&NewActivity::new(clean, start, end).with_usages(["clean.csv"]))
        .expect("Failed to add activity");

    assert!(second.id > first.id);

    let stored = db
        .get_activity(first.id)
        .expect("Failed to get activity")
        .expect("Activity should exist");
    assert_eq!(stored, first);
    assert!(db
        .get_activity(ActivityId(999))
        .expect("Failed to query")
        .is_none());

    let touching: Vec<ActivityId> = db
        .get_activities_by_path("clean.csv")
        .expect("Failed to query by path")
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(touching, vec![first.id, second.id]);

    let store = db.load_activities().expect("Failed to load activities");
    assert_eq!(store.len(), 2);
    assert_eq!(
        store
            .get_downstream_activities(first.id)
            .iter()
            .map(|a| a.id)
            .collect::<Vec<_>>(),
        vec![second.id]
    );
}

#[test]
fn test_activity_requires_stored_plan() {
    let (_temp_file, mut db) = create_test_db();
    let now = Timestamp::now();

    let result = db.add_activity(&NewActivity::new(PlanId(12), now, now));

    assert!(matches!(result, Err(StrataError::Database { .. })));
}

#[test]
fn test_activities_by_path_include_directories() {
    let (_temp_file, mut db) = create_test_db();
    let (arena, clean, _) = sample_arena();
    save_arena(&mut db, &arena);
    let now = Timestamp::now();

    let writer = db
        .add_activity(&NewActivity::new(clean, now, now).with_generations(["exports/"]))
        .expect("Failed to add activity");
    let reader = db
        .add_activity(&NewActivity::new(clean, now, now).with_usages(["exports/2024/a.csv"]))
        .expect("Failed to add activity");
    db.add_activity(&NewActivity::new(clean, now, now).with_usages(["exports-old/a.csv"]))
        .expect("Failed to add activity");

    let touching: Vec<ActivityId> = db
        .get_activities_by_path("exports/2024")
        .expect("Failed to query by path")
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(touching, vec![writer.id, reader.id]);

    let store = db.load_activities().expect("Failed to load activities");
    let downstream: Vec<ActivityId> = store
        .get_downstream_activities(writer.id)
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(downstream, vec![reader.id]);
}
