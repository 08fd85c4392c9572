use std::collections::BTreeSet;

use jiff::Timestamp;

use super::{are_paths_related, filter_related_paths, ActivityStore, Direction};
use crate::models::{Activity, ActivityId, NewActivity, PlanId};

fn activity(id: u64, usages: &[&str], generations: &[&str]) -> Activity {
    let at = Timestamp::from_second(1_700_000_000 + id as i64).expect("valid timestamp");
    NewActivity::new(PlanId(id), at, at)
        .with_usages(usages.iter().copied())
        .with_generations(generations.iter().copied())
        .into_activity(ActivityId(id))
}

/// r1..r7 lineage fixture: a→r1→b→r2→c, d→r3→e, (c,e)→r4→(f,g), f→r5→h,
/// g→r6→i and the isolated x→r7→y.
fn create_test_store() -> ActivityStore {
    ActivityStore::from_activities([
        activity(1, &["a"], &["b"]),
        activity(2, &["b"], &["c"]),
        activity(3, &["d"], &["e"]),
        activity(4, &["c", "e"], &["f", "g"]),
        activity(5, &["f"], &["h"]),
        activity(6, &["g"], &["i"]),
        activity(7, &["x"], &["y"]),
    ])
}

fn chain_set(chains: Vec<Vec<ActivityId>>) -> BTreeSet<Vec<u64>> {
    chains
        .into_iter()
        .map(|chain| chain.into_iter().map(|id| id.0).collect())
        .collect()
}

fn expected(chains: &[&[u64]]) -> BTreeSet<Vec<u64>> {
    chains.iter().map(|chain| chain.to_vec()).collect()
}

#[test]
fn test_downstream_chains_from_r1() {
    let store = create_test_store();

    let chains = store.get_downstream_activity_chains(ActivityId(1));

    assert_eq!(
        chain_set(chains),
        expected(&[&[2], &[2, 4], &[2, 4, 5], &[2, 4, 6]])
    );
}

#[test]
fn test_downstream_chains_from_r4() {
    let store = create_test_store();

    let chains = store.get_downstream_activity_chains(ActivityId(4));

    assert_eq!(chain_set(chains), expected(&[&[5], &[6]]));
}

#[test]
fn test_upstream_chains_from_r6() {
    let store = create_test_store();

    let chains = store.get_upstream_activity_chains(ActivityId(6));

    assert_eq!(
        chain_set(chains),
        expected(&[&[4], &[4, 3], &[4, 2], &[4, 2, 1]])
    );
}

#[test]
fn test_upstream_chains_from_r4() {
    let store = create_test_store();

    let chains = store.get_upstream_activity_chains(ActivityId(4));

    assert_eq!(chain_set(chains), expected(&[&[3], &[2], &[2, 1]]));
}

#[test]
fn test_chains_at_graph_edges_are_empty() {
    let store = create_test_store();

    assert!(store.get_downstream_activity_chains(ActivityId(7)).is_empty());
    assert!(store.get_upstream_activity_chains(ActivityId(7)).is_empty());
    assert!(store.get_downstream_activity_chains(ActivityId(6)).is_empty());
    assert!(store.get_upstream_activity_chains(ActivityId(1)).is_empty());
    assert!(store.get_downstream_activity_chains(ActivityId(99)).is_empty());
}

#[test]
fn test_immediate_neighbours() {
    let store = create_test_store();

    let downstream: Vec<u64> = store
        .get_downstream_activities(ActivityId(4))
        .iter()
        .map(|a| a.id.0)
        .collect();
    let upstream: Vec<u64> = store
        .get_upstream_activities(ActivityId(4))
        .iter()
        .map(|a| a.id.0)
        .collect();

    assert_eq!(downstream, vec![5, 6]);
    assert_eq!(upstream, vec![2, 3]);
    assert!(store.get_upstream_activities(ActivityId(42)).is_empty());
}

#[test]
fn test_all_producers_count() {
    let mut store = create_test_store();
    store.add(activity(8, &["z"], &["b"]));

    let upstream: Vec<u64> = store
        .get_upstream_activities(ActivityId(2))
        .iter()
        .map(|a| a.id.0)
        .collect();

    assert_eq!(upstream, vec![1, 8]);
}

#[test]
fn test_cycle_terminates() {
    let store = ActivityStore::from_activities([
        activity(1, &["p"], &["q"]),
        activity(2, &["q"], &["p"]),
    ]);

    let chains = store.chains(ActivityId(1), Direction::Downstream);

    assert_eq!(chain_set(chains), expected(&[&[2]]));
}

#[test]
fn test_diamond_reports_each_chain() {
    let store = ActivityStore::from_activities([
        activity(1, &["a"], &["b", "c"]),
        activity(2, &["b"], &["d"]),
        activity(3, &["c"], &["e"]),
        activity(4, &["d", "e"], &["f"]),
    ]);

    let chains = store.get_downstream_activity_chains(ActivityId(1));

    assert_eq!(
        chain_set(chains),
        expected(&[&[2], &[2, 4], &[3], &[3, 4]])
    );
}

#[test]
fn test_duplicate_id_is_ignored() {
    let mut store = create_test_store();

    assert!(!store.add(activity(1, &["other"], &["thing"])));
    assert_eq!(store.len(), 7);
    assert!(store.get_activities_by_path("other").is_empty());
}

#[test]
fn test_path_listings() {
    let store = create_test_store();

    assert_eq!(
        store.get_all_usage_paths(),
        vec!["a", "b", "c", "d", "e", "f", "g", "x"]
    );
    assert_eq!(
        store.get_all_generation_paths(),
        vec!["b", "c", "e", "f", "g", "h", "i", "y"]
    );

    let touching_c: Vec<u64> = store
        .get_activities_by_path("c")
        .iter()
        .map(|a| a.id.0)
        .collect();
    assert_eq!(touching_c, vec![2, 4]);
}

#[test]
fn test_related_paths() {
    assert!(are_paths_related("data/raw/a.csv", "data"));
    assert!(are_paths_related("data", "data/raw/a.csv"));
    assert!(are_paths_related("model.bin", "model.bin"));
    assert!(!are_paths_related("data2/a.csv", "data"));

    let paths = vec!["data/a.csv", "data/b.csv", "model.bin"];
    assert_eq!(
        filter_related_paths(paths.clone(), &["data".to_string()]),
        vec!["data/a.csv", "data/b.csv"]
    );
    assert_eq!(filter_related_paths(paths, &[]), vec!["data/a.csv", "data/b.csv", "model.bin"]);
}

/// previous writes a directory read by intermediate, whose output file lies
/// inside the directory following reads.
fn create_directory_store() -> ActivityStore {
    ActivityStore::from_activities([
        activity(1, &["some/data"], &["other/data/file"]),
        activity(2, &[], &["some/"]),
        activity(3, &["other/data"], &[]),
        activity(4, &["unrelated_in"], &["unrelated_out"]),
    ])
}

fn ids(activities: Vec<&Activity>) -> Vec<u64> {
    activities.iter().map(|a| a.id.0).collect()
}

#[test]
fn test_directory_paths_link_activities() {
    let store = create_directory_store();

    assert!(store.get_downstream_activities(ActivityId(3)).is_empty());
    assert_eq!(ids(store.get_downstream_activities(ActivityId(1))), vec![3]);
    assert_eq!(ids(store.get_downstream_activities(ActivityId(2))), vec![1]);
    assert_eq!(ids(store.get_upstream_activities(ActivityId(3))), vec![1]);
    assert!(store.get_downstream_activities(ActivityId(4)).is_empty());

    let chains = store.get_downstream_activity_chains(ActivityId(2));
    assert_eq!(chain_set(chains), expected(&[&[1], &[1, 3]]));
}

#[test]
fn test_activities_by_related_path() {
    let store = create_directory_store();

    assert_eq!(ids(store.get_activities_by_path("some")), vec![1, 2]);
    assert_eq!(ids(store.get_activities_by_path("other/data/file")), vec![1, 3]);
    assert!(store.get_activities_by_path("unrelated").is_empty());
}
