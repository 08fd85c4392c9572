//! Activity persistence and path queries.

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension, Row};

use crate::{
    activity::{are_paths_related, ActivityStore},
    error::{DatabaseResultExt, Result},
    models::{Activity, ActivityId, NewActivity, PlanId},
};

const INSERT_ACTIVITY_SQL: &str =
    "INSERT INTO activities (plan_id, started_at, ended_at) VALUES (?1, ?2, ?3)";
const INSERT_ACTIVITY_PATH_SQL: &str =
    "INSERT OR IGNORE INTO activity_paths (activity_id, path, role) VALUES (?1, ?2, ?3)";
const SELECT_ACTIVITY_SQL: &str =
    "SELECT id, plan_id, started_at, ended_at FROM activities WHERE id = ?1";
const SELECT_ALL_ACTIVITIES_SQL: &str =
    "SELECT id, plan_id, started_at, ended_at FROM activities ORDER BY id";
const SELECT_ACTIVITY_PATHS_SQL: &str =
    "SELECT path, role FROM activity_paths WHERE activity_id = ?1 ORDER BY path";
const SELECT_ALL_ACTIVITY_PATHS_SQL: &str = "SELECT activity_id, path, role FROM activity_paths";
const SELECT_ACTIVITY_ID_PATHS_SQL: &str = "SELECT DISTINCT activity_id, path FROM activity_paths";

const USAGE: &str = "usage";
const GENERATION: &str = "generation";

fn parse_timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(index)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Activity header without paths.
fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: ActivityId(row.get::<_, i64>(0)? as u64),
        plan_id: PlanId(row.get::<_, i64>(1)? as u64),
        usages: Default::default(),
        generations: Default::default(),
        started_at: parse_timestamp(row, 2)?,
        ended_at: parse_timestamp(row, 3)?,
    })
}

fn add_path(activity: &mut Activity, path: String, role: &str) {
    if role == GENERATION {
        activity.generations.insert(path);
    } else {
        activity.usages.insert(path);
    }
}

impl super::Database {
    /// Record a finished execution and return it with its new id.
    pub fn add_activity(&mut self, activity: &NewActivity) -> Result<Activity> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            INSERT_ACTIVITY_SQL,
            params![
                activity.plan_id.0 as i64,
                activity.started_at.to_string(),
                activity.ended_at.to_string()
            ],
        )
        .db_context("Failed to insert activity")?;

        let id = ActivityId(tx.last_insert_rowid() as u64);

        {
            let mut stmt = tx
                .prepare(INSERT_ACTIVITY_PATH_SQL)
                .db_context("Failed to prepare path insert")?;
            let roles = activity
                .usages
                .iter()
                .map(|path| (path, USAGE))
                .chain(activity.generations.iter().map(|path| (path, GENERATION)));
            for (path, role) in roles {
                stmt.execute(params![id.0 as i64, path, role])
                    .db_context("Failed to insert activity path")?;
            }
        }

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(activity.clone().into_activity(id))
    }

    /// Retrieves one activity with its paths.
    pub fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>> {
        let activity = self
            .connection
            .query_row(SELECT_ACTIVITY_SQL, params![id.0 as i64], activity_from_row)
            .optional()
            .db_context("Failed to query activity")?;

        let Some(mut activity) = activity else {
            return Ok(None);
        };

        let mut stmt = self
            .connection
            .prepare(SELECT_ACTIVITY_PATHS_SQL)
            .db_context("Failed to prepare query")?;
        let rows = stmt
            .query_map(params![id.0 as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .db_context("Failed to query activity paths")?;
        for row in rows {
            let (path, role) = row.db_context("Failed to read activity path")?;
            add_path(&mut activity, path, &role);
        }

        Ok(Some(activity))
    }

    /// Lists every activity with its paths, in id order.
    pub fn list_activities(&self) -> Result<Vec<Activity>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_ALL_ACTIVITIES_SQL)
            .db_context("Failed to prepare query")?;
        let mut activities: BTreeMap<ActivityId, Activity> = stmt
            .query_map([], activity_from_row)
            .db_context("Failed to query activities")?
            .map(|row| row.map(|activity| (activity.id, activity)))
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .db_context("Failed to read activity rows")?;

        let mut stmt = self
            .connection
            .prepare(SELECT_ALL_ACTIVITY_PATHS_SQL)
            .db_context("Failed to prepare query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    ActivityId(row.get::<_, i64>(0)? as u64),
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .db_context("Failed to query activity paths")?;
        for row in rows {
            let (id, path, role) = row.db_context("Failed to read activity path")?;
            if let Some(activity) = activities.get_mut(&id) {
                add_path(activity, path, &role);
            }
        }

        Ok(activities.into_values().collect())
    }

    /// Activities that used or generated `path` or a path related to it, in
    /// id order.
    pub fn get_activities_by_path(&self, path: &str) -> Result<Vec<Activity>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_ACTIVITY_ID_PATHS_SQL)
            .db_context("Failed to prepare query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .db_context("Failed to query activities by path")?;

        let mut ids = BTreeSet::new();
        for row in rows {
            let (id, other) = row.db_context("Failed to read activity path")?;
            if are_paths_related(path, &other) {
                ids.insert(ActivityId(id as u64));
            }
        }

        let mut activities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(activity) = self.get_activity(id)? {
                activities.push(activity);
            }
        }
        Ok(activities)
    }

    /// Load every activity into an indexed in-memory store.
    pub fn load_activity_store(&self) -> Result<ActivityStore> {
        Ok(ActivityStore::from_activities(self.list_activities()?))
    }
}
