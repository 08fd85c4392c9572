//! Plan persistence and queries.

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension, Row};

use crate::{
    error::{DatabaseResultExt, Result},
    models::{AbstractPlan, PlanId},
    workflow::PlanArena,
};

const UPSERT_PLAN_SQL: &str = "INSERT INTO plans \
     (id, name, kind, body, created_at, invalidated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, kind = excluded.kind, \
     body = excluded.body, invalidated_at = excluded.invalidated_at";
const SELECT_PLAN_SQL: &str = "SELECT body, invalidated_at FROM plans WHERE id = ?1";
const SELECT_PLAN_BY_NAME_SQL: &str =
    "SELECT body, invalidated_at FROM plans WHERE name = ?1 AND invalidated_at IS NULL";
const SELECT_ACTIVE_PLANS_SQL: &str =
    "SELECT body, invalidated_at FROM plans WHERE invalidated_at IS NULL ORDER BY name";
const SELECT_ALL_PLANS_SQL: &str = "SELECT body, invalidated_at FROM plans ORDER BY id";

/// Decode a `(body, invalidated_at)` row. The column wins over the body for
/// the invalidation timestamp.
fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<AbstractPlan> {
    let body: String = row.get(0)?;
    let mut plan: AbstractPlan = serde_json::from_str(&body)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    let invalidated_at: Option<String> = row.get(1)?;
    if let Some(at) = invalidated_at {
        let at = at.parse::<Timestamp>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
        })?;
        plan.invalidate(at);
    }
    Ok(plan)
}

impl super::Database {
    /// Insert or update a plan. The plan must carry an arena-assigned id.
    pub fn save_plan(&mut self, plan: &AbstractPlan) -> Result<()> {
        self.save_plans([plan])
    }

    /// Insert or update several plans in one transaction.
    pub fn save_plans<'a>(
        &mut self,
        plans: impl IntoIterator<Item = &'a AbstractPlan>,
    ) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        for plan in plans {
            let body = serde_json::to_string(plan)?;
            tx.execute(
                UPSERT_PLAN_SQL,
                params![
                    plan.id().0 as i64,
                    plan.name(),
                    plan.kind(),
                    body,
                    plan.created_at().to_string(),
                    plan.invalidated_at().map(ToString::to_string),
                ],
            )
            .db_context("Failed to save plan")?;
        }

        tx.commit().db_context("Failed to commit transaction")
    }

    /// Retrieves a plan by id, invalidated or not.
    pub fn get_plan(&self, id: PlanId) -> Result<Option<AbstractPlan>> {
        self.connection
            .query_row(SELECT_PLAN_SQL, params![id.0 as i64], plan_from_row)
            .optional()
            .db_context("Failed to query plan")
    }

    /// Retrieves the active plan called `name`.
    pub fn get_plan_by_name(&self, name: &str) -> Result<Option<AbstractPlan>> {
        self.connection
            .query_row(SELECT_PLAN_BY_NAME_SQL, params![name], plan_from_row)
            .optional()
            .db_context("Failed to query plan by name")
    }

    /// Lists plans ordered by name, or every plan by id when
    /// `include_invalidated` is set.
    pub fn list_plans(&self, include_invalidated: bool) -> Result<Vec<AbstractPlan>> {
        let sql = if include_invalidated {
            SELECT_ALL_PLANS_SQL
        } else {
            SELECT_ACTIVE_PLANS_SQL
        };

        let mut stmt = self
            .connection
            .prepare(sql)
            .db_context("Failed to prepare query")?;
        let plans = stmt
            .query_map([], plan_from_row)
            .db_context("Failed to query plans")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read plan rows")?;
        Ok(plans)
    }

    /// Load every stored plan, removed ones included, into an arena.
    pub fn load_arena(&self) -> Result<PlanArena> {
        Ok(PlanArena::from_plans(self.list_plans(true)?))
    }
}
