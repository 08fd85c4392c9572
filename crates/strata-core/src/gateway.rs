//! Storage seam between the in-memory core and a persistent backend.

use crate::{
    activity::ActivityStore,
    db::Database,
    error::Result,
    models::{AbstractPlan, Activity, NewActivity, PlanId},
    workflow::PlanArena,
};

/// What the core needs from persistent storage.
///
/// Plans and activities are loaded into a [`PlanArena`] and an
/// [`ActivityStore`] for resolution and lineage queries; mutations are written
/// back one plan or activity at a time.
pub trait Gateway {
    fn get_by_id(&self, id: PlanId) -> Result<Option<AbstractPlan>>;

    /// Active plan called `name`.
    fn get_by_name(&self, name: &str) -> Result<Option<AbstractPlan>>;

    fn save(&mut self, plan: &AbstractPlan) -> Result<()>;

    /// Save several plans. Backends with transactions store all or none.
    fn save_all(&mut self, plans: &[AbstractPlan]) -> Result<()> {
        for plan in plans {
            self.save(plan)?;
        }
        Ok(())
    }

    fn get_activities_by_path(&self, path: &str) -> Result<Vec<Activity>>;

    /// Store a finished execution and return it with its assigned id.
    fn add_activity(&mut self, activity: &NewActivity) -> Result<Activity>;

    fn load_arena(&self) -> Result<PlanArena>;

    fn load_activities(&self) -> Result<ActivityStore>;
}

impl Gateway for Database {
    fn get_by_id(&self, id: PlanId) -> Result<Option<AbstractPlan>> {
        self.get_plan(id)
    }

    fn get_by_name(&self, name: &str) -> Result<Option<AbstractPlan>> {
        self.get_plan_by_name(name)
    }

    fn save(&mut self, plan: &AbstractPlan) -> Result<()> {
        self.save_plan(plan)
    }

    fn save_all(&mut self, plans: &[AbstractPlan]) -> Result<()> {
        self.save_plans(plans)
    }

    fn get_activities_by_path(&self, path: &str) -> Result<Vec<Activity>> {
        Database::get_activities_by_path(self, path)
    }

    fn add_activity(&mut self, activity: &NewActivity) -> Result<Activity> {
        Database::add_activity(self, activity)
    }

    fn load_arena(&self) -> Result<PlanArena> {
        Database::load_arena(self)
    }

    fn load_activities(&self) -> Result<ActivityStore> {
        self.load_activity_store()
    }
}
