//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, Result};

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()?;

        Ok(())
    }

    /// Bring databases created before plan removal existed up to date.
    fn apply_migrations(&self) -> Result<()> {
        let has_invalidated_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('plans') WHERE name = 'invalidated_at'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        if !has_invalidated_column {
            self.connection
                .execute("ALTER TABLE plans ADD COLUMN invalidated_at TEXT", [])
                .db_context("Failed to add invalidated_at column to plans table")?;
        }

        // Needs the column above, so it cannot live in the schema file
        self.connection
            .execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_plans_active_name \
                 ON plans(name) WHERE invalidated_at IS NULL",
                [],
            )
            .db_context("Failed to create plan name index")?;

        Ok(())
    }
}
