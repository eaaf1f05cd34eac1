use sqlx::{Row, SqlitePool};

use crate::utils;

/// A SQLite table whose rows are keyed by a text `id` column.
#[async_trait::async_trait]
pub trait Table {
    type Record<'a>;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    /// Column list used when the table does not exist yet.
    fn columns(&self) -> &'static str;

    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error>;

    async fn create(&self) -> Result<(), sqlx::Error> {
        if utils::is_table_exists(self.get_pool(), self.get_name()).await? {
            tracing::debug!("Use table {}", self.get_name());
            return Ok(());
        }
        tracing::debug!("Create table {}", self.get_name());
        let query = format!("CREATE TABLE {} ({})", self.get_name(), self.columns());
        sqlx::query(&query).execute(self.get_pool()).await?;
        Ok(())
    }

    async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }
}
