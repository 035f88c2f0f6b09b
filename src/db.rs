//! Global database pool and schema setup.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Schema statements, applied in order by [`migrate`].
const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Connects to the database and stores the pool for [`get_db_pool`].
/// Calling it again after a successful init is a no-op.
pub async fn init_db(database_url: String) -> Result<(), DbErr> {
    if DB_POOL.get().is_some() {
        return Ok(());
    }

    let pool = Database::connect(&database_url).await?;
    if DB_POOL.set(pool).is_err() {
        log::debug!("Database pool was initialized concurrently, keeping the first one");
    }
    Ok(())
}

/// Returns the global pool.
///
/// # Panics
/// If [`init_db`] has not completed.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL
        .get()
        .expect("Database pool accessed before init_db was called.")
}

/// Creates any missing tables and indexes.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    for statement in schema_statements() {
        db.execute(Statement::from_string(backend, statement.to_owned()))
            .await?;
    }
    log::info!("Database schema is up to date");
    Ok(())
}

fn schema_statements() -> impl Iterator<Item = &'static str> {
    SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_every_table() {
        let statements: Vec<&str> = schema_statements().collect();
        for table in [
            "users",
            "sessions",
            "categories",
            "courses",
            "lessons",
            "tags",
            "lesson_tags",
            "comments",
            "likes",
            "ratings",
        ] {
            let create = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(
                statements.iter().any(|s| s.contains(&create)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_schema_statements_are_trimmed() {
        assert!(schema_statements().all(|s| !s.is_empty() && s == s.trim()));
    }
}
