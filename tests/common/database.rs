//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::env;
use std::sync::Once;

static INIT_SYNC: Once = Once::new();

/// Initialize synchronous global state (SALT, ARGON2)
fn init_sync_globals() {
    INIT_SYNC.call_once(|| {
        if env::var("SALT").is_err() {
            env::set_var("SALT", "testsaltfortestingonly1234567890AB");
        }
        courseapp::session::init();
    });
}

/// Connects to `TEST_DATABASE_URL`, applies the schema and empties every table.
///
/// Returns None when no test database is configured so the caller can skip.
/// Each test gets its own connection because every `actix_rt::test` runs on
/// its own runtime.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let database_url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL is not set; skipping database test");
            return None;
        }
    };

    init_sync_globals();

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    courseapp::db::migrate(&db)
        .await
        .expect("Failed to apply schema to test database");
    cleanup_test_data(&db)
        .await
        .expect("Failed to clean up test database");

    Some(db)
}

/// Cleanup function to remove test data
///
/// RESTART IDENTITY resets sequences (id counters) to 1.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "TRUNCATE TABLE
            lesson_tags,
            comments,
            likes,
            ratings,
            tags,
            lessons,
            courses,
            categories,
            sessions,
            users
        RESTART IDENTITY CASCADE;"
            .to_string(),
    ))
    .await?;

    Ok(())
}
