use actix_web::HttpServer;
use courseapp::app_config;
use courseapp::db::{get_db_pool, init_db, migrate};
use env_logger::Env;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "DATABASE_URL must be set.")
    })?;
    init_db(database_url).await.map_err(to_io_error)?;
    migrate(get_db_pool()).await.map_err(to_io_error)?;

    // Sweep expired bearer tokens every hour.
    actix_web::rt::spawn(async {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match courseapp::session::expire_sessions(get_db_pool()).await {
                Ok(0) => {}
                Ok(n) => log::info!("Removed {} expired tokens", n),
                Err(e) => log::error!("Failed to remove expired tokens: {}", e),
            }
        }
    });

    let server = app_config::server();
    let mut http = HttpServer::new(|| courseapp::web::app(get_db_pool().clone()));
    if server.workers > 0 {
        http = http.workers(server.workers);
    }

    log::info!("Listening on {}", server.bind);
    http.bind(&server.bind)?.run().await
}

fn to_io_error(e: sea_orm::DbErr) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
pub fn init_our_mods() {
    // Each module should work mostly independent of others.
    app_config::init();
    courseapp::session::init();
}
