//! Creates a staff account from the command line.
//!
//! Usage: `createsuperuser <username> [email]`. The password is read from
//! `SUPERUSER_PASSWORD` if set, otherwise from the first line of stdin.

use anyhow::{anyhow, bail, Context};
use courseapp::db::{get_db_pool, init_db, migrate};
use courseapp::user::{create_user, NewUser};
use env_logger::Env;
use std::io::BufRead;
use validator::Validate;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    courseapp::session::init();

    let mut args = std::env::args().skip(1);
    let username = args
        .next()
        .context("usage: createsuperuser <username> [email]")?;
    let email = args.next();

    let password = match std::env::var("SUPERUSER_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            eprintln!("Password:");
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(&['\r', '\n'][..]).to_owned()
        }
    };

    let form = NewUser {
        username,
        password,
        email,
        first_name: String::new(),
        last_name: String::new(),
        avatar: None,
    }
    .trimmed();
    if let Err(e) = form.validate() {
        bail!("invalid superuser: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set.")?;
    init_db(database_url).await?;
    migrate(get_db_pool()).await?;

    let user = create_user(get_db_pool(), form, true)
        .await
        .map_err(|e| anyhow!("{}", e))?;
    println!("Superuser {} created (id {}).", user.username, user.id);
    Ok(())
}
