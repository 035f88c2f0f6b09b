//! Password hashing and bearer token sessions.

use crate::orm::{sessions, users};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use uuid::Uuid;

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(|| {
    let salt = match std::env::var("SALT") {
        Ok(salt) if !salt.is_empty() => salt,
        _ => {
            log::warn!("SALT is not set; password hashes are not keyed with an application secret.");
            return Argon2::default();
        }
    };

    // The secret lives as long as the process.
    let secret: &'static [u8] = Box::leak(salt.into_bytes().into_boxed_slice());
    Argon2::new_with_secret(
        secret,
        argon2::Algorithm::default(),
        argon2::Version::default(),
        argon2::Params::default(),
    )
    .unwrap_or_else(|e| {
        log::error!("Invalid SALT for argon2, falling back to unkeyed hashing: {}", e);
        Argon2::default()
    })
});

/// Forces the hasher to initialize so a bad SALT is reported at startup.
pub fn init() {
    Lazy::force(&ARGON2);
}

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a plaintext password against a stored PHC string.
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Issues a new token for the user, valid for `lifetime_minutes`.
pub async fn new_session(
    db: &DatabaseConnection,
    user_id: i32,
    lifetime_minutes: i64,
) -> Result<sessions::Model, DbErr> {
    let now = Utc::now().naive_utc();
    sessions::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + Duration::minutes(lifetime_minutes)),
    }
    .insert(db)
    .await
}

/// Resolves a token to its active user. Expired tokens are removed.
pub async fn authenticate_by_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<users::Model>, DbErr> {
    let found = sessions::Entity::find_by_id(token.to_owned())
        .find_also_related(users::Entity)
        .one(db)
        .await?;

    let (session, user) = match found {
        Some((session, Some(user))) => (session, user),
        _ => return Ok(None),
    };

    if session.expires_at <= Utc::now().naive_utc() {
        log::debug!("Expired token presented for user_id={}", session.user_id);
        sessions::Entity::delete_by_id(session.id).exec(db).await?;
        return Ok(None);
    }

    if !user.is_active {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Deletes a token. Returns whether it existed.
pub async fn revoke_session(db: &DatabaseConnection, token: &str) -> Result<bool, DbErr> {
    let res = sessions::Entity::delete_by_id(token.to_owned())
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Removes every expired token.
pub async fn expire_sessions(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(Utc::now().naive_utc()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
