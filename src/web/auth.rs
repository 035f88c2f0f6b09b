//! Bearer token issue and revocation.

use crate::app_config;
use crate::middleware::ClientCtx;
use crate::session::{new_session, revoke_session};
use crate::user::{login, LoginResult};
use crate::web::error::ApiError;
use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(issue_token).service(revoke_token);
}

#[derive(Deserialize)]
pub struct TokenForm {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token stops working.
    pub expires_in: i64,
}

/// POST /auth/token - Exchange a username and password for a bearer token.
#[post("/auth/token")]
async fn issue_token(
    db: web::Data<DatabaseConnection>,
    form: web::Json<TokenForm>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let user_id = match login(db, form.username.trim(), &form.password).await? {
        LoginResult::Success(user_id) => user_id,
        LoginResult::Inactive => {
            log::debug!("login failure: inactive account {}", form.username);
            return Err(ApiError::BadRequest("User account is disabled.".to_owned()));
        }
        LoginResult::BadCredentials => {
            log::debug!("login failure: bad credentials for {}", form.username);
            // Same message for unknown names and wrong passwords.
            return Err(ApiError::BadRequest(
                "Unable to log in with provided credentials.".to_owned(),
            ));
        }
    };

    let lifetime = i64::from(app_config::security().token_lifetime_minutes);
    let session = new_session(db, user_id, lifetime).await?;
    log::info!("Issued token to user_id={}", user_id);

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: session.id,
        token_type: "Bearer",
        expires_in: lifetime * 60,
    }))
}

/// POST /auth/revoke - Invalidate the token the request was made with.
#[post("/auth/revoke")]
async fn revoke_token(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let token = client.get_token().ok_or(ApiError::Unauthorized)?;

    if revoke_session(db.get_ref(), token).await? {
        log::info!("Revoked token of user_id={}", user_id);
    }
    Ok(HttpResponse::NoContent().finish())
}
