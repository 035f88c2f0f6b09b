use crate::middleware::ClientCtx;
use crate::serializer::{MediaUrl, UserRepr};
use crate::user::{create_user, update_user, NewUser, UserUpdate};
use crate::web::error::{parse_json, ApiError};
use actix_web::{get, post, put, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(register)
        .service(view_current_user)
        .service(update_current_user);
}

/// POST /users - Register an account.
#[post("/users")]
async fn register(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    form: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner().trimmed();
    if form.username.is_empty() {
        return Err(ApiError::field("username", "This field may not be blank."));
    }
    form.validate()?;

    let user = create_user(db.get_ref(), form, false).await?;
    Ok(HttpResponse::Created().json(UserRepr::new(user, &MediaUrl::from_request(&req))))
}

/// GET /users/current-user - The caller's own profile.
#[get("/users/current-user")]
async fn view_current_user(client: ClientCtx, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = client.require_user()?;
    Ok(HttpResponse::Ok().json(UserRepr::new(user.clone(), &MediaUrl::from_request(&req))))
}

/// PUT /users/current-user - Update the caller's names, email, avatar or password.
#[put("/users/current-user")]
async fn update_current_user(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_user()?.clone();
    let form: UserUpdate = parse_json(&body)?;
    form.validate()?;

    let user = update_user(db.get_ref(), user, form).await?;
    Ok(HttpResponse::Ok().json(UserRepr::new(user, &MediaUrl::from_request(&req))))
}
