use super::lesson::CommentForm;
use crate::comment::{delete_comment, get_active_comment, update_comment};
use crate::middleware::ClientCtx;
use crate::orm::{comments, users};
use crate::serializer::{CommentRepr, MediaUrl};
use crate::web::error::{parse_json, ApiError};
use actix_web::{delete, patch, put, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(put_comment)
        .service(patch_comment)
        .service(destroy_comment);
}

/// Loads the comment and checks the caller wrote it.
async fn owned_comment(
    db: &DatabaseConnection,
    client: &ClientCtx,
    comment_id: i32,
) -> Result<(comments::Model, users::Model), ApiError> {
    client.require_login()?;
    let (comment, author) = get_active_comment(db, comment_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    client.require_ownership(comment.user_id).map_err(|e| {
        log::debug!(
            "user_id={:?} denied edit of comment {} owned by user_id={}",
            client.get_id(),
            comment.id,
            comment.user_id
        );
        e
    })?;

    Ok((comment, author))
}

async fn edit_comment(
    db: &DatabaseConnection,
    client: ClientCtx,
    req: HttpRequest,
    comment_id: i32,
    body: &[u8],
) -> Result<HttpResponse, ApiError> {
    let (comment, author) = owned_comment(db, &client, comment_id).await?;
    let form: CommentForm = parse_json(body)?;
    form.validate()?;

    let comment = update_comment(db, comment, &form.content).await?;
    Ok(HttpResponse::Ok().json(CommentRepr::new(
        comment,
        author,
        &MediaUrl::from_request(&req),
    )))
}

/// PUT /comments/{id} - Replace the text of one's own comment.
#[put("/comments/{comment_id}")]
async fn put_comment(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    edit_comment(db.get_ref(), client, req, path.into_inner(), &body).await
}

/// PATCH /comments/{id} - Same as PUT; `content` is the only writable field.
#[patch("/comments/{comment_id}")]
async fn patch_comment(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    edit_comment(db.get_ref(), client, req, path.into_inner(), &body).await
}

/// DELETE /comments/{id} - Remove one's own comment.
#[delete("/comments/{comment_id}")]
async fn destroy_comment(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (comment, _) = owned_comment(db, &client, path.into_inner()).await?;
    delete_comment(db, comment).await?;
    Ok(HttpResponse::NoContent().finish())
}
