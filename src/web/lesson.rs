//! Lesson detail and the nested lesson actions.

use crate::lesson;
use crate::middleware::ClientCtx;
use crate::orm::action::LessonAction;
use crate::orm::lessons;
use crate::serializer::{
    CommentRepr, LessonDetailRepr, LessonDetailResponse, MediaUrl, RatingRepr,
};
use crate::web::error::{parse_json, ApiError};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

/// Longest accepted tag name.
const TAG_NAME_MAX: usize = 100;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_lesson)
        .service(assign_tags)
        .service(view_comments)
        .service(create_comment)
        .service(toggle_like)
        .service(rate_lesson);
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagsForm {
    #[validate(length(min = 1, message = "This list may not be empty."))]
    tags: Vec<String>,
}

impl TagsForm {
    fn check_names(&self) -> Result<(), ApiError> {
        if self.tags.iter().any(|name| name.trim().is_empty()) {
            return Err(ApiError::field("tags", "This field may not be blank."));
        }
        if self.tags.iter().any(|name| name.trim().chars().count() > TAG_NAME_MAX) {
            return Err(ApiError::field(
                "tags",
                "Ensure this field has no more than 100 characters.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Ensure this field has between 1 and 255 characters."
    ))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingForm {
    #[validate(range(min = 1, max = 5, message = "Ensure this value is between 1 and 5."))]
    rating: i16,
}

async fn find_lesson(db: &DatabaseConnection, id: i32) -> Result<lessons::Model, ApiError> {
    lesson::get_active_lesson(db, id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// GET /lessons/{id} - Lesson detail. Authenticated callers also get their
/// like and rating.
#[get("/lessons/{lesson_id}")]
async fn view_lesson(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;
    let tags = lesson::lesson_tags(db, &lesson).await?;
    let lesson_id = lesson.id;
    let detail = LessonDetailRepr::new(lesson, tags, &MediaUrl::from_request(&req));

    let body = match client.get_id() {
        Some(user_id) => {
            let viewer = lesson::viewer_state(db, LessonAction { lesson_id, user_id }).await?;
            LessonDetailResponse::Authorized(detail.with_viewer(viewer))
        }
        None => LessonDetailResponse::Public(detail),
    };

    Ok(HttpResponse::Ok().json(body))
}

/// POST /lessons/{id}/tags - Finds or creates each named tag and links it.
#[post("/lessons/{lesson_id}/tags")]
async fn assign_tags(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_login()?;
    let form: TagsForm = parse_json(&body)?;
    form.validate()?;
    form.check_names()?;

    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;
    lesson::assign_tags(db, lesson.id, &form.tags).await?;

    let tags = lesson::lesson_tags(db, &lesson).await?;
    Ok(HttpResponse::Created().json(LessonDetailRepr::new(
        lesson,
        tags,
        &MediaUrl::from_request(&req),
    )))
}

/// GET /lessons/{id}/comments - Active comments, oldest first.
#[get("/lessons/{lesson_id}/comments")]
async fn view_comments(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;
    let media = MediaUrl::from_request(&req);

    let comments: Vec<CommentRepr> = lesson::list_comments(db, lesson.id)
        .await?
        .into_iter()
        .map(|(comment, user)| CommentRepr::new(comment, user, &media))
        .collect();

    Ok(HttpResponse::Ok().json(comments))
}

/// POST /lessons/{id}/comments - Comment as the calling user.
#[post("/lessons/{lesson_id}/comments")]
async fn create_comment(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user = client.require_user()?;
    let form: CommentForm = parse_json(&body)?;
    form.validate()?;

    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;
    let comment = lesson::create_comment(
        db,
        LessonAction {
            lesson_id: lesson.id,
            user_id: user.id,
        },
        &form.content,
    )
    .await?;

    Ok(HttpResponse::Created().json(CommentRepr::new(
        comment,
        user.clone(),
        &MediaUrl::from_request(&req),
    )))
}

/// POST /lessons/{id}/like - Likes the lesson, or flips an existing like.
#[post("/lessons/{lesson_id}/like")]
async fn toggle_like(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;

    let like = lesson::toggle_like(
        db,
        LessonAction {
            lesson_id: lesson.id,
            user_id,
        },
    )
    .await?;
    log::debug!(
        "user_id={} set liked={} on lesson_id={}",
        user_id,
        like.liked,
        lesson.id
    );

    Ok(HttpResponse::Ok().finish())
}

/// POST /lessons/{id}/rating - Sets the caller's rating.
#[post("/lessons/{lesson_id}/rating")]
async fn rate_lesson(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    path: web::Path<i32>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user_id = client.require_login()?;
    let form: RatingForm = parse_json(&body)?;
    form.validate()?;

    let db = db.get_ref();
    let lesson = find_lesson(db, path.into_inner()).await?;
    let rating = lesson::set_rating(
        db,
        LessonAction {
            lesson_id: lesson.id,
            user_id,
        },
        form.rating,
    )
    .await?;
    log::info!(
        "user_id={} rated lesson_id={} with {}",
        user_id,
        lesson.id,
        rating.rate
    );

    Ok(HttpResponse::Ok().json(RatingRepr {
        rating: rating.rate,
    }))
}
