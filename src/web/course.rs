use crate::app_config;
use crate::catalog::{get_active_course, list_course_lessons, list_courses, tags_for_lessons, CourseFilter};
use crate::serializer::{page_link, request_url, CourseRepr, LessonRepr, MediaUrl, Page};
use crate::web::error::ApiError;
use actix_web::{get, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_courses).service(view_course_lessons);
}

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    q: Option<String>,
    category_id: Option<i32>,
    page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LessonQuery {
    lesson: Option<String>,
}

/// GET /courses - Active courses, paginated, filtered by `q` and `category_id`.
#[get("/courses")]
async fn view_courses(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    query: web::Query<CourseQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let page = query.page.unwrap_or(1);
    let filter = CourseFilter {
        q: query.q,
        category_id: query.category_id,
    };

    let found = list_courses(
        db.get_ref(),
        &filter,
        page,
        app_config::limits().courses_per_page as usize,
    )
    .await?
    .map_err(|_| {
        log::debug!("Course page {} is out of range", page);
        ApiError::NotFound
    })?;

    let media = MediaUrl::from_request(&req);
    let url = request_url(&req);
    let link = |target: usize| url.as_ref().map(|url| page_link(url, target));

    Ok(HttpResponse::Ok().json(Page {
        count: found.count,
        next: if page < found.num_pages { link(page + 1) } else { None },
        previous: if page > 1 { link(page - 1) } else { None },
        results: found
            .courses
            .into_iter()
            .map(|course| CourseRepr::new(course, &media))
            .collect::<Vec<_>>(),
    }))
}

/// GET /courses/{id}/lessons - Active lessons of an active course.
#[get("/courses/{course_id}/lessons")]
async fn view_course_lessons(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    path: web::Path<i32>,
    query: web::Query<LessonQuery>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let course = get_active_course(db, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound)?;

    let lessons = list_course_lessons(db, course.id, query.lesson.as_deref()).await?;
    let ids: Vec<i32> = lessons.iter().map(|l| l.id).collect();
    let mut tags = tags_for_lessons(db, &ids).await?;

    let media = MediaUrl::from_request(&req);
    let results: Vec<LessonRepr> = lessons
        .iter()
        .map(|lesson| LessonRepr::new(lesson, tags.remove(&lesson.id).unwrap_or_default(), &media))
        .collect();

    Ok(HttpResponse::Ok().json(results))
}
