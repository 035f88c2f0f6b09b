//! Staff-only management endpoints and the course statistics report.
//!
//! Row creation, soft-delete toggles and hard deletes for the catalog tables.
//! Hard deletes follow the schema's foreign keys: removing a course or lesson
//! takes its dependents with it, a category still used by a course is refused.

use crate::app_config;
use crate::middleware::ClientCtx;
use crate::orm::{categories, courses, lessons, tags};
use crate::serializer::{CategoryRepr, CourseRepr, LessonDetailRepr, MediaUrl, TagRepr};
use crate::web::error::{parse_json, ApiError};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement,
};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_course_stats)
        .service(create_category)
        .service(create_course)
        .service(create_lesson)
        .service(create_tag)
        .service(set_resource_active)
        .service(delete_resource);
}

/// Catalog tables reachable through `/admin/{resource}/{id}`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Categories,
    Courses,
    Lessons,
    Tags,
}

impl Resource {
    fn table(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Courses => "courses",
            Self::Lessons => "lessons",
            Self::Tags => "tags",
        }
    }
}

#[derive(Debug, FromQueryResult)]
pub struct CourseStat {
    pub id: i32,
    pub subject: String,
    pub lesson_count: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(Template)]
#[template(path = "admin/course_stats.html")]
struct CourseStatsTemplate {
    site_name: String,
    course_count: i64,
    course_stats: Vec<CourseStat>,
}

/// GET /admin/course-stats - Active course count and lessons per course.
#[get("/admin/course-stats")]
async fn view_course_stats(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
) -> Result<impl Responder, ApiError> {
    client.require_staff()?;
    let db = db.get_ref();

    let course_count = CountRow::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        "SELECT COUNT(*) AS count FROM courses WHERE active = TRUE".to_owned(),
    ))
    .one(db)
    .await?
    .map_or(0, |row| row.count);

    let course_stats = CourseStat::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        r#"
        SELECT c.id, c.subject, COUNT(l.id) AS lesson_count
        FROM courses c
        LEFT JOIN lessons l ON l.course_id = c.id
        WHERE c.active = TRUE
        GROUP BY c.id, c.subject
        ORDER BY c.id
        "#
        .to_owned(),
    ))
    .all(db)
    .await?;

    Ok(CourseStatsTemplate {
        site_name: app_config::site().name,
        course_count,
        course_stats,
    }
    .to_response())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 100))]
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CourseForm {
    #[validate(length(min = 1, max = 100))]
    subject: String,
    description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    image: String,
    category_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LessonForm {
    #[validate(length(min = 1, max = 255))]
    subject: String,
    content: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    image: String,
    course_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagForm {
    #[validate(length(min = 1, max = 100))]
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    active: bool,
}

impl CategoryForm {
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self
    }
}

impl CourseForm {
    fn trimmed(mut self) -> Self {
        self.subject = self.subject.trim().to_owned();
        self
    }
}

impl LessonForm {
    fn trimmed(mut self) -> Self {
        self.subject = self.subject.trim().to_owned();
        self
    }
}

impl TagForm {
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_owned();
        self
    }
}

fn invalid_pk(field: &str, id: i32) -> ApiError {
    ApiError::field(
        field,
        &format!("Invalid pk \"{}\" - object does not exist.", id),
    )
}

/// POST /admin/categories
#[post("/admin/categories")]
async fn create_category(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let form = parse_json::<CategoryForm>(&body)?.trimmed();
    form.validate()?;
    let db = db.get_ref();

    let name = form.name.as_str();
    let taken = categories::Entity::find()
        .filter(categories::Column::Name.eq(name))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ApiError::field(
            "name",
            "category with this name already exists.",
        ));
    }

    let category = categories::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    log::info!("Category {} ({}) created", category.id, category.name);

    Ok(HttpResponse::Created().json(CategoryRepr::from(category)))
}

/// POST /admin/courses
#[post("/admin/courses")]
async fn create_course(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let form = parse_json::<CourseForm>(&body)?.trimmed();
    form.validate()?;
    let db = db.get_ref();

    if categories::Entity::find_by_id(form.category_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(invalid_pk("category_id", form.category_id));
    }

    let course = courses::ActiveModel {
        subject: Set(form.subject),
        description: Set(form.description),
        image: Set(form.image),
        category_id: Set(form.category_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    log::info!("Course {} created in category {}", course.id, course.category_id);

    Ok(HttpResponse::Created().json(CourseRepr::new(course, &MediaUrl::from_request(&req))))
}

/// POST /admin/lessons
#[post("/admin/lessons")]
async fn create_lesson(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let form = parse_json::<LessonForm>(&body)?.trimmed();
    form.validate()?;
    let db = db.get_ref();

    if courses::Entity::find_by_id(form.course_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(invalid_pk("course_id", form.course_id));
    }

    let lesson = lessons::ActiveModel {
        subject: Set(form.subject),
        content: Set(form.content),
        image: Set(form.image),
        course_id: Set(form.course_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    log::info!("Lesson {} created in course {}", lesson.id, lesson.course_id);

    Ok(HttpResponse::Created().json(LessonDetailRepr::new(
        lesson,
        Vec::new(),
        &MediaUrl::from_request(&req),
    )))
}

/// POST /admin/tags
#[post("/admin/tags")]
async fn create_tag(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let form = parse_json::<TagForm>(&body)?.trimmed();
    form.validate()?;

    let tag = tags::ActiveModel {
        name: Set(form.name),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;
    log::info!("Tag {} ({}) created", tag.id, tag.name);

    Ok(HttpResponse::Created().json(TagRepr::from(tag)))
}

/// PATCH /admin/{resource}/{id} - Hide or restore a row.
#[patch("/admin/{resource}/{id}")]
async fn set_resource_active(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    path: web::Path<(Resource, i32)>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let form: ActiveForm = parse_json(&body)?;
    let (resource, id) = path.into_inner();

    let res = db
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &format!(
                "UPDATE {} SET active = $1, updated_date = NOW() WHERE id = $2",
                resource.table()
            ),
            [form.active.into(), id.into()],
        ))
        .await?;

    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    log::info!("{} {} set active={}", resource.table(), id, form.active);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id, "active": form.active })))
}

/// DELETE /admin/{resource}/{id} - Remove a row and its dependents.
#[delete("/admin/{resource}/{id}")]
async fn delete_resource(
    db: web::Data<DatabaseConnection>,
    client: ClientCtx,
    path: web::Path<(Resource, i32)>,
) -> Result<HttpResponse, ApiError> {
    client.require_staff()?;
    let (resource, id) = path.into_inner();
    let db = db.get_ref();

    if resource == Resource::Categories {
        let used_by = courses::Entity::find()
            .filter(courses::Column::CategoryId.eq(id))
            .count(db)
            .await?;
        if used_by > 0 {
            return Err(ApiError::Conflict(format!(
                "Cannot delete category {}: it is used by {} course(s).",
                id, used_by
            )));
        }
    }

    let res = db
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &format!("DELETE FROM {} WHERE id = $1", resource.table()),
            [id.into()],
        ))
        .await?;

    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    log::info!("{} {} deleted", resource.table(), id);

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        let resource: Resource = serde_json::from_str(r#""lessons""#).unwrap();
        assert_eq!(resource, Resource::Lessons);
        assert_eq!(Resource::Categories.table(), "categories");
        assert!(serde_json::from_str::<Resource>(r#""users""#).is_err());
    }

    #[test]
    fn test_names_are_trimmed_before_validation() {
        let blank = CategoryForm {
            name: "   ".to_owned(),
        };
        assert!(blank.trimmed().validate().is_err());

        let padded = TagForm {
            name: format!("  {}  ", "t".repeat(100)),
        };
        let padded = padded.trimmed();
        assert_eq!(padded.name.len(), 100);
        assert!(padded.validate().is_ok());

        let lesson: LessonForm =
            serde_json::from_str(r#"{"subject": " Intro ", "course_id": 1}"#).unwrap();
        assert_eq!(lesson.trimmed().subject, "Intro");
    }

    #[test]
    fn test_course_stats_template() {
        let html = CourseStatsTemplate {
            site_name: "Course App".to_owned(),
            course_count: 2,
            course_stats: vec![
                CourseStat {
                    id: 1,
                    subject: "Django <basics>".to_owned(),
                    lesson_count: 3,
                },
                CourseStat {
                    id: 2,
                    subject: "Rust".to_owned(),
                    lesson_count: 0,
                },
            ],
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"<strong id="course-count">2</strong>"#));
        assert!(html.contains("Django &lt;basics&gt;"));
        assert!(html.contains("<td>3</td>"));
        assert!(!html.contains("No courses yet."));
    }

    #[test]
    fn test_empty_course_stats_template() {
        let html = CourseStatsTemplate {
            site_name: "Course App".to_owned(),
            course_count: 0,
            course_stats: vec![],
        }
        .render()
        .unwrap();
        assert!(html.contains("No courses yet."));
    }
}
