//! Category, course and lesson listings.

use crate::orm::lifecycle::SoftDelete;
use crate::orm::{categories, courses, lesson_tags, lessons, tags};
use crate::serializer::TagRepr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbBackend, DbErr, FromQueryResult, Statement};
use std::collections::HashMap;

/// Shared `FROM`/`WHERE` of the course listing and its count.
/// `$1` is a lowercase `LIKE` pattern or NULL, `$2` a category id or NULL.
const COURSE_FILTER_SQL: &str = r#"
    FROM courses
    WHERE active = TRUE
      AND ($1::TEXT IS NULL OR LOWER(subject) LIKE $1)
      AND ($2::INT IS NULL OR category_id = $2)
"#;

/// Filters accepted by the course listing.
#[derive(Clone, Debug, Default)]
pub struct CourseFilter {
    /// Case-insensitive substring of the subject.
    pub q: Option<String>,
    pub category_id: Option<i32>,
}

impl CourseFilter {
    fn pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(contains_pattern)
    }
}

/// One page of courses plus the total number of matches.
#[derive(Debug)]
pub struct CoursePage {
    pub courses: Vec<courses::Model>,
    pub count: usize,
    pub num_pages: usize,
}

/// Page requested past the end of the listing.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidPage;

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

pub async fn list_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<categories::Model>, DbErr> {
    categories::Entity::find_active().all(db).await
}

/// Case-insensitive `LIKE` pattern for a substring search.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

/// Number of pages needed for `count` rows. An empty listing still has one page.
fn page_count(count: usize, page_size: usize) -> usize {
    ((count + page_size - 1) / page_size).max(1)
}

/// Fetches 1-based `page` of the filtered course listing, ordered by id.
/// Page 1 of an empty listing is valid; any other page past the end is not.
pub async fn list_courses<C: ConnectionTrait>(
    db: &C,
    filter: &CourseFilter,
    page: usize,
    page_size: usize,
) -> Result<Result<CoursePage, InvalidPage>, DbErr> {
    let page_size = page_size.max(1);

    let count = CountRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        &format!("SELECT COUNT(*) AS count {}", COURSE_FILTER_SQL),
        [filter.pattern().into(), filter.category_id.into()],
    ))
    .one(db)
    .await?
    .map_or(0, |row| row.count.max(0) as usize);

    let num_pages = page_count(count, page_size);
    if page == 0 || page > num_pages {
        return Ok(Err(InvalidPage));
    }

    let courses = courses::Entity::find()
        .from_raw_sql(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &format!(
                "SELECT * {} ORDER BY id ASC LIMIT $3 OFFSET $4",
                COURSE_FILTER_SQL
            ),
            [
                filter.pattern().into(),
                filter.category_id.into(),
                (page_size as i64).into(),
                (((page - 1) * page_size) as i64).into(),
            ],
        ))
        .all(db)
        .await?;

    Ok(Ok(CoursePage {
        courses,
        count,
        num_pages,
    }))
}

pub async fn get_active_course<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
) -> Result<Option<courses::Model>, DbErr> {
    courses::Entity::find_active()
        .filter(courses::Column::Id.eq(course_id))
        .one(db)
        .await
}

/// Active lessons of a course, optionally narrowed by subject substring.
pub async fn list_course_lessons<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    subject: Option<&str>,
) -> Result<Vec<lessons::Model>, DbErr> {
    let pattern = subject.filter(|s| !s.is_empty()).map(contains_pattern);
    lessons::Entity::find()
        .from_raw_sql(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT *
            FROM lessons
            WHERE active = TRUE
              AND course_id = $1
              AND ($2::TEXT IS NULL OR LOWER(subject) LIKE $2)
            ORDER BY id ASC
            "#,
            [course_id.into(), pattern.into()],
        ))
        .all(db)
        .await
}

/// Active tags of each lesson, keyed by lesson id and ordered by tag id.
/// Every requested id is present in the result.
pub async fn tags_for_lessons<C: ConnectionTrait>(
    db: &C,
    lesson_ids: &[i32],
) -> Result<HashMap<i32, Vec<TagRepr>>, DbErr> {
    let mut result: HashMap<i32, Vec<TagRepr>> =
        lesson_ids.iter().map(|&id| (id, Vec::new())).collect();
    if lesson_ids.is_empty() {
        return Ok(result);
    }

    let links = lesson_tags::Entity::find()
        .filter(lesson_tags::Column::LessonId.is_in(lesson_ids.to_vec()))
        .find_also_related(tags::Entity)
        .filter(tags::Column::Active.eq(true))
        .order_by_asc(tags::Column::Id)
        .all(db)
        .await?;

    for (link, tag) in links {
        if let (Some(tag), Some(list)) = (tag, result.get_mut(&link.lesson_id)) {
            list.push(tag.into());
        }
    }

    Ok(result)
}
