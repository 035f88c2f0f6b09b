//! JSON representations of catalog rows.
//!
//! Lessons compose: [`LessonRepr`] embeds its tags, [`LessonDetailRepr`] adds
//! the content and [`AuthorizedLessonDetailRepr`] adds what the viewing user
//! did to the lesson.

use crate::app_config;
use crate::orm::lifecycle::HasLifecycle;
use crate::orm::{categories, comments, courses, lessons, tags, users};
use actix_web::HttpRequest;
use chrono::NaiveDateTime;
use serde::Serialize;
use url::Url;

/// Builds absolute media URLs for the host a request came in on.
#[derive(Clone, Debug)]
pub struct MediaUrl {
    base: String,
}

impl MediaUrl {
    pub fn new(origin: &str, url_prefix: &str) -> Self {
        Self {
            base: format!(
                "{}/{}",
                origin.trim_end_matches('/'),
                url_prefix.trim_matches('/')
            ),
        }
    }

    pub fn from_request(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        let origin = format!("{}://{}", info.scheme(), info.host());
        Self::new(&origin, &app_config::media().url_prefix)
    }

    /// Absolute URL for a stored path. Empty paths stay empty.
    pub fn absolute(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryRepr {
    pub id: i32,
    pub name: String,
}

impl From<categories::Model> for CategoryRepr {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseRepr {
    pub id: i32,
    pub subject: String,
    pub image: String,
    pub created_date: NaiveDateTime,
    pub category_id: i32,
}

impl CourseRepr {
    pub fn new(course: courses::Model, media: &MediaUrl) -> Self {
        Self {
            id: course.id,
            image: media.absolute(&course.image),
            created_date: course.lifecycle().created_date,
            subject: course.subject,
            category_id: course.category_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagRepr {
    pub id: i32,
    pub name: String,
}

impl From<tags::Model> for TagRepr {
    fn from(tag: tags::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonRepr {
    pub id: i32,
    pub subject: String,
    pub image: String,
    pub course_id: i32,
    pub created_date: NaiveDateTime,
    pub updated_date: NaiveDateTime,
    pub tags: Vec<TagRepr>,
}

impl LessonRepr {
    pub fn new(lesson: &lessons::Model, tags: Vec<TagRepr>, media: &MediaUrl) -> Self {
        let lifecycle = lesson.lifecycle();
        Self {
            id: lesson.id,
            subject: lesson.subject.clone(),
            image: media.absolute(&lesson.image),
            course_id: lesson.course_id,
            created_date: lifecycle.created_date,
            updated_date: lifecycle.updated_date,
            tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonDetailRepr {
    #[serde(flatten)]
    pub lesson: LessonRepr,
    pub content: Option<String>,
}

impl LessonDetailRepr {
    pub fn new(lesson: lessons::Model, tags: Vec<TagRepr>, media: &MediaUrl) -> Self {
        Self {
            lesson: LessonRepr::new(&lesson, tags, media),
            content: lesson.content,
        }
    }

    pub fn with_viewer(self, viewer: ViewerState) -> AuthorizedLessonDetailRepr {
        AuthorizedLessonDetailRepr {
            detail: self,
            liked: viewer.liked,
            rating: viewer.rating,
        }
    }
}

/// What one user did to a lesson. `rating` is 0 when the user never rated it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub liked: bool,
    pub rating: i16,
}

#[derive(Debug, Serialize)]
pub struct AuthorizedLessonDetailRepr {
    #[serde(flatten)]
    pub detail: LessonDetailRepr,
    pub liked: bool,
    pub rating: i16,
}

/// Lesson detail as seen by an anonymous or an authenticated caller.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LessonDetailResponse {
    Public(LessonDetailRepr),
    Authorized(AuthorizedLessonDetailRepr),
}

#[derive(Debug, Serialize)]
pub struct RatingRepr {
    pub rating: i16,
}

/// Password is never part of the representation.
#[derive(Debug, Serialize)]
pub struct UserRepr {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl UserRepr {
    pub fn new(user: users::Model, media: &MediaUrl) -> Self {
        Self {
            id: user.id,
            avatar: user
                .avatar
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|a| media.absolute(a)),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentRepr {
    pub id: i32,
    pub content: String,
    pub created_date: NaiveDateTime,
    pub updated_date: NaiveDateTime,
    pub user: UserRepr,
}

impl CommentRepr {
    pub fn new(comment: comments::Model, user: users::Model, media: &MediaUrl) -> Self {
        let lifecycle = comment.lifecycle();
        Self {
            id: comment.id,
            content: comment.content,
            created_date: lifecycle.created_date,
            updated_date: lifecycle.updated_date,
            user: UserRepr::new(user, media),
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Absolute URL of the request, if it can be reconstructed.
pub fn request_url(req: &HttpRequest) -> Option<Url> {
    let info = req.connection_info();
    Url::parse(&format!("{}://{}{}", info.scheme(), info.host(), req.uri())).ok()
}

/// `current` with its `page` parameter replaced. Page 1 drops the parameter.
pub fn page_link(current: &Url, page: usize) -> String {
    let pairs: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = current.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn lesson() -> lessons::Model {
        lessons::Model {
            id: 7,
            subject: "Ownership".to_owned(),
            content: Some("<p>Moves and borrows</p>".to_owned()),
            image: "lessons/2024/03/ownership.png".to_owned(),
            course_id: 3,
            created_date: timestamp(),
            updated_date: timestamp(),
            active: true,
        }
    }

    #[test]
    fn test_media_url() {
        let media = MediaUrl::new("http://testserver/", "/static/");
        assert_eq!(
            media.absolute("courses/2024/01/a.png"),
            "http://testserver/static/courses/2024/01/a.png"
        );
        assert_eq!(media.absolute("/b.png"), "http://testserver/static/b.png");
        assert_eq!(media.absolute(""), "");
    }

    #[test]
    fn test_lesson_detail_shape() {
        let media = MediaUrl::new("http://testserver", "/static");
        let tags = vec![TagRepr {
            id: 1,
            name: "rust".to_owned(),
        }];
        let detail = LessonDetailRepr::new(lesson(), tags, &media);
        let value = serde_json::to_value(LessonDetailResponse::Public(detail)).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["course_id"], 3);
        assert_eq!(value["content"], "<p>Moves and borrows</p>");
        assert_eq!(
            value["image"],
            "http://testserver/static/lessons/2024/03/ownership.png"
        );
        assert_eq!(value["tags"][0]["name"], "rust");
        assert!(value.get("liked").is_none());
        assert!(value.get("rating").is_none());
    }

    #[test]
    fn test_authorized_lesson_detail_adds_viewer_state() {
        let media = MediaUrl::new("http://testserver", "/static");
        let detail = LessonDetailRepr::new(lesson(), vec![], &media).with_viewer(ViewerState {
            liked: true,
            rating: 4,
        });
        let value = serde_json::to_value(LessonDetailResponse::Authorized(detail)).unwrap();

        assert_eq!(value["subject"], "Ownership");
        assert_eq!(value["liked"], true);
        assert_eq!(value["rating"], 4);
        assert_eq!(value["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_user_repr_omits_password() {
        let media = MediaUrl::new("http://testserver", "/static");
        let user = users::Model {
            id: 1,
            username: "alice".to_owned(),
            password: "$argon2id$v=19$...".to_owned(),
            email: Some("alice@example.com".to_owned()),
            first_name: "Alice".to_owned(),
            last_name: "Liddell".to_owned(),
            avatar: Some("avatars/alice.png".to_owned()),
            is_active: true,
            is_staff: false,
            date_joined: timestamp(),
            last_login: None,
        };
        let value = serde_json::to_value(UserRepr::new(user, &media)).unwrap();

        assert!(value.get("password").is_none());
        assert_eq!(value["avatar"], "http://testserver/static/avatars/alice.png");
        assert_eq!(value["username"], "alice");
    }

    #[test]
    fn test_page_link_keeps_filters() {
        let url = Url::parse("http://testserver/courses?q=django&category_id=2&page=2").unwrap();
        assert_eq!(
            page_link(&url, 3),
            "http://testserver/courses?q=django&category_id=2&page=3"
        );
        assert_eq!(
            page_link(&url, 1),
            "http://testserver/courses?q=django&category_id=2"
        );
    }

    #[test]
    fn test_page_link_without_filters() {
        let url = Url::parse("http://testserver/courses?page=2").unwrap();
        assert_eq!(page_link(&url, 1), "http://testserver/courses");
        assert_eq!(page_link(&url, 3), "http://testserver/courses?page=3");
    }
}
