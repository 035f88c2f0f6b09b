//! Test fixtures for creating test data
#![allow(dead_code)]

use actix_web::http::header;
use courseapp::orm::{categories, courses, lessons, users};
use courseapp::user::{create_user, NewUser};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Password given to every fixture user.
pub const TEST_PASSWORD: &str = "password123";

/// Create a user with the fixture password.
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> users::Model {
    insert_user(db, username, false).await
}

/// Create a staff user with the fixture password.
pub async fn create_staff_user(db: &DatabaseConnection, username: &str) -> users::Model {
    insert_user(db, username, true).await
}

async fn insert_user(db: &DatabaseConnection, username: &str, is_staff: bool) -> users::Model {
    create_user(
        db,
        NewUser {
            username: username.to_owned(),
            password: TEST_PASSWORD.to_owned(),
            email: Some(format!("{}@test.com", username)),
            first_name: String::new(),
            last_name: String::new(),
            avatar: None,
        },
        is_staff,
    )
    .await
    .expect("Failed to create user")
}

/// Issue a bearer token for the user.
pub async fn token_for(db: &DatabaseConnection, user_id: i32) -> String {
    courseapp::session::new_session(db, user_id, 60)
        .await
        .expect("Failed to create session")
        .id
}

/// `Authorization` header carrying the token.
pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn create_category(db: &DatabaseConnection, name: &str) -> categories::Model {
    categories::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create category")
}

pub async fn create_course(
    db: &DatabaseConnection,
    category_id: i32,
    subject: &str,
) -> courses::Model {
    courses::ActiveModel {
        subject: Set(subject.to_owned()),
        description: Set(Some(format!("<p>{}</p>", subject))),
        image: Set(format!("courses/{}.png", subject.to_lowercase().replace(' ', "-"))),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create course")
}

pub async fn create_lesson(db: &DatabaseConnection, course_id: i32, subject: &str) -> lessons::Model {
    lessons::ActiveModel {
        subject: Set(subject.to_owned()),
        content: Set(Some(format!("<p>{} content</p>", subject))),
        image: Set(String::new()),
        course_id: Set(course_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create lesson")
}

/// Soft delete a course.
pub async fn deactivate_course(db: &DatabaseConnection, course: courses::Model) -> Result<courses::Model, DbErr> {
    let mut active: courses::ActiveModel = course.into();
    active.active = Set(false);
    active.update(db).await
}

/// Soft delete a lesson.
pub async fn deactivate_lesson(db: &DatabaseConnection, lesson: lessons::Model) -> Result<lessons::Model, DbErr> {
    let mut active: lessons::ActiveModel = lesson.into();
    active.active = Set(false);
    active.update(db).await
}

/// Soft delete a category.
pub async fn deactivate_category(
    db: &DatabaseConnection,
    category: categories::Model,
) -> Result<categories::Model, DbErr> {
    let mut active: categories::ActiveModel = category.into();
    active.active = Set(false);
    active.update(db).await
}
