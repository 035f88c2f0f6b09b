/// Tests for registration, token login and the current-user profile
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::database::setup_test_database;
use common::fixtures::*;
use courseapp::orm::{sessions, users};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::{json, Value};
use serial_test::serial;

#[actix_rt::test]
#[serial]
async fn test_register_and_login() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({
            "username": "newbie",
            "password": "correct horse",
            "email": "newbie@example.com",
            "first_name": "New",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "newbie");
    assert_eq!(body["first_name"], "New");
    assert_eq!(body["last_name"], "");
    assert!(body.get("password").is_none());

    // Stored hashed, never staff.
    let stored = users::Entity::find().one(&db).await.unwrap().unwrap();
    assert_ne!(stored.password, "correct horse");
    assert!(!stored.is_staff);

    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_json(json!({ "username": "newbie", "password": "correct horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_i64().unwrap() > 0);
    let token = body["access_token"].as_str().unwrap().to_owned();

    let req = test::TestRequest::get()
        .uri("/users/current-user")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "newbie");
    assert_eq!(body["email"], "newbie@example.com");

    let stored = users::Entity::find().one(&db).await.unwrap().unwrap();
    assert!(stored.last_login.is_some());
}

#[actix_rt::test]
#[serial]
async fn test_register_rejects_bad_input() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    create_test_user(&db, "taken").await;
    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "username": "taken", "password": "long enough" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["username"][0],
        "A user with that username already exists."
    );

    let rejected = [
        (json!({ "username": "shortpass", "password": "short" }), "password"),
        (json!({ "username": "   ", "password": "long enough" }), "username"),
        (json!({ "username": "bademail", "password": "long enough", "email": "nope" }), "email"),
        (json!({ "password": "long enough" }), "username"),
        (json!({ "username": "nopass" }), "password"),
    ];
    for (body, field) in rejected {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body[field].is_array(), "expected {} error, got {}", field, body);
    }

    assert_eq!(users::Entity::find().count(&db).await.unwrap(), 1);
}

#[actix_rt::test]
#[serial]
async fn test_register_trims_username_before_checking_length() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let app = test::init_service(courseapp::web::app(db.clone())).await;
    let username = "a".repeat(150);

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({
            "username": format!("  {}  ", username),
            "password": "long enough",
            "email": "",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], username.as_str());

    let stored = users::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(stored.username, username);
    assert_eq!(stored.email, None);
}

#[actix_rt::test]
#[serial]
async fn test_login_failures() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    create_test_user(&db, "alice").await;
    let disabled = create_test_user(&db, "disabled").await;
    let mut disabled: users::ActiveModel = disabled.into();
    disabled.is_active = Set(false);
    disabled.update(&db).await.unwrap();

    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let attempts = [
        (json!({ "username": "alice", "password": "wrong password" }), "Unable to log in with provided credentials."),
        (json!({ "username": "nobody", "password": TEST_PASSWORD }), "Unable to log in with provided credentials."),
        (json!({ "username": "disabled", "password": TEST_PASSWORD }), "User account is disabled."),
    ];
    for (body, message) in attempts {
        let req = test::TestRequest::post()
            .uri("/auth/token")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], message);
    }

    assert_eq!(sessions::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_update_current_user() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let user = create_test_user(&db, "alice").await;
    let token = token_for(&db, user.id).await;
    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let req = test::TestRequest::put()
        .uri("/users/current-user")
        .insert_header(bearer(&token))
        .set_json(json!({
            "first_name": "Alice",
            "email": "Alice@Example.com",
            "password": "a brand new password",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["first_name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");

    // The new password works, the old one does not.
    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_json(json!({ "username": "alice", "password": "a brand new password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_json(json!({ "username": "alice", "password": TEST_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
#[serial]
async fn test_update_current_user_clears_email() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let user = create_test_user(&db, "alice").await;
    assert!(user.email.is_some());
    let token = token_for(&db, user.id).await;
    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let req = test::TestRequest::put()
        .uri("/users/current-user")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["email"].is_null());

    let stored = users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, None);

    // Anything non-blank still has to be an address.
    let req = test::TestRequest::put()
        .uri("/users/current-user")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": "alice at example" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"][0], "Enter a valid email address.");
}

#[actix_rt::test]
#[serial]
async fn test_update_current_user_rejects_protected_fields() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let user = create_test_user(&db, "alice").await;
    let token = token_for(&db, user.id).await;
    let app = test::init_service(courseapp::web::app(db.clone())).await;

    for body in [json!({ "is_staff": true }), json!({ "username": "mallory" })] {
        let req = test::TestRequest::put()
            .uri("/users/current-user")
            .insert_header(bearer(&token))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let stored = users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.username, "alice");
    assert!(!stored.is_staff);

    let req = test::TestRequest::get()
        .uri("/users/current-user")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri("/users/current-user")
        .set_json(json!({ "is_staff": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
#[serial]
async fn test_revoke_token() {
    let Some(db) = setup_test_database().await else {
        return;
    };

    let user = create_test_user(&db, "alice").await;
    let token = token_for(&db, user.id).await;
    let app = test::init_service(courseapp::web::app(db.clone())).await;

    let req = test::TestRequest::post()
        .uri("/auth/revoke")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/users/current-user")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
