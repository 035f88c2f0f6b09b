pub mod admin;
pub mod auth;
pub mod category;
pub mod comment;
pub mod course;
pub mod error;
pub mod lesson;
pub mod user;

use crate::app_config;
use crate::middleware::ClientCtx;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App};
use sea_orm::DatabaseConnection;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    // Route resolution will stop at the first match.
    category::configure(conf);
    course::configure(conf);
    lesson::configure(conf);
    comment::configure(conf);
    user::configure(conf);
    auth::configure(conf);
    admin::configure(conf);
}

/// Builds the application around a database connection.
/// Shared by the server binary and the integration tests.
pub fn app(db: DatabaseConnection) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let media = app_config::media();

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    App::new()
        .app_data(web::Data::new(db))
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .wrap(
            DefaultHeaders::new()
                .add((header::X_FRAME_OPTIONS, "DENY"))
                .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
        )
        .wrap(ClientCtx::default())
        .wrap(Logger::new("%a %r %s %{User-Agent}i %Dms"))
        .configure(configure)
        .service(actix_files::Files::new(&media.url_prefix, &media.root))
}
