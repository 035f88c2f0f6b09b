use crate::catalog::list_categories;
use crate::serializer::CategoryRepr;
use crate::web::error::ApiError;
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_categories);
}

/// GET /categories - Every active category, ordered by id.
#[get("/categories")]
async fn view_categories(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let categories: Vec<CategoryRepr> = list_categories(db.get_ref())
        .await?
        .into_iter()
        .map(CategoryRepr::from)
        .collect();

    Ok(HttpResponse::Ok().json(categories))
}
