//! JSON error responses.

use crate::user::AccountError;
use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Field name to list of messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Invalid input.")]
    Validation(FieldErrors),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "Authentication credentials were not provided.")]
    Unauthorized,
    #[display(fmt = "You do not have permission to perform this action.")]
    Forbidden,
    #[display(fmt = "Not found.")]
    NotFound,
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "A server error occurred.")]
    Database(DbErr),
    #[display(fmt = "A server error occurred.")]
    Internal(String),
}

impl ApiError {
    /// Single-field validation error.
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_owned(), vec![message.to_owned()]);
        Self::Validation(errors)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation(errors) => HttpResponse::build(self.status_code()).json(errors),
            Self::Database(e) => {
                log::error!("Database error: {}", e);
                HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
            }
            Self::Internal(e) => {
                log::error!("Internal error: {}", e);
                HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() })),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UsernameTaken => {
                Self::field("username", &AccountError::UsernameTaken.to_string())
            }
            AccountError::Hash(e) => Self::Internal(format!("password hashing failed: {}", e)),
            AccountError::Database(e) => Self::Database(e),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_validation_errors(&errors, None, &mut fields);
        Self::Validation(fields)
    }
}

fn collect_validation_errors(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let name = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => (*field).to_owned(),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = out.entry(name).or_default();
                for err in errs {
                    messages.push(match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value ({}).", err.code),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(nested, Some(&name), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let item_name = format!("{}[{}]", name, index);
                    collect_validation_errors(nested, Some(&item_name), out);
                }
            }
        }
    }
}

/// Name of the field a deserialize error reports as absent.
fn missing_field(err: &serde_json::Error) -> Option<String> {
    if !err.is_data() {
        return None;
    }
    err.to_string()
        .strip_prefix("missing field `")?
        .split('`')
        .next()
        .map(str::to_owned)
}

/// Absent fields get field-level detail like any other invalid field.
fn deserialize_error(err: &serde_json::Error) -> ApiError {
    match missing_field(err) {
        Some(field) => ApiError::field(&field, "This field is required."),
        None => ApiError::BadRequest(format!("JSON parse error - {}", err)),
    }
}

/// Parses a body read as raw bytes. Handlers that must check the caller
/// before looking at the payload extract `web::Bytes` and call this.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("Rejected JSON payload: {}", e);
        deserialize_error(&e)
    })
}

/// Rejected JSON bodies.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected JSON payload: {}", err);
    match &err {
        JsonPayloadError::Deserialize(e) => deserialize_error(e).into(),
        _ => ApiError::BadRequest(format!("JSON parse error - {}", err)).into(),
    }
}

/// Rejected query strings.
pub fn query_error_handler(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string: {}", err);
    ApiError::BadRequest(format!("Invalid query parameters - {}", err)).into()
}

/// Path segments that do not parse (e.g. a non-numeric id) name no resource.
pub fn path_error_handler(err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected path: {}", err);
    ApiError::NotFound.into()
}
