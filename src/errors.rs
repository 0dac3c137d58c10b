use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    Json(serde_json::Error),
    BadRequest(String),
    Unauthorized,
    RateLimited,
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "State store error: {e}"),
            AppError::Pool(e) => write!(f, "State store unavailable: {e}"),
            AppError::Json(e) => write!(f, "Serialization error: {e}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::RateLimited => write!(f, "Too many attempts"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized => HttpResponse::Unauthorized().body("unauthorized"),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().body(msg.clone()),
            AppError::RateLimited => {
                HttpResponse::TooManyRequests().body("too many attempts, try again later")
            }
            AppError::NotFound => HttpResponse::NotFound().body("not found"),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": self.to_string(),
                    "stack": format!("{self:?}"),
                }))
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}
