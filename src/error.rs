use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sea_orm::DbErr),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::InvalidInput(msg) => {
                log::warn!("Invalid input: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "INVALID_INPUT",
                    msg.clone(),
                )
            }
            AppError::SlotConflict(msg) => {
                // 客户端收到后应重新拉取可用时段再选，而不是原样重试
                log::warn!("Slot conflict: {msg}");
                (
                    actix_web::http::StatusCode::CONFLICT,
                    "SLOT_CONFLICT",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::PermissionDenied => {
                log::warn!("Permission denied");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    "Permission denied".to_string(),
                )
            }
            AppError::StorageUnavailable(err) => {
                // 只记日志，不把数据库细节回给调用方；5xx 可带退避重试
                log::error!("Storage unavailable: {err}");
                (
                    actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    "Storage unavailable".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
