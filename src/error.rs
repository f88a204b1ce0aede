use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not Found")]
    NotFound,
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Generic error: {0}")]
    Generic(String),
}

/// JSON body returned for every relay failure.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn summary(&self) -> String {
        match self {
            AppError::InvalidRequest(_) => t!("errors.invalid_request").to_string(),
            AppError::NotFound => t!("errors.not_found").to_string(),
            AppError::Upstream(_) => t!("errors.upstream").to_string(),
            AppError::Timeout(_) => t!("errors.timeout").to_string(),
            AppError::Config(_) | AppError::Io(_) | AppError::Anyhow(_) | AppError::Generic(_) => {
                t!("errors.internal").to_string()
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Anyhow(_)
            | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let response = ErrorResponse::from(self);
        log::debug!("Final error response: {:?}", response);
        HttpResponse::build(self.status_code()).content_type(ContentType::json()).json(response)
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        ErrorResponse {
            code: error.status_code().as_u16(),
            error: error.summary(),
            message: error.to_string(),
        }
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
