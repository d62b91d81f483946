use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed")]
    Validation(HashMap<String, String>),
}

impl ApiError {
    /// Field-level validation messages, if the backend returned any.
    pub fn validation_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
