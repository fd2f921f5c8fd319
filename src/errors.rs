// errors.rs
use crate::sync::StoreError;
use thiserror::Error;

/// Errors surfaced by the HTTP layer, either from request handling itself or
/// from the store underneath.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ServerError::NotFound,
            StoreError::Validation(msg) => ServerError::BadRequest(msg),
            other => ServerError::DbError(other.to_string()),
        }
    }
}
