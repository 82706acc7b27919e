use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::APIResponse;
use crate::{bad_request, server_error};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("StoreConnection: {0}")]
    Connection(#[from] redis::RedisError),
    #[error("StoreTimeout: no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("No number provided (query parameter 'n')")]
    MissingNumber,
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
    #[error("Failed to serialize likes window")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        use HandlerError::*;
        match self {
            MissingNumber | InvalidNumber(_) | BodyTooLarge(_) => StatusCode::BAD_REQUEST,
            BodyRead(_) | Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        if self.status().is_client_error() {
            tracing::warn!(error = %self, "rejected request");
            return bad_request(APIResponse::new_from_msg(&self.to_string()));
        }

        tracing::error!(error = %crate::unpack_error(&self), "request failed");
        server_error(APIResponse::new_from_msg("Internal Server Error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error_chain_and_status() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err = HandlerError::from(json_err);

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let chain = crate::unpack_error(&err);
        assert!(chain.starts_with("Failed to serialize likes window: "));
        assert!(chain.len() > "Failed to serialize likes window: ".len());
    }

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(HandlerError::MissingNumber.status(), StatusCode::BAD_REQUEST);
        assert_eq!(HandlerError::BodyTooLarge(32).status(), StatusCode::BAD_REQUEST);
        let res = HandlerError::InvalidNumber("x".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
