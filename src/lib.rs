use crate::api::APIResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod likes;
pub mod routes;
pub mod store;

pub fn server_error(body: APIResponse) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub fn bad_request(body: APIResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn unpack_error(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
