use axum::{
    Json,
    body::Bytes,
    extract::{
        Query, RawQuery, State,
        rejection::{BytesRejection, FailedToBufferBody, QueryRejection},
    },
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use tracing::info;

use crate::api::{APIResponse, LikeQuery};
use crate::error::HandlerError;
use crate::likes::{Likes, Window};

#[derive(Clone)]
pub struct AppState {
    pub likes: Likes,
}

/// Largest accepted body for a submitted like.
pub const MAX_BODY_SIZE: usize = 32;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Set on a submit-like response when the increment may not have landed.
pub const LIKE_DEGRADED: HeaderName = HeaderName::from_static("x-like-degraded");

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

pub async fn submit_like(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, HandlerError> {
    let body = body.map_err(|rejection| match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            HandlerError::BodyTooLarge(MAX_BODY_SIZE)
        }
        other => HandlerError::BodyRead(other.body_text()),
    })?;
    let num = parse_number(&String::from_utf8_lossy(&body))?;

    let outcome = state.likes.increment(num).await;
    let window = state.likes.get_window(num).await;

    let mut response = window_response(StatusCode::CREATED, &window)?;
    if outcome.is_degraded() {
        tracing::warn!(id = num, "returning window for a like that may not have landed");
        response
            .headers_mut()
            .insert(LIKE_DEGRADED, HeaderValue::from_static("true"));
    }

    Ok(response)
}

pub async fn query_likes(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, HandlerError> {
    let Query(pairs) = query
        .map_err(|_| HandlerError::InvalidNumber(raw_query.unwrap_or_default()))?;
    let raw = LikeQuery::from_pairs(pairs)
        .n
        .filter(|n| !n.is_empty())
        .ok_or(HandlerError::MissingNumber)?;
    let num = parse_number(&raw)?;

    let window = state.likes.get_window(num).await;
    window_response(StatusCode::OK, &window)
}

/// Front-door proxies own the origin headers; this only advertises what the endpoint accepts.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
            (header::ALLOW, ALLOWED_METHODS),
        ],
    )
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        Json(APIResponse::new_from_msg("Method Not Allowed")),
    )
        .into_response()
}

fn parse_number(raw: &str) -> Result<i64, HandlerError> {
    raw.parse::<i64>()
        .map_err(|_| HandlerError::InvalidNumber(raw.to_string()))
}

fn window_response(status: StatusCode, window: &Window) -> Result<Response, HandlerError> {
    let body = serde_json::to_vec(window)?;
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
