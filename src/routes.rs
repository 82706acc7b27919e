use axum::{Router, extract::DefaultBodyLimit, routing::get};

use crate::handler::{
    self, AppState, MAX_BODY_SIZE, method_not_allowed, preflight, query_likes, submit_like,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(query_likes)
                .post(submit_like)
                .options(preflight)
                .head(method_not_allowed)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .route("/health", get(handler::healthcheck))
}
