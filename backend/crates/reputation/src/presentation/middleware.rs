//! Admission Filter
//!
//! Every request from a banned network identity is answered with 403 before
//! it reaches a handler.

use crate::domain::repository::MinerRepository;
use crate::domain::value_object::MinerId;
use crate::error::BANNED_REPLY;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::request_identity;
use std::sync::Arc;

/// Header set on rejected responses
pub const BANNED_HEADER: &str = "X-Banned";

/// Middleware state
#[derive(Clone)]
pub struct BanFilterState<R>
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
}

/// Middleware that rejects banned identities
///
/// A storage failure lets the request through.
pub async fn reject_banned<R>(
    State(state): State<BanFilterState<R>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    R: MinerRepository + Clone + Send + Sync + 'static,
{
    let identity = MinerId::new(request_identity(req.headers(), req.extensions()));

    match state.repo.is_banned(&identity).await {
        Ok(true) => {
            tracing::warn!(identity = %identity, path = %req.uri().path(), "Banned identity rejected");
            return (
                StatusCode::FORBIDDEN,
                [(BANNED_HEADER, "true")],
                BANNED_REPLY,
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, identity = %identity, "Ban lookup failed, admitting request");
        }
    }

    next.run(req).await
}
