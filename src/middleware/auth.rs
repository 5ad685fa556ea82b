// ==============================================================================
// middleware/auth.rs - Shared Secret Authorization
// ==============================================================================
// Description: Check the Authorization header of mutating requests
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
//
// POST, PUT and DELETE on /result must carry an Authorization header equal to
// the configured secret. The extractor is listed first in those handlers so a
// bad credential is rejected with 403 before any other input is looked at.
//
// ==============================================================================

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::warn;

use crate::handlers::AppError;
use crate::state::AppState;

/// Proof that the request presented the shared secret
///
/// # Example
/// ```rust,ignore
/// async fn my_handler(_auth: SharedSecret) -> impl IntoResponse {
///     "authorized"
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SharedSecret;

impl FromRequestParts<AppState> for SharedSecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match presented {
            Some(secret) if secret == state.config().secret => Ok(SharedSecret),
            Some(_) => {
                warn!("Rejected {} {}: wrong credential", parts.method, parts.uri.path());
                Err(AppError::Forbidden)
            }
            None => {
                warn!("Rejected {} {}: missing credential", parts.method, parts.uri.path());
                Err(AppError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::Request;
    use clap::Parser;

    fn state() -> AppState {
        AppState::new(AppConfig::parse_from(["variant-result-api", "--secret", "password"]))
    }

    async fn extract(request: Request<()>) -> Result<SharedSecret, AppError> {
        let (mut parts, _) = request.into_parts();
        SharedSecret::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn test_correct_secret() {
        let req = Request::builder()
            .header("Authorization", "password")
            .body(())
            .unwrap();

        assert!(extract(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_header() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(extract(req).await, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let req = Request::builder()
            .header("Authorization", "wrong_password")
            .body(())
            .unwrap();

        assert!(matches!(extract(req).await, Err(AppError::Forbidden)));
    }
}
