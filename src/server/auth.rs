//! Bearer-key guard for admin routes

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::error::ApiError;
use super::app::AppState;

/// Extractor that only succeeds for requests carrying the configured admin key
///
/// - no `Authorization: Bearer ...` header: 401
/// - wrong key, or no key configured: 403
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let Some(expected) = state.config.server.api_key.as_deref() else {
            return Err(ApiError::Forbidden("Admin routes are disabled".to_string()));
        };

        if !keys_match(token, expected) {
            tracing::warn!("Rejected admin request with wrong key");
            return Err(ApiError::Forbidden("Invalid credentials".to_string()));
        }

        Ok(AdminGuard)
    }
}

/// Compare without returning early on the first differing byte
fn keys_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
