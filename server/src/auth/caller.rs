use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::OrganizerId;
use crate::services::event_service::require_organizer;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Identity of the caller, resolved once per request from the bearer token.
/// Operations that need an organizer decide what an absent identity means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(pub Option<OrganizerId>);

impl Caller {
    pub fn identity(&self) -> Option<&OrganizerId> {
        self.0.as_ref()
    }

    /// Fails with `Unauthorized` unless a non-blank organizer was resolved.
    pub fn organizer(&self) -> Result<&OrganizerId, AppError> {
        require_organizer(self.identity())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer(&parts.headers) else {
            return Ok(Caller(None));
        };
        Ok(Caller(state.identity.resolve(&token).await))
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
