//! Bearer token authentication for HTTP endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
};

use crate::{domain::Identity, infrastructure::dto::http::ErrorResponse, ui::state::AppState};

/// `Authorization: Bearer <token>` の token 部分
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// 認証済みのリクエスト送信者
pub struct AuthenticatedIdentity(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthenticatedIdentity {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .connect_participant_usecase
            .authenticate(bearer_token(&parts.headers))
            .map(Self)
            .map_err(|e| {
                tracing::warn!("Rejected HTTP request to {}: {}", parts.uri.path(), e);
                (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.to_string())))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));

        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));

        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
