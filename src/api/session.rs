//! Cookie-session authentication.

use axum::{async_trait, extract::FromRequestParts, http::{header, request::Parts, HeaderMap}};
use chrono::Utc;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::StorefrontError;

/// The customer behind the request's session cookie. Rejects with 401.
#[derive(Clone, Copy, Debug)]
pub struct CurrentCustomer(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.session_cookie).ok_or(StorefrontError::Unauthenticated)?;
        let customer_id = state.repo.customer_for_session(token, Utc::now()).await?.ok_or(StorefrontError::Unauthenticated)?;
        Ok(Self(customer_id))
    }
}

fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; ivma_session=abc123; lang=en"));
        assert_eq!(session_token(&headers, "ivma_session"), Some("abc123"));
        assert_eq!(session_token(&headers, "other"), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("ivma_session="));
        assert_eq!(session_token(&headers, "ivma_session"), None);
    }
}
