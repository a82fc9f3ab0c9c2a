use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Relay bearer-token settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    tokens: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from the configured relay tokens.
    ///
    /// In development, no tokens disables auth for local iteration.
    /// Elsewhere, no tokens fails startup.
    pub fn from_tokens(tokens: &[String], is_development: bool) -> anyhow::Result<Self> {
        if tokens.is_empty() {
            if is_development {
                tracing::warn!(
                    "BOOSTLINE_RELAY_TOKENS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    tokens: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "BOOSTLINE_RELAY_TOKENS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            tokens: Arc::new(tokens.to_vec()),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.tokens
            .iter()
            .any(|known| bool::from(known.as_bytes().ct_eq(token.as_bytes())))
    }
}

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
struct Rejection {
    error: RejectionDetail,
}

#[derive(Debug, Serialize)]
struct RejectionDetail {
    code: &'static str,
    message: &'static str,
}

fn unauthorized() -> Response {
    let body = Rejection {
        error: RejectionDetail {
            code: "unauthorized",
            message: "relay bearer token missing or not recognised",
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Tags every request with a [`RequestId`], reusing the caller's
/// `x-request-id` when present, and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = match req.headers().get(REQUEST_ID_HEADER).map(HeaderValue::to_str) {
        Some(Ok(given)) if !given.is_empty() => given.to_owned(),
        _ => Uuid::new_v4().to_string(),
    };
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects relay calls whose bearer token is not configured.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    let permitted = !auth.enabled
        || bearer_token(req.headers().get(AUTHORIZATION)).is_some_and(|t| auth.allows(t));
    if permitted {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "relay request rejected: bad bearer token");
        unauthorized()
    }
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    let (scheme, token) = value?.to_str().ok()?.split_once(' ')?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer relay-token");
        assert_eq!(bearer_token(Some(&header)), Some("relay-token"));
    }

    #[test]
    fn bearer_token_rejects_blank_token() {
        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(bearer_token(Some(&header)), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_tokens_in_dev() {
        let state = AuthState::from_tokens(&[], true).expect("dev should allow missing tokens");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_tokens_outside_dev() {
        assert!(AuthState::from_tokens(&[], false).is_err());
    }

    #[test]
    fn allows_only_configured_tokens() {
        let state = AuthState::from_tokens(&["alpha".to_string(), "beta".to_string()], false)
            .expect("tokens configured");
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("alph"));
    }
}
