//! Authentication middleware and extractors for axum.
//!
//! Callers authenticate with the access token attached to their user record:
//!
//! ```text
//! Authorization: Bearer <accessToken>
//! ```
//!
//! ```text
//! Request → auth_middleware → injects UserRecord into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! # Example
//!
//! ```ignore
//! let repo: Arc<dyn UserRecordRepository> = Arc::new(InMemoryUserRecordRepository::new());
//!
//! let app = Router::new()
//!     .route("/api/me", get(me))
//!     .route_layer(middleware::from_fn_with_state(repo, auth_middleware));
//!
//! async fn me(RequireAuth(user): RequireAuth) -> String {
//!     user.email.to_string()
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::billing::UserRecord;
use crate::ports::UserRecordRepository;

/// Auth middleware state - the record store used for token lookup.
pub type AuthState = Arc<dyn UserRecordRepository>;

/// Resolves a Bearer token to its user record.
///
/// - Missing header: continues without a user (use `RequireAuth` to enforce)
/// - Unknown token: 401
/// - Store failure: 503
pub async fn auth_middleware(
    State(repository): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match repository.find_by_access_token(&token).await {
        Ok(Some(record)) => {
            request.extensions_mut().insert(record);
            next.run(request).await
        }
        Ok(None) => auth_error(StatusCode::UNAUTHORIZED, "Invalid token"),
        Err(e) => {
            tracing::error!(error = %e, "Access token lookup failed");
            auth_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service unavailable",
            )
        }
    }
}

fn auth_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": "AUTH_ERROR"
        })),
    )
        .into_response()
}

/// Extractor that requires an authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub UserRecord);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserRecord>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid access token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => {
                auth_error(StatusCode::UNAUTHORIZED, "Authentication required")
            }
        }
    }
}
