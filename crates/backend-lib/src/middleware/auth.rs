// crates/backend-lib/src/middleware/auth.rs

//! Session check for protected routes.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AUTH_HEADER;
use crate::{error::AppError, AppState};

/// Reject requests without a valid session token.
///
/// On success the [`Session`](crate::auth::Session) is stored in the request
/// extensions for handlers to extract. Which routes skip this check is decided
/// by the router, not here.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(value) = request.headers().get(AUTH_HEADER) else {
        return Err(AppError::MissingToken);
    };
    let token = value.to_str().map_err(|_| AppError::Unauthorized)?;
    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    let session = state.sessions.check(token).await?;
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
