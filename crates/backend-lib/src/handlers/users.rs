// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! User handlers.
//!
//! `/register` and `/login` are public. Everything else runs behind
//! [`require_session`](crate::middleware::require_session), which leaves the
//! caller's [`Session`] in the request extensions.
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use tracing::{debug, info};
use usersvc_common::{
    ListUsersResponse, LoginRequest, LoginResponse, PasswordChange, UserId, UserIn, UserUpdate,
    UserView,
};

use crate::auth::Session;
use crate::users::User;
use crate::validation::{password_errors, validate_user};
use crate::{error::AppError, AppState};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn path_id(id: Result<Path<UserId>, PathRejection>) -> Result<UserId, AppError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// A session may only modify its own user
fn ensure_self(session: &Session, id: UserId) -> Result<(), AppError> {
    if session.user_id != id {
        return Err(AppError::Forbidden("cannot modify another user".to_string()));
    }
    Ok(())
}

fn issue(state: &AppState, user: &User) -> Result<LoginResponse, AppError> {
    let token = state.sessions.create(user)?;
    Ok(LoginResponse {
        token,
        user_id: user.id,
    })
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserIn>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let input = body(payload)?;
    validate_user(&input, &state.settings.password_requirements).map_err(AppError::Validation)?;

    let user = state.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(issue(&state, &user)?)))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let LoginRequest { email, password } = body(payload)?;

    let user = state.users.check_password_by_email(&email, password).await?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(issue(&state, &user)?))
}

/// `GET /users`
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ListUsersResponse>, AppError> {
    debug!(user_id = session.user_id, "listing users");
    let users = state.users.list().await?;
    Ok(Json(ListUsersResponse {
        users: users.iter().map(User::view).collect(),
    }))
}

/// `PUT /users/{id}`
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UserView>, AppError> {
    let id = path_id(id)?;
    ensure_self(&session, id)?;
    let update = body(payload)?;

    let user = state.users.partial_update(id, update).await?;
    Ok(Json(user.view()))
}

/// `PUT /users/{id}/password`
///
/// Changing the password revokes every earlier token, including the one
/// used for this request, so a fresh token is returned.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let id = path_id(id)?;
    ensure_self(&session, id)?;
    let change = body(payload)?;

    let errors = password_errors(&change.new_password, &state.settings.password_requirements);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let user = state
        .users
        .change_password(id, change.current_password, change.new_password)
        .await?;
    Ok(Json(issue(&state, &user)?))
}
