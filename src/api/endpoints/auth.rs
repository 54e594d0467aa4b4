//! Identity endpoints.
//!
//! - `GET /api/auth/session`: current identity state
//! - `PUT /api/auth/session`: browser auth SDK reports a state change
//! - `POST /api/auth/google`: sign in through the identity provider
//! - `POST /api/auth/email`: local email sign-in / sign-up
//! - `POST /api/auth/logout`: sign out

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::identity::{EmailSignIn, IdentityState};
use crate::models::UserIdentity;

#[derive(Deserialize)]
pub struct AuthStateChange {
    pub user: Option<UserIdentity>,
}

pub async fn session(State(ctx): State<ApiContext>) -> Json<IdentityState> {
    Json(ctx.core.identity().current())
}

pub async fn report_state(
    State(ctx): State<ApiContext>,
    Json(change): Json<AuthStateChange>,
) -> Json<IdentityState> {
    let next = match change.user {
        Some(user) => IdentityState::SignedIn(user),
        None => IdentityState::SignedOut,
    };
    ctx.core.identity().apply(next);
    Json(ctx.core.identity().current())
}

pub async fn google(State(ctx): State<ApiContext>) -> Result<Json<UserIdentity>, ApiError> {
    let user = ctx.core.identity().sign_in_with_google()?;
    Ok(Json(user))
}

pub async fn email(
    State(ctx): State<ApiContext>,
    Json(form): Json<EmailSignIn>,
) -> Result<Json<UserIdentity>, ApiError> {
    let user = ctx.core.identity().sign_in_with_email(form)?;
    Ok(Json(user))
}

pub async fn logout(State(ctx): State<ApiContext>) -> Result<Json<IdentityState>, ApiError> {
    ctx.core.identity().logout()?;
    Ok(Json(ctx.core.identity().current()))
}
