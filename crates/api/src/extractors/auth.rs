use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use workhub_services::{AccessError, AuthService, Principal, dao::base::DaoError};

use crate::{error::ApiError, state::AppState};

/// The authenticated caller, resolved from a JWT (Authorization header or
/// `access_token` cookie) and the live user row.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub username: String,
    pub principal: Principal,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        cookie
                            .trim()
                            .strip_prefix("access_token=")
                            .map(|s| s.to_string())
                    })
                })
        })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(parts).ok_or(AccessError::Unauthenticated)?;

        let claims = app_state.auth.verify_access_token(&token)?;
        let user_id = AuthService::user_id(&claims)?;

        // Role and email come from the stored user so revocations apply at once.
        let user = app_state.users.find_active(user_id).await.map_err(|e| match e {
            DaoError::NotFound => AccessError::Unauthenticated,
            other => AccessError::Store(other),
        })?;

        Ok(AuthUser {
            user_id,
            username: user.username,
            principal: Principal::new(user_id, user.email, user.role),
        })
    }
}

/// Helper trait for extracting AppState from composite state types
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AppState> for AppState {
    fn from_ref(input: &AppState) -> Self {
        input.clone()
    }
}
