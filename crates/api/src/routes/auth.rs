use axum::{Json, extract::State, http::{HeaderMap, HeaderValue, StatusCode, header}};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use workhub_db::models::{GlobalRole, User};
use workhub_services::{
    AccessError, AuthService,
    auth::TokenPair,
    dao::{base::DaoError, user::normalize_email},
};

use super::hex_id;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 2, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// `owner` or `member`; admin is never self-assigned.
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub role: GlobalRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: hex_id(user.id),
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            avatar: user.avatar,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Global role for a new account. Configured admin emails win over the
/// requested role; anything but `owner` falls back to member.
fn registration_role(state: &AppState, email: &str, requested: Option<&str>) -> GlobalRole {
    let email = normalize_email(email);
    if state
        .settings
        .auth
        .admin_emails
        .iter()
        .any(|admin| normalize_email(admin) == email)
    {
        return GlobalRole::Admin;
    }
    match requested.and_then(|r| r.parse::<GlobalRole>().ok()) {
        Some(GlobalRole::Owner) => GlobalRole::Owner,
        _ => GlobalRole::Member,
    }
}

fn session_response(
    state: &AppState,
    user: User,
) -> Result<(HeaderMap, AuthResponse), ApiError> {
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("User without id".to_string()))?;
    let TokenPair {
        access_token,
        refresh_token,
        expires_in,
    } = state
        .auth
        .generate_tokens(user_id, &user.email, &user.username)?;

    let mut headers = HeaderMap::new();
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        access_token, expires_in
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie header: {e}")))?;
    headers.insert(header::SET_COOKIE, cookie);

    Ok((
        headers,
        AuthResponse {
            access_token,
            refresh_token,
            expires_in,
            user: user.into(),
        },
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let role = registration_role(&state, &body.email, body.role.as_deref());
    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(
            &body.email,
            body.username,
            body.display_name,
            password_hash,
            role,
        )
        .await
        .map_err(|e| match e {
            DaoError::DuplicateKey(_) => {
                ApiError::Conflict("Email or username already registered".to_string())
            }
            other => other.into(),
        })?;

    info!(user_id = %hex_id(user.id), %role, "User registered");
    let (headers, response) = session_response(&state, user)?;
    Ok((StatusCode::CREATED, headers, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user = if let Some(ref username) = body.username {
        state.users.find_by_username(username).await
    } else if let Some(ref email) = body.email {
        state.users.find_by_email(email).await
    } else {
        return Err(ApiError::BadRequest("Either username or email is required".to_string()));
    }
    .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("No password set".to_string()))?;

    if !state.auth.verify_password(&body.password, password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if let Some(user_id) = user.id {
        state.users.touch(user_id).await?;
    }

    let (headers, response) = session_response(&state, user)?;
    Ok((headers, Json(response)))
}

pub async fn logout() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"),
    );
    headers
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find_active(auth.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;
    let user_id = AuthService::user_id(&claims)?;

    let user = state
        .users
        .find_active(user_id)
        .await
        .map_err(|e| match e {
            DaoError::NotFound => AccessError::Unauthenticated,
            other => AccessError::Store(other),
        })?;

    let (headers, response) = session_response(&state, user)?;
    Ok((headers, Json(response)))
}
