/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register`: create an account
/// - `GET  /v1/auth/login`: login form description, or a redirect when
///   already signed in
/// - `POST /v1/auth/login`: start a session
/// - `POST /v1/auth/logout`: end the session
///
/// A successful login sets the `taskboard_session` cookie and also returns
/// the token so non-browser clients can send it as a bearer token.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/v1/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"email":"ada@example.com","first_name":"Ada","last_name":"Lovelace",
///        "password":"Engine#1843","password_confirmation":"Engine#1843"}'
///
/// curl -c cookies.txt -X POST http://localhost:8080/v1/auth/login \
///   -H "Content-Type: application/json" \
///   -d '{"email":"ada@example.com","password":"Engine#1843"}'
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::root::MY_TASKS_PATH,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{
        middleware::{authenticate, clear_session_cookie, session_cookie},
        password,
        session::{issue_session, SessionClaims},
    },
    models::user::{CreateUser, User, UserSummary},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 150, message = "First name is required (at most 150 characters)"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150, message = "Last name is required (at most 150 characters)"))]
    pub last_name: String,

    pub password: String,

    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,

    pub token: String,

    /// Unix timestamp
    pub expires_at: i64,
}

/// What a client needs to render the login form
#[derive(Debug, Serialize)]
pub struct LoginForm {
    pub action: String,

    pub method: &'static str,

    pub fields: [&'static str; 2],

    pub register: &'static str,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    req.validate()?;
    password::check_new_password(&req.password, &req.password_confirmation)?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::invalid("email", "A user with that email already exists"));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            is_staff: false,
            is_superuser: false,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if authenticate(&state.db, &headers, state.session_secret()).await.is_ok() {
        return Redirect::to(MY_TASKS_PATH).into_response();
    }

    Json(LoginForm {
        action: state.login_path().to_string(),
        method: "POST",
        fields: ["email", "password"],
        register: "/v1/auth/register",
    })
    .into_response()
}

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Response> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = SessionClaims::new(user.id, state.config.session_ttl());
    let token = issue_session(&claims, state.session_secret())?;
    let cookie = session_cookie(&token, state.config.session_ttl(), state.config.api.production);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: UserSummary::from(&user),
            token,
            expires_at: claims.exp,
        }),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.api.production))],
        Redirect::to(state.login_path()),
    )
}
