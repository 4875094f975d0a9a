use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use crate::{
    auth::{
        cookie::{removal_cookie, session_cookie},
        dto::{AuthResponse, LoginRequest, SignupRequest},
        extractors::SessionUser,
        service::{AuthSession, PublicUser},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

// Body problems are the caller's fault: answer 400 rather than axum's 415/422.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected request body");
            Err(AppError::validation(rejection.body_text()))
        }
    }
}

fn with_session(state: &AppState, jar: CookieJar, session: AuthSession) -> (CookieJar, Json<AuthResponse>) {
    let cookie = session_cookie(&state.config.cookie, session.token, state.auth.keys().ttl);
    (jar.add(cookie), Json(AuthResponse { user: session.user }))
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let req = body(payload)?;
    let session = state.auth.sign_up(&req.email, &req.name, &req.password).await?;
    let (jar, json) = with_session(&state, jar, session);
    Ok((StatusCode::CREATED, jar, json))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let req = body(payload)?;
    let session = state.auth.login(&req.email, &req.password).await?;
    Ok(with_session(&state, jar, session))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(removal_cookie(&state.config.cookie)), StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<PublicUser>, AppError> {
    match state.auth.me(user_id).await {
        Ok(user) => Ok(Json(user)),
        // token outlived its user
        Err(AppError::NotFound) => Err(AppError::Authentication),
        Err(e) => Err(e),
    }
}
