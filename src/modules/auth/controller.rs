use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, UserCrud},
    model::User,
    schema::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse},
};
use crate::modules::common::ErrorResponse;
use crate::services::hashing;
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    if req.password.len() < 8 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Password must be at least 8 characters")),
        ));
    }

    let crud = UserCrud::new(state.db.clone());

    if crud.email_exists(&req.email).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })? {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Email already registered")),
        ));
    }

    let password_hash = hashing::hash_password(&req.password).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name.clone(),
        email: req.email.clone(),
        password_hash,
        trial_used: false,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = crud.insert(&user).await {
        // MySQL duplicate key (1062) can race the email_exists check.
        let err_str = e.to_string();
        if err_str.contains("Duplicate entry") || err_str.contains("1062") {
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Email already registered")),
            ));
        }
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(err_str)),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse {
                id: user.id,
                name: user.name,
                email: user.email,
                trial_used: user.trial_used,
                created_at: user.created_at,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<ErrorResponse>)> {
    let crud = UserCrud::new(state.db.clone());

    let user = crud.verify_login(&req.email, &req.password).await.map_err(|e| match e {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid email or password")),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        ),
    })?;

    let access_token = state
        .jwt_service
        .create_access_token(&user.id, &user.email)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;

    let refresh_token = state
        .jwt_service
        .create_refresh_token(&user.id)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;

    // Audit trail; failure to write it must not block the login itself.
    let ip_address = header_str(&headers, "x-forwarded-for").unwrap_or("unknown");
    let user_agent = header_str(&headers, "user-agent").unwrap_or("unknown");
    if let Err(e) = crud.record_login(&user.email, ip_address, user_agent).await {
        tracing::warn!("failed to record login for {}: {}", user.email, e);
    }

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: state.jwt_service.access_token_duration_secs(),
        }),
    ))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
