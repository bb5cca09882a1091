use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::modules::auth::{crud::UserCrud, model::User};
use crate::modules::common::ErrorResponse;
use crate::AppState;

/// Bearer-token authenticated user, resolved against the users table.
pub struct AuthUser(pub User);

type Rejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(msg: &str) -> Rejection {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(msg)))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing authorization header"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid authorization header"))?;

        let claims = state
            .jwt_service
            .verify_access_token(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?
            .claims;

        let crud = UserCrud::new(state.db.clone());
        let user = crud
            .get_by_id(&claims.sub)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(e.to_string())),
                )
            })?
            .ok_or_else(|| unauthorized("User not found"))?;

        Ok(AuthUser(user))
    }
}
