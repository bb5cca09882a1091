use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::modules::auth::extractor::AuthUser;
use crate::modules::common::ErrorResponse;
use crate::modules::plan::crud::AccountCrud;
use crate::modules::plan::interface::AccountStore;
use crate::modules::plan::schema::{
    CancelPlanRequest, CancelPlanResponse, PlanSummary, RenewPlanRequest, RenewPlanResponse,
    TrialResponse,
};
use crate::services::intent::plan_price;
use crate::services::trial::TrialError;
use crate::AppState;

type Rejection = (StatusCode, Json<ErrorResponse>);

fn internal(e: impl ToString) -> Rejection {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(e.to_string())),
    )
}

fn not_found() -> Rejection {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Account not found")),
    )
}

// =============================================================================
// POST /api/trial
// =============================================================================

pub async fn create_trial(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<TrialResponse>), Rejection> {
    let grant = state.trials.start_trial(&user).await.map_err(|e| match e {
        TrialError::AlreadyUsed => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Trial already used")),
        ),
        TrialError::Provision(e) => {
            tracing::error!("trial provisioning failed for user {}: {}", user.id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Provisioning failed")),
            )
        }
        TrialError::Store(e) => internal(e),
    })?;

    Ok((
        StatusCode::OK,
        Json(TrialResponse {
            message: "Trial created",
            username: grant.username,
            expires: grant.expires,
        }),
    ))
}

// =============================================================================
// GET /api/get-plans
// =============================================================================

pub async fn get_plans(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<PlanSummary>>, Rejection> {
    let accounts = AccountCrud::new(state.db.clone());
    let rows = accounts.list_by_owner(&user.id).await.map_err(internal)?;

    Ok(Json(
        rows.into_iter()
            .map(|acc| PlanSummary {
                id: acc.id,
                plan: acc.plan,
                username: acc.username,
                expires: acc.expires_at,
            })
            .collect(),
    ))
}

// =============================================================================
// GET /api/download-config/{account_id}
// =============================================================================

pub async fn download_config(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(account_id): Path<String>,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>), Rejection> {
    let accounts = AccountCrud::new(state.db.clone());
    let account = accounts
        .find_by_id(&account_id)
        .await
        .map_err(internal)?
        .filter(|acc| acc.owner_id == user.id)
        .ok_or_else(not_found)?;

    let bytes = STANDARD
        .decode(&account.ehi_file)
        .map_err(|_| not_found())?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.ehi\"", account.username),
            ),
        ],
        bytes,
    ))
}

// =============================================================================
// POST /api/renew-plan
// =============================================================================

pub async fn renew_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<RenewPlanRequest>,
) -> Result<Json<RenewPlanResponse>, Rejection> {
    if plan_price(req.days).is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid plan")),
        ));
    }

    let accounts = AccountCrud::new(state.db.clone());
    let account = accounts
        .find_by_id(&req.account_id)
        .await
        .map_err(internal)?
        .filter(|acc| acc.owner_id == user.id)
        .ok_or_else(not_found)?;

    state
        .provisioner
        .extend(&account.username, req.days as i64)
        .await
        .map_err(|e| {
            tracing::error!("renewal of {} failed on remote host: {}", account.username, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Provisioning failed")),
            )
        })?;

    let expires = Utc::now() + Duration::days(req.days as i64);
    let ehi_file = state
        .ehi
        .generate(&account.username, &account.password, &account.plan);

    accounts
        .update_renewal(&account.id, expires, &ehi_file)
        .await
        .map_err(internal)?;

    Ok(Json(RenewPlanResponse {
        message: "Plan renewed",
        expires,
    }))
}

// =============================================================================
// POST /api/cancel-plan
// =============================================================================

pub async fn cancel_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CancelPlanRequest>,
) -> Result<Json<CancelPlanResponse>, Rejection> {
    let accounts = AccountCrud::new(state.db.clone());
    let account = accounts
        .find_by_id(&req.account_id)
        .await
        .map_err(internal)?
        .filter(|acc| acc.owner_id == user.id)
        .ok_or_else(not_found)?;

    // Remote teardown before the row goes away; a vanished remote account is
    // treated as already deleted by the provisioner.
    state
        .provisioner
        .deprovision(&account.username)
        .await
        .map_err(|e| {
            tracing::error!("teardown of {} failed: {}", account.username, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Provisioning failed")),
            )
        })?;

    accounts.delete(&account.id).await.map_err(internal)?;

    Ok(Json(CancelPlanResponse {
        message: "Plan cancelled",
    }))
}
