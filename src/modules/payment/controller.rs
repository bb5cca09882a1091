use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::modules::auth::extractor::AuthUser;
use crate::modules::common::ErrorResponse;
use crate::modules::payment::schema::{CreatePixRequest, CreatePixResponse, WebhookResponse};
use crate::services::intent::IntentError;
use crate::AppState;

// Overall deadline for one webhook delivery. Safe to retry after a timeout
// because of the reconciler's approve CAS.
const WEBHOOK_DEADLINE: Duration = Duration::from_secs(25);

// =============================================================================
// POST /api/create-pix
// =============================================================================

pub async fn create_pix(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreatePixRequest>,
) -> Result<Json<CreatePixResponse>, (StatusCode, Json<ErrorResponse>)> {
    let payment = state
        .intents
        .create_intent(&user.id, &user.email, req.plan_days)
        .await
        .map_err(|e| match e {
            IntentError::InvalidPlan => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid plan")),
            ),
            IntentError::Gateway(e) => {
                tracing::error!("pix creation failed for user {}: {}", user.id, e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse::new("Payment gateway error")),
                )
            }
            IntentError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ),
        })?;

    Ok(Json(CreatePixResponse {
        payment_id: payment.id,
        status: payment.status,
        copy_paste: payment.qr_code.clone(),
        qr_code: payment.qr_code,
        qr_code_base64: payment.qr_code_base64,
    }))
}

// =============================================================================
// POST /api/webhook/mercadopago
// =============================================================================

pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<WebhookResponse>), (StatusCode, Json<ErrorResponse>)> {
    let outcome = tokio::time::timeout(
        WEBHOOK_DEADLINE,
        state.reconciler.handle_notification(&body),
    )
    .await
    .map_err(|_| {
        tracing::error!("webhook handling exceeded deadline");
        (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ErrorResponse::new("Webhook deadline exceeded")),
        )
    })?;

    Ok((
        outcome.status_code(),
        Json(WebhookResponse {
            status: outcome.as_str(),
        }),
    ))
}
