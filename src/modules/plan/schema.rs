use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// POST /api/trial
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TrialResponse {
    pub message: &'static str,
    pub username: String,
    pub expires: DateTime<Utc>,
}

// =============================================================================
// GET /api/get-plans
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub id: String,
    pub plan: String,
    pub username: String,
    pub expires: DateTime<Utc>,
}

// =============================================================================
// POST /api/renew-plan
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RenewPlanRequest {
    pub account_id: String,
    pub days: i32,
}

#[derive(Debug, Serialize)]
pub struct RenewPlanResponse {
    pub message: &'static str,
    pub expires: DateTime<Utc>,
}

// =============================================================================
// POST /api/cancel-plan
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CancelPlanRequest {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelPlanResponse {
    pub message: &'static str,
}
