use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn plan_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trial", post(controller::create_trial))
        .route("/get-plans", get(controller::get_plans))
        .route(
            "/download-config/{account_id}",
            get(controller::download_config),
        )
        .route("/renew-plan", post(controller::renew_plan))
        .route("/cancel-plan", post(controller::cancel_plan))
}
