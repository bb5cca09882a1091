use axum::{routing::post, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn payment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create-pix", post(controller::create_pix))
        .route("/webhook/mercadopago", post(controller::webhook))
}
