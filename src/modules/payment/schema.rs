use serde::{Deserialize, Serialize};

// =============================================================================
// POST /api/create-pix
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePixRequest {
    pub plan_days: i32,
}

#[derive(Debug, Serialize)]
pub struct CreatePixResponse {
    pub payment_id: String,
    pub status: String,
    pub qr_code: String,
    pub qr_code_base64: String,
    pub copy_paste: String,
}

// =============================================================================
// POST /api/webhook/mercadopago
// =============================================================================

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}
