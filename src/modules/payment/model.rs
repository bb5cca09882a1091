use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";

/// A requested-but-not-yet-confirmed purchase, keyed by the gateway-assigned
/// payment id. Status is mutated only by the reconciler; `approved` is
/// terminal.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentIntent {
    pub id: String,
    pub user_id: String,
    pub plan_days: i32,
    pub mp_payment_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }
}
