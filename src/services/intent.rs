use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::modules::common::StoreError;
use crate::modules::payment::interface::PaymentStore;
use crate::modules::payment::model::{PaymentIntent, STATUS_PENDING};
use crate::services::gateway::{CreatePixPayment, GatewayError, PaymentGateway, PixPayment};

/// Fixed price table in BRL. Unknown durations are rejected before any
/// gateway call.
pub const PLAN_PRICES: &[(i32, f64)] = &[(7, 5.00), (15, 7.00), (30, 12.00)];

pub fn plan_price(days: i32) -> Option<f64> {
    PLAN_PRICES
        .iter()
        .find(|(d, _)| *d == days)
        .map(|(_, price)| *price)
}

#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("invalid plan")]
    InvalidPlan,

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates PIX payment requests and records the matching pending intent.
///
/// Exactly one intent row per successful call; any failure leaves no local
/// state behind (the gateway call happens before the insert).
pub struct PaymentIntentService {
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notification_url: String,
}

impl PaymentIntentService {
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notification_url: String,
    ) -> Self {
        Self {
            payments,
            gateway,
            notification_url,
        }
    }

    pub async fn create_intent(
        &self,
        user_id: &str,
        user_email: &str,
        plan_days: i32,
    ) -> Result<PixPayment, IntentError> {
        let price = plan_price(plan_days).ok_or(IntentError::InvalidPlan)?;

        let payment = self
            .gateway
            .create_pix_payment(&CreatePixPayment {
                amount: price,
                description: format!("Plano Maritima VPN - {plan_days} dias"),
                payer_email: user_email.to_string(),
                notification_url: self.notification_url.clone(),
            })
            .await?;

        let intent = PaymentIntent {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            plan_days,
            mp_payment_id: payment.id.clone(),
            status: STATUS_PENDING.to_string(),
            created_at: Utc::now(),
        };
        self.payments.insert(&intent).await?;

        tracing::info!(
            "created pix intent {} for user {} ({} days)",
            payment.id,
            user_id,
            plan_days
        );
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_table_covers_known_plans_only() {
        assert_eq!(plan_price(7), Some(5.00));
        assert_eq!(plan_price(15), Some(7.00));
        assert_eq!(plan_price(30), Some(12.00));
        assert_eq!(plan_price(14), None);
        assert_eq!(plan_price(0), None);
        assert_eq!(plan_price(-30), None);
    }
}
