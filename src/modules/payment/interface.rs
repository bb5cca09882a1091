use async_trait::async_trait;

use super::model::PaymentIntent;
use crate::modules::common::StoreError;

/// PaymentIntent persistence as seen by the intent service and reconciler.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError>;

    async fn find_by_external_id(
        &self,
        mp_payment_id: &str,
    ) -> Result<Option<PaymentIntent>, StoreError>;

    /// Atomic compare-and-set of status from `pending` to `approved`.
    ///
    /// Returns whether this call performed the transition. This is the
    /// serialization point for concurrent duplicate webhook deliveries: of
    /// two racers exactly one observes `true`.
    async fn approve_if_pending(&self, mp_payment_id: &str) -> Result<bool, StoreError>;
}
