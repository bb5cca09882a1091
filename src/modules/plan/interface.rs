use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::VpnAccount;
use crate::modules::common::StoreError;

/// VpnAccount persistence as seen by the reconciler, sweeper and plan routes.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: &VpnAccount) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<VpnAccount>, StoreError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<VpnAccount>, StoreError>;

    /// All accounts not yet torn down, for the expiration sweep.
    async fn list_all(&self) -> Result<Vec<VpnAccount>, StoreError>;

    /// Advance the notified stage, never backwards. Returns whether the row
    /// moved.
    async fn advance_notified_stage(&self, id: &str, stage: i32) -> Result<bool, StoreError>;

    /// Renewal: new expiry, regenerated blob, notification stage reset.
    async fn update_renewal(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
        ehi_file: &str,
    ) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
