use async_trait::async_trait;

use super::model::User;
use crate::modules::common::StoreError;

/// User persistence as seen by the core services.
///
/// The sqlx-backed `UserCrud` is the production implementation; tests use an
/// in-memory fake so the reconciler and sweeper run without a database.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// One-shot trial flag: flips false -> true and reports whether this call
    /// performed the transition. Must be atomic under concurrent requests.
    async fn mark_trial_used(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Compensation for a failed trial provisioning: put the flag back so
    /// the user can retry.
    async fn clear_trial_used(&self, user_id: &str) -> Result<(), StoreError>;
}
