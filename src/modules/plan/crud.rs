use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::interface::AccountStore;
use super::model::VpnAccount;
use crate::config::DbPool;
use crate::modules::common::StoreError;

pub struct AccountCrud {
    pool: DbPool,
}

impl AccountCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountCrud {
    async fn insert(&self, account: &VpnAccount) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO vpn_accounts
                (id, owner_id, username, password, plan, expires_at, ehi_file, notified_stage, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.owner_id)
        .bind(&account.username)
        .bind(&account.password)
        .bind(&account.plan)
        .bind(account.expires_at)
        .bind(&account.ehi_file)
        .bind(account.notified_stage)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VpnAccount>, StoreError> {
        let account =
            sqlx::query_as::<_, VpnAccount>("SELECT * FROM vpn_accounts WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(account)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<VpnAccount>, StoreError> {
        let accounts = sqlx::query_as::<_, VpnAccount>(
            "SELECT * FROM vpn_accounts WHERE owner_id = ? ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn list_all(&self) -> Result<Vec<VpnAccount>, StoreError> {
        let accounts = sqlx::query_as::<_, VpnAccount>("SELECT * FROM vpn_accounts")
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    async fn advance_notified_stage(&self, id: &str, stage: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE vpn_accounts SET notified_stage = ? WHERE id = ? AND notified_stage < ?",
        )
        .bind(stage)
        .bind(id)
        .bind(stage)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_renewal(
        &self,
        id: &str,
        expires_at: DateTime<Utc>,
        ehi_file: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE vpn_accounts SET expires_at = ?, ehi_file = ?, notified_stage = 0 WHERE id = ?",
        )
        .bind(expires_at)
        .bind(ehi_file)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM vpn_accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }
}
