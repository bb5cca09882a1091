use async_trait::async_trait;

use super::interface::PaymentStore;
use super::model::{PaymentIntent, STATUS_APPROVED, STATUS_PENDING};
use crate::config::DbPool;
use crate::modules::common::StoreError;

pub struct PaymentCrud {
    pool: DbPool,
}

impl PaymentCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PaymentCrud {
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, user_id, plan_days, mp_payment_id, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&intent.id)
        .bind(&intent.user_id)
        .bind(intent.plan_days)
        .bind(&intent.mp_payment_id)
        .bind(&intent.status)
        .bind(intent.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    async fn find_by_external_id(
        &self,
        mp_payment_id: &str,
    ) -> Result<Option<PaymentIntent>, StoreError> {
        let intent =
            sqlx::query_as::<_, PaymentIntent>("SELECT * FROM payments WHERE mp_payment_id = ?")
                .bind(mp_payment_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(intent)
    }

    async fn approve_if_pending(&self, mp_payment_id: &str) -> Result<bool, StoreError> {
        // rows_affected tells us whether we won the transition.
        let result = sqlx::query(
            "UPDATE payments SET status = ? WHERE mp_payment_id = ? AND status = ?",
        )
        .bind(STATUS_APPROVED)
        .bind(mp_payment_id)
        .bind(STATUS_PENDING)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
