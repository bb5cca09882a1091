use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::modules::auth::interface::UserStore;
use crate::modules::plan::interface::AccountStore;
use crate::modules::plan::model::ExpiryStage;
use crate::services::notifier::{EmailMessage, Notifier};

/// Periodic task notifying owners of accounts crossing expiry thresholds.
///
/// Each account gets at most one notice per sweep, and a given threshold is
/// notified at most once ever (tracked by the account's notified_stage).
/// A failed notification leaves the stage untouched so the next sweep
/// retries it.
pub struct ExpirationSweeper {
    accounts: Arc<dyn AccountStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
}

impl ExpirationSweeper {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts,
            users,
            notifier,
        }
    }

    /// Fixed-interval background loop.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            let notified = self.sweep(Utc::now()).await;
            tracing::info!("expiration sweep done, {} notices sent", notified);
        }
    }

    /// One pass over all accounts. Failures are isolated per account.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let accounts = match self.accounts.list_all().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("sweep aborted, account listing failed: {}", e);
                return 0;
            }
        };

        let mut notified = 0;

        for account in accounts {
            let stage = ExpiryStage::for_expiry(account.expires_at, now);
            if stage.as_i32() <= account.notified_stage {
                continue;
            }

            let user = match self.users.find_by_id(&account.owner_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    tracing::warn!("account {} has no owner, skipping", account.id);
                    continue;
                }
                Err(e) => {
                    tracing::error!("owner lookup for account {} failed: {}", account.id, e);
                    continue;
                }
            };

            let message = EmailMessage {
                to: user.email.clone(),
                subject: stage.subject().to_string(),
                body: notice_body(&user.name, &account.username, account.expires_at, stage),
                attachment: None,
            };

            if let Err(e) = self.notifier.send(&message).await {
                tracing::warn!(
                    "expiry notice for account {} failed, will retry next sweep: {}",
                    account.id,
                    e
                );
                continue;
            }

            match self
                .accounts
                .advance_notified_stage(&account.id, stage.as_i32())
                .await
            {
                Ok(_) => notified += 1,
                Err(e) => {
                    tracing::error!(
                        "failed to record notified stage for account {}: {}",
                        account.id,
                        e
                    );
                }
            }
        }

        notified
    }
}

fn notice_body(
    name: &str,
    username: &str,
    expires_at: DateTime<Utc>,
    stage: ExpiryStage,
) -> String {
    let date = expires_at.format("%d/%m/%Y");
    match stage {
        ExpiryStage::ThreeDays => format!(
            "Ola {name}, sua VPN ({username}) expira no dia {date}. Renove para evitar interrupcoes."
        ),
        ExpiryStage::OneDay => format!(
            "Ola {name}, sua VPN ({username}) expira amanha ({date}). Recomendamos renovar hoje."
        ),
        ExpiryStage::Expired => format!(
            "Ola {name}, sua VPN ({username}) expirou. Faca a renovacao para continuar utilizando."
        ),
        ExpiryStage::None => String::new(),
    }
}
