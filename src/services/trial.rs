use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::modules::auth::interface::UserStore;
use crate::modules::auth::model::User;
use crate::modules::common::StoreError;
use crate::modules::plan::interface::AccountStore;
use crate::modules::plan::model::{ExpiryStage, VpnAccount};
use crate::services::ehi::EhiGenerator;
use crate::services::notifier::{EmailAttachment, EmailMessage, Notifier};
use crate::services::provisioner::{CredentialProvisioner, ProvisionError};

pub const TRIAL_DAYS: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    #[error("trial already used")]
    AlreadyUsed,

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct TrialGrant {
    pub username: String,
    pub expires: DateTime<Utc>,
}

/// One free account per user, ever.
///
/// The one-shot flag is burned before provisioning so two concurrent
/// requests cannot both provision. Unlike a paid order, nothing is owed to
/// the user if provisioning then fails, so the failure branch releases the
/// flag again and the user can retry.
pub struct TrialService {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    provisioner: Arc<CredentialProvisioner>,
    ehi: EhiGenerator,
    notifier: Arc<dyn Notifier>,
}

impl TrialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        provisioner: Arc<CredentialProvisioner>,
        ehi: EhiGenerator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            accounts,
            provisioner,
            ehi,
            notifier,
        }
    }

    pub async fn start_trial(&self, user: &User) -> Result<TrialGrant, TrialError> {
        if !self.users.mark_trial_used(&user.id).await? {
            return Err(TrialError::AlreadyUsed);
        }

        let creds = match self.provisioner.provision(&user.id, TRIAL_DAYS).await {
            Ok(creds) => creds,
            Err(e) => {
                self.release_flag(&user.id).await;
                return Err(e.into());
            }
        };

        let expires = Utc::now() + Duration::days(TRIAL_DAYS);
        let ehi_file = self.ehi.generate(&creds.username, &creds.password, "trial");

        let account = VpnAccount {
            id: Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            username: creds.username.clone(),
            password: creds.password.clone(),
            plan: "trial".to_string(),
            expires_at: expires,
            ehi_file: ehi_file.clone(),
            notified_stage: ExpiryStage::None.as_i32(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.accounts.insert(&account).await {
            // Undo both sides; deprovision tolerates a vanished account.
            if let Err(e) = self.provisioner.deprovision(&creds.username).await {
                tracing::error!("orphaned remote account {}: {}", creds.username, e);
            }
            self.release_flag(&user.id).await;
            return Err(e.into());
        }

        let message = EmailMessage {
            to: user.email.clone(),
            subject: "Teste gratis Maritima VPN".to_string(),
            body: format!(
                "Seu teste gratis foi ativado!\n\nUsuario SSH: {}\nSenha SSH: {}\nValidade: {}",
                creds.username,
                creds.password,
                expires.format("%d/%m/%Y")
            ),
            attachment: Some(EmailAttachment {
                filename: format!("{}.ehi", creds.username),
                content: STANDARD.decode(&ehi_file).unwrap_or_default(),
            }),
        };
        if let Err(e) = self.notifier.send(&message).await {
            tracing::warn!("trial mail for user {} failed: {}", user.id, e);
        }

        tracing::info!("trial account {} active until {}", creds.username, expires);
        Ok(TrialGrant {
            username: creds.username,
            expires,
        })
    }

    async fn release_flag(&self, user_id: &str) {
        if let Err(e) = self.users.clear_trial_used(user_id).await {
            tracing::error!("failed to release trial flag for user {}: {}", user_id, e);
        }
    }
}
