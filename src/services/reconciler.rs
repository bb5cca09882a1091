use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::modules::auth::interface::UserStore;
use crate::modules::auth::model::User;
use crate::modules::payment::interface::PaymentStore;
use crate::modules::plan::interface::AccountStore;
use crate::modules::plan::model::{ExpiryStage, VpnAccount};
use crate::services::ehi::EhiGenerator;
use crate::services::gateway::PaymentGateway;
use crate::services::notifier::{EmailAttachment, EmailMessage, Notifier};
use crate::services::provisioner::CredentialProvisioner;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Terminal outcome of one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Not a payment-status event; expected and harmless.
    Ignored,
    /// Malformed payload (missing payment id).
    Invalid,
    /// Authoritative gateway status is not approved; no side effects.
    NotApproved,
    /// Intent already approved; re-delivery performed nothing.
    AlreadyProcessed,
    /// No local intent for this payment id.
    UnknownPayment,
    /// First approval observed; account provisioned.
    PlanCreated,
    /// Transient collaborator failure; the sender should retry.
    GatewayError,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Invalid => "invalid",
            Self::NotApproved => "not_approved",
            Self::AlreadyProcessed => "already_processed",
            Self::UnknownPayment => "unknown_payment",
            Self::PlanCreated => "plan_created",
            Self::GatewayError => "gateway_error",
        }
    }

    /// Permanently-unprocessable outcomes must answer 200 so the gateway
    /// stops re-delivering; only transient failures are 5xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::GatewayError => StatusCode::BAD_GATEWAY,
            _ => StatusCode::OK,
        }
    }
}

/// Resolves asynchronous payment notifications into local state changes.
///
/// Deliveries are at-least-once and possibly duplicated or out of order; the
/// contract is at most one provisioning action per payment. Concurrent
/// duplicates serialize at the store's `approve_if_pending` compare-and-set.
pub struct WebhookReconciler {
    payments: Arc<dyn PaymentStore>,
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    gateway: Arc<dyn PaymentGateway>,
    provisioner: Arc<CredentialProvisioner>,
    ehi: EhiGenerator,
    notifier: Arc<dyn Notifier>,
}

impl WebhookReconciler {
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        gateway: Arc<dyn PaymentGateway>,
        provisioner: Arc<CredentialProvisioner>,
        ehi: EhiGenerator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            payments,
            users,
            accounts,
            gateway,
            provisioner,
            ehi,
            notifier,
        }
    }

    pub async fn handle_notification(&self, body: &Value) -> WebhookOutcome {
        if body.get("type").and_then(Value::as_str) != Some("payment") {
            return WebhookOutcome::Ignored;
        }

        let payment_id = match extract_payment_id(body) {
            Some(id) => id,
            None => {
                tracing::warn!("webhook payload missing data.id: {}", body);
                return WebhookOutcome::Invalid;
            }
        };

        // The payload only signals "go check"; the gateway is the source of
        // truth for the status. Trusting the embedded status would let anyone
        // who can guess a payment id forge an approval.
        let status = match self.gateway.payment_status(&payment_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("status query failed for payment {}: {}", payment_id, e);
                return WebhookOutcome::GatewayError;
            }
        };

        if status != "approved" {
            return WebhookOutcome::NotApproved;
        }

        let intent = match self.payments.find_by_external_id(&payment_id).await {
            Ok(Some(intent)) => intent,
            Ok(None) => {
                tracing::warn!("approved webhook for unknown payment {}", payment_id);
                return WebhookOutcome::UnknownPayment;
            }
            Err(e) => {
                tracing::error!("intent lookup failed for payment {}: {}", payment_id, e);
                return WebhookOutcome::GatewayError;
            }
        };

        if intent.is_approved() {
            return WebhookOutcome::AlreadyProcessed;
        }

        // The approve flag is written before provisioning on purpose: a crash
        // here leaves a detectable approved-but-unprovisioned state instead of
        // risking a double provision.
        match self.payments.approve_if_pending(&payment_id).await {
            Ok(true) => {}
            Ok(false) => return WebhookOutcome::AlreadyProcessed,
            Err(e) => {
                tracing::error!("approve CAS failed for payment {}: {}", payment_id, e);
                return WebhookOutcome::GatewayError;
            }
        }

        let user = match self.users.find_by_id(&intent.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!(
                    "payment {} approved but owner {} is missing; manual reconciliation required",
                    payment_id,
                    intent.user_id
                );
                return WebhookOutcome::GatewayError;
            }
            Err(e) => {
                tracing::error!("owner lookup failed for payment {}: {}", payment_id, e);
                return WebhookOutcome::GatewayError;
            }
        };

        self.provision_plan(&user, &payment_id, intent.plan_days).await
    }

    async fn provision_plan(
        &self,
        user: &User,
        payment_id: &str,
        plan_days: i32,
    ) -> WebhookOutcome {
        let creds = match self.provisioner.provision(&user.id, plan_days as i64).await {
            Ok(creds) => creds,
            Err(e) => {
                // Approval is never rolled back: the user has paid. Surface
                // the degraded state and let the re-delivery report
                // already_processed.
                tracing::error!(
                    "payment {} approved but provisioning failed: {}; manual reconciliation required",
                    payment_id,
                    e
                );
                return WebhookOutcome::GatewayError;
            }
        };

        let plan = plan_days.to_string();
        let expires_at = Utc::now() + Duration::days(plan_days as i64);
        let ehi_file = self.ehi.generate(&creds.username, &creds.password, &plan);

        let account = VpnAccount {
            id: Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            username: creds.username.clone(),
            password: creds.password.clone(),
            plan,
            expires_at,
            ehi_file: ehi_file.clone(),
            notified_stage: ExpiryStage::None.as_i32(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.accounts.insert(&account).await {
            tracing::error!(
                "payment {} provisioned as {} but account row insert failed: {}",
                payment_id,
                creds.username,
                e
            );
            return WebhookOutcome::GatewayError;
        }

        // Delivery failure must not fail the provisioning: the account exists
        // and a retried webhook would be a no-op.
        let message = EmailMessage {
            to: user.email.clone(),
            subject: "Seu acesso Maritima VPN".to_string(),
            body: format!(
                "Seu plano foi ativado!\n\nUsuario SSH: {}\nSenha SSH: {}\nValidade: {}\n\nO arquivo EHI esta anexado.",
                creds.username,
                creds.password,
                expires_at.format("%d/%m/%Y")
            ),
            attachment: Some(EmailAttachment {
                filename: format!("{}.ehi", creds.username),
                content: STANDARD.decode(&ehi_file).unwrap_or_default(),
            }),
        };
        if let Err(e) = self.notifier.send(&message).await {
            tracing::warn!("confirmation mail for payment {} failed: {}", payment_id, e);
        }

        tracing::info!(
            "payment {} reconciled: account {} active until {}",
            payment_id,
            creds.username,
            expires_at
        );
        WebhookOutcome::PlanCreated
    }
}

fn extract_payment_id(body: &Value) -> Option<String> {
    match body.pointer("/data/id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
