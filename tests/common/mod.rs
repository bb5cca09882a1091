use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use maritima_backend::modules::auth::interface::UserStore;
use maritima_backend::modules::auth::model::User;
use maritima_backend::modules::common::StoreError;
use maritima_backend::modules::payment::interface::PaymentStore;
use maritima_backend::modules::payment::model::{PaymentIntent, STATUS_APPROVED, STATUS_PENDING};
use maritima_backend::modules::plan::interface::AccountStore;
use maritima_backend::modules::plan::model::VpnAccount;
use maritima_backend::services::ehi::EhiGenerator;
use maritima_backend::services::gateway::{
    CreatePixPayment, GatewayError, PaymentGateway, PixPayment,
};
use maritima_backend::services::intent::PaymentIntentService;
use maritima_backend::services::notifier::{EmailMessage, NotifyError, Notifier};
use maritima_backend::services::provisioner::CredentialProvisioner;
use maritima_backend::services::reconciler::WebhookReconciler;
use maritima_backend::services::remote::{RemoteError, RemoteHost};
use maritima_backend::services::trial::TrialService;

// =============================================================================
// IN-MEMORY STORES
// =============================================================================

#[derive(Default)]
pub struct FakeUserStore {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserStore for FakeUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn mark_trial_used(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) if !user.trial_used => {
                user.trial_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_trial_used(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
            user.trial_used = false;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePaymentStore {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

#[allow(dead_code)]
impl FakePaymentStore {
    pub fn count(&self) -> usize {
        self.intents.lock().unwrap().len()
    }

    pub fn status_of(&self, mp_payment_id: &str) -> Option<String> {
        self.intents
            .lock()
            .unwrap()
            .get(mp_payment_id)
            .map(|i| i.status.clone())
    }

    pub async fn seed_pending(
        &self,
        user_id: &str,
        plan_days: i32,
        mp_payment_id: &str,
    ) -> PaymentIntent {
        let intent = PaymentIntent {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            plan_days,
            mp_payment_id: mp_payment_id.to_string(),
            status: STATUS_PENDING.to_string(),
            created_at: Utc::now(),
        };
        self.insert(&intent).await.unwrap();
        intent
    }
}

#[async_trait]
impl PaymentStore for FakePaymentStore {
    async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
        self.intents
            .lock()
            .unwrap()
            .insert(intent.mp_payment_id.clone(), intent.clone());
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        mp_payment_id: &str,
    ) -> Result<Option<PaymentIntent>, StoreError> {
        Ok(self.intents.lock().unwrap().get(mp_payment_id).cloned())
    }

    async fn approve_if_pending(&self, mp_payment_id: &str) -> Result<bool, StoreError> {
        let mut intents = self.intents.lock().unwrap();
        match intents.get_mut(mp_payment_id) {
            Some(intent) if intent.status == STATUS_PENDING => {
                intent.status = STATUS_APPROVED.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct FakeAccountStore {
    accounts: Mutex<Vec<VpnAccount>>,
}

#[allow(dead_code)]
impl FakeAccountStore {
    pub fn count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<VpnAccount> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn push(&self, account: VpnAccount) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn find_account(&self, id: &str) -> Option<VpnAccount> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }
}

#[async_trait]
impl AccountStore for FakeAccountStore {
    async fn insert(&self, account: &VpnAccount) -> Result<(), StoreError> {
        self.accounts.lock().unwrap().push(account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VpnAccount>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<VpnAccount>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<VpnAccount>, StoreError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn advance_notified_stage(&self, id: &str, stage: i32) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts
            .iter_mut()
            .find(|a| a.id == id && a.notified_stage < stage)
        {
            Some(account) => {
                account.notified_stage = stage;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_renewal(
        &self,
        id: &str,
        expires_at: chrono::DateTime<Utc>,
        ehi_file: &str,
    ) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            account.expires_at = expires_at;
            account.ehi_file = ehi_file.to_string();
            account.notified_stage = 0;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.accounts.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }
}

// =============================================================================
// CAPABILITY FAKES
// =============================================================================

#[derive(Default)]
pub struct FakeGateway {
    statuses: Mutex<HashMap<String, String>>,
    created: Mutex<Vec<CreatePixPayment>>,
    next_id: Mutex<u32>,
    pub fail_create: AtomicBool,
    pub fail_status: AtomicBool,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn set_status(&self, payment_id: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(payment_id.to_string(), status.to_string());
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_pix_payment(
        &self,
        request: &CreatePixPayment,
    ) -> Result<PixPayment, GatewayError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Http("connection refused".into()));
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("mp-{}", *next);

        self.statuses
            .lock()
            .unwrap()
            .insert(id.clone(), "pending".to_string());
        self.created.lock().unwrap().push(request.clone());

        Ok(PixPayment {
            id: id.clone(),
            status: "pending".to_string(),
            qr_code: format!("00020126pix-{id}"),
            qr_code_base64: "cGl4".to_string(),
        })
    }

    async fn payment_status(&self, payment_id: &str) -> Result<String, GatewayError> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(GatewayError::Http("connection refused".into()));
        }

        self.statuses
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or(GatewayError::Api(404))
    }
}

#[derive(Default)]
pub struct FakeRemoteHost {
    commands: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl FakeRemoteHost {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteHost for FakeRemoteHost {
    async fn exec(&self, command: &str) -> Result<String, RemoteError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::CommandFailed {
                code: 1,
                stderr: "connection timed out".to_string(),
            });
        }
        self.commands.lock().unwrap().push(command.to_string());
        Ok(String::new())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    fail_to: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl FakeNotifier {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make delivery fail for one recipient only.
    pub fn fail_for(&self, recipient: &str) {
        *self.fail_to.lock().unwrap() = Some(recipient.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_to.lock().unwrap() = None;
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        if self.fail_to.lock().unwrap().as_deref() == Some(message.to.as_str()) {
            return Err(NotifyError::Api(500));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Fully fake-backed service wiring; no database, no network.
#[allow(dead_code)]
pub struct Harness {
    pub users: Arc<FakeUserStore>,
    pub payments: Arc<FakePaymentStore>,
    pub accounts: Arc<FakeAccountStore>,
    pub gateway: Arc<FakeGateway>,
    pub remote: Arc<FakeRemoteHost>,
    pub notifier: Arc<FakeNotifier>,
    pub intents: PaymentIntentService,
    pub reconciler: WebhookReconciler,
    pub trials: TrialService,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let users = Arc::new(FakeUserStore::default());
        let payments = Arc::new(FakePaymentStore::default());
        let accounts = Arc::new(FakeAccountStore::default());
        let gateway = Arc::new(FakeGateway::default());
        let remote = Arc::new(FakeRemoteHost::default());
        let notifier = Arc::new(FakeNotifier::default());

        let provisioner = Arc::new(CredentialProvisioner::new(remote.clone()));
        let ehi = EhiGenerator::new("maritimavpn.shop".into(), "104.17.71.206".into(), 80);

        let intents = PaymentIntentService::new(
            payments.clone(),
            gateway.clone(),
            "https://maritimavpn.shop/api/webhook/mercadopago".to_string(),
        );

        let reconciler = WebhookReconciler::new(
            payments.clone(),
            users.clone(),
            accounts.clone(),
            gateway.clone(),
            provisioner.clone(),
            ehi.clone(),
            notifier.clone(),
        );

        let trials = TrialService::new(
            users.clone(),
            accounts.clone(),
            provisioner,
            ehi,
            notifier.clone(),
        );

        Self {
            users,
            payments,
            accounts,
            gateway,
            remote,
            notifier,
            intents,
            reconciler,
            trials,
        }
    }

    pub async fn add_user(&self, name: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            trial_used: false,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await.unwrap();
        user
    }

    pub async fn add_pending_intent(
        &self,
        user_id: &str,
        plan_days: i32,
        mp_payment_id: &str,
    ) -> PaymentIntent {
        self.payments
            .seed_pending(user_id, plan_days, mp_payment_id)
            .await
    }
}

/// Webhook payload as Mercado Pago delivers it.
#[allow(dead_code)]
pub fn payment_webhook(payment_id: &str) -> serde_json::Value {
    json!({ "type": "payment", "data": { "id": payment_id } })
}

/// Account fixture for sweeper tests.
#[allow(dead_code)]
pub fn account_expiring_in(owner_id: &str, days: i64) -> VpnAccount {
    let now = Utc::now();
    VpnAccount {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        username: format!("user{}", Uuid::new_v4().simple()),
        password: "pw1234abcd".to_string(),
        plan: "30".to_string(),
        expires_at: now + chrono::Duration::days(days),
        ehi_file: "e30=".to_string(),
        notified_stage: 0,
        created_at: now,
    }
}
