pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::environment::Config;
use config::DbPool;
use modules::auth::auth_routes;
use modules::auth::crud::UserCrud;
use modules::payment::crud::PaymentCrud;
use modules::payment::payment_routes;
use modules::plan::crud::AccountCrud;
use modules::plan::plan_routes;
use services::ehi::EhiGenerator;
use services::gateway::MercadoPagoClient;
use services::intent::PaymentIntentService;
use services::jwt::JwtService;
use services::notifier::{MailApiClient, Notifier};
use services::provisioner::CredentialProvisioner;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::reconciler::WebhookReconciler;
use services::remote::SshRemoteHost;
use services::security::security_headers;
use services::trial::TrialService;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub intents: PaymentIntentService,
    pub reconciler: WebhookReconciler,
    pub trials: TrialService,
    pub provisioner: Arc<CredentialProvisioner>,
    pub ehi: EhiGenerator,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Wire the production collaborators from config. Tests build the struct
    /// directly with fakes instead.
    pub fn new(db: DbPool, config: &Config) -> Self {
        let jwt_service = JwtService::new(config.jwt_secret.clone());

        let gateway = Arc::new(MercadoPagoClient::new(
            config.mp_access_token.clone(),
            config.mp_base_url.clone(),
        ));

        let notifier: Arc<dyn Notifier> = Arc::new(MailApiClient::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ));

        let remote = Arc::new(SshRemoteHost::new(
            config.ssh_host.clone(),
            config.ssh_user.clone(),
            config.ssh_password.clone(),
        ));
        let provisioner = Arc::new(CredentialProvisioner::new(remote));

        let ehi = EhiGenerator::new(
            config.ssh_host.clone(),
            config.ehi_proxy_host.clone(),
            config.ehi_proxy_port,
        );

        let payments = Arc::new(PaymentCrud::new(db.clone()));
        let users = Arc::new(UserCrud::new(db.clone()));
        let accounts = Arc::new(AccountCrud::new(db.clone()));

        let intents = PaymentIntentService::new(
            payments.clone(),
            gateway.clone(),
            config.mp_notification_url.clone(),
        );

        let reconciler = WebhookReconciler::new(
            payments,
            users.clone(),
            accounts.clone(),
            gateway,
            provisioner.clone(),
            ehi.clone(),
            notifier.clone(),
        );

        let trials = TrialService::new(
            users,
            accounts,
            provisioner.clone(),
            ehi.clone(),
            notifier.clone(),
        );

        Self {
            db,
            jwt_service,
            intents,
            reconciler,
            trials,
            provisioner,
            ehi,
            notifier,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);

    // Sustained 20 req/s with a burst of 40
    let rate_limiter = create_rate_limiter(20, 40);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/api", payment_routes().merge(plan_routes()))
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Maritima VPN API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
