use std::sync::Arc;
use std::time::Duration;

use maritima_backend::config::{environment::Config, init_db};
use maritima_backend::modules::auth::crud::UserCrud;
use maritima_backend::modules::plan::crud::AccountCrud;
use maritima_backend::services::notifier::{MailApiClient, Notifier};
use maritima_backend::services::sweeper::ExpirationSweeper;
use maritima_backend::{create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maritima_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url).await;
    tracing::info!("Connected to MySQL");

    // Expiration sweeper runs independently of request handling; it shares
    // nothing with it but the database.
    let sweeper = {
        let notifier: Arc<dyn Notifier> = Arc::new(MailApiClient::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ));
        ExpirationSweeper::new(
            Arc::new(AccountCrud::new(db.clone())),
            Arc::new(UserCrud::new(db.clone())),
            notifier,
        )
    };
    tokio::spawn(async move {
        sweeper.run(SWEEP_PERIOD).await;
    });

    let bind_addr = config.bind_addr.clone();
    let app = create_app(AppState::new(db, &config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.unwrap();
}
