use std::env;

/// Environment configuration
/// Loads and validates environment variables. Secrets have no defaults;
/// a missing one aborts startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,

    // Mercado Pago
    pub mp_access_token: String,
    pub mp_base_url: String,
    pub mp_notification_url: String,

    // Outbound mail API
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,

    // Remote SSH host where accounts are provisioned
    pub ssh_host: String,
    pub ssh_user: String,
    pub ssh_password: String,

    // Connection parameters embedded in generated EHI files
    pub ehi_proxy_host: String,
    pub ehi_proxy_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let mp_access_token =
            env::var("MP_ACCESS_TOKEN").map_err(|_| "MP_ACCESS_TOKEN must be set".to_string())?;

        let mp_base_url = env::var("MP_BASE_URL")
            .unwrap_or_else(|_| "https://api.mercadopago.com".to_string());

        let mp_notification_url = env::var("MP_NOTIFICATION_URL")
            .unwrap_or_else(|_| "https://maritimavpn.shop/api/webhook/mercadopago".to_string());

        let mail_api_url =
            env::var("MAIL_API_URL").unwrap_or_else(|_| "https://api.mailchannel.app".to_string());

        let mail_api_key =
            env::var("MAIL_API_KEY").map_err(|_| "MAIL_API_KEY must be set".to_string())?;

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "suporte@maritimavpn.shop".to_string());

        let ssh_host = env::var("SSH_HOST").map_err(|_| "SSH_HOST must be set".to_string())?;
        let ssh_user = env::var("SSH_USER").map_err(|_| "SSH_USER must be set".to_string())?;
        let ssh_password =
            env::var("SSH_PASSWORD").map_err(|_| "SSH_PASSWORD must be set".to_string())?;

        let ehi_proxy_host =
            env::var("EHI_PROXY_HOST").unwrap_or_else(|_| "104.17.71.206".to_string());

        let ehi_proxy_port = env::var("EHI_PROXY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(80);

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            mp_access_token,
            mp_base_url,
            mp_notification_url,
            mail_api_url,
            mail_api_key,
            mail_from,
            ssh_host,
            ssh_user,
            ssh_password,
            ehi_proxy_host,
            ehi_proxy_port,
        })
    }
}
