use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

/// Payment collaborator interface.
///
/// The reconciler never trusts webhook payloads; it re-queries the gateway
/// for the authoritative status of a payment id.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_pix_payment(
        &self,
        request: &CreatePixPayment,
    ) -> Result<PixPayment, GatewayError>;

    /// Authoritative current status for an external payment id.
    async fn payment_status(&self, payment_id: &str) -> Result<String, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct CreatePixPayment {
    pub amount: f64,
    pub description: String,
    pub payer_email: String,
    pub notification_url: String,
}

#[derive(Debug, Clone)]
pub struct PixPayment {
    pub id: String,
    pub status: String,
    pub qr_code: String,
    pub qr_code_base64: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("gateway returned status {0}")]
    Api(u16),
}

/// Mercado Pago PIX client.
pub struct MercadoPagoClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl MercadoPagoClient {
    pub fn new(access_token: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build http client");

        Self {
            client,
            access_token,
            base_url,
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_pix_payment(
        &self,
        request: &CreatePixPayment,
    ) -> Result<PixPayment, GatewayError> {
        let url = format!("{}/v1/payments", self.base_url);

        let body = serde_json::json!({
            "transaction_amount": request.amount,
            "description": request.description,
            "payment_method_id": "pix",
            "payer": { "email": request.payer_email },
            "notification_url": request.notification_url,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("X-Idempotency-Key", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Api(response.status().as_u16()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let id = json
            .get("id")
            .map(value_to_id)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::Parse("missing 'id'".to_string()))?;

        let status = json
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("pending")
            .to_string();

        let transaction_data = json
            .pointer("/point_of_interaction/transaction_data")
            .ok_or_else(|| GatewayError::Parse("missing transaction_data".to_string()))?;

        let qr_code = transaction_data
            .get("qr_code")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Parse("missing qr_code".to_string()))?
            .to_string();

        let qr_code_base64 = transaction_data
            .get("qr_code_base64")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(PixPayment {
            id,
            status,
            qr_code,
            qr_code_base64,
        })
    }

    async fn payment_status(&self, payment_id: &str) -> Result<String, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Api(response.status().as_u16()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        json.get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Parse("missing 'status'".to_string()))
    }
}

// Mercado Pago returns payment ids as numbers; normalize to string.
fn value_to_id(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
