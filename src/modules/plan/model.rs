use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Provisioned VPN/SSH account. Mutated only by renewal (expiry + blob) and
/// the sweeper (notified_stage); the payment flow never touches it after
/// creation.
#[derive(Debug, Clone, FromRow)]
pub struct VpnAccount {
    pub id: String,
    pub owner_id: String,
    pub username: String,
    pub password: String,
    pub plan: String,
    pub expires_at: DateTime<Utc>,
    pub ehi_file: String,
    pub notified_stage: i32,
    pub created_at: DateTime<Utc>,
}

/// Last expiry threshold a user was notified about, ordered by urgency.
///
/// Replaces the legacy boolean "notified" flag: with a single bit the
/// three-day notice would either suppress the later ones or be re-sent on
/// every sweep tick. The stage only moves forward; renewal resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExpiryStage {
    None = 0,
    ThreeDays = 1,
    OneDay = 2,
    Expired = 3,
}

impl ExpiryStage {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Threshold crossed at `now` for an account expiring at `expires_at`,
    /// using floored whole days remaining.
    pub fn for_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days_left = (expires_at - now).num_days();

        if days_left <= 0 {
            ExpiryStage::Expired
        } else if days_left == 1 {
            ExpiryStage::OneDay
        } else if days_left == 3 {
            ExpiryStage::ThreeDays
        } else {
            ExpiryStage::None
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            ExpiryStage::ThreeDays => "Sua VPN expira em 3 dias",
            ExpiryStage::OneDay => "Sua VPN expira amanha",
            ExpiryStage::Expired => "Sua VPN expirou",
            ExpiryStage::None => "",
        }
    }
}
