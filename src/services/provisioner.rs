use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::services::remote::{RemoteError, RemoteHost};

const PASSWORD_LEN: usize = 10;
const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone)]
pub struct ProvisionedCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("remote host error: {0}")]
    Remote(#[from] RemoteError),
}

/// Creates, extends and removes system accounts on the SSH host.
///
/// Credential generation is kept separate from the remote calls so collision
/// and entropy properties can be tested with a seeded RNG.
pub struct CredentialProvisioner {
    remote: Arc<dyn RemoteHost>,
}

impl CredentialProvisioner {
    pub fn new(remote: Arc<dyn RemoteHost>) -> Self {
        Self { remote }
    }

    /// Create a system account expiring `days` from now.
    pub async fn provision(
        &self,
        owner_id: &str,
        days: i64,
    ) -> Result<ProvisionedCredentials, ProvisionError> {
        // ThreadRng is not Send; it must be gone before the first await or
        // the future cannot run on the runtime's worker threads.
        let (username, password) = {
            let mut rng = rand::rng();
            (
                generate_username(owner_id, &mut rng),
                generate_password(&mut rng),
            )
        };

        let expire_date = (Utc::now() + Duration::days(days)).format("%Y-%m-%d");

        let commands = [
            format!("useradd -M -s /bin/false {username}"),
            format!("echo '{username}:{password}' | chpasswd"),
            format!("chage -E {expire_date} {username}"),
        ];

        for cmd in &commands {
            self.remote.exec(cmd).await?;
        }

        tracing::info!("provisioned ssh account {} ({} days)", username, days);
        Ok(ProvisionedCredentials { username, password })
    }

    /// Remove a system account. Deleting an account that no longer exists is
    /// treated as success.
    pub async fn deprovision(&self, username: &str) -> Result<(), ProvisionError> {
        match self.remote.exec(&format!("userdel -rf {username}")).await {
            Ok(_) => Ok(()),
            Err(RemoteError::CommandFailed { stderr, .. })
                if stderr.contains("does not exist") =>
            {
                tracing::warn!("deprovision: account {} already gone", username);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Push the account expiry out to `days` from now.
    pub async fn extend(&self, username: &str, days: i64) -> Result<(), ProvisionError> {
        let expire_date = (Utc::now() + Duration::days(days)).format("%Y-%m-%d");
        self.remote
            .exec(&format!("chage -E {expire_date} {username}"))
            .await?;
        Ok(())
    }
}

/// Username derived from the owner id plus a random suffix, so two accounts
/// for the same owner never collide in practice.
fn generate_username(owner_id: &str, rng: &mut impl Rng) -> String {
    let prefix: String = owner_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect();
    let suffix: u32 = rng.random_range(1000..10000);
    format!("user{prefix}{suffix}")
}

fn generate_password(rng: &mut impl Rng) -> String {
    (0..PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn username_embeds_owner_prefix() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = generate_username("ab12cd34-5678", &mut rng);
        assert!(name.starts_with("userab12"));
        assert!(name.len() > "userab12".len());
    }

    #[test]
    fn passwords_are_mixed_alphanumeric_and_long_enough() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let pw = generate_password(&mut rng);
            assert_eq!(pw.len(), PASSWORD_LEN);
            assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn successive_passwords_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = generate_password(&mut rng);
        let b = generate_password(&mut rng);
        assert_ne!(a, b);
    }
}
