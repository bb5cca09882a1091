use async_trait::async_trait;
use tokio::process::Command;

/// A host on which system accounts can be managed by running shell commands.
///
/// The production implementation shells out over SSH; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    async fn exec(&self, command: &str) -> Result<String, RemoteError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("failed to spawn ssh: {0}")]
    Spawn(String),

    #[error("remote command failed (exit {code}): {stderr}")]
    CommandFailed { code: i32, stderr: String },
}

/// Executes commands on the SSH host using the `sshpass`/`ssh` binaries.
pub struct SshRemoteHost {
    host: String,
    user: String,
    password: String,
}

impl SshRemoteHost {
    pub fn new(host: String, user: String, password: String) -> Self {
        Self { host, user, password }
    }
}

#[async_trait]
impl RemoteHost for SshRemoteHost {
    async fn exec(&self, command: &str) -> Result<String, RemoteError> {
        let target = format!("{}@{}", self.user, self.host);
        tracing::debug!("ssh exec on {}: {}", self.host, command);

        let output = Command::new("sshpass")
            .arg("-p")
            .arg(&self.password)
            .arg("ssh")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("ConnectTimeout=10")
            .arg(&target)
            .arg(command)
            .output()
            .await
            .map_err(|e| RemoteError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            tracing::error!("remote command failed on {}: {}", self.host, stderr);
            return Err(RemoteError::CommandFailed { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
