//! Admin access bootstrap for new cache servers
//!
//! Renders the baseline script run on a freshly created server: an admin
//! login with the operator's public key, optional passwordless sudo and
//! no root password login over SSH.

use crate::config::schema::AdminConfig;
use crate::error::{FleetCacheError, FleetCacheResult};
use std::path::PathBuf;
use tokio::fs;

/// Admin login installed on new servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccess {
    pub user: String,
    pub public_key: String,
    pub sudo: bool,
}

impl AdminAccess {
    /// Build from configuration, reading the public key from disk
    pub async fn from_config(config: &AdminConfig) -> FleetCacheResult<Self> {
        let user = match &config.user {
            Some(user) => user.clone(),
            None => std::env::var("USER").map_err(|_| {
                FleetCacheError::User("admin.user is not set and $USER is unavailable".to_string())
            })?,
        };

        let key_path = match &config.public_key_path {
            Some(path) => path.clone(),
            None => default_public_key_path()?,
        };
        let public_key = fs::read_to_string(&key_path).await.map_err(|e| {
            FleetCacheError::io(format!("reading public key {}", key_path.display()), e)
        })?;

        Self::new(user, public_key.trim().to_string(), config.sudo)
    }

    /// Validate and build an admin access description
    pub fn new(user: String, public_key: String, sudo: bool) -> FleetCacheResult<Self> {
        let valid_user = !user.is_empty()
            && user.len() <= 32
            && user
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
            && !user.starts_with('-');
        if !valid_user {
            return Err(FleetCacheError::User(format!(
                "invalid admin user name: {:?}",
                user
            )));
        }
        if public_key.is_empty() || public_key.contains(['\'', '\n', '\r']) {
            return Err(FleetCacheError::User(
                "admin public key must be a single line without quotes".to_string(),
            ));
        }

        Ok(Self {
            user,
            public_key,
            sudo,
        })
    }

    /// Render the bootstrap script
    pub fn render(&self) -> String {
        let user = &self.user;
        let mut script = format!(
            "id -u {user} >/dev/null 2>&1 || useradd -m -s /bin/bash {user}\n\
             mkdir -p /home/{user}/.ssh\n\
             grep -qxF '{key}' /home/{user}/.ssh/authorized_keys 2>/dev/null || \
             echo '{key}' >> /home/{user}/.ssh/authorized_keys\n\
             chmod 700 /home/{user}/.ssh\n\
             chmod 600 /home/{user}/.ssh/authorized_keys\n\
             chown -R {user}: /home/{user}/.ssh\n",
            user = user,
            key = self.public_key,
        );

        if self.sudo {
            script.push_str(&format!(
                "echo '{user} ALL=(ALL) NOPASSWD:ALL' > /etc/sudoers.d/{user}\n\
                 chmod 0440 /etc/sudoers.d/{user}\n",
                user = user,
            ));
        }

        script.push_str(
            "sed -i 's/^#\\?PermitRootLogin.*/PermitRootLogin prohibit-password/' /etc/ssh/sshd_config\n\
             (service ssh reload || service sshd reload || systemctl reload sshd) >/dev/null 2>&1 || true\n",
        );
        script
    }
}

fn default_public_key_path() -> FleetCacheResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ssh").join("id_rsa.pub"))
        .ok_or_else(|| FleetCacheError::User("cannot determine home directory".to_string()))
}
