//! Database credential lookup.
//!
//! The password is read fresh on every context bind: first from a
//! well-known secret file (the container-orchestrator convention), then
//! from an environment variable. The read is local and cheap, and skipping
//! a cache means rotated secrets take effect on the next request.

use std::path::PathBuf;

/// Resolves the tenant data-store password.
#[derive(Debug, Clone)]
pub struct SecretStore {
    secret_path: PathBuf,
    password_env: String,
}

impl SecretStore {
    #[must_use]
    pub fn new(secret_path: PathBuf, password_env: String) -> Self {
        Self {
            secret_path,
            password_env,
        }
    }

    /// Secret file first, environment second, development default last.
    #[must_use]
    pub fn database_password(&self) -> String {
        if let Ok(contents) = std::fs::read_to_string(&self.secret_path) {
            return contents.trim().to_string();
        }
        std::env::var(&self.password_env).unwrap_or_else(|_| "password".to_string())
    }
}
