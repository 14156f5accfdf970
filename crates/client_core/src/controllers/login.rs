use anyhow::Result;
use tracing::{info, warn};

use crate::session::{SessionError, SessionManager};

pub struct LoginController {
    session: SessionManager,
}

impl LoginController {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub async fn status_login(&self, is_login: bool) -> Result<()> {
        self.session.status_login(is_login).await
    }

    pub async fn username(&self) -> Result<String> {
        self.session.username().await
    }

    pub async fn password(&self) -> Result<String> {
        self.session.password().await
    }

    /// Decides at launch whether the authenticated screens are reachable.
    pub async fn login_status(&self) -> Result<bool> {
        self.session.login_status().await
    }

    /// Checks the credentials against the account registered on this device
    /// and raises the login flag when they match.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let stored_username = self.username().await?;
        if stored_username.is_empty() {
            return Err(SessionError::NotRegistered.into());
        }
        if stored_username != username || self.password().await? != password {
            warn!(username, "login rejected");
            return Err(SessionError::InvalidCredentials.into());
        }

        self.status_login(true).await?;
        info!(username, "logged in");
        Ok(())
    }
}
