use std::sync::Arc;

use anyhow::Result;
use futures::stream::{BoxStream, StreamExt};
use shared::domain::{PreferenceKey, SessionProfile};
use storage::PreferenceStore;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("no account has been registered on this device")]
    NotRegistered,
    #[error("username or password is incorrect")]
    InvalidCredentials,
}

/// Typed access to the session profile kept in the preference store.
///
/// Strings read as empty and the login flag as `false` until written.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn PreferenceStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    async fn get_string(&self, key: PreferenceKey) -> Result<String> {
        Ok(self.store.get(key).await?.unwrap_or_default())
    }

    pub async fn username(&self) -> Result<String> {
        self.get_string(PreferenceKey::Username).await
    }

    pub async fn set_username(&self, username: &str) -> Result<()> {
        self.store.set(PreferenceKey::Username, username).await
    }

    pub async fn password(&self) -> Result<String> {
        self.get_string(PreferenceKey::Password).await
    }

    pub async fn set_password(&self, password: &str) -> Result<()> {
        self.store.set(PreferenceKey::Password, password).await
    }

    pub async fn email(&self) -> Result<String> {
        self.get_string(PreferenceKey::Email).await
    }

    pub async fn set_email(&self, email: &str) -> Result<()> {
        self.store.set(PreferenceKey::Email, email).await
    }

    pub async fn fullname(&self) -> Result<String> {
        self.get_string(PreferenceKey::Fullname).await
    }

    pub async fn set_fullname(&self, fullname: &str) -> Result<()> {
        self.store.set(PreferenceKey::Fullname, fullname).await
    }

    pub async fn address(&self) -> Result<String> {
        self.get_string(PreferenceKey::Address).await
    }

    pub async fn set_address(&self, address: &str) -> Result<()> {
        self.store.set(PreferenceKey::Address, address).await
    }

    pub async fn login_status(&self) -> Result<bool> {
        Ok(parse_flag(
            self.store.get(PreferenceKey::LoginStatus).await?.as_deref(),
        ))
    }

    pub async fn status_login(&self, is_login: bool) -> Result<()> {
        self.store
            .set(PreferenceKey::LoginStatus, if is_login { "true" } else { "false" })
            .await
    }

    pub async fn image(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(PreferenceKey::Image)
            .await?
            .filter(|image| !image.is_empty()))
    }

    pub async fn set_image(&self, image: &str) -> Result<()> {
        self.store.set(PreferenceKey::Image, image).await
    }

    pub async fn profile(&self) -> Result<SessionProfile> {
        Ok(SessionProfile {
            username: self.username().await?,
            password: self.password().await?,
            email: self.email().await?,
            fullname: self.fullname().await?,
            address: self.address().await?,
            login_status: self.login_status().await?,
            image: self.image().await?,
        })
    }

    pub fn observe_username(&self) -> BoxStream<'static, String> {
        self.store
            .observe(PreferenceKey::Username)
            .map(Option::unwrap_or_default)
            .boxed()
    }

    pub fn observe_login_status(&self) -> BoxStream<'static, bool> {
        self.store
            .observe(PreferenceKey::LoginStatus)
            .map(|value| parse_flag(value.as_deref()))
            .boxed()
    }

    pub fn observe_image(&self) -> BoxStream<'static, Option<String>> {
        self.store
            .observe(PreferenceKey::Image)
            .map(|value| value.filter(|image| !image.is_empty()))
            .boxed()
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|raw| raw.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
