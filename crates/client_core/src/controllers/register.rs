use anyhow::Result;
use tracing::info;

use crate::session::{SessionError, SessionManager};

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), SessionError> {
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(SessionError::EmptyField(field));
            }
        }
        if self.password != self.confirm_password {
            return Err(SessionError::PasswordMismatch);
        }
        Ok(())
    }
}

pub struct RegisterController {
    session: SessionManager,
}

impl RegisterController {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// Three independent writes; a failure part-way leaves earlier fields
    /// written.
    pub async fn save_account(&self, username: &str, password: &str, email: &str) -> Result<()> {
        self.session.set_username(username).await?;
        self.session.set_password(password).await?;
        self.session.set_email(email).await?;
        Ok(())
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        form.validate()?;
        self.save_account(form.username.trim(), &form.password, form.email.trim())
            .await?;
        info!(username = form.username.trim(), "account registered");
        Ok(())
    }
}
