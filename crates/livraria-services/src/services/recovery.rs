//! Password recovery.
//!
//! Requests are rate limited per email address. A 32-byte random token is
//! mailed to the user; only its SHA-256 digest is stored, so a database leak
//! never exposes usable tokens. Tokens are single-use and expire.

use chrono::{Duration as ChronoDuration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use livraria_core::config::RecoveryConfig;
use livraria_core::AppError;
use livraria_db::{PasswordResetRepository, UserRepository};

use crate::services::email::EmailService;
use crate::services::rate_limit::RequestRateLimiter;

const TOKEN_BYTES: usize = 32;
const PASSWORD_MIN_LEN: usize = 8;

#[derive(Clone)]
pub struct PasswordRecoveryService {
    users: UserRepository,
    resets: PasswordResetRepository,
    email: Option<EmailService>,
    limiter: RequestRateLimiter,
    config: RecoveryConfig,
}

impl PasswordRecoveryService {
    pub fn new(
        users: UserRepository,
        resets: PasswordResetRepository,
        email: Option<EmailService>,
        config: RecoveryConfig,
    ) -> Self {
        let limiter = RequestRateLimiter::new(config.max_requests_per_window, config.window);
        Self {
            users,
            resets,
            email,
            limiter,
            config,
        }
    }

    /// Start a recovery flow for `email`. Unknown addresses succeed silently
    /// so the endpoint cannot be used to probe which accounts exist.
    #[tracing::instrument(skip(self), fields(email = %email))]
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();

        if !self.limiter.allow(&email).await {
            return Err(AppError::TooManyRequests(
                "Too many recovery requests; try again later".to_string(),
            ));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Recovery requested for unknown email");
            return Ok(());
        };

        let token = generate_token();
        let digest = digest_token(&token);
        let expires_at = Utc::now() + ChronoDuration::minutes(self.config.token_ttl_minutes);

        self.resets.insert(user.id, &digest, expires_at).await?;

        let Some(email_service) = &self.email else {
            tracing::warn!(user_id = %user.id, "Recovery token stored but outbound email is disabled");
            return Ok(());
        };

        let link = match &self.config.frontend_url {
            Some(base) => format!("{}/reset-password?token={}", base.trim_end_matches('/'), token),
            None => token.clone(),
        };
        let body = format!(
            "Hello {},\n\nA password reset was requested for your account. \
             Use the link below within {} minutes:\n\n{}\n\n\
             If you did not request this, you can ignore this message.",
            user.name, self.config.token_ttl_minutes, link
        );

        email_service
            .send(&user.email, "Password reset", &body)
            .await?;

        tracing::info!(user_id = %user.id, "Recovery email sent");
        Ok(())
    }

    /// Complete a recovery flow: validate the token, replace the password and
    /// burn the token.
    #[tracing::instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.len() < PASSWORD_MIN_LEN {
            return Err(AppError::Validation(vec![format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_LEN
            )]));
        }

        let digest = digest_token(token);
        let reset = self
            .resets
            .find_valid(&digest)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired reset token".to_string()))?;

        let hash = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        self.users.update_password(reset.user_id, &hash).await?;
        self.resets.consume(reset.id).await?;

        tracing::info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_stable_and_distinct_from_token() {
        let token = generate_token();
        let d1 = digest_token(&token);
        let d2 = digest_token(&token);
        assert_eq!(d1, d2);
        assert_ne!(d1, token);
        assert_eq!(d1.len(), 64);
    }
}
