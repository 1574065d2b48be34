//! Outbound email over SMTP with bounded retry.
//!
//! Transient SMTP failures are retried up to `max_retries` times with a
//! linearly growing delay (`retry_base_delay_ms * attempt`). Once the budget
//! is spent the failure surfaces as [`AppError::Upstream`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use livraria_core::config::SmtpConfig;
use livraria_core::AppError;

/// Seam between the retry policy and the wire. Lets tests exercise the retry
/// behavior without an SMTP server.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, AppError> {
        if !config.enabled {
            tracing::debug!("Outbound email disabled (EMAIL_ENABLED=false)");
            return Ok(None);
        }

        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::Internal("SMTP_HOST is not set".to_string()))?;
        let from: Mailbox = config
            .from
            .as_deref()
            .ok_or_else(|| AppError::Internal("SMTP_FROM is not set".to_string()))?
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM: {}", e)))?;
        let port = config.port.unwrap_or(587);

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::Internal(format!("SMTP relay setup failed: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder.credentials(Credentials::new(user.clone(), password.clone()))
        } else {
            builder
        };

        tracing::info!(host = %host, port, tls = config.tls, "Email transport initialized");

        Ok(Some(Self {
            mailer: builder.build(),
            from,
        }))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn MailTransport>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl EmailService {
    pub fn new(transport: Arc<dyn MailTransport>, config: &SmtpConfig) -> Self {
        Self {
            transport,
            max_retries: config.max_retries.max(1),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Construct from config; `None` when outbound email is disabled.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, AppError> {
        let Some(transport) = SmtpMailTransport::from_config(config)? else {
            return Ok(None);
        };

        Ok(Some(Self::new(Arc::new(transport), config)))
    }

    #[tracing::instrument(skip(self, body), fields(to = %to))]
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.transport.send(to, subject, body).await {
                Ok(()) => {
                    tracing::info!(attempt, "Email sent");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Email send attempt failed");
                    last_error = e;
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_base_delay * attempt).await;
                    }
                }
            }
        }

        Err(AppError::Upstream(format!(
            "email delivery failed after {} attempts: {}",
            self.max_retries, last_error
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyTransport {
        calls: AtomicUsize,
        succeed_on: usize,
    }

    #[async_trait]
    impl MailTransport for FlakyTransport {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(())
            } else {
                Err("connection refused".to_string())
            }
        }
    }

    fn smtp_config(max_retries: u32) -> SmtpConfig {
        SmtpConfig {
            enabled: true,
            host: Some("localhost".to_string()),
            port: Some(2525),
            user: None,
            password: None,
            from: Some("noreply@example.com".to_string()),
            tls: false,
            max_retries,
            retry_base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn first_attempt_success_sends_once() {
        let transport = Arc::new(FlakyTransport {
            calls: AtomicUsize::new(0),
            succeed_on: 1,
        });
        let service = EmailService::new(transport.clone(), &smtp_config(3));

        service
            .send("a@example.com", "Hi", "body")
            .await
            .expect("send should succeed");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let transport = Arc::new(FlakyTransport {
            calls: AtomicUsize::new(0),
            succeed_on: 3,
        });
        let service = EmailService::new(transport.clone(), &smtp_config(3));

        service
            .send("a@example.com", "Hi", "body")
            .await
            .expect("third attempt should succeed");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_upstream_error() {
        let transport = Arc::new(FlakyTransport {
            calls: AtomicUsize::new(0),
            succeed_on: usize::MAX,
        });
        let service = EmailService::new(transport.clone(), &smtp_config(3));

        let err = service
            .send("a@example.com", "Hi", "body")
            .await
            .expect_err("all attempts fail");
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }
}
