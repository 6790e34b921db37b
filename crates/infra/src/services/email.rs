use super::IErrorSink;
use crate::config::SmtpConfig;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::error;

/// Mails failure reports to the operator bug-alert address. Reporting is
/// best effort: a failed report is logged and dropped, it never takes the
/// worker down.
pub struct EmailErrorSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailErrorSink {
    pub fn create(config: &SmtpConfig, timeout: Duration) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
            to: config.to.parse()?,
        })
    }
}

#[async_trait::async_trait]
impl IErrorSink for EmailErrorSink {
    async fn report(&self, scope: &str, detail: &str) {
        error!("{}: {}", scope, detail);

        let email = match Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("Reminder worker failure: {}", scope))
            .body(detail.to_string())
        {
            Ok(email) => email,
            Err(e) => {
                error!("Unable to build the failure report email: {:?}", e);
                return;
            }
        };

        if let Err(e) = self.transport.send(email).await {
            error!("Unable to deliver the failure report email: {:?}", e);
        }
    }
}

/// Log-only failure reports, used when SMTP alerting is not configured
pub struct LogErrorSink;

#[async_trait::async_trait]
impl IErrorSink for LogErrorSink {
    async fn report(&self, scope: &str, detail: &str) {
        error!("{}: {}", scope, detail);
    }
}
