mod apns;
mod email;
mod fcm;

pub use apns::ApnsChannel;
pub use email::{EmailErrorSink, LogErrorSink};
pub use fcm::FcmChannel;

use crate::config::Config;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// A push delivery backend. Anything that can deliver a text message to an
/// opaque device token can serve as a channel, so adding a provider means
/// adding an adapter, not another dispatch pipeline.
#[async_trait::async_trait]
pub trait IPushChannel: Send + Sync {
    /// Delivers `message` to `device_token` and returns the provider
    /// delivery identifier
    async fn send(&self, device_token: &str, message: &str) -> Result<String, PushError>;
}

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Unable to reach the push provider: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Push provider rejected the notification ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sink for cycle-fatal and job-local failure reports. Whether reports end
/// up in the log or in the operator's mailbox is decided at startup.
#[async_trait::async_trait]
pub trait IErrorSink: Send + Sync {
    async fn report(&self, scope: &str, detail: &str);
}

#[derive(Clone)]
pub struct Notifiers {
    pub ios: Arc<dyn IPushChannel>,
    pub android: Arc<dyn IPushChannel>,
    pub alerts: Arc<dyn IErrorSink>,
}

impl Notifiers {
    pub fn create(config: &Config) -> Self {
        let timeout = config.provider_timeout();

        let alerts: Arc<dyn IErrorSink> = match &config.smtp {
            Some(smtp) => match EmailErrorSink::create(smtp, timeout) {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    warn!(
                        "Unable to set up the SMTP failure report sink: {:?}. Falling back to log reporting.",
                        e
                    );
                    Arc::new(LogErrorSink)
                }
            },
            None => Arc::new(LogErrorSink),
        };

        Self {
            ios: Arc::new(ApnsChannel::new(config.apns.clone(), timeout)),
            android: Arc::new(FcmChannel::new(config.fcm.clone(), timeout)),
            alerts,
        }
    }
}
