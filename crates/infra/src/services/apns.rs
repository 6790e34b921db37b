use super::{IPushChannel, PushError};
use crate::config::ApnsConfig;

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// APNs delivery over the provider HTTP/2 API. Certificate and key
/// provisioning happens outside this process; the channel only carries an
/// opaque bearer token.
pub struct ApnsChannel {
    client: Client,
    config: ApnsConfig,
}

impl ApnsChannel {
    pub fn new(config: ApnsConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("To create APNs http client");

        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct ApnsPayload {
    aps: Aps,
}

#[derive(Debug, Serialize)]
struct Aps {
    alert: ApsAlert,
}

#[derive(Debug, Serialize)]
struct ApsAlert {
    body: String,
}

impl ApnsPayload {
    fn new(message: &str) -> Self {
        Self {
            aps: Aps {
                alert: ApsAlert {
                    body: message.to_string(),
                },
            },
        }
    }
}

#[async_trait::async_trait]
impl IPushChannel for ApnsChannel {
    async fn send(&self, device_token: &str, message: &str) -> Result<String, PushError> {
        let url = format!("{}/3/device/{}", self.config.endpoint, device_token);
        let res = self
            .client
            .post(&url)
            .header("apns-topic", &self.config.topic)
            .header("apns-push-type", "alert")
            .header("authorization", format!("bearer {}", self.config.auth_token))
            .json(&ApnsPayload::new(message))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let delivery_id = res
            .headers()
            .get("apns-id")
            .and_then(|id| id.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(delivery_id)
    }
}
