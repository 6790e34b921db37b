use super::{IPushChannel, PushError};
use crate::config::FcmConfig;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// FCM delivery through the legacy HTTP send endpoint, authenticated with
/// the server key.
pub struct FcmChannel {
    client: Client,
    config: FcmConfig,
}

impl FcmChannel {
    pub fn new(config: FcmConfig, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("To create FCM http client");

        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    to: &'a str,
    data: FcmData<'a>,
}

#[derive(Debug, Serialize)]
struct FcmData<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    multicast_id: i64,
    #[serde(default)]
    success: i64,
    #[serde(default)]
    failure: i64,
}

#[async_trait::async_trait]
impl IPushChannel for FcmChannel {
    async fn send(&self, device_token: &str, message: &str) -> Result<String, PushError> {
        let res = self
            .client
            .post(&self.config.endpoint)
            .header(
                "authorization",
                format!("key={}", self.config.server_key),
            )
            .json(&FcmMessage {
                to: device_token,
                data: FcmData { message },
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let fcm_res = res.json::<FcmResponse>().await?;
        if fcm_res.success < 1 {
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body: format!("provider reported {} failed deliveries", fcm_res.failure),
            });
        }

        Ok(fcm_res.multicast_id.to_string())
    }
}
