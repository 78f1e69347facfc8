use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Error;
use crate::notify::Notifier;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Client for the push-notification gateway that owns device tokens and
/// actual delivery. Every call is bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct PushGateway {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Serialize)]
struct DeliveryRequest<'a> {
    recipients: &'a [Uuid],
    title: &'a str,
    body: &'a str,
    data: Value,
}

#[derive(Deserialize)]
struct DeliveryReceipt {
    sent_count: u32,
}

impl PushGateway {
    pub fn from_env() -> Result<Self, Error> {
        let api_base = env::var("PUSH_GATEWAY_API_BASE")?;

        let timeout_ms = env::var("PUSH_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self { client, api_base })
    }
}

#[async_trait]
impl Notifier for PushGateway {
    #[tracing::instrument(skip(self, data))]
    async fn notify(
        &self,
        recipients: &[Uuid],
        title: &str,
        body: &str,
        data: Value,
    ) -> Result<u32, Error> {
        let url = format!("https://{}/notifications", self.api_base);

        let res = self
            .client
            .post(url)
            .json(&DeliveryRequest {
                recipients,
                title,
                body,
                data,
            })
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(Error::validation_error("push gateway rejected the request"));
        } else if status_code != 200 {
            return Err(Error::upstream_error());
        }

        let receipt: DeliveryReceipt = res.json().await?;

        Ok(receipt.sent_count)
    }
}
