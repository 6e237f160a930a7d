//! Outbound delivery through the configured webhook relay.
//!
//! The relay call never returns an error: every outcome, including a
//! timeout, is folded into a receipt the caller records on the outbox
//! row.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug)]
pub struct DeliveryReceipt {
    pub ok: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl DeliveryReceipt {
    fn failed(error: String) -> Self {
        Self {
            ok: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// POST the payload to the relay with a bounded timeout. A slow
/// endpoint surfaces as a failed receipt rather than stalling the
/// caller past the timeout window.
pub async fn deliver(url: &str, payload: &Value, timeout: Duration) -> DeliveryReceipt {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => return DeliveryReceipt::failed(err.to_string()),
    };

    let response = match client.post(url).json(payload).send().await {
        Ok(response) => response,
        // Covers connection errors and the request timeout
        Err(err) => return DeliveryReceipt::failed(err.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return DeliveryReceipt::failed(format!("delivery returned status {}", status.as_u16()));
    }

    let body: RelayResponse = response.json().await.unwrap_or_default();
    if body.ok == Some(false) {
        return DeliveryReceipt::failed(
            body.error
                .unwrap_or_else(|| "relay reported failure".to_string()),
        );
    }

    DeliveryReceipt {
        ok: true,
        message_id: body.id,
        error: None,
    }
}
