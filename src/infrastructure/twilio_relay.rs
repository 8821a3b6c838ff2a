use crate::{
    config::RelayConfig,
    domain::{
        errors::RelayError,
        models::{SmsMessage, SmsReceipt, SmsRelay},
        phone::validate_phone_number,
    },
};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

/// Sends SMS through the Twilio Messages REST API.
pub struct TwilioRelay {
    config: Option<RelayConfig>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    message: String,
    #[serde(default)]
    code: Option<u32>,
}

impl TwilioRelay {
    /// Creates a relay. Without a configuration every send fails with [`RelayError::NotConfigured`].
    pub fn new(config: Option<RelayConfig>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    fn messages_url(config: &RelayConfig) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_url.trim_end_matches('/'),
            config.account_sid
        )
    }
}

#[async_trait::async_trait]
impl SmsRelay for TwilioRelay {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn send(&self, message: &SmsMessage) -> Result<SmsReceipt, RelayError> {
        validate_phone_number(&message.to)?;
        let config = self.config.as_ref().ok_or(RelayError::NotConfigured)?;

        let response = self
            .client
            .post(Self::messages_url(config))
            .basic_auth(&config.account_sid, Some(config.auth_token.expose_secret()))
            .form(&[
                ("To", message.to.as_str()),
                ("From", config.from_number.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Failed to reach Twilio: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorResource>(&body) {
                Ok(ErrorResource {
                    message: text,
                    code: Some(code),
                }) => format!("{} (code {})", text, code),
                Ok(ErrorResource { message: text, .. }) => text,
                Err(_) => body,
            };
            tracing::warn!(to = %message.to, %status, "Twilio rejected SMS: {}", detail);
            return Err(RelayError::Upstream(format!(
                "Twilio returned {}: {}",
                status, detail
            )));
        }

        let resource: MessageResource = response.json().await.map_err(|e| {
            RelayError::Upstream(format!("Failed to parse Twilio response: {}", e))
        })?;

        tracing::info!(
            to = %message.to,
            sid = %resource.sid,
            transaction_id = ?message.transaction_id,
            "SMS sent successfully"
        );

        Ok(SmsReceipt::sent(resource.sid, resource.status))
    }
}
