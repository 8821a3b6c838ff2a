use clap::Parser;
use secrecy::Secret;
use std::path::PathBuf;

pub const DEFAULT_TWILIO_API_URL: &str = "https://api.twilio.com";

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Fraud-scoring transaction API with SMS alerts"
)]
pub struct Settings {
    /// Directory holding transactions.json and blacklist.json
    #[arg(short, long, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Listen port REST API
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub listen_port: u16,

    /// Keep all collections in memory instead of on disk
    #[arg(long, default_value_t = false)]
    pub in_memory: bool,

    /// Twilio account SID
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub twilio_auth_token: Option<String>,

    /// Sender phone number registered with Twilio
    #[arg(long, env = "TWILIO_PHONE_NUMBER")]
    pub twilio_phone_number: Option<String>,

    /// Base URL of the Twilio REST API
    #[arg(long, env = "TWILIO_API_URL", default_value = DEFAULT_TWILIO_API_URL)]
    pub twilio_api_url: String,
}

impl Settings {
    /// Relay credentials, present only when all three are set and non-empty.
    pub fn relay_config(&self) -> Option<RelayConfig> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        Some(RelayConfig {
            account_sid: non_empty(&self.twilio_account_sid)?,
            auth_token: Secret::new(non_empty(&self.twilio_auth_token)?),
            from_number: non_empty(&self.twilio_phone_number)?,
            api_url: self.twilio_api_url.clone(),
        })
    }
}

/// Credentials and endpoint for the SMS provider.
#[derive(Debug)]
pub struct RelayConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    pub from_number: String,
    pub api_url: String,
}

impl RelayConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: Secret::new(auth_token.into()),
            from_number: from_number.into(),
            api_url: DEFAULT_TWILIO_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}
