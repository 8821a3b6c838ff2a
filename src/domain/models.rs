use super::errors::{DataStorageError, RelayError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Represents an accepted, scored transaction.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Transaction {
    /// Position of the transaction in the history, starting at 1
    pub id: u64,
    /// Account the transaction belongs to. Empty for older records written without one.
    #[serde(default)]
    pub account_id: String,
    /// Transaction amount, `0` when an older record has none
    #[serde(default)]
    pub amount: f64,
    /// ISO-8601 creation time, assigned on append
    pub timestamp: String,
    /// Risk score in `[0, 100]`
    pub fraud_score: u8,
    /// Any further fields supplied by the caller, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated transaction that has not been scored or stored yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTransaction {
    pub account_id: String,
    pub amount: f64,
    pub extra: Map<String, Value>,
}

impl NewTransaction {
    pub fn new(account_id: impl Into<String>, amount: f64) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            extra: Map::new(),
        }
    }
}

/// Accounts that are always scored as high-risk.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct Blacklist {
    #[serde(default)]
    pub accounts: HashSet<String>,
}

impl Blacklist {
    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.contains(account_id)
    }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// The named collections kept by a [`DataStorage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Transactions,
    Blacklist,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Blacklist => "blacklist",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

/// Trait for loading and persisting whole collections.
#[async_trait::async_trait]
pub trait DataStorage {
    /// Loads a collection. A collection that was never saved loads as `T::default()`.
    async fn load<T>(&self, collection: Collection) -> Result<T, DataStorageError>
    where
        T: DeserializeOwned + Default + Send + 'static;

    /// Replaces a collection. Readers never observe a partially written value.
    async fn save<T>(&self, collection: Collection, value: &T) -> Result<(), DataStorageError>
    where
        T: Serialize + Sync;
}

/// A text message to deliver through an SMS relay.
#[derive(Clone, Debug, PartialEq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
    pub transaction_id: Option<String>,
}

/// Outcome of an SMS send as reported to callers.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SmsReceipt {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmsReceipt {
    pub fn sent(message_id: String, status: Option<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            status,
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Trait for the outbound SMS provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SmsRelay {
    /// Whether provider credentials are available.
    fn is_configured(&self) -> bool;

    /// Sends one message. Malformed numbers and a missing configuration fail before any network call.
    async fn send(&self, message: &SmsMessage) -> Result<SmsReceipt, RelayError>;
}

/// Which template an alert is rendered with.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Fraud,
    Confirmation,
    Custom,
}

/// The two rendered alert texts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertTemplate {
    Fraud,
    Confirmation,
}

impl From<AlertTemplate> for AlertKind {
    fn from(template: AlertTemplate) -> Self {
        match template {
            AlertTemplate::Fraud => AlertKind::Fraud,
            AlertTemplate::Confirmation => AlertKind::Confirmation,
        }
    }
}

/// Transaction details printed in alert messages. Every field is optional.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlertTransaction {
    pub id: Option<Value>,
    #[serde(alias = "account_id")]
    pub acc_no: Option<Value>,
    pub amount: Option<f64>,
    pub location: Option<String>,
    #[serde(alias = "fraud_score")]
    pub risk_score: Option<f64>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

impl AlertTransaction {
    /// The transaction id as text, whether it was sent as a number or a string.
    pub fn transaction_id(&self) -> Option<String> {
        self.id.as_ref().and_then(value_as_text)
    }

    pub fn account(&self) -> Option<String> {
        self.acc_no.as_ref().and_then(value_as_text)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One record of the SMS log.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SmsLogEntry {
    pub transaction_id: Option<String>,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub timestamp: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}
