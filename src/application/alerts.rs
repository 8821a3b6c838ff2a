use crate::{
    domain::{
        errors::RelayError,
        models::{
            AlertKind, AlertTemplate, AlertTransaction, SmsLogEntry, SmsMessage, SmsReceipt,
            SmsRelay,
        },
        phone::validate_phone_number,
    },
    infrastructure::sms_log::SmsLog,
};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use typed_builder::TypedBuilder;

const UNKNOWN: &str = "unknown";

/// Renders alert texts, sends them through an [`SmsRelay`] and keeps the [`SmsLog`].
#[derive(TypedBuilder)]
pub struct AlertService<R> {
    relay: Arc<R>,
    #[builder(default)]
    log: SmsLog,
}

impl<R> AlertService<R>
where
    R: SmsRelay + Send + Sync,
{
    /// Sends a free-form message.
    pub async fn send_sms(&self, message: SmsMessage) -> Result<SmsReceipt, RelayError> {
        self.deliver(message, AlertKind::Custom).await
    }

    /// Sends the fraud or confirmation template for `transaction` to `phone_number`.
    pub async fn send_alert(
        &self,
        transaction: &AlertTransaction,
        phone_number: &str,
        template: AlertTemplate,
    ) -> Result<SmsReceipt, RelayError> {
        let message = SmsMessage {
            to: phone_number.to_string(),
            body: render(transaction, template),
            transaction_id: transaction.transaction_id(),
        };
        self.deliver(message, template.into()).await
    }

    pub async fn history(&self, limit: usize) -> Vec<SmsLogEntry> {
        self.log.recent(limit).await
    }

    pub async fn by_transaction(&self, transaction_id: &str) -> Vec<SmsLogEntry> {
        self.log.by_transaction(transaction_id).await
    }

    // Validation and configuration errors are returned as-is and not logged; provider
    // failures become an unsuccessful receipt.
    async fn deliver(&self, message: SmsMessage, kind: AlertKind) -> Result<SmsReceipt, RelayError> {
        validate_phone_number(&message.to)?;

        let receipt = match self.relay.send(&message).await {
            Ok(receipt) => receipt,
            Err(RelayError::Upstream(error)) => {
                tracing::error!(to = %message.to, "SMS delivery failed: {}", error);
                SmsReceipt::failed(error)
            }
            Err(e) => return Err(e),
        };

        self.log
            .record(SmsLogEntry {
                transaction_id: message.transaction_id,
                phone_number: message.to,
                kind,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                success: receipt.success,
                message_id: receipt.message_id.clone(),
            })
            .await;

        Ok(receipt)
    }
}

fn render(transaction: &AlertTransaction, template: AlertTemplate) -> String {
    let account = transaction.account().unwrap_or_else(|| UNKNOWN.to_string());
    let amount = transaction
        .amount
        .map(|a| a.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let location = transaction.location.as_deref().unwrap_or(UNKNOWN);
    let time = transaction.timestamp.as_deref().unwrap_or(UNKNOWN);

    match template {
        AlertTemplate::Fraud => {
            let risk = transaction
                .risk_score
                .map(|r| r.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string());
            format!(
                "🚨 FRAUD ALERT: Suspicious transaction detected\n\n\
                 Account: {account}\n\
                 Amount: ${amount}\n\
                 Location: {location}\n\
                 Risk Score: {risk}%\n\
                 Time: {time}\n\n\
                 Please review immediately."
            )
        }
        AlertTemplate::Confirmation => {
            let status = transaction.status.as_deref().unwrap_or(UNKNOWN);
            format!(
                "✅ TRANSACTION CONFIRMED: Your transaction was processed\n\n\
                 Account: {account}\n\
                 Amount: ${amount}\n\
                 Location: {location}\n\
                 Status: {status}\n\
                 Time: {time}\n\n\
                 Thank you for banking with us."
            )
        }
    }
}
