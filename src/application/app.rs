use std::sync::Arc;

use super::alerts::AlertService;
use super::transactions::TransactionService;
use crate::domain::errors::{DataStorageError, RelayError};
use crate::domain::models::{
    AlertTemplate, AlertTransaction, DataStorage, NewTransaction, SmsLogEntry, SmsMessage, SmsReceipt,
    SmsRelay, Transaction,
};
use crate::infrastructure::memory::InMemoryDatabase;

#[async_trait::async_trait]
pub trait Application {
    async fn list_transactions(&self) -> Result<Vec<Transaction>, DataStorageError>;
    async fn append_transaction(
        &self,
        candidate: NewTransaction,
    ) -> Result<Transaction, DataStorageError>;
    async fn send_sms(&self, message: SmsMessage) -> Result<SmsReceipt, RelayError>;
    async fn send_alert(
        &self,
        transaction: AlertTransaction,
        phone_number: String,
        template: AlertTemplate,
    ) -> Result<SmsReceipt, RelayError>;
    async fn sms_history(&self, limit: usize) -> Vec<SmsLogEntry>;
    async fn sms_by_transaction(&self, transaction_id: String) -> Vec<SmsLogEntry>;
}

pub struct App<D, R> {
    transactions: TransactionService<D>,
    alerts: AlertService<R>,
}

impl<D, R> App<D, R>
where
    R: SmsRelay + Send + Sync,
{
    pub fn new(store: D, relay: R) -> Self {
        Self {
            transactions: TransactionService::builder().store(Arc::new(store)).build(),
            alerts: AlertService::builder().relay(Arc::new(relay)).build(),
        }
    }
}

impl<R> App<InMemoryDatabase, R>
where
    R: SmsRelay + Send + Sync,
{
    pub fn in_memory(relay: R) -> Self {
        Self::new(InMemoryDatabase::default(), relay)
    }
}

#[async_trait::async_trait]
impl<D, R> Application for App<D, R>
where
    D: DataStorage + Send + Sync + 'static,
    R: SmsRelay + Send + Sync + 'static,
{
    async fn list_transactions(&self) -> Result<Vec<Transaction>, DataStorageError> {
        tracing::info!("Getting all transactions ...");
        self.transactions.list().await
    }

    async fn append_transaction(
        &self,
        candidate: NewTransaction,
    ) -> Result<Transaction, DataStorageError> {
        tracing::info!("Appending transaction for account {}", candidate.account_id);
        self.transactions.append(candidate).await
    }

    async fn send_sms(&self, message: SmsMessage) -> Result<SmsReceipt, RelayError> {
        tracing::info!("Sending SMS to {}", message.to);
        self.alerts.send_sms(message).await
    }

    async fn send_alert(
        &self,
        transaction: AlertTransaction,
        phone_number: String,
        template: AlertTemplate,
    ) -> Result<SmsReceipt, RelayError> {
        tracing::info!("Sending {:?} alert to {}", template, phone_number);
        self.alerts
            .send_alert(&transaction, &phone_number, template)
            .await
    }

    async fn sms_history(&self, limit: usize) -> Vec<SmsLogEntry> {
        tracing::info!("Getting last {} SMS log entries", limit);
        self.alerts.history(limit).await
    }

    async fn sms_by_transaction(&self, transaction_id: String) -> Vec<SmsLogEntry> {
        tracing::info!("Getting SMS log entries for transaction {}", transaction_id);
        self.alerts.by_transaction(&transaction_id).await
    }
}
