use crate::domain::models::SmsLogEntry;
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Number of entries kept before the oldest are dropped.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Bounded, newest-first record of SMS send attempts.
#[derive(Default)]
pub struct SmsLog {
    entries: RwLock<VecDeque<SmsLogEntry>>,
}

impl SmsLog {
    pub async fn record(&self, entry: SmsLogEntry) {
        tracing::info!(
            transaction_id = ?entry.transaction_id,
            kind = ?entry.kind,
            success = entry.success,
            "SMS logged"
        );

        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(MAX_LOG_ENTRIES);
    }

    /// The `limit` most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<SmsLogEntry> {
        self.entries.read().await.iter().take(limit).cloned().collect()
    }

    pub async fn by_transaction(&self, transaction_id: &str) -> Vec<SmsLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.transaction_id.as_deref() == Some(transaction_id))
            .cloned()
            .collect()
    }
}
