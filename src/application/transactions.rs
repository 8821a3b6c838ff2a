use crate::domain::{
    errors::DataStorageError,
    models::{Blacklist, Collection, DataStorage, NewTransaction, Transaction},
    scoring::fraud_score,
};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use typed_builder::TypedBuilder;

/// Lists and appends scored transactions on top of a [`DataStorage`].
#[derive(TypedBuilder)]
pub struct TransactionService<D> {
    store: Arc<D>,
    // Held across load -> score -> save so concurrent appends never share an id.
    #[builder(default)]
    append_lock: Mutex<()>,
}

impl<D> TransactionService<D>
where
    D: DataStorage + Send + Sync,
{
    /// Returns the full history in arrival order.
    pub async fn list(&self) -> Result<Vec<Transaction>, DataStorageError> {
        self.store.load(Collection::Transactions).await
    }

    /// Scores `candidate`, stamps its id and timestamp, and persists it.
    ///
    /// # Returns
    ///
    /// The stored transaction, or a `DataStorageError` if the history could not be read or written.
    pub async fn append(&self, candidate: NewTransaction) -> Result<Transaction, DataStorageError> {
        let _guard = self.append_lock.lock().await;

        let mut history: Vec<Transaction> = self.store.load(Collection::Transactions).await?;
        let blacklist: Blacklist = self.store.load(Collection::Blacklist).await?;

        let score = fraud_score(&candidate, &history, &blacklist);
        let transaction = Transaction {
            id: history.len() as u64 + 1,
            account_id: candidate.account_id,
            amount: candidate.amount,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            fraud_score: score,
            extra: candidate.extra,
        };

        history.push(transaction.clone());
        self.store.save(Collection::Transactions, &history).await?;

        tracing::info!(
            id = transaction.id,
            account_id = %transaction.account_id,
            fraud_score = transaction.fraud_score,
            "Transaction stored"
        );

        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{json_store::JsonFileStore, memory::InMemoryDatabase};
    use serde_json::json;
    use tokio::task::JoinSet;

    fn service(database: InMemoryDatabase) -> TransactionService<InMemoryDatabase> {
        TransactionService::builder().store(Arc::new(database)).build()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let service = service(InMemoryDatabase::default());

        let transactions = tokio_test::assert_ok!(service.list().await);

        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn ids_are_dense_in_append_order() {
        let service = service(InMemoryDatabase::default());

        for n in 0..5 {
            service
                .append(NewTransaction::new(format!("ACC-{n}"), 10.0))
                .await
                .unwrap();
        }

        let ids: Vec<u64> = service.list().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn append_scores_against_history_and_blacklist() {
        let blacklist: Blacklist = ["BAD-1"].into_iter().collect();
        let database = InMemoryDatabase::default()
            .with_collection(Collection::Blacklist, &blacklist)
            .unwrap();
        let service = service(database);

        let high = service.append(NewTransaction::new("ACC-1", 10_001.0)).await.unwrap();
        let listed = service.append(NewTransaction::new("BAD-1", 0.0)).await.unwrap();

        assert_eq!(high.fraud_score, 30);
        assert_eq!(listed.fraud_score, 50);
    }

    #[tokio::test]
    async fn seventh_transaction_for_an_account_is_frequent() {
        let service = service(InMemoryDatabase::default());

        for _ in 0..6 {
            let tx = service.append(NewTransaction::new("ACC-1", 100.0)).await.unwrap();
            assert_eq!(tx.fraud_score, 0);
        }
        let seventh = service.append(NewTransaction::new("ACC-1", 100.0)).await.unwrap();

        assert_eq!(seventh.id, 7);
        assert_eq!(seventh.fraud_score, 20);
    }

    #[tokio::test]
    async fn every_rule_together_is_capped() {
        let blacklist: Blacklist = ["BAD-1"].into_iter().collect();
        let database = InMemoryDatabase::default()
            .with_collection(Collection::Blacklist, &blacklist)
            .unwrap();
        let service = service(database);

        let mut last = None;
        for _ in 0..8 {
            last = Some(service.append(NewTransaction::new("BAD-1", 20_000.0)).await.unwrap());
        }

        let last = last.unwrap();
        assert_eq!(last.fraud_score, 100);
        assert!(service
            .list()
            .await
            .unwrap()
            .iter()
            .all(|t| t.fraud_score <= 100));
    }

    #[tokio::test]
    async fn extra_fields_are_kept() {
        let service = service(InMemoryDatabase::default());
        let mut candidate = NewTransaction::new("ACC-1", 5.0);
        candidate.extra.insert("location".to_string(), json!("Tokyo"));

        let stored = service.append(candidate).await.unwrap();

        assert_eq!(stored.extra.get("location"), Some(&json!("Tokyo")));
        assert_eq!(service.list().await.unwrap(), vec![stored]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_do_not_lose_updates() {
        let service = Arc::new(service(InMemoryDatabase::default()));
        let mut join_set = JoinSet::new();

        for n in 0..50 {
            let service = service.clone();
            join_set.spawn(async move {
                service
                    .append(NewTransaction::new(format!("ACC-{}", n % 7), 1.0))
                    .await
            });
        }
        while let Some(result) = join_set.join_next().await {
            result.unwrap().unwrap();
        }

        let mut ids: Vec<u64> = service.list().await.unwrap().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn history_survives_a_new_service_on_the_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = TransactionService::builder()
            .store(Arc::new(JsonFileStore::new(dir.path())))
            .build();
        first.append(NewTransaction::new("ACC-1", 1.0)).await.unwrap();
        first.append(NewTransaction::new("ACC-1", 2.0)).await.unwrap();

        let second = TransactionService::builder()
            .store(Arc::new(JsonFileStore::new(dir.path())))
            .build();
        let third = second.append(NewTransaction::new("ACC-2", 3.0)).await.unwrap();

        assert_eq!(third.id, 3);
        assert_eq!(second.list().await.unwrap().len(), 3);
    }
}
