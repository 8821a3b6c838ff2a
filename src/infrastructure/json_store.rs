use crate::domain::{
    errors::DataStorageError,
    models::{Collection, DataStorage},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Keeps every collection as a pretty-printed JSON file in one directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_of(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }
}

#[async_trait::async_trait]
impl DataStorage for JsonFileStore {
    async fn load<T>(&self, collection: Collection) -> Result<T, DataStorageError>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let path = self.path_of(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not found, using an empty {}", path.display(), collection.name());
                return Ok(T::default());
            }
            Err(source) => {
                return Err(DataStorageError::Io {
                    collection: collection.name(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| DataStorageError::Malformed {
            collection: collection.name(),
            source,
        })
    }

    async fn save<T>(&self, collection: Collection, value: &T) -> Result<(), DataStorageError>
    where
        T: Serialize + Sync,
    {
        let io_error = |source: std::io::Error| DataStorageError::Io {
            collection: collection.name(),
            source,
        };

        let bytes =
            serde_json::to_vec_pretty(value).map_err(|source| DataStorageError::Malformed {
                collection: collection.name(),
                source,
            })?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(io_error)?;

        // Write next to the target and rename so readers never see a half-written file.
        let path = self.path_of(collection);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await.map_err(io_error)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(io_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Blacklist, Transaction};
    use serde_json::Map;

    fn transaction(id: u64) -> Transaction {
        Transaction {
            id,
            account_id: "ACC-1".to_string(),
            amount: 120.5,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            fraud_score: 0,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let transactions: Vec<Transaction> = store.load(Collection::Transactions).await.unwrap();
        let blacklist: Blacklist = store.load(Collection::Blacklist).await.unwrap();

        assert!(transactions.is_empty());
        assert!(blacklist.accounts.is_empty());
    }

    #[tokio::test]
    async fn saved_history_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let history = vec![transaction(1), transaction(2)];

        store.save(Collection::Transactions, &history).await.unwrap();
        let loaded: Vec<Transaction> = store.load(Collection::Transactions).await.unwrap();

        assert_eq!(loaded, history);
        assert!(dir.path().join("transactions.json").exists());
        assert!(!dir.path().join("transactions.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_creates_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("data"));

        store
            .save(Collection::Transactions, &vec![transaction(1)])
            .await
            .unwrap();

        assert!(store.data_dir().join("transactions.json").exists());
    }

    #[tokio::test]
    async fn reads_blacklist_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("blacklist.json"),
            r#"{ "accounts": ["ACC-666", "ACC-13"] }"#,
        )
        .unwrap();
        let store = JsonFileStore::new(dir.path());

        let blacklist: Blacklist = store.load(Collection::Blacklist).await.unwrap();

        assert!(blacklist.contains("ACC-666"));
        assert!(blacklist.contains("ACC-13"));
    }

    #[tokio::test]
    async fn loads_history_with_records_missing_account_or_amount() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("transactions.json"),
            r#"[
                { "amount": 5, "id": 1, "timestamp": "2024-01-01T00:00:00Z", "fraud_score": 0 },
                { "account_id": "ACC-1", "id": 2, "timestamp": "2024-01-01T00:00:01Z", "fraud_score": 0 }
            ]"#,
        )
        .unwrap();
        let store = JsonFileStore::new(dir.path());

        let loaded: Vec<Transaction> = store.load(Collection::Transactions).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].account_id, "");
        assert_eq!(loaded[0].amount, 5.0);
        assert_eq!(loaded[1].account_id, "ACC-1");
        assert_eq!(loaded[1].amount, 0.0);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("transactions.json"), "[{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        let result: Result<Vec<Transaction>, _> = store.load(Collection::Transactions).await;

        assert!(matches!(
            result,
            Err(DataStorageError::Malformed {
                collection: "transactions",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let store = JsonFileStore::new(&blocker);

        let result = store.save(Collection::Transactions, &vec![transaction(1)]).await;

        assert!(matches!(result, Err(DataStorageError::Io { .. })));
    }
}
