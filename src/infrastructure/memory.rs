use crate::domain::{
    errors::DataStorageError,
    models::{Collection, DataStorage},
};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Keeps collections in memory. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    // collection -> last saved value
    collections: DashMap<Collection, Value>,
}

impl InMemoryDatabase {
    /// Pre-populates a collection, e.g. to install a blacklist.
    pub fn with_collection<T: Serialize>(
        self,
        collection: Collection,
        value: &T,
    ) -> Result<Self, DataStorageError> {
        let value = to_value(collection, value)?;
        self.collections.insert(collection, value);
        Ok(self)
    }
}

#[async_trait::async_trait]
impl DataStorage for InMemoryDatabase {
    async fn load<T>(&self, collection: Collection) -> Result<T, DataStorageError>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        let Some(value) = self.collections.get(&collection).map(|v| v.value().clone()) else {
            return Ok(T::default());
        };

        serde_json::from_value(value).map_err(|source| DataStorageError::Malformed {
            collection: collection.name(),
            source,
        })
    }

    async fn save<T>(&self, collection: Collection, value: &T) -> Result<(), DataStorageError>
    where
        T: Serialize + Sync,
    {
        let value = to_value(collection, value)?;
        self.collections.insert(collection, value);
        Ok(())
    }
}

fn to_value<T: Serialize>(collection: Collection, value: &T) -> Result<Value, DataStorageError> {
    serde_json::to_value(value).map_err(|source| DataStorageError::Malformed {
        collection: collection.name(),
        source,
    })
}
