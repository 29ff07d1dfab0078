//! Data source lookups backing attribute scope resolution

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AccessControlError, Result};

mod resolver;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDataSourceStore;

pub use resolver::{
    DatasourceNameScopeResolver, DatasourceUidScopeResolver, DATASOURCE_NAME_PREFIX, DATASOURCE_UID_PREFIX,
};

/// Stored data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    pub uid: String,
    pub org_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub ds_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub access: String,
}

/// Data source creation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDataSourceCommand {
    pub uid: String,
    pub org_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub ds_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub access: String,
}

/// Data source lookup trait
#[async_trait]
pub trait DataSourceStore: Send + Sync {
    /// Find a data source by name within an organization
    async fn get_by_name(&self, org_id: i64, name: &str) -> Result<Option<DataSource>>;

    /// Find a data source by uid within an organization
    async fn get_by_uid(&self, org_id: i64, uid: &str) -> Result<Option<DataSource>>;
}

/// In-memory data source store
///
/// Ids are assigned sequentially starting at 1.
pub struct InMemoryDataSourceStore {
    data_sources: Arc<RwLock<HashMap<i64, DataSource>>>,
}

impl InMemoryDataSourceStore {
    pub fn new() -> Self {
        Self {
            data_sources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a data source, rejecting duplicate names and uids within an org
    pub async fn add(&self, cmd: AddDataSourceCommand) -> Result<DataSource> {
        if cmd.name.is_empty() {
            return Err(AccessControlError::InvalidInput(
                "Data source name cannot be empty".to_string(),
            ));
        }

        let mut data_sources = self.data_sources.write().await;
        let conflict = data_sources.values().any(|ds| {
            ds.org_id == cmd.org_id && (ds.name == cmd.name || (!cmd.uid.is_empty() && ds.uid == cmd.uid))
        });
        if conflict {
            return Err(AccessControlError::InvalidInput(format!(
                "Data source '{}' already exists in org {}",
                cmd.name, cmd.org_id
            )));
        }

        let id = data_sources.keys().max().copied().unwrap_or(0) + 1;
        let data_source = DataSource {
            id,
            uid: cmd.uid,
            org_id: cmd.org_id,
            name: cmd.name,
            ds_type: cmd.ds_type,
            url: cmd.url,
            access: cmd.access,
        };
        data_sources.insert(id, data_source.clone());

        Ok(data_source)
    }

    pub async fn len(&self) -> usize {
        self.data_sources.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data_sources.read().await.is_empty()
    }
}

impl Default for InMemoryDataSourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSourceStore for InMemoryDataSourceStore {
    async fn get_by_name(&self, org_id: i64, name: &str) -> Result<Option<DataSource>> {
        let data_sources = self.data_sources.read().await;
        Ok(data_sources
            .values()
            .find(|ds| ds.org_id == org_id && ds.name == name)
            .cloned())
    }

    async fn get_by_uid(&self, org_id: i64, uid: &str) -> Result<Option<DataSource>> {
        let data_sources = self.data_sources.read().await;
        Ok(data_sources
            .values()
            .find(|ds| ds.org_id == org_id && ds.uid == uid)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testds(org_id: i64) -> AddDataSourceCommand {
        AddDataSourceCommand {
            uid: "testUID".to_string(),
            org_id,
            name: "testds".to_string(),
            ds_type: "postgresql".to_string(),
            url: "http://localhost:5432".to_string(),
            access: "Proxy".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_lookup() {
        let store = InMemoryDataSourceStore::new();
        let ds = store.add(testds(1)).await.unwrap();
        assert_eq!(ds.id, 1);

        let found = store.get_by_name(1, "testds").await.unwrap().unwrap();
        assert_eq!(found, ds);
        assert_eq!(store.get_by_uid(1, "testUID").await.unwrap(), Some(ds));

        assert!(store.get_by_name(2, "testds").await.unwrap().is_none());
        assert!(store.get_by_name(1, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_per_org() {
        let store = InMemoryDataSourceStore::new();
        store.add(testds(1)).await.unwrap();

        assert!(store.add(testds(1)).await.is_err());

        let other_org = store.add(testds(2)).await.unwrap();
        assert_eq!(other_org.id, 2);
        assert_eq!(store.len().await, 2);
    }
}
