//! Attribute resolvers translating data source names and uids into ids

use async_trait::async_trait;
use std::sync::Arc;

use super::DataSourceStore;
use crate::error::{AccessControlError, Result};
use crate::scope::{AttributeResolver, ResolveContext};

/// Prefix of data source name scopes
pub const DATASOURCE_NAME_PREFIX: &str = "datasources:name:";

/// Prefix of data source uid scopes
pub const DATASOURCE_UID_PREFIX: &str = "datasources:uid:";

/// Resolves `datasources:name:<name>` to `datasources:id:<id>`
pub struct DatasourceNameScopeResolver {
    store: Arc<dyn DataSourceStore>,
}

impl DatasourceNameScopeResolver {
    pub fn new(store: Arc<dyn DataSourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AttributeResolver for DatasourceNameScopeResolver {
    fn prefix(&self) -> &str {
        DATASOURCE_NAME_PREFIX
    }

    async fn resolve(&self, ctx: &ResolveContext, org_id: i64, name: &str) -> Result<String> {
        if ctx.is_cancelled() {
            return Err(AccessControlError::Cancelled(format!("{}{}", DATASOURCE_NAME_PREFIX, name)));
        }

        let data_source = self
            .store
            .get_by_name(org_id, name)
            .await?
            .ok_or_else(|| AccessControlError::DataSourceNotFound(name.to_string()))?;

        Ok(data_source.id.to_string())
    }
}

/// Resolves `datasources:uid:<uid>` to `datasources:id:<id>`
pub struct DatasourceUidScopeResolver {
    store: Arc<dyn DataSourceStore>,
}

impl DatasourceUidScopeResolver {
    pub fn new(store: Arc<dyn DataSourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AttributeResolver for DatasourceUidScopeResolver {
    fn prefix(&self) -> &str {
        DATASOURCE_UID_PREFIX
    }

    async fn resolve(&self, ctx: &ResolveContext, org_id: i64, uid: &str) -> Result<String> {
        if ctx.is_cancelled() {
            return Err(AccessControlError::Cancelled(format!("{}{}", DATASOURCE_UID_PREFIX, uid)));
        }

        let data_source = self
            .store
            .get_by_uid(org_id, uid)
            .await?
            .ok_or_else(|| AccessControlError::DataSourceNotFound(uid.to_string()))?;

        Ok(data_source.id.to_string())
    }
}
