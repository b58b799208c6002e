//! COA and product lookups

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::client::{ApiClient, ApiResult};
use crate::models::{CoaList, CoaRecord, ComparedProduct};

/// Query for `GET /coa`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoaQuery {
    pub skip: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl CoaQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, ..Default::default() }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("skip", self.skip.to_string()), ("limit", self.limit.to_string())];
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(status) = self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

/// Source of COA records and labelled products
#[async_trait]
pub trait CoaSource: Send + Sync {
    async fn list_coas(&self, query: &CoaQuery) -> ApiResult<CoaList>;
    async fn get_coa(&self, id: &str) -> ApiResult<CoaRecord>;
    async fn get_product(&self, id: &str) -> ApiResult<ComparedProduct>;
}

#[async_trait]
impl CoaSource for ApiClient {
    async fn list_coas(&self, query: &CoaQuery) -> ApiResult<CoaList> {
        self.get_json("/coa", &query.to_pairs()).await
    }

    async fn get_coa(&self, id: &str) -> ApiResult<CoaRecord> {
        info!("Fetching COA {}", id);
        self.get_json(&format!("/coa/{}", id), &[]).await
    }

    async fn get_product(&self, id: &str) -> ApiResult<ComparedProduct> {
        info!("Fetching product {}", id);
        let raw: Value = self.get_json(&format!("/products/{}", id), &[]).await?;
        Ok(ComparedProduct::from_api(&raw))
    }
}
