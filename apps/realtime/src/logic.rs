//! Client for the stateless logic (compute) service.
//!
//! The logic service resolves synthesis recipes and upgrade costs over
//! plain request/response HTTP. Every call is bounded by the configured
//! timeout; failures surface as `GameError::External` and never crash the
//! connection pipeline.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::GameError;

/// Resolves the materials required by laboratory operations.
///
/// Responses map a material key (`"{category}:{itemId}"`) to the required
/// count.
#[async_trait]
pub trait RecipeResolver: Send + Sync {
    async fn synthesis_materials(
        &self,
        item_category: &str,
        item_id: i64,
    ) -> Result<HashMap<String, i64>, GameError>;

    async fn upgrade_materials(
        &self,
        lab_id: i64,
        lab_level: i64,
    ) -> Result<HashMap<String, i64>, GameError>;
}

#[derive(Clone)]
pub struct LogicClient {
    base_url: String,
    http: reqwest::Client,
}

impl LogicClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client"),
        }
    }

    async fn post_for_materials(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<HashMap<String, i64>, GameError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self.http.post(&url).json(&body).send().await.map_err(|err| {
            tracing::error!(?err, %url, "logic request failed");
            GameError::External(err.to_string())
        })?;

        response.json().await.map_err(|err| {
            tracing::error!(?err, %url, "logic response parse failed");
            GameError::External(err.to_string())
        })
    }
}

#[async_trait]
impl RecipeResolver for LogicClient {
    async fn synthesis_materials(
        &self,
        item_category: &str,
        item_id: i64,
    ) -> Result<HashMap<String, i64>, GameError> {
        self.post_for_materials(
            "lab/synthesize",
            json!({ "itemCategory": item_category, "itemId": item_id }),
        )
        .await
    }

    async fn upgrade_materials(
        &self,
        lab_id: i64,
        lab_level: i64,
    ) -> Result<HashMap<String, i64>, GameError> {
        self.post_for_materials(
            "lab/upgrade",
            json!({ "labId": lab_id, "labLevel": lab_level }),
        )
        .await
    }
}
