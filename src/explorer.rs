use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "explorer";

/// Client for an Etherscan-compatible `?module=..&action=..` explorer API.
#[derive(Clone)]
pub struct ExplorerClient {
    http: Client,
    base_url: String,
}

impl ExplorerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues one GET with `module`, `action` and the given extra fields, in order.
    pub async fn query(
        &self,
        module: &str,
        action: &str,
        fields: &[(&'static str, String)],
    ) -> Result<Value> {
        let mut params: Vec<(&str, &str)> = vec![("module", module), ("action", action)];
        params.extend(fields.iter().map(|(k, v)| (*k, v.as_str())));

        debug!("Explorer query {}/{} with {} field(s)", module, action, fields.len());

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(Error::upstream(SERVICE, Some(status.as_u16()), body));
        }

        serde_json::from_str(&body).map_err(|e| Error::malformed(SERVICE, e))
    }
}
