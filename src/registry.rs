//! HTTP client for the component registry.

use crate::model::{ComponentVersion, Provenance, ResponseKey, Sbom};
use anyhow::{Context, Result};
use serde::Serialize;

/// Blocking registry client. Each call POSTs one JSON document and
/// decodes the registry-assigned key from the response.
pub struct RegistryClient {
    base: String,
    agent: ureq::Agent,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn post_sbom(&self, sbom: &Sbom) -> Result<String> {
        self.post("/msapi/sbom", sbom)
    }

    pub fn post_provenance(&self, provenance: &Provenance) -> Result<String> {
        self.post("/msapi/provenance", provenance)
    }

    pub fn post_component_version(&self, compver: &ComponentVersion) -> Result<String> {
        self.post("/msapi/compver", compver)
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<String> {
        let url = format!("{}{}", self.base, path);
        let mut response = self
            .agent
            .post(&url)
            .send_json(body)
            .with_context(|| format!("POST {url}"))?;
        let key: ResponseKey = response
            .body_mut()
            .read_json()
            .with_context(|| format!("decode response from {url}"))?;
        Ok(key.key)
    }
}
