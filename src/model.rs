//! Wire records submitted to the registry.

use crate::attrs::{AttributeRecord, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// License text, line by line.
#[derive(Debug, Default, Clone, Serialize)]
pub struct License {
    pub content: Vec<String>,
}

/// Readme text, line by line.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Readme {
    pub content: Vec<String>,
}

/// Swagger/OpenAPI document. JSON specs are carried parsed; anything
/// else (YAML) is carried as one JSON string value.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Swagger {
    pub content: Value,
}

/// Software bill of materials payload.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Sbom {
    pub content: Value,
}

/// Build provenance attestation payload.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Provenance {
    pub content: Value,
}

/// Registry response carrying the assigned record key.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResponseKey {
    #[serde(default)]
    pub key: String,
}

/// The assembled component version record.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentVersion {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub variant: String,
    pub version: String,
    pub comp_type: String,
    pub created: DateTime<Utc>,
    pub creator: Identity,
    pub owner: Identity,
    pub attrs: AttributeRecord,
    pub license: License,
    pub readme: Readme,
    pub swagger: Swagger,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sbom_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provenance_key: String,
}
