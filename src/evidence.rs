//! End-to-end evidence gathering and submission.

use crate::attrs::split_identity;
use crate::config::ConfigDocument;
use crate::facts;
use crate::files::{self, LICENSE_FILES, README_FILES, SWAGGER_FILES};
use crate::image;
use crate::model::{ComponentVersion, License, Provenance, Readme, Sbom, Swagger};
use crate::registry::RegistryClient;
use crate::resolve::{resolve_attributes, EnvContext};
use crate::runner::ShellRunner;
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs for one evidence-gathering run.
pub struct EvidenceOpts {
    /// Registry base URL.
    pub url: String,
    /// Submitting user id; a dotted prefix becomes the user's domain.
    pub user: String,
    /// Submitting user password. Accepted for parity with the registry
    /// CLI surface; requests are currently unauthenticated.
    pub password: String,
    /// Optional pre-built CycloneDX JSON SBOM.
    pub sbom_path: Option<PathBuf>,
}

/// Collect facts, resolve attributes, assemble the component version,
/// and submit everything to the registry.
///
/// Submissions are best-effort: a failed POST is logged and the run
/// moves on to the next document.
pub fn gather_evidence(opts: &EvidenceOpts) -> Result<()> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let created = Utc::now();
    let user = split_identity(&opts.user);

    let license = License {
        content: files::gather_lines(&cwd, LICENSE_FILES),
    };
    let readme = Readme {
        content: files::gather_lines(&cwd, README_FILES),
    };
    let swagger = Swagger {
        content: swagger_content(&files::gather_lines(&cwd, SWAGGER_FILES)),
    };

    let runner = ShellRunner;
    let raw_facts = facts::collect(&runner);
    let document = ConfigDocument::load(&cwd);
    let mut env = EnvContext::from_process();
    let (attrs, extra) = resolve_attributes(&raw_facts, &document, &mut env);

    let component = split_identity(extra.get("NAME").map_or("", String::as_str));
    let mut compver = ComponentVersion {
        name: component.name,
        domain: component.domain,
        variant: extra.get("VARIANT").cloned().unwrap_or_default(),
        version: extra.get("VERSION").cloned().unwrap_or_default(),
        comp_type: "docker".to_string(),
        created,
        creator: user.clone(),
        owner: user,
        attrs,
        license,
        readme,
        swagger,
        sbom_key: String::new(),
        provenance_key: String::new(),
    };

    let client = RegistryClient::new(&opts.url);

    if let Some(path) = opts.sbom_path.as_deref() {
        if let Some(content) = read_sbom_file(path) {
            submit_sbom(&client, content, &mut compver);
        }
    }

    if let Some(image_ref) = image::image_ref(&compver.attrs) {
        let sbom_text = image::sbom_from_image(&runner, &image_ref);
        if !sbom_text.is_empty() {
            match serde_json::from_str(&sbom_text) {
                Ok(content) => submit_sbom(&client, content, &mut compver),
                Err(err) => tracing::warn!(%err, "image SBOM is not valid JSON"),
            }
        }

        let provenance_text = image::provenance_from_image(&runner, &image_ref);
        if !provenance_text.is_empty() {
            match serde_json::from_str(&provenance_text) {
                Ok(content) => {
                    let provenance = Provenance { content };
                    match client.post_provenance(&provenance) {
                        Ok(key) => {
                            tracing::info!(key, "provenance submitted");
                            compver.provenance_key = key;
                        }
                        Err(err) => tracing::error!(%err, "provenance submission failed"),
                    }
                }
                Err(err) => tracing::warn!(%err, "image provenance is not valid JSON"),
            }
        }
    }

    match client.post_component_version(&compver) {
        Ok(key) => tracing::info!(key, "component version submitted"),
        Err(err) => tracing::error!(%err, "component version submission failed"),
    }
    Ok(())
}

fn submit_sbom(client: &RegistryClient, content: Value, compver: &mut ComponentVersion) {
    let sbom = Sbom { content };
    match client.post_sbom(&sbom) {
        Ok(key) => {
            tracing::info!(key, "SBOM submitted");
            compver.sbom_key = key;
        }
        Err(err) => tracing::error!(%err, "SBOM submission failed"),
    }
}

fn read_sbom_file(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "SBOM file not read");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(content) => Some(content),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "SBOM file is not valid JSON");
            None
        }
    }
}

/// JSON specs are carried parsed; YAML and friends become one string
/// value so the request body stays valid JSON.
fn swagger_content(lines: &[String]) -> Value {
    if lines.is_empty() {
        return Value::Null;
    }
    let joined = lines.join("\n");
    serde_json::from_str(&joined).unwrap_or(Value::String(joined))
}
