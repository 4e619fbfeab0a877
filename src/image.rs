//! SBOM and provenance extraction from container images.
//!
//! Buildx attaches an SPDX SBOM and a provenance attestation to images it
//! builds; both are read back through `docker buildx imagetools inspect`.
//! The registry speaks CycloneDX, so the SPDX document is converted
//! before submission.

use crate::attrs::AttributeRecord;
use crate::runner::{tool_available, CommandRunner};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Form the image reference from resolved docker attributes.
///
/// A digest pin wins over a tag; without either there is no reference.
pub fn image_ref(attrs: &AttributeRecord) -> Option<String> {
    if attrs.docker_repo.is_empty() {
        return None;
    }
    if !attrs.docker_sha.is_empty() {
        return Some(format!("{}@sha256:{}", attrs.docker_repo, attrs.docker_sha));
    }
    if !attrs.docker_tag.is_empty() {
        return Some(format!("{}:{}", attrs.docker_repo, attrs.docker_tag));
    }
    None
}

/// Read the image's SPDX SBOM and convert it to CycloneDX JSON.
///
/// Any failure along the way (docker missing, no SBOM attached,
/// undecodable JSON) logs and yields an empty string.
pub fn sbom_from_image(runner: &dyn CommandRunner, image_ref: &str) -> String {
    let raw = inspect(runner, image_ref, "{{ json .SBOM.SPDX }}");
    if raw.is_empty() {
        tracing::warn!(image = image_ref, "no SBOM found in image");
        return String::new();
    }
    match spdx_to_cyclonedx(&raw) {
        Ok(converted) => {
            tracing::info!(image = image_ref, "converted image SBOM to CycloneDX");
            converted
        }
        Err(err) => {
            tracing::warn!(image = image_ref, %err, "could not convert image SBOM");
            String::new()
        }
    }
}

/// Read the image's provenance attestation verbatim.
pub fn provenance_from_image(runner: &dyn CommandRunner, image_ref: &str) -> String {
    let raw = inspect(runner, image_ref, "{{ json .Provenance }}");
    if raw.is_empty() {
        tracing::warn!(image = image_ref, "no provenance found in image");
    }
    raw
}

fn inspect(runner: &dyn CommandRunner, image_ref: &str, format: &str) -> String {
    if !tool_available("docker") {
        tracing::warn!(image = image_ref, "docker not found on PATH");
        return String::new();
    }
    let output = runner.run(&format!(
        "docker buildx imagetools inspect {image_ref} --format '{format}'"
    ));
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return String::new();
    }
    trimmed.to_string()
}

#[derive(Deserialize)]
struct SpdxDocument {
    #[serde(default)]
    packages: Vec<SpdxPackage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version_info: String,
    #[serde(default)]
    license_concluded: String,
    #[serde(default)]
    external_refs: Vec<SpdxExternalRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    #[serde(default)]
    reference_type: String,
    #[serde(default)]
    reference_locator: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: &'static str,
    spec_version: &'static str,
    version: u32,
    components: Vec<CycloneDxComponent>,
}

#[derive(Serialize)]
struct CycloneDxComponent {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    purl: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<CycloneDxLicense>,
}

#[derive(Serialize)]
struct CycloneDxLicense {
    license: CycloneDxLicenseId,
}

#[derive(Serialize)]
struct CycloneDxLicenseId {
    id: String,
}

/// Convert an SPDX JSON document into a CycloneDX 1.5 JSON BOM.
fn spdx_to_cyclonedx(raw: &str) -> Result<String> {
    let document: SpdxDocument = serde_json::from_str(raw).context("decode SPDX document")?;
    let components = document
        .packages
        .into_iter()
        .map(|package| {
            let purl = package
                .external_refs
                .iter()
                .find(|reference| reference.reference_type == "purl")
                .map(|reference| reference.reference_locator.clone())
                .unwrap_or_default();
            let licenses = if package.license_concluded.is_empty()
                || package.license_concluded == "NOASSERTION"
            {
                Vec::new()
            } else {
                vec![CycloneDxLicense {
                    license: CycloneDxLicenseId {
                        id: package.license_concluded,
                    },
                }]
            };
            CycloneDxComponent {
                kind: "library",
                name: package.name,
                version: package.version_info,
                purl,
                licenses,
            }
        })
        .collect();
    let bom = CycloneDxBom {
        bom_format: "CycloneDX",
        spec_version: "1.5",
        version: 1,
        components,
    };
    serde_json::to_string(&bom).context("encode CycloneDX document")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn digest_pin_wins_over_tag() {
        let mut attrs = AttributeRecord::default();
        assert_eq!(image_ref(&attrs), None);
        attrs.docker_repo = "quay.io/acme/widget".to_string();
        assert_eq!(image_ref(&attrs), None);
        attrs.docker_tag = "v1".to_string();
        assert_eq!(image_ref(&attrs).as_deref(), Some("quay.io/acme/widget:v1"));
        attrs.docker_sha = "deadbeef".to_string();
        assert_eq!(
            image_ref(&attrs).as_deref(),
            Some("quay.io/acme/widget@sha256:deadbeef")
        );
    }

    #[test]
    fn spdx_packages_become_cyclonedx_components() {
        let spdx = r#"{
            "spdxVersion": "SPDX-2.3",
            "name": "widget",
            "packages": [
                {
                    "name": "libfoo",
                    "versionInfo": "1.2.3",
                    "licenseConcluded": "MIT",
                    "externalRefs": [
                        {
                            "referenceType": "purl",
                            "referenceLocator": "pkg:deb/debian/libfoo@1.2.3"
                        }
                    ]
                },
                {
                    "name": "bare",
                    "licenseConcluded": "NOASSERTION"
                }
            ]
        }"#;
        let converted = spdx_to_cyclonedx(spdx).expect("convert");
        let bom: Value = serde_json::from_str(&converted).expect("json");
        assert_eq!(bom["bomFormat"], "CycloneDX");
        assert_eq!(bom["specVersion"], "1.5");
        let components = bom["components"].as_array().expect("components");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["name"], "libfoo");
        assert_eq!(components[0]["purl"], "pkg:deb/debian/libfoo@1.2.3");
        assert_eq!(components[0]["licenses"][0]["license"]["id"], "MIT");
        assert_eq!(components[1]["name"], "bare");
        assert!(components[1].get("licenses").is_none());
        assert!(components[1].get("version").is_none());
    }

    #[test]
    fn undecodable_spdx_is_an_error() {
        assert!(spdx_to_cyclonedx("not json").is_err());
    }
}
