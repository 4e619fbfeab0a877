//! End-to-end attribute resolution over a real config file on disk.

use std::collections::BTreeMap;
use std::fs;

use compver::attrs::{self, AttributeRecord};
use compver::config::{ConfigDocument, CONFIG_FILE};
use compver::resolve::{resolve_attributes, resolve_vars, EnvContext};

fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[test]
fn empty_config_resolves_facts_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = ConfigDocument::load(dir.path());
    assert!(document.is_empty());

    let mut env = EnvContext::empty();
    let (record, extra) = resolve_attributes(
        &raw(&[("GIT_REPO", "org/repo"), ("SHORT_SHA", "abc123")]),
        &document,
        &mut env,
    );

    assert_eq!(record.git_repo, "org/repo");
    assert_eq!(record.git_commit, "abc123");
    assert!(extra.is_empty());
}

#[test]
fn attributes_section_resolves_against_seeded_facts_and_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(CONFIG_FILE),
        "[Attributes]\nNAME = \"svc\"\nVERSION = \"${BUILDNUM}\"\n",
    )
    .expect("write config");
    let document = ConfigDocument::load(dir.path());

    let mut env = EnvContext::empty().with_var("BUILDNUM", "42");
    let (record, extra) = resolve_attributes(&BTreeMap::new(), &document, &mut env);

    assert_eq!(record, AttributeRecord::default());
    assert_eq!(extra.get("NAME").map(String::as_str), Some("svc"));
    assert_eq!(extra.get("VERSION").map(String::as_str), Some("42"));
}

#[test]
fn every_recognized_name_lands_in_the_record_not_in_extras() {
    let recognized = [
        attrs::BASENAME,
        attrs::BLDDATE,
        attrs::BUILDID,
        attrs::BUILDNUM,
        attrs::BUILDURL,
        attrs::CHART,
        attrs::CHARTNAMESPACE,
        attrs::CHARTREPO,
        attrs::CHARTREPOURL,
        attrs::CHARTVERSION,
        attrs::DISCORDCHANNEL,
        attrs::DOCKERREPO,
        attrs::DOCKERSHA,
        attrs::DOCKERTAG,
        attrs::GITCOMMIT,
        attrs::GITREPO,
        attrs::GITTAG,
        attrs::GITURL,
        attrs::GIT_BRANCH,
        attrs::GIT_BRANCH_CREATE_COMMIT,
        attrs::GIT_BRANCH_CREATE_TIMESTAMP,
        attrs::GIT_BRANCH_PARENT,
        attrs::GIT_COMMIT,
        attrs::GIT_COMMITTERS_CNT,
        attrs::GIT_COMMIT_AUTHORS,
        attrs::GIT_COMMIT_TIMESTAMP,
        attrs::GIT_CONTRIB_PERCENTAGE,
        attrs::GIT_LINES_ADDED,
        attrs::GIT_LINES_DELETED,
        attrs::GIT_LINES_TOTAL,
        attrs::GIT_ORG,
        attrs::GIT_PREVIOUS_COMPONENT_COMMIT,
        attrs::GIT_REPO,
        attrs::GIT_REPO_PROJECT,
        attrs::GIT_SIGNED_OFF_BY,
        attrs::GIT_TAG,
        attrs::GIT_TOTAL_COMMITTERS_CNT,
        attrs::GIT_URL,
        attrs::GIT_VERIFY_COMMIT,
        attrs::HIPCHATCHANNEL,
        attrs::PAGERDUTYBUSINESSURL,
        attrs::PAGERDUTYURL,
        attrs::REPOSITORY,
        attrs::SERVICEOWNER,
        attrs::SHORT_SHA,
        attrs::SLACKCHANNEL,
    ];

    for name in recognized {
        // date fields need parseable input and the verify flag needs the
        // literal "1" before their assignment is visible on the record
        let value = match name {
            attrs::BLDDATE | attrs::GIT_COMMIT_TIMESTAMP | attrs::GIT_BRANCH_CREATE_TIMESTAMP => {
                "2026-08-07"
            }
            attrs::GIT_VERIFY_COMMIT => "1",
            _ => "x",
        };
        let document = ConfigDocument::parse(&format!("{name} = \"{value}\""))
            .expect("parse single-key config");
        let mut env = EnvContext::empty();
        let (record, extra) = resolve_attributes(&BTreeMap::new(), &document, &mut env);
        assert!(extra.is_empty(), "{name} leaked into extras");
        assert_ne!(
            record,
            AttributeRecord::default(),
            "{name} left the record untouched"
        );
    }
}

#[test]
fn recognized_names_match_case_insensitively() {
    let document = ConfigDocument::parse("dockerrepo = \"quay.io/acme/widget\"").expect("parse");
    let mut env = EnvContext::empty();
    let (record, extra) = resolve_attributes(&BTreeMap::new(), &document, &mut env);
    assert_eq!(record.docker_repo, "quay.io/acme/widget");
    assert!(extra.is_empty());
}

#[test]
fn config_values_overwrite_derived_facts() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "GIT_REPO = \"b\"\n").expect("write config");
    let document = ConfigDocument::load(dir.path());

    let mut env = EnvContext::empty();
    let (record, _) = resolve_attributes(&raw(&[("GIT_REPO", "a")]), &document, &mut env);
    assert_eq!(record.git_repo, "b");
}

#[test]
fn document_shadows_environment_in_substitution() {
    let document = ConfigDocument::parse("X = \"foo\"").expect("parse");
    let env = EnvContext::empty().with_var("X", "bar");
    assert_eq!(resolve_vars("${X}", &document, &env), "foo");
    assert_eq!(
        resolve_vars("${UNKNOWN}", &ConfigDocument::default(), &EnvContext::empty()),
        "${UNKNOWN}"
    );
}

#[test]
fn verify_commit_flag_requires_literal_one() {
    let mut env = EnvContext::empty();
    let (record, _) = resolve_attributes(
        &raw(&[("GIT_VERIFY_COMMIT", "1")]),
        &ConfigDocument::default(),
        &mut env,
    );
    assert!(record.git_verify_commit);

    let mut env = EnvContext::empty();
    let (record, _) = resolve_attributes(
        &raw(&[("GIT_VERIFY_COMMIT", "0")]),
        &ConfigDocument::default(),
        &mut env,
    );
    assert!(!record.git_verify_commit);
}
