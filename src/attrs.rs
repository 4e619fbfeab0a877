//! Canonical attribute record and the recognized-name table.
//!
//! The record holds one field per recognized attribute name. Names are
//! matched after uppercasing, and a handful of historical spellings alias
//! the same field (`GIT_COMMIT`/`GITCOMMIT`/`SHORT_SHA`, and the
//! repo/tag/url pairs). The aliases are equivalent; when several appear in
//! one source the last one applied wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

pub const BASENAME: &str = "BASENAME";
pub const BLDDATE: &str = "BLDDATE";
pub const BUILDID: &str = "BUILDID";
pub const BUILDNUM: &str = "BUILDNUM";
pub const BUILDURL: &str = "BUILDURL";
pub const CHART: &str = "CHART";
pub const CHARTNAMESPACE: &str = "CHARTNAMESPACE";
pub const CHARTREPO: &str = "CHARTREPO";
pub const CHARTREPOURL: &str = "CHARTREPOURL";
pub const CHARTVERSION: &str = "CHARTVERSION";
pub const DISCORDCHANNEL: &str = "DISCORDCHANNEL";
pub const DOCKERREPO: &str = "DOCKERREPO";
pub const DOCKERSHA: &str = "DOCKERSHA";
pub const DOCKERTAG: &str = "DOCKERTAG";
pub const GITCOMMIT: &str = "GITCOMMIT";
pub const GITREPO: &str = "GITREPO";
pub const GITTAG: &str = "GITTAG";
pub const GITURL: &str = "GITURL";
pub const GIT_BRANCH: &str = "GIT_BRANCH";
pub const GIT_BRANCH_CREATE_COMMIT: &str = "GIT_BRANCH_CREATE_COMMIT";
pub const GIT_BRANCH_CREATE_TIMESTAMP: &str = "GIT_BRANCH_CREATE_TIMESTAMP";
pub const GIT_BRANCH_PARENT: &str = "GIT_BRANCH_PARENT";
pub const GIT_COMMIT: &str = "GIT_COMMIT";
pub const GIT_COMMITTERS_CNT: &str = "GIT_COMMITTERS_CNT";
pub const GIT_COMMIT_AUTHORS: &str = "GIT_COMMIT_AUTHORS";
pub const GIT_COMMIT_TIMESTAMP: &str = "GIT_COMMIT_TIMESTAMP";
pub const GIT_CONTRIB_PERCENTAGE: &str = "GIT_CONTRIB_PERCENTAGE";
pub const GIT_LINES_ADDED: &str = "GIT_LINES_ADDED";
pub const GIT_LINES_DELETED: &str = "GIT_LINES_DELETED";
pub const GIT_LINES_TOTAL: &str = "GIT_LINES_TOTAL";
pub const GIT_ORG: &str = "GIT_ORG";
pub const GIT_PREVIOUS_COMPONENT_COMMIT: &str = "GIT_PREVIOUS_COMPONENT_COMMIT";
pub const GIT_REPO: &str = "GIT_REPO";
pub const GIT_REPO_PROJECT: &str = "GIT_REPO_PROJECT";
pub const GIT_SIGNED_OFF_BY: &str = "GIT_SIGNED_OFF_BY";
pub const GIT_TAG: &str = "GIT_TAG";
pub const GIT_TOTAL_COMMITTERS_CNT: &str = "GIT_TOTAL_COMMITTERS_CNT";
pub const GIT_URL: &str = "GIT_URL";
pub const GIT_VERIFY_COMMIT: &str = "GIT_VERIFY_COMMIT";
pub const HIPCHATCHANNEL: &str = "HIPCHATCHANNEL";
pub const PAGERDUTYBUSINESSURL: &str = "PAGERDUTYBUSINESSURL";
pub const PAGERDUTYURL: &str = "PAGERDUTYURL";
pub const REPOSITORY: &str = "REPOSITORY";
pub const SERVICEOWNER: &str = "SERVICEOWNER";
pub const SHORT_SHA: &str = "SHORT_SHA";
pub const SLACKCHANNEL: &str = "SLACKCHANNEL";

/// An identity split out of a dotted string.
///
/// `a.b.svc` becomes name `svc` with domain `a.b`; a string without dots
/// is all name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Split a dotted string into its identity parts.
pub fn split_identity(raw: &str) -> Identity {
    match raw.rsplit_once('.') {
        Some((domain, name)) => Identity {
            name: name.to_string(),
            domain: Some(domain.to_string()),
        },
        None => Identity {
            name: raw.to_string(),
            domain: None,
        },
    }
}

/// Canonical resolved attribute set for one component build event.
///
/// Every field is either populated from a recognized source key or left
/// at its zero value; unrecognized keys never land here.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct AttributeRecord {
    pub basename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date: Option<DateTime<Utc>>,
    pub build_id: String,
    pub build_num: String,
    pub build_url: String,
    pub chart: String,
    pub chart_namespace: String,
    pub chart_repo: String,
    pub chart_repo_url: String,
    pub chart_version: String,
    pub discord_channel: String,
    pub docker_repo: String,
    pub docker_sha: String,
    pub docker_tag: String,
    pub git_branch: String,
    pub git_branch_create_commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch_create_timestamp: Option<DateTime<Utc>>,
    pub git_branch_parent: String,
    pub git_commit: String,
    pub git_commit_authors: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit_timestamp: Option<DateTime<Utc>>,
    pub git_committers_cnt: String,
    pub git_contrib_percentage: String,
    pub git_lines_added: String,
    pub git_lines_deleted: String,
    pub git_lines_total: String,
    pub git_org: String,
    pub git_previous_component_commit: String,
    pub git_repo: String,
    pub git_repo_project: String,
    pub git_signed_off_by: String,
    pub git_tag: String,
    pub git_total_committers_cnt: String,
    pub git_url: String,
    pub git_verify_commit: bool,
    pub hipchat_channel: String,
    pub pagerduty_business_url: String,
    pub pagerduty_url: String,
    pub repository: String,
    pub service_owner: Identity,
    pub slack_channel: String,
}

impl AttributeRecord {
    /// Assign `value` to the field matching the recognized `name`.
    ///
    /// `name` must already be uppercased. Returns `false` and leaves the
    /// record untouched when the name is outside the recognized set.
    pub fn apply(&mut self, name: &str, value: &str) -> bool {
        match name {
            BASENAME => self.basename = value.to_string(),
            BLDDATE => self.build_date = parse_any_date(value),
            BUILDID => self.build_id = value.to_string(),
            BUILDNUM => self.build_num = value.to_string(),
            BUILDURL => self.build_url = value.to_string(),
            CHART => self.chart = value.to_string(),
            CHARTNAMESPACE => self.chart_namespace = value.to_string(),
            CHARTREPO => self.chart_repo = value.to_string(),
            CHARTREPOURL => self.chart_repo_url = value.to_string(),
            CHARTVERSION => self.chart_version = value.to_string(),
            DISCORDCHANNEL => self.discord_channel = value.to_string(),
            DOCKERREPO => self.docker_repo = value.to_string(),
            DOCKERSHA => self.docker_sha = value.to_string(),
            DOCKERTAG => self.docker_tag = value.to_string(),
            GIT_BRANCH => self.git_branch = value.to_string(),
            GIT_BRANCH_CREATE_COMMIT => self.git_branch_create_commit = value.to_string(),
            GIT_BRANCH_CREATE_TIMESTAMP => {
                self.git_branch_create_timestamp = parse_any_date(value)
            }
            GIT_BRANCH_PARENT => self.git_branch_parent = value.to_string(),
            GIT_COMMIT | GITCOMMIT | SHORT_SHA => self.git_commit = value.to_string(),
            GIT_COMMITTERS_CNT => self.git_committers_cnt = value.to_string(),
            GIT_COMMIT_AUTHORS => self.git_commit_authors = value.to_string(),
            GIT_COMMIT_TIMESTAMP => self.git_commit_timestamp = parse_any_date(value),
            GIT_CONTRIB_PERCENTAGE => self.git_contrib_percentage = value.to_string(),
            GIT_LINES_ADDED => self.git_lines_added = value.to_string(),
            GIT_LINES_DELETED => self.git_lines_deleted = value.to_string(),
            GIT_LINES_TOTAL => self.git_lines_total = value.to_string(),
            GIT_ORG => self.git_org = value.to_string(),
            GIT_PREVIOUS_COMPONENT_COMMIT => {
                self.git_previous_component_commit = value.to_string()
            }
            GIT_REPO | GITREPO => self.git_repo = value.to_string(),
            GIT_REPO_PROJECT => self.git_repo_project = value.to_string(),
            GIT_SIGNED_OFF_BY => self.git_signed_off_by = value.to_string(),
            GIT_TAG | GITTAG => self.git_tag = value.to_string(),
            GIT_TOTAL_COMMITTERS_CNT => self.git_total_committers_cnt = value.to_string(),
            GIT_URL | GITURL => self.git_url = value.to_string(),
            GIT_VERIFY_COMMIT => self.git_verify_commit = value == "1",
            HIPCHATCHANNEL => self.hipchat_channel = value.to_string(),
            PAGERDUTYBUSINESSURL => self.pagerduty_business_url = value.to_string(),
            PAGERDUTYURL => self.pagerduty_url = value.to_string(),
            REPOSITORY => self.repository = value.to_string(),
            SERVICEOWNER => self.service_owner = split_identity(value),
            SLACKCHANNEL => self.slack_channel = value.to_string(),
            _ => return false,
        }
        true
    }
}

const ZONED_FORMATS: &[&str] = &[
    // Go time.Time Display, e.g. "2026-08-07 10:11:12.123 +0000"
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    // git default, e.g. "Thu Aug 7 10:11:12 2026 +0000"
    "%a %b %e %H:%M:%S %Y %z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a free-form date string, `None` when nothing matches.
///
/// Tries RFC 3339 and RFC 2822 first, then the zoned and naive formats
/// this pipeline actually produces. Naive inputs are taken as UTC.
pub fn parse_any_date(raw: &str) -> Option<DateTime<Utc>> {
    let mut text = raw.trim();
    // "2026-08-07 10:11:12 +0000 UTC" carries both an offset and a zone name
    text = text.strip_suffix(" UTC").unwrap_or(text).trim_end();
    if text.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
