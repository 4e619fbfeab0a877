//! Ordered derivation of version-control facts.
//!
//! Later steps consume earlier results as arguments (the verify step
//! needs the commit id, the author window needs both timestamps), so the
//! sequence is load-bearing: each derivation reuses the already-computed
//! value instead of re-running the command that produced it.

use crate::attrs;
use crate::runner::{tool_available, CommandRunner};
use chrono::Utc;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Derived component name; not part of the recognized attribute set but
/// seeded into the environment context like every other fact.
pub const COMPNAME: &str = "COMPNAME";

/// Facts derived from the checkout, keyed by environment-variable-style
/// names. Built fresh each run and consumed immediately.
pub type RawFactMap = BTreeMap<String, String>;

/// Derive the full fact map for the checkout in the working directory.
///
/// Every command failure surfaces as an empty string for that fact; no
/// derivation is fatal or retried.
pub fn collect(runner: &dyn CommandRunner) -> RawFactMap {
    if !tool_available("git") {
        tracing::warn!("git not found on PATH; derived facts will be empty");
    }

    let mut facts = RawFactMap::new();

    // un-shallow CI clones so history-wide facts see the whole log
    runner.run("git fetch --unshallow");

    facts.insert(attrs::BLDDATE.to_string(), Utc::now().to_rfc3339());

    let short_sha = first_token(&runner.run("git log --oneline -n 1"));
    facts.insert(attrs::SHORT_SHA.to_string(), short_sha.clone());
    facts.insert(attrs::GIT_COMMIT.to_string(), short_sha.clone());

    let verify_output = runner.run(&format!("git verify-commit {short_sha}"));
    facts.insert(
        attrs::GIT_VERIFY_COMMIT.to_string(),
        count_signature_lines(&verify_output).to_string(),
    );

    let head_log = runner.run(&format!("git log -1 {short_sha}"));
    facts.insert(attrs::GIT_SIGNED_OFF_BY.to_string(), signed_off_by(&head_log));

    facts.insert(
        attrs::BUILDNUM.to_string(),
        line_count(&runner.run("git log --oneline")).to_string(),
    );

    let origin_url = runner.run("git config --get remote.origin.url");
    facts.insert(attrs::GIT_URL.to_string(), origin_url.clone());
    facts.insert(attrs::GIT_REPO.to_string(), repo_from_url(&origin_url));
    facts.insert(attrs::GIT_REPO_PROJECT.to_string(), project_from_url(&origin_url));
    facts.insert(attrs::GIT_ORG.to_string(), org_from_url(&origin_url));

    let branch = runner.run("git rev-parse --abbrev-ref HEAD");
    facts.insert(attrs::GIT_BRANCH.to_string(), branch.clone());

    let commit_timestamp = first_line(&runner.run(&format!(
        "git log --pretty='format:%cd' --date=rfc {short_sha}"
    )));
    facts.insert(attrs::GIT_COMMIT_TIMESTAMP.to_string(), commit_timestamp.clone());

    let parent = parent_branch(&runner.run("git show-branch -a"), &branch);
    facts.insert(attrs::GIT_BRANCH_PARENT.to_string(), parent.clone());

    let parent_ref = or_default(&parent, "main");
    let branch_ref = or_default(&branch, "main");
    let create_commit = first_token(&first_line(&runner.run(&format!(
        "git log --oneline --reverse {parent_ref}..{branch_ref}"
    ))));
    facts.insert(attrs::GIT_BRANCH_CREATE_COMMIT.to_string(), create_commit.clone());

    let create_ref = or_default(&create_commit, "HEAD");
    let create_timestamp = first_line(&runner.run(&format!(
        "git log --pretty='format:%cd' --date=rfc {create_ref}"
    )));
    facts.insert(
        attrs::GIT_BRANCH_CREATE_TIMESTAMP.to_string(),
        create_timestamp.clone(),
    );

    let mut authors = author_list(&runner.run(&format!(
        "git rev-list --remotes --pretty --since='{create_timestamp}' --until='{commit_timestamp}'"
    )));
    if authors.is_empty() {
        // young or single-commit branches have no window to scan
        authors = author_list(&runner.run("git log"));
    }
    facts.insert(attrs::GIT_COMMIT_AUTHORS.to_string(), authors.clone());

    let committers = authors.split(',').count() as i64;
    facts.insert(attrs::GIT_COMMITTERS_CNT.to_string(), committers.to_string());

    // unknown unless something upstream seeded it; kept at zero rather
    // than guessed from the author window
    let total_committers: i64 = facts
        .get(attrs::GIT_TOTAL_COMMITTERS_CNT)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    facts.insert(
        attrs::GIT_TOTAL_COMMITTERS_CNT.to_string(),
        total_committers.to_string(),
    );
    let contribution = if total_committers > 0 {
        committers * 100 / total_committers
    } else {
        0
    };
    facts.insert(
        attrs::GIT_CONTRIB_PERCENTAGE.to_string(),
        contribution.to_string(),
    );

    facts.insert(
        attrs::GIT_LINES_TOTAL.to_string(),
        total_lines(&runner.run("git ls-files")).to_string(),
    );

    let previous_commit = facts
        .get(attrs::GIT_PREVIOUS_COMPONENT_COMMIT)
        .cloned()
        .unwrap_or_default();
    if previous_commit.is_empty() {
        facts.insert(attrs::GIT_PREVIOUS_COMPONENT_COMMIT.to_string(), String::new());
        facts.insert(attrs::GIT_LINES_ADDED.to_string(), "0".to_string());
        facts.insert(attrs::GIT_LINES_DELETED.to_string(), "0".to_string());
    } else {
        let stat = runner.run(&format!("git diff --shortstat {short_sha} {previous_commit}"));
        facts.insert(attrs::GIT_LINES_ADDED.to_string(), shortstat_count(&stat, "insertion"));
        facts.insert(attrs::GIT_LINES_DELETED.to_string(), shortstat_count(&stat, "deletion"));
    }

    for key in [attrs::GIT_COMMIT_TIMESTAMP, attrs::GIT_BRANCH_CREATE_TIMESTAMP] {
        let normalized = facts
            .get(key)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| attrs::parse_any_date(raw))
            .map(|ts| ts.to_rfc3339());
        if let Some(normalized) = normalized {
            facts.insert(key.to_string(), normalized);
        }
    }

    let basename = std::env::current_dir()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    facts.insert(attrs::BASENAME.to_string(), basename);

    if facts.get(COMPNAME).is_none_or(|name| name.is_empty()) {
        let project = facts
            .get(attrs::GIT_REPO_PROJECT)
            .cloned()
            .unwrap_or_default();
        facts.insert(COMPNAME.to_string(), project);
    }

    facts
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").to_string()
}

fn first_token(text: &str) -> String {
    text.split_whitespace().next().unwrap_or("").to_string()
}

fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.lines().count()
    }
}

/// Lines of a `git verify-commit` transcript that announce a signature.
fn count_signature_lines(text: &str) -> usize {
    text.lines()
        .filter(|line| line.to_lowercase().contains("signature made"))
        .count()
}

/// `Signed-off-by:` trailers from a commit log, markup-escaped and
/// newline-joined.
fn signed_off_by(log: &str) -> String {
    log.lines()
        .filter_map(|line| line.split_once("Signed-off-by:"))
        .map(|(_, rest)| escape_markup(rest.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn url_segments(url: &str) -> Vec<String> {
    // scp-style remotes ("git@host:org/repo") count the colon as a
    // path separator
    let normalized = url.replacen(':', "/", 1);
    let trimmed = normalized.strip_suffix(".git").unwrap_or(&normalized);
    trimmed.split('/').map(str::to_string).collect()
}

/// `org/project` from a remote URL, or as much of it as the URL carries.
fn repo_from_url(url: &str) -> String {
    let segments = url_segments(url);
    match segments.as_slice() {
        [.., org, project] => format!("{org}/{project}"),
        [only] => only.clone(),
        [] => String::new(),
    }
}

fn project_from_url(url: &str) -> String {
    url_segments(url).last().cloned().unwrap_or_default()
}

fn org_from_url(url: &str) -> String {
    let segments = url_segments(url);
    match segments.as_slice() {
        [.., org, _] => org.clone(),
        _ => String::new(),
    }
}

/// Parent branch parsed from `git show-branch -a` output: the first
/// marked (`*`) line naming a branch other than the current one.
fn parent_branch(show_branch: &str, branch: &str) -> String {
    for line in show_branch.lines() {
        let head = line.split(']').next().unwrap_or("");
        if !head.contains('*') || head.contains(branch) {
            continue;
        }
        if let Some((_, name)) = head.rsplit_once('[') {
            return name.to_string();
        }
    }
    String::new()
}

/// Author names from a `git log`/`git rev-list --pretty` transcript:
/// deduplicated, sorted, comma-joined, bots excluded.
fn author_list(log: &str) -> String {
    let pattern = Regex::new(r"(?i)^\s*author:\s*([^<]+)").expect("author pattern");
    let mut names = BTreeSet::new();
    for line in log.lines() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        let name = captures[1].trim().to_string();
        if name.is_empty() || name.to_lowercase().contains("dependabot") {
            continue;
        }
        names.insert(name);
    }
    names.into_iter().collect::<Vec<_>>().join(",")
}

/// Pull one figure (`insertion` or `deletion`) out of a
/// `git diff --shortstat` summary line.
fn shortstat_count(stat: &str, kind: &str) -> String {
    let pattern = Regex::new(&format!(r"(\d+)\s+{kind}")).expect("shortstat pattern");
    pattern
        .captures(stat)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| "0".to_string())
}

/// Newline count summed over every tracked file.
fn total_lines(ls_files: &str) -> u64 {
    ls_files
        .lines()
        .filter(|line| !line.is_empty())
        .map(|file| newline_count(Path::new(file)))
        .sum()
}

fn newline_count(path: &Path) -> u64 {
    match fs::read(path) {
        Ok(bytes) => bytes.iter().filter(|byte| **byte == b'\n').count() as u64,
        Err(_) => 0,
    }
}
