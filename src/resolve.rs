//! Variable substitution and the attribute resolution engine.
//!
//! Three partially-overlapping sources meet here: facts derived from the
//! checkout, the process environment, and `component.toml`. Facts seed the
//! environment context without displacing pre-existing variables; config
//! values overwrite derived facts for any recognized key they name.

use crate::attrs::AttributeRecord;
use crate::config::ConfigDocument;
use std::collections::BTreeMap;

/// Snapshot of the process environment threaded through resolution.
///
/// Stands in for the original side channel of mutating the real process
/// environment. Seeded facts never displace a variable that was already
/// present when the snapshot was taken.
#[derive(Debug, Default, Clone)]
pub struct EnvContext {
    vars: BTreeMap<String, String>,
}

impl EnvContext {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Context with no variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style insert, mainly for tests.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Insert `name` unless the context already carries it.
    pub fn seed(&mut self, name: &str, value: &str) {
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Replace `${name}` tokens in `value`.
///
/// Each token is looked up against the document's flat keys, then its
/// group keys, then the environment context, so a document key shadows an
/// environment variable of the same name. The scan is a single pass over
/// the original text: substituted text is never re-scanned, and tokens
/// with no match stay verbatim.
pub fn resolve_vars(value: &str, document: &ConfigDocument, env: &EnvContext) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // unterminated token, keep the tail as-is
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match lookup(name, document, env) {
            Some(replacement) => out.push_str(replacement),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup<'a>(name: &str, document: &'a ConfigDocument, env: &'a EnvContext) -> Option<&'a str> {
    document
        .flat_value(name)
        .or_else(|| document.group_value(name))
        .or_else(|| env.get(name))
}

/// Merge derived facts, the environment, and the config document into one
/// attribute record plus the residual extra attributes.
///
/// Precedence: facts fill the record first and seed the context; config
/// values (flat keys, then group keys) overwrite unconditionally for any
/// recognized name. Config keys outside the recognized set land in the
/// extras map under their uppercased name. Raw facts never become extras.
pub fn resolve_attributes(
    raw: &BTreeMap<String, String>,
    document: &ConfigDocument,
    env: &mut EnvContext,
) -> (AttributeRecord, BTreeMap<String, String>) {
    let mut record = AttributeRecord::default();
    let mut extra = BTreeMap::new();

    for (name, value) in raw {
        let upper = name.to_uppercase();
        env.seed(&upper, value);
        record.apply(&upper, value);
    }

    for (name, value) in document.flat_entries() {
        assign(&mut record, &mut extra, name, value, document, env);
    }
    for (_, name, value) in document.group_entries() {
        assign(&mut record, &mut extra, name, value, document, env);
    }

    (record, extra)
}

fn assign(
    record: &mut AttributeRecord,
    extra: &mut BTreeMap<String, String>,
    name: &str,
    value: &str,
    document: &ConfigDocument,
    env: &EnvContext,
) {
    let upper = name.to_uppercase();
    let resolved = resolve_vars(value, document, env);
    if !record.apply(&upper, &resolved) {
        extra.insert(upper, resolved);
    }
}
