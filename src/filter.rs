//! Host selection by group and variable criteria.
//!
//! Selection strings come straight from the command line and are parsed
//! best-effort: entries that make no sense are dropped rather than rejected.
//!
//! # Syntax
//!
//! - Groups: `web:!canary:db` selects hosts in `web` or `db` that are not in
//!   `canary`.
//! - Hostnames: `web1,db1`.
//! - Variables: `deploy:true,team` matches hosts whose `deploy` is `true` or
//!   that define `team` at all.

use crate::inventory::{Host, Inventory, Vars};
use serde_yaml::Value;
use tracing::{debug, warn};

/// Groups to include and exclude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Parse a `:`-separated group list where a `!` prefix excludes a group.
pub fn parse_groups(spec: Option<&str>) -> GroupSpec {
    let mut groups = GroupSpec::default();
    let Some(spec) = spec else {
        return groups;
    };

    for entry in spec.split(':').map(str::trim) {
        match entry.strip_prefix('!') {
            Some(name) if !name.trim().is_empty() => groups.exclude.push(name.trim().to_string()),
            Some(_) => {}
            None if !entry.is_empty() => groups.include.push(entry.to_string()),
            None => {}
        }
    }
    groups
}

/// Parse a comma-separated hostname list.
pub fn parse_hostnames(spec: Option<&str>) -> Vec<String> {
    spec.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// A condition on a host's variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPredicate {
    pub key: String,
    /// `None` only requires the key to be present.
    pub value: Option<String>,
}

impl VarPredicate {
    /// Parse `key:value` or `key`. Splits on the first `:` so values may
    /// contain colons; `key:` is the same as `key`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (key, value) = match spec.split_once(':') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (spec.trim(), None),
        };
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            value: value.filter(|v| !v.is_empty()).map(String::from),
        })
    }

    pub fn matches(&self, vars: &Vars) -> bool {
        match (vars.get(&self.key), &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => value_matches(actual, expected),
        }
    }
}

fn value_matches(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::Bool(b) => expected.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

/// Parse variable specs. Each spec may hold several comma-separated
/// predicates.
pub fn parse_vars<S: AsRef<str>>(specs: &[S]) -> Vec<VarPredicate> {
    specs
        .iter()
        .flat_map(|spec| spec.as_ref().split(','))
        .filter_map(VarPredicate::parse)
        .collect()
}

/// Combined group and variable criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFilter {
    pub groups: GroupSpec,
    pub include_vars: Vec<VarPredicate>,
    pub exclude_vars: Vec<VarPredicate>,
}

impl HostFilter {
    /// Whether `host` passes both the group and the variable criteria.
    pub fn matches(&self, host: &Host) -> bool {
        self.matches_groups(host) && self.matches_vars(host)
    }

    fn matches_groups(&self, host: &Host) -> bool {
        let included = self.groups.include.is_empty()
            || self.groups.include.iter().any(|g| host.in_group(g));
        included && !self.groups.exclude.iter().any(|g| host.in_group(g))
    }

    fn matches_vars(&self, host: &Host) -> bool {
        let included = self.include_vars.is_empty()
            || self.include_vars.iter().any(|p| p.matches(&host.vars));
        included && !self.exclude_vars.iter().any(|p| p.matches(&host.vars))
    }

    /// Keep the hosts that match, preserving their order.
    pub fn apply<'a, I>(&self, hosts: I) -> Vec<&'a Host>
    where
        I: IntoIterator<Item = &'a Host>,
    {
        hosts.into_iter().filter(|h| self.matches(h)).collect()
    }
}

/// Select hosts from the inventory.
///
/// Explicit `hostnames` replace group selection: they are taken in the given
/// order and only the variable predicates apply to them. Otherwise every host
/// goes through the full filter.
pub fn select_hosts<'a>(
    inventory: &'a Inventory,
    hostnames: &[String],
    filter: &HostFilter,
) -> Vec<&'a Host> {
    if !hostnames.is_empty() {
        let mut picked: Vec<&Host> = Vec::new();
        for name in hostnames {
            match inventory.host(name) {
                Some(host) if !picked.iter().any(|h| h.name == host.name) => picked.push(host),
                Some(_) => {}
                None => warn!(host = %name, "host not found in inventory"),
            }
        }
        return picked.into_iter().filter(|h| filter.matches_vars(h)).collect();
    }

    for group in filter.groups.include.iter().chain(&filter.groups.exclude) {
        if inventory.group(group).is_none() {
            warn!(group = %group, "group not found in inventory");
        }
    }

    let selected = filter.apply(inventory.hosts());
    debug!(
        selected = selected.len(),
        total = inventory.len(),
        "filtered hosts"
    );
    selected
}
