//! Ansible YAML inventory loading.
//!
//! Flattens the nested group structure of an inventory into a map of
//! [`Host`] records, each carrying its merged variables and every group it
//! belongs to.
//!
//! # Inventory Format
//!
//! ```yaml
//! all:
//!   vars:
//!     ansible_user: admin
//!   children:
//!     web:
//!       hosts:
//!         web[01:03].example.com:
//!     db:
//!       hosts:
//!         db1:
//!           ansible_host: 10.0.0.7
//!           ansible_port: 2222
//! ```
//!
//! Group membership is transitive: `web01.example.com` above is a member of
//! `web` and `all`. Variables are merged from the shallowest group to the
//! deepest one, then host variables override everything.
//!
//! Anchors, aliases and merge keys (`<<: *common`) are supported. A mapping
//! that repeats a key (the same host listed twice under one `hosts:`, for
//! example) is rejected as a parse error instead of keeping the last entry.

use crate::error::{ConnectError, Result};
use indexmap::{IndexMap, IndexSet};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Variables attached to a host or group.
pub type Vars = IndexMap<String, Value>;

/// Name of the implicit group containing every host.
pub const ALL_GROUP: &str = "all";
/// Name of the implicit group for hosts listed directly under `all`.
pub const UNGROUPED_GROUP: &str = "ungrouped";

/// A managed host with its merged variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    /// Inventory hostname.
    pub name: String,
    /// Group variables merged with host variables.
    pub vars: Vars,
    /// Every group this host belongs to, directly or through children.
    pub groups: IndexSet<String>,
}

impl Host {
    /// Whether the host is a member of `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Get a variable rendered as a string (see [`scalar_to_string`]).
    pub fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).and_then(scalar_to_string)
    }
}

/// A named group as declared in the inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub name: String,
    /// Hosts listed directly under this group.
    pub hosts: Vec<String>,
    /// Names of child groups.
    pub children: Vec<String>,
    pub vars: Vars,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A fully resolved inventory.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    hosts: IndexMap<String, Host>,
    groups: IndexMap<String, Group>,
}

impl Inventory {
    /// Load and parse an inventory file.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InventoryNotFound`] if the file doesn't exist
    /// - [`ConnectError::IoError`] if reading fails
    /// - [`ConnectError::InventoryParse`] / [`ConnectError::InvalidInventory`]
    ///   if the content is not an inventory
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConnectError::InventoryNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let inventory = Self::from_yaml(&contents)?;
        debug!(
            path = %path.display(),
            hosts = inventory.len(),
            groups = inventory.groups.len(),
            "loaded inventory"
        );
        Ok(inventory)
    }

    /// Parse inventory YAML text.
    ///
    /// Merge keys (`<<: *anchor`) are resolved before the groups are read.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut data: Value = serde_yaml::from_str(content)?;
        data.apply_merge()?;
        let mut builder = Builder::default();

        match data {
            Value::Null => {}
            Value::Mapping(map) => builder.add_top_level(&map),
            Value::Sequence(items) => {
                for item in items {
                    match item {
                        Value::Mapping(map) => builder.add_top_level(&map),
                        Value::Null => {}
                        _ => {
                            return Err(ConnectError::InvalidInventory(
                                "expected a list of group mappings".into(),
                            ));
                        }
                    }
                }
            }
            _ => {
                return Err(ConnectError::InvalidInventory(
                    "expected a mapping of groups".into(),
                ));
            }
        }

        Ok(builder.finish())
    }

    /// Iterate hosts in inventory order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Number of hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Render a scalar variable as a string.
///
/// Strings are returned as-is, booleans as `true`/`false` and numbers in
/// their YAML form. Null, sequences, mappings and tagged values (such as
/// `!vault` blobs) have no string form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Collects groups and raw host variables before membership and variable
/// merging are resolved.
#[derive(Default)]
struct Builder {
    groups: IndexMap<String, Group>,
    host_vars: IndexMap<String, Vars>,
    top_level: Vec<String>,
}

impl Builder {
    fn add_top_level(&mut self, map: &Mapping) {
        for (key, value) in map {
            let Some(name) = scalar_to_string(key) else {
                warn!("skipping group with non-scalar name");
                continue;
            };
            self.parse_group(&name, value);
            if !self.top_level.contains(&name) {
                self.top_level.push(name);
            }
        }
    }

    fn group_mut(&mut self, name: &str) -> &mut Group {
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| Group::new(name))
    }

    fn parse_group(&mut self, name: &str, value: &Value) {
        self.group_mut(name);

        let map = match value {
            Value::Mapping(map) => map,
            Value::Null => return,
            _ => {
                warn!(group = name, "group definition is not a mapping, ignoring it");
                return;
            }
        };

        for (key, section) in map {
            match key.as_str() {
                Some("hosts") => self.parse_hosts(name, section),
                Some("vars") => {
                    let vars = to_vars(section, name);
                    self.group_mut(name).vars.extend(vars);
                }
                Some("children") => self.parse_children(name, section),
                _ => warn!(group = name, key = ?key, "unknown group key, ignoring it"),
            }
        }
    }

    fn parse_hosts(&mut self, group: &str, section: &Value) {
        let map = match section {
            Value::Mapping(map) => map,
            Value::Null => return,
            _ => {
                warn!(group, "hosts section is not a mapping, ignoring it");
                return;
            }
        };

        for (pattern, vars) in map {
            let Some(pattern) = scalar_to_string(pattern) else {
                warn!(group, "skipping host with non-scalar name");
                continue;
            };
            let vars = to_vars(vars, &pattern);
            for name in expand_host_pattern(&pattern) {
                self.host_vars
                    .entry(name.clone())
                    .or_default()
                    .extend(vars.clone());
                let hosts = &mut self.group_mut(group).hosts;
                if !hosts.contains(&name) {
                    hosts.push(name);
                }
            }
        }
    }

    fn parse_children(&mut self, parent: &str, section: &Value) {
        let map = match section {
            Value::Mapping(map) => map,
            Value::Null => return,
            _ => {
                warn!(group = parent, "children section is not a mapping, ignoring it");
                return;
            }
        };

        for (child, definition) in map {
            let Some(child) = scalar_to_string(child) else {
                warn!(group = parent, "skipping child group with non-scalar name");
                continue;
            };
            self.parse_group(&child, definition);
            let children = &mut self.group_mut(parent).children;
            if !children.contains(&child) {
                children.push(child);
            }
        }
    }

    fn finish(mut self) -> Inventory {
        // Every top-level group hangs off `all`, and hosts that nothing but
        // `all` lists directly are `ungrouped`.
        let top_level = std::mem::take(&mut self.top_level);
        for name in top_level.iter().filter(|n| n.as_str() != ALL_GROUP) {
            let all = self.group_mut(ALL_GROUP);
            if !all.children.contains(name) {
                all.children.push(name.clone());
            }
        }
        self.group_mut(ALL_GROUP);

        let listed_elsewhere: HashSet<&String> = self
            .groups
            .values()
            .filter(|g| g.name != ALL_GROUP)
            .flat_map(|g| g.hosts.iter())
            .collect();
        let ungrouped: Vec<String> = self
            .host_vars
            .keys()
            .filter(|h| !listed_elsewhere.contains(h))
            .cloned()
            .collect();
        self.group_mut(UNGROUPED_GROUP).hosts.extend(ungrouped);
        let all = self.group_mut(ALL_GROUP);
        if !all.children.iter().any(|c| c == UNGROUPED_GROUP) {
            all.children.push(UNGROUPED_GROUP.to_string());
        }

        let depths = group_depths(&self.groups);
        let mut memberships: IndexMap<String, Vec<&Group>> = IndexMap::new();
        for group in self.groups.values() {
            for host in descendant_hosts(&self.groups, &group.name) {
                memberships.entry(host).or_default().push(group);
            }
        }

        let mut hosts = IndexMap::new();
        for (name, own_vars) in &self.host_vars {
            let mut groups: Vec<&Group> = memberships.get(name).cloned().unwrap_or_default();
            groups.sort_by(|a, b| {
                let da = depths.get(&a.name).copied().unwrap_or(0);
                let db = depths.get(&b.name).copied().unwrap_or(0);
                da.cmp(&db).then_with(|| a.name.cmp(&b.name))
            });

            let mut vars = Vars::new();
            for group in &groups {
                vars.extend(group.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            vars.extend(own_vars.iter().map(|(k, v)| (k.clone(), v.clone())));

            let mut group_names: IndexSet<String> =
                groups.iter().map(|g| g.name.clone()).collect();
            group_names.insert(ALL_GROUP.to_string());

            hosts.insert(
                name.clone(),
                Host {
                    name: name.clone(),
                    vars,
                    groups: group_names,
                },
            );
        }

        Inventory {
            hosts,
            groups: self.groups,
        }
    }
}

fn to_vars(value: &Value, owner: &str) -> Vars {
    let mut vars = Vars::new();
    match value {
        Value::Mapping(map) => {
            for (key, val) in map {
                match scalar_to_string(key) {
                    Some(key) => {
                        vars.insert(key, val.clone());
                    }
                    None => warn!(owner, "skipping variable with non-scalar name"),
                }
            }
        }
        Value::Null => {}
        _ => warn!(owner, "variables are not a mapping, ignoring them"),
    }
    vars
}

/// Hosts of `root` and of every group below it.
fn descendant_hosts(groups: &IndexMap<String, Group>, root: &str) -> Vec<String> {
    let mut seen_groups = HashSet::new();
    let mut hosts = IndexSet::new();
    let mut stack = vec![root.to_string()];

    while let Some(name) = stack.pop() {
        if !seen_groups.insert(name.clone()) {
            continue;
        }
        if let Some(group) = groups.get(&name) {
            hosts.extend(group.hosts.iter().cloned());
            stack.extend(group.children.iter().rev().cloned());
        }
    }

    hosts.into_iter().collect()
}

/// Longest distance of each group from `all`. Groups unreachable from `all`
/// keep depth 1.
fn group_depths(groups: &IndexMap<String, Group>) -> IndexMap<String, usize> {
    fn visit(
        groups: &IndexMap<String, Group>,
        name: &str,
        depth: usize,
        path: &mut Vec<String>,
        depths: &mut IndexMap<String, usize>,
    ) {
        if path.iter().any(|p| p == name) {
            return;
        }
        let entry = depths.entry(name.to_string()).or_insert(depth);
        if *entry > depth {
            return;
        }
        *entry = depth;

        if let Some(group) = groups.get(name) {
            path.push(name.to_string());
            for child in &group.children {
                visit(groups, child, depth + 1, path, depths);
            }
            path.pop();
        }
    }

    let mut depths: IndexMap<String, usize> = groups
        .keys()
        .map(|name| (name.clone(), if name == ALL_GROUP { 0 } else { 1 }))
        .collect();
    let mut path = Vec::new();
    visit(groups, ALL_GROUP, 0, &mut path, &mut depths);
    depths
}

/// Expand host range patterns such as `web[01:03]` or `db-[a:c]`.
///
/// Ranges take the form `[start:end]` or `[start:end:step]`. Numeric ranges
/// keep the zero padding of `start`. Patterns with several ranges expand to
/// every combination. A malformed range is kept as a literal hostname.
pub fn expand_host_pattern(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('[') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find(']').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };

    let head = &pattern[..open];
    let body = &pattern[open + 1..close];
    let tail = &pattern[close + 1..];

    let Some(items) = expand_range(body) else {
        warn!(pattern, "invalid host range, using pattern literally");
        return vec![pattern.to_string()];
    };

    let tails = expand_host_pattern(tail);
    let mut result = Vec::with_capacity(items.len() * tails.len());
    for item in &items {
        for rest in &tails {
            result.push(format!("{head}{item}{rest}"));
        }
    }
    result
}

fn expand_range(body: &str) -> Option<Vec<String>> {
    let parts: Vec<&str> = body.split(':').map(str::trim).collect();
    let (start, end, step) = match parts.as_slice() {
        [start, end] => (*start, *end, 1usize),
        [start, end, step] => (*start, *end, step.parse().ok()?),
        _ => return None,
    };
    if step == 0 {
        return None;
    }

    if let (Ok(first), Ok(last)) = (start.parse::<u64>(), end.parse::<u64>()) {
        if first > last {
            return None;
        }
        let width = if start.len() > 1 && start.starts_with('0') {
            start.len()
        } else {
            0
        };
        return Some(
            (first..=last)
                .step_by(step)
                .map(|n| format!("{n:0width$}"))
                .collect(),
        );
    }

    let mut first = start.chars();
    let mut last = end.chars();
    match (first.next(), first.next(), last.next(), last.next()) {
        (Some(a), None, Some(b), None) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
            if a > b {
                return None;
            }
            Some(
                (a..=b)
                    .step_by(step)
                    .map(|c| c.to_string())
                    .collect(),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"
all:
  vars:
    ansible_user: admin
    tier: base
  hosts:
    bastion:
  children:
    web:
      vars:
        tier: web
      hosts:
        web1:
          ansible_host: 10.0.0.1
        web2:
      children:
        canary:
          vars:
            tier: canary
          hosts:
            web2:
              tier: pinned
            web3:
    db:
      hosts:
        db1:
          ansible_port: 2222
"#;

    fn names(inventory: &Inventory) -> Vec<&str> {
        inventory.hosts().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_hosts_are_flattened_in_order() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        assert_eq!(names(&inventory), ["bastion", "web1", "web2", "web3", "db1"]);
    }

    #[test]
    fn test_membership_is_transitive() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        let web3 = inventory.host("web3").unwrap();
        assert!(web3.in_group("canary"));
        assert!(web3.in_group("web"));
        assert!(web3.in_group("all"));
        assert!(!web3.in_group("db"));
    }

    #[test]
    fn test_ungrouped_hosts() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        assert!(inventory.host("bastion").unwrap().in_group(UNGROUPED_GROUP));
        assert!(!inventory.host("web1").unwrap().in_group(UNGROUPED_GROUP));
    }

    #[test]
    fn test_deeper_groups_override_shallower() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        assert_eq!(inventory.host("bastion").unwrap().var("tier").as_deref(), Some("base"));
        assert_eq!(inventory.host("web1").unwrap().var("tier").as_deref(), Some("web"));
        assert_eq!(inventory.host("web3").unwrap().var("tier").as_deref(), Some("canary"));
    }

    #[test]
    fn test_host_vars_override_group_vars() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        let web2 = inventory.host("web2").unwrap();
        assert_eq!(web2.var("tier").as_deref(), Some("pinned"));
        assert_eq!(web2.var("ansible_user").as_deref(), Some("admin"));
    }

    #[test]
    fn test_numbers_render_as_strings() {
        let inventory = Inventory::from_yaml(NESTED).unwrap();
        assert_eq!(inventory.host("db1").unwrap().var("ansible_port").as_deref(), Some("2222"));
    }

    #[test]
    fn test_top_level_groups_without_all() {
        let yaml = "groupA:\n  hosts:\n    a1:\ngroupB:\n  hosts:\n    b1:\n";
        let inventory = Inventory::from_yaml(yaml).unwrap();
        assert_eq!(inventory.len(), 2);
        let all = inventory.group(ALL_GROUP).unwrap();
        assert!(all.children.contains(&"groupA".to_string()));
        assert!(inventory.host("b1").unwrap().in_group("all"));
    }

    #[test]
    fn test_sequence_of_mappings_is_merged() {
        let yaml = "- g1:\n    hosts:\n      h1:\n        x: 1\n- g2:\n    hosts:\n      h1:\n        y: 2\n";
        let inventory = Inventory::from_yaml(yaml).unwrap();
        let h1 = inventory.host("h1").unwrap();
        assert!(h1.in_group("g1") && h1.in_group("g2"));
        assert_eq!(h1.var("x").as_deref(), Some("1"));
        assert_eq!(h1.var("y").as_deref(), Some("2"));
    }

    #[test]
    fn test_empty_document_is_empty_inventory() {
        let inventory = Inventory::from_yaml("").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_scalar_document_is_invalid() {
        assert!(matches!(
            Inventory::from_yaml("just a string"),
            Err(ConnectError::InvalidInventory(_))
        ));
    }

    #[test]
    fn test_child_cycle_terminates() {
        let yaml = "a:\n  hosts:\n    h1:\n  children:\n    b:\n      children:\n        a:\n";
        let inventory = Inventory::from_yaml(yaml).unwrap();
        let h1 = inventory.host("h1").unwrap();
        assert!(h1.in_group("a") && h1.in_group("b"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yml");
        assert!(matches!(
            Inventory::load(&path),
            Err(ConnectError::InventoryNotFound(_))
        ));
    }

    #[test]
    fn test_expand_numeric_range_keeps_padding() {
        assert_eq!(
            expand_host_pattern("web[08:10].example.com"),
            ["web08.example.com", "web09.example.com", "web10.example.com"]
        );
    }

    #[test]
    fn test_expand_alpha_range_with_step() {
        assert_eq!(expand_host_pattern("db-[a:e:2]"), ["db-a", "db-c", "db-e"]);
    }

    #[test]
    fn test_expand_multiple_ranges() {
        assert_eq!(
            expand_host_pattern("r[1:2]n[1:2]"),
            ["r1n1", "r1n2", "r2n1", "r2n2"]
        );
    }

    #[test]
    fn test_invalid_range_is_literal() {
        assert_eq!(expand_host_pattern("odd[5:1]"), ["odd[5:1]"]);
        assert_eq!(expand_host_pattern("plain.host"), ["plain.host"]);
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&Value::Bool(true)).as_deref(), Some("true"));
        assert_eq!(scalar_to_string(&Value::Null), None);
        assert_eq!(scalar_to_string(&Value::Sequence(vec![])), None);
    }

    #[test]
    fn test_merge_keys_share_connection_vars() {
        let inventory = Inventory::from_yaml(
            r#"
web:
  hosts:
    web1:
      <<: &common
        ansible_user: deploy
        ansible_host: 10.0.0.9
    web2:
      <<: *common
      ansible_port: 2222
"#,
        )
        .unwrap();
        let web2 = inventory.host("web2").unwrap();
        assert_eq!(web2.var("ansible_user").as_deref(), Some("deploy"));
        assert_eq!(web2.var("ansible_host").as_deref(), Some("10.0.0.9"));
        assert_eq!(web2.var("ansible_port").as_deref(), Some("2222"));
        assert!(web2.vars.get("<<").is_none());
        assert_eq!(inventory.host("web1").unwrap().var("ansible_user").as_deref(), Some("deploy"));
    }

    #[test]
    fn test_duplicate_host_key_is_rejected() {
        let result = Inventory::from_yaml("web:\n  hosts:\n    web1:\n    web1:\n");
        assert!(matches!(result, Err(ConnectError::InventoryParse(_))));
    }
}
