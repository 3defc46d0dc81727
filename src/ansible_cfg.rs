//! Ansible configuration (`ansible.cfg`) defaults.
//!
//! Options such as `remote_user` or `private_key_file` act as the last
//! fallback for connection settings that no inventory variable provides.
//! The file is located the same way Ansible does it:
//!
//! 1. `$ANSIBLE_CONFIG` (must exist when set)
//! 2. `./ansible.cfg`
//! 3. `~/.ansible.cfg`
//! 4. `/etc/ansible/ansible.cfg`
//!
//! Options from all sections are flattened into one map.

use crate::error::{ConnectError, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the config search.
pub const ENV_VAR: &str = "ANSIBLE_CONFIG";

const SYSTEM_CONFIG: &str = "/etc/ansible/ansible.cfg";

/// Flattened `ansible.cfg` options with lowercase keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnsibleConfig {
    options: IndexMap<String, String>,
}

impl AnsibleConfig {
    /// Parse INI text.
    ///
    /// Section headers only separate options; a key set in several sections
    /// keeps the last value. Lines without a `=` or `:` delimiter are skipped.
    /// Indented lines continue the previous value.
    pub fn parse(content: &str) -> Self {
        let mut options: IndexMap<String, String> = IndexMap::new();
        let mut last_key: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                last_key = None;
                continue;
            }

            if line.starts_with([' ', '\t']) {
                if let Some(value) = last_key.as_ref().and_then(|k| options.get_mut(k)) {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(trimmed);
                    continue;
                }
            }

            let Some(split_at) = trimmed.find(['=', ':']) else {
                continue;
            };
            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();
            if key.is_empty() {
                continue;
            }
            options.insert(key.clone(), value);
            last_key = Some(key);
        }

        Self { options }
    }

    /// Load the config Ansible itself would use, or an empty one if there is
    /// none.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::AnsibleConfigNotFound`] if `ANSIBLE_CONFIG` names a
    ///   missing file
    /// - [`ConnectError::IoError`] if reading fails
    pub fn load() -> Result<Self> {
        match config_path()? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and parse a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents);
        debug!(path = %path.display(), options = config.len(), "loaded ansible config");
        Ok(config)
    }

    /// Look up an option by its (case-insensitive) name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Locate the `ansible.cfg` in effect for the current process.
pub fn config_path() -> Result<Option<PathBuf>> {
    let env_override = std::env::var_os(ENV_VAR).map(PathBuf::from);

    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("ansible.cfg"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".ansible.cfg"));
    }
    candidates.push(PathBuf::from(SYSTEM_CONFIG));

    resolve_path(env_override, &candidates)
}

fn resolve_path(env_override: Option<PathBuf>, candidates: &[PathBuf]) -> Result<Option<PathBuf>> {
    if let Some(path) = env_override {
        if !path.exists() {
            return Err(ConnectError::AnsibleConfigNotFound(path));
        }
        return Ok(Some(path));
    }
    Ok(candidates.iter().find(|path| path.exists()).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[defaults]
private_key_file = test_key_file
Remote_User: deploy
# comment
; another comment

[ssh_connection]
ssh_args = -C
    -o ControlMaster=auto
[other]
test=option
";

    #[test]
    fn test_options_from_all_sections_are_flattened() {
        let config = AnsibleConfig::parse(SAMPLE);
        assert_eq!(config.len(), 4);
        assert_eq!(config.get("private_key_file"), Some("test_key_file"));
        assert_eq!(config.get("test"), Some("option"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let config = AnsibleConfig::parse(SAMPLE);
        assert_eq!(config.get("remote_user"), Some("deploy"));
        assert_eq!(config.get("REMOTE_USER"), Some("deploy"));
    }

    #[test]
    fn test_continuation_lines_extend_value() {
        let config = AnsibleConfig::parse(SAMPLE);
        assert_eq!(config.get("ssh_args"), Some("-C -o ControlMaster=auto"));
    }

    #[test]
    fn test_value_may_contain_delimiters() {
        let config = AnsibleConfig::parse("[defaults]\nssh_args = -o ProxyCommand=nc %h:%p\n");
        assert_eq!(config.get("ssh_args"), Some("-o ProxyCommand=nc %h:%p"));
    }

    #[test]
    fn test_env_override_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.cfg");
        assert!(matches!(
            resolve_path(Some(missing), &[]),
            Err(ConnectError::AnsibleConfigNotFound(_))
        ));
    }

    #[test]
    fn test_env_override_wins_over_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("env.cfg");
        let local = dir.path().join("ansible.cfg");
        std::fs::write(&env_path, "").unwrap();
        std::fs::write(&local, "").unwrap();
        let found = resolve_path(Some(env_path.clone()), &[local]).unwrap();
        assert_eq!(found, Some(env_path));
    }

    #[test]
    fn test_first_existing_candidate_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ansible.cfg");
        let home = dir.path().join(".ansible.cfg");
        std::fs::write(&home, "[defaults]\nremote_user = admin\n").unwrap();
        let found = resolve_path(None, &[missing, home.clone()]).unwrap();
        assert_eq!(found, Some(home.clone()));
        let config = AnsibleConfig::load_from(&home).unwrap();
        assert_eq!(config.get("remote_user"), Some("admin"));
    }

    #[test]
    fn test_no_candidate_found() {
        let dir = tempfile::tempdir().unwrap();
        let found = resolve_path(None, &[dir.path().join("ansible.cfg")]).unwrap();
        assert_eq!(found, None);
    }
}
