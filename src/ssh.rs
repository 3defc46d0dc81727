//! SSH connection commands built from inventory variables.
//!
//! Every setting is looked up through a list of synonym variable names
//! (Ansible accepts both `ansible_ssh_user` and `ansible_user`, for example),
//! then through `ansible.cfg`, then through the tool config. The first value
//! found wins.

use crate::ansible_cfg::AnsibleConfig;
use crate::config::SshConfig;
use crate::error::{ConnectError, Result};
use crate::inventory::{scalar_to_string, Host, Vars};
use std::fmt;

/// Placeholder some inventories use for an unset password.
pub const NULL_VALUE: &str = "null";

// Order matters: the first key present in the host variables is used.
// Names follow the Ansible ssh connection plugin.
const HOST_KEYS: &[&str] = &["ansible_ssh_host", "ansible_host"];
const USER_KEYS: &[&str] = &["ansible_ssh_user", "ansible_user", "remote_user"];
const PORT_KEYS: &[&str] = &["ansible_ssh_port", "ansible_port", "remote_port"];
const PASSWORD_KEYS: &[&str] = &["ansible_ssh_password", "ansible_ssh_pass", "ansible_password"];
const PRIVATE_KEY_FILE_KEYS: &[&str] = &[
    "ansible_ssh_private_key_file",
    "ansible_private_key_file",
    "private_key_file",
];
const HOST_KEY_CHECKING_KEYS: &[&str] = &[
    "ansible_ssh_host_key_checking",
    "ansible_host_key_checking",
    "host_key_checking",
];
const SSH_ARGS_KEYS: &[&str] = &["ansible_ssh_args", "ssh_args"];
const EXTRA_ARGS_KEYS: &[&str] = &["ansible_ssh_extra_args"];
const COMMON_ARGS_KEYS: &[&str] = &["ansible_ssh_common_args"];
const EXECUTABLE_KEYS: &[&str] = &["ansible_ssh_executable", "ssh_executable"];

const CONNECTION_KEY: &str = "ansible_connection";
const SSH_CONNECTIONS: &[&str] = &["ssh", "smart", "paramiko"];

const NO_HOST_KEY_CHECKING: &str = "-o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no";

/// Whether the host is reached over SSH.
///
/// Hosts without `ansible_connection` default to SSH.
pub fn is_ssh_host(vars: &Vars) -> bool {
    match vars.get(CONNECTION_KEY).and_then(scalar_to_string) {
        Some(kind) => SSH_CONNECTIONS.contains(&kind.as_str()),
        None => true,
    }
}

/// Return the value of the first key in `keys` present in `vars`.
pub fn first_of(vars: &Vars, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| vars.get(*key))
        .and_then(scalar_to_string)
}

/// Fallbacks applied when the host variables say nothing.
#[derive(Debug, Clone, Default)]
pub struct ConnectionDefaults {
    pub ansible: AnsibleConfig,
    pub ssh: SshConfig,
}

impl ConnectionDefaults {
    pub fn new(ssh: SshConfig, ansible: AnsibleConfig) -> Self {
        Self { ansible, ssh }
    }

    fn lookup(&self, vars: &Vars, keys: &[&str], cfg_key: Option<&str>) -> Option<String> {
        first_of(vars, keys).or_else(|| {
            cfg_key
                .and_then(|k| self.ansible.get(k))
                .map(String::from)
        })
    }
}

/// A resolved SSH invocation for one host.
#[derive(Clone, PartialEq)]
pub struct ConnectionCommand {
    pub hostname: String,
    /// Explicit address; `None` falls back to `hostname`.
    pub address: Option<String>,
    pub user: String,
    /// Whether `user` came from a variable or `ansible.cfg`.
    pub explicit_user: bool,
    pub port: Option<String>,
    pub password: Option<String>,
    pub private_key_file: Option<String>,
    pub host_key_checking: bool,
    pub ssh_args: String,
    pub extra_args: String,
    pub common_args: String,
    pub executable: String,
    pub password_helper: String,
}

impl ConnectionCommand {
    pub fn from_host(host: &Host, defaults: &ConnectionDefaults) -> Self {
        Self::from_vars(&host.name, &host.vars, defaults)
    }

    /// Resolve every connection setting from a host's variables.
    pub fn from_vars(hostname: &str, vars: &Vars, defaults: &ConnectionDefaults) -> Self {
        let user = defaults.lookup(vars, USER_KEYS, Some("remote_user"));
        let password = first_of(vars, PASSWORD_KEYS).filter(|p| is_set(p));
        let private_key_file = defaults
            .lookup(vars, PRIVATE_KEY_FILE_KEYS, Some("private_key_file"))
            .filter(|k| is_set(k));
        let host_key_checking = defaults
            .lookup(vars, HOST_KEY_CHECKING_KEYS, Some("host_key_checking"))
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        Self {
            hostname: hostname.to_string(),
            address: first_of(vars, HOST_KEYS).filter(|a| !a.is_empty()),
            explicit_user: user.is_some(),
            user: user.unwrap_or_else(|| defaults.ssh.default_user.clone()),
            port: defaults
                .lookup(vars, PORT_KEYS, Some("remote_port"))
                .filter(|p| !p.is_empty()),
            password,
            private_key_file,
            host_key_checking,
            ssh_args: defaults
                .lookup(vars, SSH_ARGS_KEYS, Some("ssh_args"))
                .unwrap_or_else(|| defaults.ssh.args.clone()),
            extra_args: first_of(vars, EXTRA_ARGS_KEYS).unwrap_or_default(),
            common_args: first_of(vars, COMMON_ARGS_KEYS).unwrap_or_default(),
            executable: defaults
                .lookup(vars, EXECUTABLE_KEYS, Some("ssh_executable"))
                .unwrap_or_else(|| defaults.ssh.executable.clone()),
            password_helper: defaults.ssh.password_helper.clone(),
        }
    }

    /// The `user@address` (or bare hostname) argument.
    ///
    /// Without an explicit address the inventory hostname is used so that
    /// `~/.ssh/config` can resolve it.
    pub fn target(&self) -> String {
        match (&self.address, self.explicit_user) {
            (Some(address), _) => format!("{}@{}", self.user, address),
            (None, true) => format!("{}@{}", self.user, self.hostname),
            (None, false) => self.hostname.clone(),
        }
    }

    /// Options placed between the executable and the target.
    pub fn ssh_options(&self) -> Vec<String> {
        let mut options: Vec<String> = [&self.ssh_args, &self.extra_args, &self.common_args]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if let Some(ref key) = self.private_key_file {
            options.push(format!("-i {}", key));
        }
        if !self.host_key_checking {
            options.push(NO_HOST_KEY_CHECKING.to_string());
        }
        if let Some(ref port) = self.port {
            options.push(format!("-p {}", port));
        }
        options
    }

    /// Render the full shell command.
    ///
    /// # Errors
    ///
    /// [`ConnectError::QuoteError`] if the password cannot be shell-quoted.
    pub fn render(&self) -> Result<String> {
        let mut parts = Vec::new();

        if let Some(ref password) = self.password {
            let quoted = shlex::try_quote(password).map_err(|_| {
                ConnectError::QuoteError(format!("password of host {}", self.hostname))
            })?;
            parts.push(format!("{} -p {}", self.password_helper, quoted));
        }

        parts.push(self.executable.clone());
        parts.extend(self.ssh_options());
        parts.push(self.target());

        Ok(parts.join(" "))
    }
}

impl fmt::Debug for ConnectionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCommand")
            .field("hostname", &self.hostname)
            .field("target", &self.target())
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_file", &self.private_key_file)
            .field("host_key_checking", &self.host_key_checking)
            .field("executable", &self.executable)
            .finish()
    }
}

fn is_set(value: &str) -> bool {
    !value.is_empty() && value != NULL_VALUE
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "no" | "off" | "0"
    )
}
