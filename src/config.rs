//! Configuration types for ansibleconnect.
//!
//! The tool config is an optional TOML file with two tables. Every key is
//! optional; missing keys fall back to the defaults shown here.
//!
//! # Config Format
//!
//! ```toml
//! [tmux]
//! layout = "tiled"
//! columns = 3
//! session_prefix = "ansibleconnect"
//! nested = false
//! forward_agent = true
//!
//! [ssh]
//! executable = "ssh"
//! args = "-C -o ControlMaster=auto -o ControlPersist=60s"
//! default_user = "root"
//! password_helper = "sshpass"
//! ```

use serde::Deserialize;
use std::str::FromStr;

/// Ansible's default `ssh_args`.
pub const DEFAULT_SSH_ARGS: &str = "-C -o ControlMaster=auto -o ControlPersist=60s";

/// How panes are arranged when no column count is given.
///
/// Each variant is applied with `select-layout` after every split.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Tiled,
    /// Panes side by side.
    Vertical,
    /// Panes stacked on top of each other.
    Horizontal,
}

impl Layout {
    /// Name of the matching tmux preset.
    pub fn to_tmux_layout(&self) -> &'static str {
        match self {
            Layout::Tiled => "tiled",
            Layout::Vertical => "even-horizontal",
            Layout::Horizontal => "even-vertical",
        }
    }
}

/// Settings for the generated tmux script.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TmuxConfig {
    /// Layout used when `-v`/`-H` are not given.
    pub layout: Option<Layout>,
    /// Arrange panes in this many columns instead of applying a layout.
    pub columns: Option<u32>,
    /// Session (or window) names are `<prefix>-<timestamp>`.
    pub session_prefix: String,
    /// Open a new window when already inside tmux instead of refusing.
    pub nested: bool,
    /// Export the caller's `SSH_AUTH_SOCK` in every pane.
    pub forward_agent: bool,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            layout: None,
            columns: None,
            session_prefix: "ansibleconnect".to_string(),
            nested: false,
            forward_agent: true,
        }
    }
}

/// Fallbacks for connection settings no inventory variable provides.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SshConfig {
    /// SSH client binary.
    pub executable: String,
    /// Arguments placed right after the executable.
    pub args: String,
    /// User for hosts with an explicit address but no user variable.
    pub default_user: String,
    /// Program used to feed inventory passwords to ssh.
    pub password_helper: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            executable: "ssh".to_string(),
            args: DEFAULT_SSH_ARGS.to_string(),
            default_user: "root".to_string(),
            password_helper: "sshpass".to_string(),
        }
    }
}

/// Top-level configuration structure.
///
/// Parsed from `~/.config/ansibleconnect/config.toml` (or XDG equivalent).
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Script emission settings.
    pub tmux: TmuxConfig,
    /// Connection command fallbacks.
    pub ssh: SshConfig,
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        toml::from_str(toml_str)
    }
}
