//! Error types for ansibleconnect.
//!
//! All errors are represented by [`ConnectError`], which covers inventory and
//! configuration problems as well as the two user-facing exit conditions
//! (running inside tmux, nothing selected).

use std::path::PathBuf;
use thiserror::Error;

/// All possible errors that can occur in ansibleconnect.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Inventory file does not exist at the given path.
    #[error("Inventory file not found: {0}")]
    InventoryNotFound(PathBuf),

    /// Inventory YAML is well-formed but not shaped like an inventory.
    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    /// YAML parsing failed.
    #[error("Failed to parse inventory: {0}")]
    InventoryParse(#[from] serde_yaml::Error),

    /// Tool config file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// `ANSIBLE_CONFIG` points at a file that does not exist.
    #[error("Ansible config file not found: {0}")]
    AnsibleConfigNotFound(PathBuf),

    /// Failed to read a file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing failed.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value could not be quoted for the shell (it contains a NUL byte).
    #[error("Cannot quote for shell: {0}")]
    QuoteError(String),

    /// Command was run inside a tmux session without nested mode.
    #[error("Please exit current tmux session in order to use ansibleconnect")]
    InsideTmux,

    /// The filters selected no hosts.
    #[error("No hosts matched given criteria")]
    NoHostsMatched,
}

impl ConnectError {
    /// Whether this error is reported as an `echo` line on stdout rather than
    /// on stderr.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ConnectError::InsideTmux | ConnectError::NoHostsMatched)
    }
}

/// Convenient Result type alias for ansibleconnect operations.
pub type Result<T> = std::result::Result<T, ConnectError>;
