//! # ansibleconnect
//!
//! Open a tmux session with one SSH pane for every host selected from an
//! Ansible inventory.
//!
//! ansibleconnect reads a YAML inventory, narrows it down by group,
//! hostname or variable, and prints a single shell line that builds the
//! tmux layout. Evaluate it in your shell:
//!
//! ```bash
//! eval "$(ansibleconnect -i inventory.yml -g 'web:!canary' --vars deploy:true)"
//! ```
//!
//! ## Features
//!
//! - **Group selection**: `web:!canary` includes and excludes groups, with
//!   membership inherited through `children`
//! - **Variable selection**: `--vars deploy:true` / `--novars env:prod`
//! - **Ansible-compatible connection settings**: `ansible_host`,
//!   `ansible_user`, `ansible_port`, passwords via `sshpass`, private keys,
//!   `ansible.cfg` defaults
//! - **Layouts**: tiled, vertical, horizontal or a fixed number of columns
//!
//! ## Quick Example
//!
//! ```
//! use ansibleconnect::filter::{select_hosts, HostFilter, parse_groups};
//! use ansibleconnect::inventory::Inventory;
//! use ansibleconnect::ssh::{ConnectionCommand, ConnectionDefaults};
//! use ansibleconnect::tmux::{create_script, ScriptOptions};
//!
//! let inventory = Inventory::from_yaml(
//!     "web:\n  hosts:\n    web1:\n      ansible_host: 10.0.0.5\n",
//! ).unwrap();
//! let filter = HostFilter { groups: parse_groups(Some("web")), ..Default::default() };
//! let hosts = select_hosts(&inventory, &[], &filter);
//!
//! let defaults = ConnectionDefaults::default();
//! let commands: Vec<String> = hosts
//!     .iter()
//!     .map(|h| ConnectionCommand::from_host(h, &defaults).render().unwrap())
//!     .collect();
//!
//! let options = ScriptOptions { session_name: "demo".into(), ..Default::default() };
//! let script = create_script(&commands, &options).unwrap();
//! assert!(script.starts_with("tmux new-session -s demo"));
//! assert!(script.contains("root@10.0.0.5"));
//! ```
//!
//! ## Requirements
//!
//! The printed line is run by your shell, so `tmux` must be on `PATH`.
//! Column mode (`-c`) sizes panes with `split-window -l N%`, which needs
//! tmux 3.1 or later. Passwords from the inventory are passed through
//! `sshpass` (configurable as `ssh.password_helper`).
//!
//! ## Architecture
//!
//! The crate is organized into these modules:
//!
//! - [`inventory`]: YAML inventory parsing, group membership and variable merging
//! - [`filter`]: Group / hostname / variable selection
//! - [`ssh`]: Connection command construction
//! - [`tmux`]: Tmux script generation
//! - [`cli`]: Command-line argument parsing with clap
//! - [`config`]: Tool configuration data structures
//! - [`loader`]: Config file discovery and loading
//! - [`ansible_cfg`]: `ansible.cfg` defaults
//! - [`logging`]: Stderr diagnostics
//! - [`error`]: Error types

pub mod ansible_cfg;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod loader;
pub mod logging;
pub mod ssh;
pub mod tmux;

pub use config::{Config, Layout};
pub use error::{ConnectError, Result};
pub use inventory::{Host, Inventory};
