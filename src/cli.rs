//! Command-line interface for ansibleconnect.
//!
//! Parses arguments using clap and provides the [`Cli`] struct containing
//! all user-specified options.

use crate::config::Layout;
use crate::filter::{self, GroupSpec, HostFilter};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for ansibleconnect.
///
/// # Examples
///
/// ```bash
/// # One pane per host in the web group, except canaries
/// eval "$(ansibleconnect -i inventory.yml -g 'web:!canary')"
///
/// # Specific hosts, side by side
/// eval "$(ansibleconnect -i inventory.yml --hosts web1,db1 -v)"
///
/// # Hosts flagged for deployment, in three columns
/// eval "$(ansibleconnect -i inventory.yml --vars deploy:true -c 3)"
/// ```
#[derive(Parser, Debug)]
#[command(name = "ansibleconnect")]
#[command(version)]
#[command(about = "Open a tmux session with an SSH pane per Ansible inventory host")]
#[command(long_about = "ansibleconnect prints a shell command that sets up a tmux layout and\n\
    starts an ssh session for every selected inventory host in its own pane.\n\n\
    Evaluate its output in your shell:\n\n    \
    eval \"$(ansibleconnect -i inventory.yml -g webservers)\"")]
pub struct Cli {
    /// Path to the Ansible inventory file (YAML).
    #[arg(short, long, value_name = "PATH")]
    pub inventory: PathBuf,

    /// Groups to connect with, `!` excludes a group.
    ///
    /// Example: `-g 'prod:!storage'` selects hosts in the prod group that are
    /// not in the storage group.
    #[arg(short, long, value_name = "GROUPS", conflicts_with = "hosts")]
    pub groups: Option<String>,

    /// Hostnames to connect with, comma-separated.
    #[arg(long, value_name = "HOSTS")]
    pub hosts: Option<String>,

    /// Inventory variables that select hosts (`key:value` or `key`).
    ///
    /// Comma-separated and repeatable. Example: `--vars type:dev,team:ui`.
    #[arg(long = "vars", visible_alias = "variables", value_name = "VARS")]
    pub vars: Vec<String>,

    /// Inventory variables that deselect hosts (`key:value` or `key`).
    #[arg(long = "novars", visible_alias = "no-variables", value_name = "VARS")]
    pub no_vars: Vec<String>,

    /// Use vertical layout (side-by-side panes).
    #[arg(short = 'v', conflicts_with = "horizontal", help = "Vertical split (panes side by side)")]
    pub vertical: bool,

    /// Use horizontal layout (stacked panes).
    #[arg(short = 'H', help = "Horizontal split (panes stacked)")]
    pub horizontal: bool,

    /// Arrange panes in this many columns.
    #[arg(short, long, value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..))]
    pub columns: Option<u32>,

    /// Open a new window when already inside tmux.
    #[arg(short, long)]
    pub window: bool,

    /// Print the selected hosts instead of the tmux script.
    #[arg(short, long)]
    pub list: bool,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug information to stderr.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Determine the layout from CLI flags.
    ///
    /// Returns `Some(Layout)` if `-v` or `-H` was specified, `None` otherwise.
    /// When `None`, the layout falls back to the config file or tiled.
    pub fn layout(&self) -> Option<Layout> {
        if self.vertical {
            Some(Layout::Vertical)
        } else if self.horizontal {
            Some(Layout::Horizontal)
        } else {
            None
        }
    }

    /// Explicit hostnames from `--hosts`.
    pub fn hostnames(&self) -> Vec<String> {
        filter::parse_hostnames(self.hosts.as_deref())
    }

    /// Group and variable criteria from `-g`, `--vars` and `--novars`.
    pub fn host_filter(&self) -> HostFilter {
        let groups: GroupSpec = filter::parse_groups(self.groups.as_deref());
        HostFilter {
            groups,
            include_vars: filter::parse_vars(&self.vars),
            exclude_vars: filter::parse_vars(&self.no_vars),
        }
    }
}
