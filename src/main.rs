//! ansibleconnect CLI entry point.
//!
//! This binary prints a shell command that opens tmux with an SSH pane for
//! every selected inventory host.

use ansibleconnect::ansible_cfg::AnsibleConfig;
use ansibleconnect::cli::Cli;
use ansibleconnect::config::{Config, Layout};
use ansibleconnect::error::Result;
use ansibleconnect::ssh::{self, ConnectionCommand, ConnectionDefaults};
use ansibleconnect::tmux::{self, ScriptOptions};
use ansibleconnect::{filter, loader, logging, ConnectError, Host, Inventory};
use clap::Parser;
use tracing::{debug, warn};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(output) => println!("{}", output),
        // The output is evaluated by the calling shell, so conditions the
        // user should see become an echo.
        Err(e) if e.is_user_facing() => {
            println!("{}", tmux::echo(&e.to_string()));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic.
fn run(cli: &Cli) -> Result<String> {
    let config = match cli.config {
        Some(ref path) => loader::load_config(path)?,
        None => loader::load_default_config()?,
    };

    let nested = cli.window || config.tmux.nested;
    if !cli.list && !nested && tmux::in_tmux() {
        return Err(ConnectError::InsideTmux);
    }

    let inventory = Inventory::load(&cli.inventory)?;
    let hosts = select(cli, &inventory);
    if hosts.is_empty() {
        return Err(ConnectError::NoHostsMatched);
    }

    if cli.list {
        return Ok(listing(&hosts));
    }

    let defaults = ConnectionDefaults::new(config.ssh.clone(), AnsibleConfig::load()?);
    let commands = hosts
        .iter()
        .map(|host| {
            let command = ConnectionCommand::from_host(host, &defaults);
            debug!(host = %host.name, ssh_target = %command.target(), "connection resolved");
            command.render()
        })
        .collect::<Result<Vec<_>>>()?;

    tmux::create_script(&commands, &script_options(cli, &config, nested))
}

/// Apply the CLI selection and drop hosts that are not reached over SSH.
fn select<'a>(cli: &Cli, inventory: &'a Inventory) -> Vec<&'a Host> {
    let selected = filter::select_hosts(inventory, &cli.hostnames(), &cli.host_filter());
    selected
        .into_iter()
        .filter(|host| {
            let ssh = ssh::is_ssh_host(&host.vars);
            if !ssh {
                warn!(host = %host.name, "skipping host that does not use an ssh connection");
            }
            ssh
        })
        .collect()
}

fn script_options(cli: &Cli, config: &Config, nested: bool) -> ScriptOptions {
    // Layout precedence: CLI flag > config > tiled
    let layout = cli
        .layout()
        .or(config.tmux.layout)
        .unwrap_or(Layout::Tiled);
    // An explicit layout flag wins over configured columns.
    let columns = cli
        .columns
        .or_else(|| cli.layout().is_none().then_some(config.tmux.columns).flatten());
    let now = chrono::Local::now().naive_local();

    ScriptOptions {
        session_name: tmux::session_name(&config.tmux.session_prefix, now),
        nested,
        layout,
        columns,
        agent_socket: if config.tmux.forward_agent {
            tmux::agent_socket()
        } else {
            None
        },
    }
}

/// Print the selected hosts and their groups.
fn listing(hosts: &[&Host]) -> String {
    hosts
        .iter()
        .map(|host| {
            let groups: Vec<&str> = host.groups.iter().map(String::as_str).collect();
            format!("{}\t{}", host.name, groups.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
