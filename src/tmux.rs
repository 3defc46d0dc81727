//! Tmux script generation.
//!
//! Instead of driving tmux directly, ansibleconnect prints one shell line
//! that the calling shell evaluates:
//!
//! ```text
//! tmux new-session -s ansibleconnect-2024-05-01-10-30 \; send-keys 'ssh root@10.0.0.5' C-m \; split-window -h \; select-layout tiled \; ...
//! ```
//!
//! The ` \; ` separator reaches tmux as a literal `;`, so the whole layout is
//! built by a single tmux invocation.

use crate::config::Layout;
use crate::error::{ConnectError, Result};
use chrono::NaiveDateTime;

/// Check if we're running inside a tmux session.
///
/// Checks for the `TMUX` environment variable, which tmux sets when active.
pub fn in_tmux() -> bool {
    std::env::var("TMUX").is_ok()
}

/// The caller's SSH agent socket, if any.
///
/// A new tmux server does not necessarily inherit it, so panes re-export it.
pub fn agent_socket() -> Option<String> {
    std::env::var("SSH_AUTH_SOCK")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Session (or window) name: `<prefix>-%Y-%m-%d-%H-%M`.
pub fn session_name(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}-{}", prefix, now.format("%Y-%m-%d-%H-%M"))
}

/// Direction of a pane split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// New pane to the right (`-h`).
    Horizontal,
    /// New pane below (`-v`).
    Vertical,
}

impl Split {
    fn flag(self) -> &'static str {
        match self {
            Split::Horizontal => "-h",
            Split::Vertical => "-v",
        }
    }

    /// The split that grows panes in the direction `layout` arranges them.
    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Horizontal => Split::Vertical,
            Layout::Tiled | Layout::Vertical => Split::Horizontal,
        }
    }
}

/// Move the active pane selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneMove {
    Left,
    Right,
}

/// One tmux command in the generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    NewSession(String),
    NewWindow(String),
    /// Type the text into the active pane and press Enter.
    SendKeys(String),
    /// Split the active pane; `percent` sizes the new pane.
    SplitWindow { split: Split, percent: Option<u32> },
    SelectLayout(Layout),
    SelectPane(PaneMove),
}

impl Directive {
    /// The tmux command name and its unquoted arguments.
    pub fn args(&self) -> Vec<String> {
        let args: Vec<&str> = match self {
            Directive::NewSession(name) => vec!["new-session", "-s", name.as_str()],
            Directive::NewWindow(name) => vec!["new-window", "-n", name.as_str()],
            Directive::SendKeys(keys) => vec!["send-keys", keys.as_str(), "C-m"],
            Directive::SplitWindow { split, percent } => {
                let mut args = vec!["split-window".to_string(), split.flag().to_string()];
                if let Some(p) = percent {
                    args.push("-l".to_string());
                    args.push(format!("{}%", p));
                }
                return args;
            }
            Directive::SelectLayout(layout) => vec!["select-layout", layout.to_tmux_layout()],
            Directive::SelectPane(PaneMove::Left) => vec!["select-pane", "-L"],
            Directive::SelectPane(PaneMove::Right) => vec!["select-pane", "-R"],
        };
        args.into_iter().map(String::from).collect()
    }

    /// Render with every argument shell-quoted.
    pub fn render(&self) -> Result<String> {
        let quoted = self
            .args()
            .iter()
            .map(|arg| quote(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(quoted.join(" "))
    }
}

/// How the panes of the generated session are arranged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOptions {
    pub session_name: String,
    /// Open a window in the current session instead of a new session.
    pub nested: bool,
    pub layout: Layout,
    /// Fill this many columns instead of applying `layout`.
    pub columns: Option<u32>,
    /// Exported in every pane before connecting.
    pub agent_socket: Option<String>,
}

/// Arrange one pane per command.
///
/// In layout mode every split is followed by `select-layout`, so N commands
/// always end up in N evenly sized panes. In column mode the commands fill
/// `min(columns, N)` columns top to bottom, left to right, using
/// proportional splits.
pub fn build_directives(commands: &[String], options: &ScriptOptions) -> Result<Vec<Directive>> {
    let mut directives = vec![if options.nested {
        Directive::NewWindow(options.session_name.clone())
    } else {
        Directive::NewSession(options.session_name.clone())
    }];

    match options.columns.filter(|c| *c > 0) {
        Some(columns) => push_columns(&mut directives, commands, columns as usize, options)?,
        None => {
            let split = Split::for_layout(options.layout);
            for (i, command) in commands.iter().enumerate() {
                push_pane(&mut directives, command, options)?;
                if i + 1 < commands.len() {
                    directives.push(Directive::SplitWindow {
                        split,
                        percent: None,
                    });
                    directives.push(Directive::SelectLayout(options.layout));
                }
            }
        }
    }

    Ok(directives)
}

fn push_columns(
    directives: &mut Vec<Directive>,
    commands: &[String],
    columns: usize,
    options: &ScriptOptions,
) -> Result<()> {
    let columns = columns.min(commands.len());
    let mut pending = commands.iter();

    for (col, rows) in rows_per_column(commands.len(), columns).into_iter().enumerate() {
        // Carve the columns still to come off to the right, then come back.
        let columns_left = columns - col;
        if columns_left > 1 {
            directives.push(Directive::SplitWindow {
                split: Split::Horizontal,
                percent: Some(share(columns_left)),
            });
            directives.push(Directive::SelectPane(PaneMove::Left));
        }

        for row in 0..rows {
            if let Some(command) = pending.next() {
                push_pane(directives, command, options)?;
            }
            let rows_left = rows - row;
            if rows_left > 1 {
                directives.push(Directive::SplitWindow {
                    split: Split::Vertical,
                    percent: Some(share(rows_left)),
                });
            }
        }

        if columns_left > 1 {
            directives.push(Directive::SelectPane(PaneMove::Right));
        }
    }
    Ok(())
}

/// Spread `total` panes over `columns`, earlier columns taking the remainder.
fn rows_per_column(total: usize, columns: usize) -> Vec<usize> {
    if columns == 0 {
        return Vec::new();
    }
    let base = total / columns;
    let extra = total % columns;
    (0..columns)
        .map(|col| if col < extra { base + 1 } else { base })
        .collect()
}

/// Percentage to give the new pane so `parts` panes end up equal.
fn share(parts: usize) -> u32 {
    ((parts - 1) * 100 / parts) as u32
}

fn push_pane(directives: &mut Vec<Directive>, command: &str, options: &ScriptOptions) -> Result<()> {
    if let Some(ref socket) = options.agent_socket {
        directives.push(Directive::SendKeys(format!(
            "export SSH_AUTH_SOCK={}",
            quote(socket)?
        )));
    }
    directives.push(Directive::SendKeys(command.to_string()));
    Ok(())
}

/// Join directives into one `tmux ... \; ...` shell line.
pub fn render_script(directives: &[Directive]) -> Result<String> {
    let rendered = directives
        .iter()
        .map(Directive::render)
        .collect::<Result<Vec<_>>>()?;
    // `\;` is printed so that `;` is interpreted by tmux instead of the shell
    Ok(format!("tmux {}", rendered.join(" \\; ")))
}

/// Build and render the script for the given connection commands.
///
/// # Errors
///
/// - [`ConnectError::NoHostsMatched`] if `commands` is empty
/// - [`ConnectError::QuoteError`] if an argument cannot be quoted
pub fn create_script(commands: &[String], options: &ScriptOptions) -> Result<String> {
    if commands.is_empty() {
        return Err(ConnectError::NoHostsMatched);
    }
    render_script(&build_directives(commands, options)?)
}

/// Shell line that prints `message`, used for user-facing exits.
pub fn echo(message: &str) -> String {
    match shlex::try_quote(message) {
        Ok(quoted) => format!("echo {}", quoted),
        Err(_) => "echo".to_string(),
    }
}

fn quote(arg: &str) -> Result<String> {
    shlex::try_quote(arg)
        .map(|q| q.into_owned())
        .map_err(|_| ConnectError::QuoteError("tmux argument contains a NUL byte".into()))
}
