#[cfg_attr(not(windows), allow(dead_code))]
mod console;
#[cfg_attr(not(windows), allow(dead_code))]
mod control;
#[cfg(windows)]
mod daemon;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clipq_common::{pipe_name, ControlRequest, ControlResponse};
use clipq_config::Config;
use clipq_core::view::truncate;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const PASTED_PREVIEW_LEN: usize = 100;

#[derive(Parser)]
#[command(name = "clipq", about = "Clipboard FIFO queue with a global paste shortcut")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the daemon in the foreground (default)
    Run {
        /// Config file to use instead of ~/.clipq.conf
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Start with the clipboard listener and keyboard hook detached
        #[arg(long)]
        no_listen: bool,

        /// Do not draw the queue in this console
        #[arg(long)]
        no_console: bool,
    },

    /// Show queue depth and listener state
    Status,

    /// List queued entries, most recent first
    #[command(alias = "ls")]
    List,

    /// Print full queue contents, oldest first
    Dump,

    /// Print recent copy/cut/paste operations, most recent first
    History,

    /// Start listening to the clipboard and keyboard
    Attach,

    /// Stop listening to the clipboard and keyboard
    Detach,

    /// Flip the listening state
    Toggle,

    /// Move the oldest entry onto the clipboard
    #[command(alias = "paste")]
    Pop,

    /// Stop the daemon
    #[command(alias = "kill-server")]
    Stop,
}

impl Commands {
    fn request(&self) -> Option<ControlRequest> {
        let request = match self {
            Commands::Run { .. } => return None,
            Commands::Status => ControlRequest::Status,
            Commands::List => ControlRequest::List,
            Commands::Dump => ControlRequest::Dump,
            Commands::History => ControlRequest::History,
            Commands::Attach => ControlRequest::Attach,
            Commands::Detach => ControlRequest::Detach,
            Commands::Toggle => ControlRequest::Toggle,
            Commands::Pop => ControlRequest::PasteNext,
            Commands::Stop => ControlRequest::Shutdown,
        };
        Some(request)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        config: None,
        no_listen: false,
        no_console: false,
    });

    // The console view owns stdout; keep logs quiet unless it is off.
    let default_level = match &command {
        Commands::Run { no_console: true, .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Run {
            config,
            no_listen,
            no_console,
        } => {
            let config = match config {
                Some(path) => Config::load_from(&path)?,
                None => Config::load().unwrap_or_else(|e| {
                    warn!("Failed to load config, using defaults: {}", e);
                    Config::default_config()
                }),
            };
            run_daemon(config, !no_listen, !no_console)
        }
        command => match command.request() {
            Some(request) => run_client(request),
            None => Ok(()),
        },
    }
}

#[cfg(windows)]
fn run_daemon(config: Config, listen: bool, console: bool) -> Result<()> {
    let listen = listen && config.options.listen_on_start;
    daemon::run(config, daemon::RunOptions { listen, console })
}

#[cfg(not(windows))]
fn run_daemon(_config: Config, _listen: bool, _console: bool) -> Result<()> {
    anyhow::bail!("clipq requires Windows")
}

fn run_client(request: ControlRequest) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let pipe = pipe_name();
    debug!("Sending {:?} to {}", request, pipe);
    let response = runtime.block_on(control::request(&pipe, &request))?;
    let output = render_response(&response)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Text printed for a daemon response.
fn render_response(response: &ControlResponse) -> Result<String> {
    let text = match response {
        ControlResponse::Status(status) => status.line.clone(),
        ControlResponse::Entries(entries) if entries.is_empty() => "Queue is empty.".to_string(),
        ControlResponse::Entries(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{}: {}", i, entry))
            .collect::<Vec<_>>()
            .join("\n"),
        ControlResponse::Text(text) => text.clone(),
        ControlResponse::Listening(listening) => format!(
            "Listener: {}",
            if *listening { "Active" } else { "Inactive" }
        ),
        ControlResponse::Pasted(Some(text)) => {
            format!("Pasted: {}", truncate(text, PASTED_PREVIEW_LEN))
        }
        ControlResponse::Pasted(None) => "Queue is empty.".to_string(),
        ControlResponse::Ok => String::new(),
        ControlResponse::Error(e) => anyhow::bail!("{}", e),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipq_common::StatusInfo;

    #[test]
    fn test_no_subcommand_runs_daemon() {
        let cli = Cli::try_parse_from(["clipq"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["clipq", "run", "--no-listen", "-f", "my.conf"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                config: Some(PathBuf::from("my.conf")),
                no_listen: true,
                no_console: false,
            })
        );
    }

    #[test]
    fn test_subcommands_map_to_requests() {
        let cases = [
            ("status", ControlRequest::Status),
            ("ls", ControlRequest::List),
            ("dump", ControlRequest::Dump),
            ("toggle", ControlRequest::Toggle),
            ("paste", ControlRequest::PasteNext),
            ("pop", ControlRequest::PasteNext),
            ("stop", ControlRequest::Shutdown),
        ];
        for (arg, expected) in cases {
            let cli = Cli::try_parse_from(["clipq", arg]).unwrap();
            assert_eq!(cli.command.unwrap().request(), Some(expected), "{}", arg);
        }
    }

    #[test]
    fn test_render_responses() {
        let status = ControlResponse::Status(StatusInfo {
            queued: 0,
            listening: false,
            history: String::new(),
            line: "Items in queue: 0 | Listener: Inactive".to_string(),
        });
        assert_eq!(
            render_response(&status).unwrap(),
            "Items in queue: 0 | Listener: Inactive"
        );
        assert_eq!(
            render_response(&ControlResponse::Entries(vec!["b".into(), "a".into()])).unwrap(),
            "0: b\n1: a"
        );
        assert_eq!(
            render_response(&ControlResponse::Pasted(None)).unwrap(),
            "Queue is empty."
        );
        assert_eq!(
            render_response(&ControlResponse::Listening(true)).unwrap(),
            "Listener: Active"
        );
        assert_eq!(render_response(&ControlResponse::Ok).unwrap(), "");
    }

    #[test]
    fn test_render_error_fails() {
        let err = render_response(&ControlResponse::Error("boom".into())).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
