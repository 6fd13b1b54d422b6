//! Echo Chat CLI

mod commands;
mod config;
mod logging;
mod presenter;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{AppContext, Commands};
use echo_core::{FileStore, Session, Toaster};
use echo_http::EchoClientBuilder;
use presenter::TerminalPresenter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "echo-chat")]
#[command(about = "Command-line client for Echo Chat")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Client configuration file (TOML, YAML or JSON); defaults to
    /// <data-dir>/config.json when that exists
    #[arg(short = 'c', long, global = true, env = "ECHO_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the session file and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the configured request timeout, in seconds
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    let config_path = config::config_file(cli.config, &data_dir);
    let client_config = config::load_client_config(config_path.as_deref())?;
    debug!(base_url = %client_config.base_url, "loaded configuration");

    let toaster = Toaster::new();
    toaster.set_presenter(Arc::new(TerminalPresenter::stdout()));

    let session = Session::new(Arc::new(FileStore::open(data_dir.join(config::SESSION_FILE))?));

    let expired_toaster = toaster.clone();
    let mut builder = EchoClientBuilder::from_config(&client_config)
        .session(session)
        .on_session_expired(move || {
            expired_toaster.warning_titled("登录已过期，请重新登录", "会话过期");
        });
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let ctx = AppContext {
        client,
        toaster,
        data_dir,
    };

    if let Err(e) = cli.command.execute(&ctx).await {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chats_defaults_to_first_page() {
        let cli = Cli::try_parse_from(["echo-chat", "chats"]).unwrap();
        match cli.command {
            Commands::Chats { page, page_size } => {
                assert_eq!(page, 1);
                assert_eq!(page_size, 10);
            }
            _ => panic!("expected chats command"),
        }
    }
}
