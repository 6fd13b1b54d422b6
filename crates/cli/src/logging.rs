use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "echo-chat.log";

/// Initialize logging for the CLI
pub fn init_logging(log_level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    let level_str = level_filter(log_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_str.into());

    if no_file_log {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(());
    }

    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn level_filter(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("echo_chat={level},echo_http={level},echo_core={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_workspace_crates() {
        assert_eq!(
            level_filter(Level::DEBUG),
            "echo_chat=debug,echo_http=debug,echo_core=debug"
        );
    }
}
