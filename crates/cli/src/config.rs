//! CLI configuration utilities

use anyhow::Result;
use echo_http::ClientConfig;
use std::path::{Path, PathBuf};

/// File holding the persisted session inside the data directory
pub const SESSION_FILE: &str = "session.json";
/// Client configuration read from the data directory when no file is given
pub const CONFIG_FILE: &str = "config.json";

/// Resolve the data directory: explicit flag, then `ECHO_STATE_DIR`, then the
/// platform data directory
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        if let Ok(dir) = std::env::var("ECHO_STATE_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("echo-chat")
        }
    })
}

/// Configuration file to load: the explicit one, else `<data-dir>/config.json`
/// if it exists
pub fn config_file(explicit: Option<PathBuf>, data_dir: &Path) -> Option<PathBuf> {
    explicit.or_else(|| {
        let path = data_dir.join(CONFIG_FILE);
        path.is_file().then_some(path)
    })
}

/// Load client configuration, layering file and environment over defaults
pub fn load_client_config(path: Option<&Path>) -> Result<ClientConfig> {
    Ok(ClientConfig::load(path)?)
}

/// Save client configuration to a JSON file
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_client_config(&ClientConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/echo-explicit");
        assert_eq!(resolve_data_dir(Some(dir.clone())), dir);
    }

    #[test]
    fn generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("echo.json");

        generate_default_config(&path).unwrap();
        let loaded = load_client_config(Some(&path)).unwrap();

        assert_eq!(loaded.base_url, ClientConfig::default().base_url);
        assert_eq!(loaded.timeout_secs, 10);
    }

    #[test]
    fn config_file_falls_back_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(config_file(None, dir.path()), None);

        let default_path = dir.path().join(CONFIG_FILE);
        generate_default_config(&default_path).unwrap();
        assert_eq!(config_file(None, dir.path()), Some(default_path));

        let explicit = dir.path().join("other.toml");
        assert_eq!(config_file(Some(explicit.clone()), dir.path()), Some(explicit));
    }
}
