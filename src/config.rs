//! Optional config file loading. Search order: ./novelscraper.toml, then
//! $XDG_CONFIG_HOME/novelscraper/config.toml (or ~/.config/novelscraper/config.toml).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = "novelscraper.toml";

/// Config file contents. All fields optional; CLI flags take precedence over present keys.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Directory output files are written to (default: current directory).
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Concurrent chapter fetches (default 50).
    pub max_workers: Option<usize>,
    /// Request timeout in seconds. Unset means requests never time out.
    pub timeout_secs: Option<u64>,
    /// Output format: epub or json.
    pub format: Option<String>,
}

/// Candidate config paths, most specific first.
fn search_paths() -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let mut paths = vec![cwd.join(LOCAL_CONFIG_FILE)];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("novelscraper").join("config.toml"));
    }
    Ok(paths)
}

/// Load the first config file found. Missing file returns Ok(None); a present file that
/// cannot be read or parsed is an error.
pub fn load_config() -> Result<Option<Config>> {
    for path in search_paths()? {
        if path.exists() {
            return load_from(&path).map(Some);
        }
    }
    Ok(None)
}

pub fn load_from(path: &Path) -> Result<Config> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config {}", path.display()))?;
    let config: Config =
        toml::from_str(&s).with_context(|| format!("Invalid config {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_empty_config() -> Result<()> {
        let c: Config = toml::from_str("")?;
        assert!(c.output_dir.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.max_workers.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.format.is_none());
        Ok(())
    }

    #[test]
    fn parse_full_config() -> Result<()> {
        let s = r#"
            output_dir = "books"
            user_agent = "Custom/1.0"
            max_workers = 8
            timeout_secs = 60
            format = "json"
        "#;
        let c: Config = toml::from_str(s)?;
        assert_eq!(c.output_dir.as_deref(), Some(Path::new("books")));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.max_workers, Some(8));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("output_dir = [").is_err());
        assert!(toml::from_str::<Config>("max_workers = \"many\"").is_err());
    }

    #[test]
    fn load_from_reports_path_on_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "timeout_secs = ")?;
        let err = match load_from(file.path()) {
            Ok(_) => anyhow::bail!("expected invalid config to fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("Invalid config"));
        Ok(())
    }

    #[test]
    fn load_from_reads_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "max_workers = 3")?;
        assert_eq!(load_from(file.path())?.max_workers, Some(3));
        Ok(())
    }
}
