use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::debug;
use thiserror::Error;

use crate::common::SourceID;

/// Environment variable overriding where `config.toml` is looked up
pub static CONFIG_DIR_ENV: &str = "VIDGRID_CONFIG_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to determine configuration directory")]
    NoConfigDir,

    #[error("Unknown channel {0:?}")]
    UnknownChannel(String),
}

/// A channel shown in the picker
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    /// Display name
    pub name: String,
    /// Channel ID, playlist ID, @handle or URL
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub web_host: String,
    pub web_port: u16,

    /// Downloader program followed by any leading arguments
    pub ytdlp_command: Vec<String>,
    /// Upper bound on videos collected per listing
    pub playlist_end: usize,
    pub cache_ttl_secs: i64,
    /// Identifiers starting with one of these are playlists
    pub playlist_prefixes: Vec<String>,

    pub channels: Vec<ChannelEntry>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            web_host: "127.0.0.1".into(),
            web_port: 8448,
            ytdlp_command: vec!["yt-dlp".into()],
            playlist_end: 150,
            cache_ttl_secs: 3600,
            playlist_prefixes: vec!["PL".into()],
            channels: vec![],
        }
    }
}

impl Config {
    /// Directory holding `config.toml`
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let pd = ProjectDirs::from("", "", "vidgrid").ok_or(ConfigError::NoConfigDir)?;
        Ok(pd.config_dir().to_path_buf())
    }

    /// Load from the default location, falling back to defaults if no file exists
    pub fn load() -> Result<Config> {
        let path = Config::config_dir()?.join("config.toml");
        Config::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        debug!("Loading config from {:?}", path);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Config::from_toml(&text).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Config> {
        let cfg: Config = toml::from_str(text)?;
        Ok(cfg)
    }

    pub fn source_id(&self, id: &str) -> SourceID {
        SourceID::classify(id, &self.playlist_prefixes)
    }

    /// Look up a configured channel by display name
    pub fn channel(&self, name: &str) -> Result<&ChannelEntry> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::UnknownChannel(name.into()).into())
    }

    pub fn default_channel(&self) -> Option<&ChannelEntry> {
        self.channels.first()
    }

    /// Cache lifetime. Negative means zero, huge values are clamped to the
    /// largest representable duration.
    pub fn cache_ttl(&self) -> chrono::Duration {
        // chrono's limit, in whole seconds
        const MAX_TTL_SECS: i64 = i64::MAX / 1000;
        chrono::Duration::seconds(self.cache_ttl_secs.clamp(0, MAX_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SourceKind;

    #[test]
    fn test_defaults_from_empty_file() -> Result<()> {
        let cfg = Config::from_toml("")?;
        assert_eq!(cfg.web_port, 8448);
        assert_eq!(cfg.ytdlp_command, vec!["yt-dlp".to_string()]);
        assert_eq!(cfg.playlist_end, 150);
        assert_eq!(cfg.cache_ttl(), chrono::Duration::hours(1));
        assert!(cfg.channels.is_empty());
        assert!(cfg.default_channel().is_none());
        Ok(())
    }

    #[test]
    fn test_channels_keep_order() -> Result<()> {
        let cfg = Config::from_toml(
            r#"
            web_port = 9000
            playlist_prefixes = ["PL", "UU"]

            [[channels]]
            name = "Sermons"
            id = "PLabc"

            [[channels]]
            name = "Main"
            id = "UCdef"
            "#,
        )?;
        assert_eq!(cfg.web_port, 9000);
        assert_eq!(cfg.web_host, "127.0.0.1");
        assert_eq!(cfg.default_channel().unwrap().name, "Sermons");

        let main = cfg.channel("Main")?;
        assert_eq!(main.id, "UCdef");
        assert_eq!(cfg.source_id(&main.id).kind, SourceKind::Channel);
        assert_eq!(cfg.source_id("UUdef").kind, SourceKind::Playlist);

        let err = cfg.channel("Nope").unwrap_err();
        assert_eq!(err.to_string(), "Unknown channel \"Nope\"");
        Ok(())
    }

    #[test]
    fn test_cache_ttl_bounds() {
        let mut cfg = Config::default();
        cfg.cache_ttl_secs = -5;
        assert_eq!(cfg.cache_ttl(), chrono::Duration::zero());

        cfg.cache_ttl_secs = i64::MAX;
        assert!(cfg.cache_ttl() > chrono::Duration::days(365 * 1000));
    }

    #[test]
    fn test_missing_and_malformed_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("config.toml");

        let cfg = Config::load_from(&path)?;
        assert!(cfg.channels.is_empty());

        std::fs::write(&path, "web_port = \"not a number\"")?;
        assert!(Config::load_from(&path).is_err());
        Ok(())
    }
}
