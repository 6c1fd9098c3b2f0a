use anyhow::{Context, Result};
use archive_mbox::MboxConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "archive.toml";

pub const DEFAULT_STORE_DIR: &str = ".list-archive";

/// Contents of `archive.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub store: StoreSection,
    pub ingest: MboxConfig,
    pub render: RenderSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub dir: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub output_dir: Option<PathBuf>,
}

impl ArchiveConfig {
    /// Load `explicit`, or `archive.toml` when present, or the defaults.
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.ingest.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ArchiveConfig::from_toml_str("").unwrap();
        assert_eq!(config, ArchiveConfig::default());
        assert_eq!(config.store.dir, PathBuf::from(DEFAULT_STORE_DIR));
        assert!(config.ingest.mask_bodies);
    }

    #[test]
    fn sections_override_defaults() {
        let config = ArchiveConfig::from_toml_str(
            r#"
            [store]
            dir = "/tmp/archive-store"

            [ingest]
            separator = '^From \d+@xxx'
            min_year = 1992
            max_year = 2001

            [render]
            output_dir = "site"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.dir, PathBuf::from("/tmp/archive-store"));
        assert_eq!(config.ingest.separator, r"^From \d+@xxx");
        assert_eq!(config.ingest.min_year, Some(1992));
        assert_eq!(config.ingest.fallback_year, 1970);
        assert_eq!(config.render.output_dir, Some(PathBuf::from("site")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ArchiveConfig::from_toml_str("[store]\npath = \"x\"\n").is_err());
        assert!(ArchiveConfig::from_toml_str("[extra]\n").is_err());
    }

    #[test]
    fn invalid_year_window_is_rejected() {
        let err = ArchiveConfig::from_toml_str("[ingest]\nmin_year = 2000\nmax_year = 1990\n")
            .unwrap_err();
        assert!(err.to_string().contains("min_year"));
    }
}
