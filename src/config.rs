use crate::{
    game::GameId,
    pak::{AssetPattern, ScanOptions, DEFAULT_EXTENSIONS, DEFAULT_SIZE_CEILING},
};
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "pakwarden.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub active_game: GameId,
    #[serde(default)]
    pub install_path: Option<PathBuf>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(skip)]
    pub data_dir: PathBuf,
}

/// Tuning for the pak index scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_size_ceiling")]
    pub size_ceiling_bytes: u64,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Overrides the game's content root (e.g. `/Game/Content/`).
    #[serde(default)]
    pub content_root: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            size_ceiling_bytes: default_size_ceiling(),
            extensions: default_extensions(),
            content_root: None,
        }
    }
}

impl AppConfig {
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_in(&base_data_dir()?)
    }

    pub fn load_or_create_in(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).context("create app data dir")?;
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read app config")?;
            let mut config: AppConfig = serde_json::from_str(&raw).context("parse app config")?;
            config.data_dir = data_dir.to_path_buf();
            return Ok(config);
        }

        let config = AppConfig {
            active_game: GameId::default(),
            install_path: None,
            scan: ScanConfig::default(),
            data_dir: data_dir.to_path_buf(),
        };
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("create app data dir")?;
        let path = self.data_dir.join(CONFIG_FILE);
        let raw = serde_json::to_string_pretty(self).context("serialize app config")?;
        fs::write(path, raw).context("write app config")?;
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn scan_options(&self) -> Result<ScanOptions> {
        let root = self
            .scan
            .content_root
            .as_deref()
            .unwrap_or_else(|| self.active_game.content_root());
        let pattern =
            AssetPattern::new(root, &self.scan.extensions).context("build asset pattern")?;
        Ok(ScanOptions::new(pattern).with_size_ceiling(self.scan.size_ceiling_bytes))
    }
}

fn default_size_ceiling() -> u64 {
    DEFAULT_SIZE_CEILING
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

fn base_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("pakwarden"))
}
