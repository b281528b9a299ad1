use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const GAME_NAME: &str = "Palworld";
pub const CONTENT_ROOT: &str = "/Pal/Content/";
const STEAM_FOLDER: &str = "Palworld";

#[derive(Debug, Clone)]
pub struct GamePaths {
    pub install_root: PathBuf,
    pub paks_dir: PathBuf,
    pub script_mods_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub ue4ss_log_path: PathBuf,
}

impl GamePaths {
    pub fn from_install(install_root: &Path) -> Self {
        let pal = install_root.join("Pal");
        let win64 = pal.join("Binaries").join("Win64");
        Self {
            install_root: install_root.to_path_buf(),
            paks_dir: pal.join("Content").join("Paks"),
            script_mods_dir: win64.join("Mods"),
            logs_dir: pal.join("Saved").join("Logs"),
            ue4ss_log_path: win64.join("UE4SS.log"),
        }
    }
}

pub fn detect_paths(install_override: Option<&Path>) -> Result<GamePaths> {
    let install_root = match install_override {
        Some(path) => path.to_path_buf(),
        None => find_install_root().context("locate Palworld install directory")?,
    };

    if !looks_like_game_root(&install_root) {
        bail!(
            "invalid install dir: expected Pal/ in {}",
            install_root.display()
        );
    }

    Ok(GamePaths::from_install(&install_root))
}

fn find_install_root() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(home) = dirs_home() {
        candidates.push(home.join(".local/share/Steam"));
        candidates.push(home.join(".steam/steam"));
    }

    let mut libraries = Vec::new();
    for base in candidates {
        let vdf = base.join("steamapps/libraryfolders.vdf");
        if vdf.exists() {
            if let Ok(paths) = parse_steam_library_paths(&vdf) {
                libraries.extend(paths);
            }
        }
        libraries.push(base);
    }

    libraries
        .into_iter()
        .map(|lib| lib.join("steamapps/common").join(STEAM_FOLDER))
        .find(|candidate| looks_like_game_root(candidate))
}

fn parse_steam_library_paths(path: &Path) -> Result<Vec<PathBuf>> {
    let raw = fs::read_to_string(path).context("read libraryfolders.vdf")?;
    Ok(library_paths_from_vdf(&raw))
}

fn library_paths_from_vdf(raw: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if !line.contains("\"path\"") {
            continue;
        }

        let parts: Vec<&str> = line.split('"').collect();
        if parts.len() >= 4 {
            let path = parts[3].replace("\\\\", "\\");
            paths.push(PathBuf::from(path));
        }
    }
    paths
}

fn dirs_home() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.home_dir().to_path_buf())
}

pub fn looks_like_game_root(path: &Path) -> bool {
    path.join("Pal").is_dir()
}
