use crate::{
    load_order,
    mods_txt::{self, MODS_TXT},
    palworld::GamePaths,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use walkdir::WalkDir;

const PAK_SUFFIX: &str = ".pak";
const DISABLED_SUFFIX: &str = ".disabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModKind {
    Pak,
    Script,
}

impl ModKind {
    pub fn label(self) -> &'static str {
        match self {
            ModKind::Pak => "Pak",
            ModKind::Script => "Script",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModEntry {
    pub name: String,
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub enabled: bool,
    pub kind: ModKind,
    pub modified_at: Option<i64>,
}

impl ModEntry {
    /// Name without the load-order prefix and pak suffixes.
    pub fn display_name(&self) -> String {
        match self.kind {
            ModKind::Script => self.name.clone(),
            ModKind::Pak => {
                let name = self.name.strip_suffix(DISABLED_SUFFIX).unwrap_or(&self.name);
                let name = name.strip_suffix(PAK_SUFFIX).unwrap_or(name);
                load_order::clean_name(name).to_string()
            }
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query)
            || self.display_name().eq_ignore_ascii_case(query)
            || self
                .relative_path
                .to_string_lossy()
                .eq_ignore_ascii_case(query)
    }
}

/// Lists pak mods (recursively, sorted by file name) followed by script mod folders.
pub fn scan_mods(paths: &GamePaths) -> Result<Vec<ModEntry>> {
    let mut mods = scan_pak_mods(&paths.paks_dir)?;
    mods.extend(scan_script_mods(&paths.script_mods_dir)?);
    Ok(mods)
}

fn scan_pak_mods(paks_dir: &Path) -> Result<Vec<ModEntry>> {
    let mut mods = Vec::new();
    if !paks_dir.is_dir() {
        log::warn!("Paks directory not found: {}", paks_dir.display());
        return Ok(mods);
    }

    for entry in WalkDir::new(paks_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.context("walk paks dir")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let enabled = name.ends_with(PAK_SUFFIX);
        if !enabled && !name.ends_with(".pak.disabled") {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(paks_dir)
            .context("rel path")?
            .to_path_buf();
        mods.push(ModEntry {
            name,
            path: entry.path().to_path_buf(),
            relative_path,
            enabled,
            kind: ModKind::Pak,
            modified_at: modified_epoch(entry.path()),
        });
    }

    Ok(mods)
}

fn scan_script_mods(mods_dir: &Path) -> Result<Vec<ModEntry>> {
    let mut mods = Vec::new();
    if !mods_dir.is_dir() {
        return Ok(mods);
    }

    let states = mods_txt::read_mods_txt(&mods_dir.join(MODS_TXT)).unwrap_or_else(|err| {
        log::error!("Failed to read {MODS_TXT}: {err:#}");
        HashMap::new()
    });

    let mut dirs: Vec<PathBuf> = fs::read_dir(mods_dir)
        .context("read script mods dir")?
        .flatten()
        .filter(|entry| entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    for path in dirs {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_string()) else {
            continue;
        };
        let enabled = states.get(&name).copied().unwrap_or(true);
        mods.push(ModEntry {
            relative_path: PathBuf::from(&name),
            modified_at: modified_epoch(&path),
            name,
            path,
            enabled,
            kind: ModKind::Script,
        });
    }

    Ok(mods)
}

/// Flips a mod on or off and returns where it lives afterwards.
///
/// Paks are renamed between `x.pak` and `x.pak.disabled`; script mods are
/// toggled in the `mods.txt` next to their folder.
pub fn set_enabled(mod_entry: &ModEntry, enabled: bool) -> Result<PathBuf> {
    match mod_entry.kind {
        ModKind::Pak => set_pak_enabled(&mod_entry.path, enabled),
        ModKind::Script => {
            let parent = mod_entry
                .path
                .parent()
                .context("script mod has no parent dir")?;
            mods_txt::set_mod_state(&parent.join(MODS_TXT), &mod_entry.name, enabled)?;
            log::info!(
                "{} script mod {}",
                if enabled { "Enabled" } else { "Disabled" },
                mod_entry.name
            );
            Ok(mod_entry.path.clone())
        }
    }
}

fn set_pak_enabled(path: &Path, enabled: bool) -> Result<PathBuf> {
    let current = if path.exists() {
        path.to_path_buf()
    } else {
        let other = toggled_pak_path(path, !path_has_disabled_suffix(path));
        if !other.exists() {
            bail!("mod file not found: {}", path.display());
        }
        other
    };

    let target = toggled_pak_path(&current, !enabled);
    if target != current {
        fs::rename(&current, &target).with_context(|| {
            format!("rename {} -> {}", current.display(), target.display())
        })?;
        log::info!("Renamed {} -> {}", current.display(), target.display());
    }
    Ok(target)
}

fn path_has_disabled_suffix(path: &Path) -> bool {
    path.to_string_lossy().ends_with(DISABLED_SUFFIX)
}

fn toggled_pak_path(path: &Path, disabled: bool) -> PathBuf {
    let raw = path.to_string_lossy();
    let base = raw.strip_suffix(DISABLED_SUFFIX).unwrap_or(&raw);
    if disabled {
        PathBuf::from(format!("{base}{DISABLED_SUFFIX}"))
    } else {
        PathBuf::from(base)
    }
}

fn modified_epoch(path: &Path) -> Option<i64> {
    fs::metadata(path)
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(system_time_to_epoch)
}

fn system_time_to_epoch(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|duration| duration.as_secs() as i64)
}
