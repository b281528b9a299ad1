use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

const ORDER_PREFIX: &str = "z_";
const ORDER_DIGITS: usize = 3;

/// Strips a `z_NNN_` load-order prefix, if present.
pub fn clean_name(file_name: &str) -> &str {
    let prefix_len = ORDER_PREFIX.len() + ORDER_DIGITS + 1;
    let Some(rest) = file_name.strip_prefix(ORDER_PREFIX) else {
        return file_name;
    };
    let bytes = rest.as_bytes();
    let has_prefix = bytes.len() > ORDER_DIGITS + 1
        && bytes[..ORDER_DIGITS].iter().all(u8::is_ascii_digit)
        && bytes[ORDER_DIGITS] == b'_';
    if has_prefix {
        &file_name[prefix_len..]
    } else {
        file_name
    }
}

pub fn ordered_name(index: usize, file_name: &str) -> String {
    format!("{ORDER_PREFIX}{index:03}_{}", clean_name(file_name))
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
}

/// Renames enabled paks so their file names sort in the given order.
///
/// Position `i` in `paths` becomes `z_{i:03}_<name>`. Every file is first moved
/// to a temporary name so swapping two paks never overwrites one of them.
/// Returns the final path of every pak that ended up in place.
pub fn apply_load_order(paths: &[PathBuf]) -> Vec<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut placed = Vec::new();
    let mut staged = Vec::new();

    for (index, path) in paths.iter().enumerate() {
        let Some(name) = file_name_of(path) else {
            continue;
        };
        if !path.is_file() || !name.ends_with(".pak") {
            continue;
        }
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let target = dir.join(ordered_name(index, &name));
        if target == *path {
            placed.push(target);
            continue;
        }

        let temp = dir.join(format!("__temp_{stamp}_{index}_{}", clean_name(&name)));
        match fs::rename(path, &temp) {
            Ok(()) => staged.push((temp, target, path.clone())),
            Err(err) => log::warn!("Failed to stage {}: {err}", path.display()),
        }
    }

    for (temp, target, original) in staged {
        if target.exists() {
            log::warn!(
                "Load order target already exists, keeping {}",
                original.display()
            );
            restore(&temp, &original);
            continue;
        }
        match fs::rename(&temp, &target) {
            Ok(()) => {
                log::info!("Renamed {} -> {}", original.display(), target.display());
                placed.push(target);
            }
            Err(err) => {
                log::warn!("Failed to rename {}: {err}", original.display());
                restore(&temp, &original);
            }
        }
    }

    placed
}

fn restore(temp: &Path, original: &Path) {
    if let Err(err) = fs::rename(temp, original) {
        log::error!(
            "Failed to restore {} from {}: {err}",
            original.display(),
            temp.display()
        );
    }
}

/// Drops the load-order prefix from every path. Returns how many files were renamed.
pub fn reset_load_order(paths: &[PathBuf]) -> usize {
    let mut renamed = 0usize;
    for path in paths {
        let Some(name) = file_name_of(path) else {
            continue;
        };
        if !path.exists() {
            continue;
        }
        let clean = clean_name(&name);
        if clean == name {
            continue;
        }
        let target = path.with_file_name(clean);
        if target.exists() {
            log::warn!("Cannot reset {}: {} exists", path.display(), target.display());
            continue;
        }
        match fs::rename(path, &target) {
            Ok(()) => renamed += 1,
            Err(err) => log::warn!("Failed to reset {}: {err}", path.display()),
        }
    }
    renamed
}
