use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};

/// UE4SS enable table living next to the script mod folders.
pub const MODS_TXT: &str = "mods.txt";

/// Parses one `Name : 1` line. Names cannot contain whitespace or colons.
fn parse_line(line: &str) -> Option<(&str, bool)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.chars().any(|ch| ch.is_whitespace()) {
        return None;
    }
    match value.trim() {
        "1" => Some((name, true)),
        "0" => Some((name, false)),
        _ => None,
    }
}

pub fn parse_mods_txt(raw: &str) -> HashMap<String, bool> {
    raw.lines()
        .filter_map(parse_line)
        .map(|(name, enabled)| (name.to_string(), enabled))
        .collect()
}

pub fn read_mods_txt(path: &Path) -> Result<HashMap<String, bool>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read_to_string(path).context("read mods.txt")?;
    Ok(parse_mods_txt(&raw))
}

fn state_line(name: &str, enabled: bool) -> String {
    format!("{name} : {}", if enabled { '1' } else { '0' })
}

/// Rewrites (or appends) the entry for `name`, leaving every other line alone.
pub fn set_mod_state(path: &Path, name: &str, enabled: bool) -> Result<()> {
    if !path.exists() {
        fs::write(path, format!("{}\n", state_line(name, enabled))).context("create mods.txt")?;
        return Ok(());
    }

    let raw = fs::read_to_string(path).context("read mods.txt")?;
    let mut found = false;
    let mut lines: Vec<String> = raw
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .map(|line| match parse_line(line) {
            Some((existing, _)) if existing.eq_ignore_ascii_case(name) => {
                found = true;
                state_line(name, enabled)
            }
            _ => line.to_string(),
        })
        .collect();

    if !found {
        let at = if lines.last().is_some_and(|line| line.is_empty()) {
            lines.len() - 1
        } else {
            lines.len()
        };
        lines.insert(at, state_line(name, enabled));
    }

    fs::write(path, lines.join("\n")).context("write mods.txt")?;
    Ok(())
}
