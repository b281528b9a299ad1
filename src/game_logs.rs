use crate::palworld::GamePaths;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

pub const TAIL_BYTES: u64 = 50 * 1024;
pub const TAIL_LINES: usize = 1000;
const TRACE_PREFIX: &str = "Pal-Trace";

#[derive(Debug, Default, Serialize)]
pub struct GameLogs {
    pub pal: Vec<String>,
    pub ue4ss: Vec<String>,
}

/// Reads at most `max_bytes` from the end of `path` and keeps the last `max_lines` lines.
pub fn read_tail_lines(path: &Path, max_bytes: u64, max_lines: usize) -> Result<Vec<String>> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file.metadata().context("stat log")?.len();
    let read_size = len.min(max_bytes);
    file.seek(SeekFrom::Start(len - read_size))
        .context("seek log tail")?;
    let mut buf = Vec::with_capacity(read_size as usize);
    file.take(read_size)
        .read_to_end(&mut buf)
        .context("read log tail")?;

    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(max_lines);
    Ok(lines[skip..].iter().map(|line| line.to_string()).collect())
}

/// Newest `Pal-Trace*` file by name (the game embeds a timestamp in it).
pub fn latest_trace_log(logs_dir: &Path) -> Option<PathBuf> {
    fs::read_dir(logs_dir)
        .ok()?
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(TRACE_PREFIX)
        })
        .map(|entry| entry.path())
        .max()
}

pub fn read_game_logs(paths: &GamePaths, max_lines: usize) -> GameLogs {
    let mut logs = GameLogs::default();

    if let Some(trace) = latest_trace_log(&paths.logs_dir) {
        match read_tail_lines(&trace, TAIL_BYTES, max_lines) {
            Ok(lines) => logs.pal = lines,
            Err(err) => log::error!("Failed to read game log: {err:#}"),
        }
    }

    if paths.ue4ss_log_path.exists() {
        match read_tail_lines(&paths.ue4ss_log_path, TAIL_BYTES, max_lines) {
            Ok(lines) => logs.ue4ss = lines,
            Err(err) => log::error!("Failed to read UE4SS log: {err:#}"),
        }
    }

    logs
}
