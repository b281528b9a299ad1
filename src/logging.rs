use anyhow::{anyhow, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl Verbosity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiet" | "minimal" => Some(Verbosity::Quiet),
            "normal" | "info" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "debug" | "trace" => Some(Verbosity::Debug),
            _ => None,
        }
    }

    fn echo_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Warn,
            Verbosity::Verbose => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }

    fn file_filter(self) -> LevelFilter {
        match self {
            Verbosity::Debug => LevelFilter::Debug,
            _ => LevelFilter::Info,
        }
    }
}

/// Appends `[LEVEL] message` lines to the app log and echoes to stderr.
struct AppLogger {
    log_path: Option<PathBuf>,
    file_filter: LevelFilter,
    echo_filter: LevelFilter,
}

impl AppLogger {
    fn new(log_path: Option<PathBuf>, verbosity: Verbosity) -> Self {
        Self {
            log_path,
            file_filter: verbosity.file_filter(),
            echo_filter: verbosity.echo_filter(),
        }
    }

    fn max_filter(&self) -> LevelFilter {
        self.file_filter.max(self.echo_filter)
    }
}

impl Log for AppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
            && metadata.level() <= self.max_filter()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level();
        let message = record.args().to_string();
        if level <= self.file_filter {
            if let Some(path) = &self.log_path {
                let _ = append_log_file(path, level, &message);
            }
        }
        if level <= self.echo_filter {
            eprintln!("[{}] {message}", log_level_label(level));
        }
    }

    fn flush(&self) {}
}

pub fn init(log_path: Option<PathBuf>, verbosity: Verbosity) -> Result<()> {
    let logger = AppLogger::new(log_path, verbosity);
    let max = logger.max_filter();
    log::set_boxed_logger(Box::new(logger)).map_err(|err| anyhow!("install logger: {err}"))?;
    log::set_max_level(max);
    Ok(())
}

fn log_level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn append_log_file(path: &Path, level: Level, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "[{label}] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(logger: &AppLogger, target: &str, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .target(target)
                .level(level)
                .args(format_args!("{message}"))
                .build(),
        );
    }

    #[test]
    fn writes_labelled_lines_at_file_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pakwarden.log");
        let logger = AppLogger::new(Some(path.clone()), Verbosity::Quiet);
        let target = concat!(env!("CARGO_CRATE_NAME"), "::pak");

        emit(&logger, target, Level::Info, "scanned 3 paks");
        emit(&logger, target, Level::Debug, "hidden");
        emit(&logger, target, Level::Warn, "bad footer");
        emit(&logger, "regex::compile", Level::Warn, "foreign");

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[INFO] scanned 3 paks\n[WARN] bad footer\n"
        );
    }

    #[test]
    fn debug_verbosity_logs_debug_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pakwarden.log");
        let logger = AppLogger::new(Some(path.clone()), Verbosity::Debug);
        emit(&logger, env!("CARGO_CRATE_NAME"), Level::Debug, "detail");
        assert_eq!(fs::read_to_string(&path).unwrap(), "[DEBUG] detail\n");
    }

    #[test]
    fn verbosity_names_parse() {
        assert_eq!(Verbosity::parse("minimal"), Some(Verbosity::Quiet));
        assert_eq!(Verbosity::parse("trace"), Some(Verbosity::Debug));
        assert_eq!(Verbosity::parse("loud"), None);
    }
}
