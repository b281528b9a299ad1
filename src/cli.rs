use crate::{
    config::AppConfig,
    conflicts::{self, ConflictEntry, ConflictStatus},
    game, game_logs,
    library::{self, ModEntry, ModKind},
    load_order,
    logging::{self, Verbosity},
    pak::{self, AssetSource, PakScanner},
    palworld::GamePaths,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::{macros::format_description, OffsetDateTime};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct GlobalOptions {
    format: OutputFormat,
    install: Option<PathBuf>,
    verbosity: Verbosity,
}

#[derive(Debug, PartialEq)]
enum CliCommand {
    ModsList(ModsListOptions),
    Conflicts,
    PakInfo(PathBuf),
    PakAssets(PathBuf),
    SetEnabled { query: String, enabled: bool },
    OrderSet(Vec<String>),
    OrderReset,
    Logs { lines: usize },
    Paths,
    ConfigShow,
    ConfigSetInstall(PathBuf),
    Help,
    Version,
}

#[derive(Debug, PartialEq)]
struct ModsListOptions {
    sort: ModSortKey,
    reverse: bool,
    filter: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ModSortKey {
    Order,
    Name,
    Modified,
    Kind,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (global, tokens) = parse_global_options(&args)?;
    match parse_command(&tokens)? {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("pakwarden v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let config = AppConfig::load_or_create()?;
            logging::init(Some(config.log_path()), global.verbosity)?;
            let session = Session {
                config,
                install_override: global.install,
            };
            run_command(session, command, global.format)
        }
    }
}

fn parse_global_options(args: &[String]) -> Result<(GlobalOptions, Vec<String>)> {
    let mut format = OutputFormat::Text;
    let mut install = None;
    let mut verbosity = Verbosity::Normal;
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--format=") {
            format = parse_format(value)?;
            continue;
        }
        if let Some(value) = arg.strip_prefix("--install=") {
            install = Some(PathBuf::from(value));
            continue;
        }
        match arg.as_str() {
            "--format" => {
                let value = iter.next().context("--format requires a value")?;
                format = parse_format(value)?;
            }
            "--install" => {
                let value = iter.next().context("--install requires a path")?;
                install = Some(PathBuf::from(value));
            }
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "--verbose" => verbosity = Verbosity::Verbose,
            "--verbosity" => {
                let level = iter.next().context("--verbosity requires a level")?;
                verbosity = Verbosity::parse(level)
                    .with_context(|| format!("Unknown verbosity: {level}"))?;
            }
            _ if arg.starts_with("-v") && arg.chars().skip(1).all(|ch| ch == 'v') => {
                verbosity = if arg.len() > 2 {
                    Verbosity::Debug
                } else {
                    Verbosity::Verbose
                };
            }
            _ => tokens.push(arg.to_string()),
        }
    }

    Ok((
        GlobalOptions {
            format,
            install,
            verbosity,
        },
        tokens,
    ))
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::parse(value).with_context(|| format!("Unknown format: {value}"))
}

fn parse_command(tokens: &[String]) -> Result<CliCommand> {
    let Some(head) = tokens.first() else {
        return Ok(CliCommand::Help);
    };
    let rest = tokens.get(1..).unwrap_or(&[]);
    let command = match head.as_str() {
        "--help" | "-h" | "help" => CliCommand::Help,
        "--version" | "-V" | "version" => CliCommand::Version,
        "mods" => CliCommand::ModsList(parse_mods_list(rest)?),
        "conflicts" => CliCommand::Conflicts,
        "pak" => {
            let sub = rest.first().map(|value| value.as_str()).unwrap_or("");
            let path = rest
                .get(1)
                .map(PathBuf::from)
                .with_context(|| format!("pak {sub} requires a file path"))?;
            match sub {
                "info" => CliCommand::PakInfo(path),
                "assets" => CliCommand::PakAssets(path),
                _ => bail!("Unknown pak command: {sub} (use 'info' or 'assets')"),
            }
        }
        "enable" | "disable" => {
            let query = rest
                .first()
                .with_context(|| format!("{head} requires a mod name"))?;
            CliCommand::SetEnabled {
                query: query.to_string(),
                enabled: head == "enable",
            }
        }
        "order" => match rest.first().map(|value| value.as_str()) {
            Some("set") => {
                let names = rest.get(1..).unwrap_or(&[]).to_vec();
                if names.is_empty() {
                    bail!("order set requires one or more mod names");
                }
                CliCommand::OrderSet(names)
            }
            Some("reset") => CliCommand::OrderReset,
            other => bail!(
                "Unknown order command: {} (use 'set' or 'reset')",
                other.unwrap_or("")
            ),
        },
        "logs" => CliCommand::Logs {
            lines: parse_lines(rest)?,
        },
        "paths" => CliCommand::Paths,
        "config" => match rest.first().map(|value| value.as_str()) {
            None | Some("show") => CliCommand::ConfigShow,
            Some("set-install") => {
                let path = rest.get(1).context("config set-install requires a path")?;
                CliCommand::ConfigSetInstall(PathBuf::from(path))
            }
            Some(other) => bail!("Unknown config command: {other} (use 'show' or 'set-install')"),
        },
        other => bail!("Unknown command: {other} (see --help)"),
    };
    Ok(command)
}

fn parse_mods_list(args: &[String]) -> Result<ModsListOptions> {
    let mut sort = ModSortKey::Order;
    let mut reverse = false;
    let mut filter = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "list" => {}
            "--sort" => {
                let value = iter.next().context("--sort requires a value")?;
                sort = parse_sort_key(value)?;
            }
            value if value.starts_with("--sort=") => {
                sort = parse_sort_key(value.trim_start_matches("--sort="))?;
            }
            "--reverse" | "-r" => reverse = true,
            "--filter" => {
                let value = iter.next().context("--filter requires a value")?;
                filter = Some(value.to_string());
            }
            value if value.starts_with("--filter=") => {
                filter = Some(value.trim_start_matches("--filter=").to_string());
            }
            other => bail!("Unknown mods option: {other}"),
        }
    }

    Ok(ModsListOptions {
        sort,
        reverse,
        filter,
    })
}

fn parse_sort_key(value: &str) -> Result<ModSortKey> {
    match value {
        "order" => Ok(ModSortKey::Order),
        "name" => Ok(ModSortKey::Name),
        "modified" => Ok(ModSortKey::Modified),
        "kind" => Ok(ModSortKey::Kind),
        _ => bail!("Unknown sort key: {value}"),
    }
}

fn parse_lines(args: &[String]) -> Result<usize> {
    let mut lines = game_logs::TAIL_LINES;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let value = match arg.strip_prefix("--lines=") {
            Some(value) => value,
            None if arg == "--lines" || arg == "-n" => {
                iter.next().context("--lines requires a number")?
            }
            None => bail!("Unknown logs option: {arg}"),
        };
        lines = value
            .parse()
            .with_context(|| format!("invalid line count: {value}"))?;
    }
    Ok(lines)
}

struct Session {
    config: AppConfig,
    install_override: Option<PathBuf>,
}

impl Session {
    fn game_paths(&self) -> Result<GamePaths> {
        let install = self
            .install_override
            .as_deref()
            .or(self.config.install_path.as_deref());
        game::detect_paths(self.config.active_game, install)
    }

    fn scanner(&self) -> Result<PakScanner> {
        Ok(PakScanner::new(self.config.scan_options()?))
    }

    fn mods(&self) -> Result<Vec<ModEntry>> {
        library::scan_mods(&self.game_paths()?)
    }
}

fn run_command(mut session: Session, command: CliCommand, format: OutputFormat) -> Result<()> {
    match command {
        CliCommand::ModsList(options) => {
            let mods = session.mods()?;
            let entries = collect_conflicts(&mods, &session.scanner()?);
            list_mods(&mod_list_items(&mods, &entries, &options), format)
        }
        CliCommand::Conflicts => {
            let mods = session.mods()?;
            let scanner = session.scanner()?;
            list_conflicts(&collect_conflicts(&mods, &scanner), format)
        }
        CliCommand::PakInfo(path) => show_pak_info(&path, format),
        CliCommand::PakAssets(path) => {
            let assets = session.scanner()?.asset_paths(&path);
            print_list(&assets.into_iter().collect::<Vec<_>>(), format, "No asset paths found.")
        }
        CliCommand::SetEnabled { query, enabled } => {
            let mods = session.mods()?;
            let mod_entry = find_mod(&mods, &query)?;
            let path = library::set_enabled(mod_entry, enabled)?;
            let verb = if enabled { "Enabled" } else { "Disabled" };
            println!("{verb} {} ({})", mod_entry.display_name(), path.display());
            Ok(())
        }
        CliCommand::OrderSet(names) => {
            let mods = session.mods()?;
            let ordered = plan_load_order(&mods, &names)?;
            let placed = load_order::apply_load_order(&ordered);
            println!("Placed {} of {} pak(s) in load order", placed.len(), ordered.len());
            Ok(())
        }
        CliCommand::OrderReset => {
            let mods = session.mods()?;
            let paths: Vec<PathBuf> = mods
                .iter()
                .filter(|mod_entry| mod_entry.kind == ModKind::Pak)
                .map(|mod_entry| mod_entry.path.clone())
                .collect();
            let renamed = load_order::reset_load_order(&paths);
            println!("Reset load order prefix on {renamed} pak(s)");
            Ok(())
        }
        CliCommand::Logs { lines } => {
            let logs = game_logs::read_game_logs(&session.game_paths()?, lines);
            show_logs(&logs, format)
        }
        CliCommand::Paths => list_paths(&session, format),
        CliCommand::ConfigShow => show_config(&session.config, format),
        CliCommand::ConfigSetInstall(path) => {
            let paths = game::detect_paths(session.config.active_game, Some(&path))?;
            session.config.install_path = Some(paths.install_root.clone());
            session.config.save()?;
            log::info!("Install path set to {}", paths.install_root.display());
            println!("Install path: {}", paths.install_root.display());
            Ok(())
        }
        CliCommand::Help | CliCommand::Version => Ok(()),
    }
}

/// Scans conflicts and resolves winners using the scan order as load order.
fn collect_conflicts(mods: &[ModEntry], source: &impl AssetSource) -> Vec<ConflictEntry> {
    let records = conflicts::scan_conflicts(mods, source);
    let load_order: Vec<String> = mods
        .iter()
        .filter(|mod_entry| mod_entry.kind == ModKind::Pak && mod_entry.enabled)
        .map(|mod_entry| mod_entry.name.clone())
        .collect();
    conflicts::resolve_winners(&records, &load_order)
}

fn find_mod<'a>(mods: &'a [ModEntry], query: &str) -> Result<&'a ModEntry> {
    let matches: Vec<&ModEntry> = mods.iter().filter(|m| m.matches(query)).collect();
    match matches.as_slice() {
        [] => bail!("Unknown mod: {query}"),
        [single] => Ok(single),
        many => bail!(
            "Mod name is ambiguous: {query} ({})",
            many.iter()
                .map(|m| m.relative_path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Named paks first (in the given order), then every other enabled pak in its current order.
fn plan_load_order(mods: &[ModEntry], names: &[String]) -> Result<Vec<PathBuf>> {
    let mut ordered: Vec<&ModEntry> = Vec::new();
    for name in names {
        let mod_entry = find_mod(mods, name)?;
        if mod_entry.kind != ModKind::Pak || !mod_entry.enabled {
            bail!("{} is not an enabled pak", mod_entry.display_name());
        }
        if !ordered.iter().any(|existing| existing.path == mod_entry.path) {
            ordered.push(mod_entry);
        }
    }
    for mod_entry in mods {
        let is_enabled_pak = mod_entry.kind == ModKind::Pak && mod_entry.enabled;
        if is_enabled_pak && !ordered.iter().any(|existing| existing.path == mod_entry.path) {
            ordered.push(mod_entry);
        }
    }
    Ok(ordered.into_iter().map(|m| m.path.clone()).collect())
}

#[derive(Serialize)]
struct ModListItem {
    order: usize,
    name: String,
    display_name: String,
    kind: ModKind,
    enabled: bool,
    modified_at: Option<i64>,
    relative_path: String,
    conflicts: usize,
    status: Option<ConflictStatus>,
}

fn mod_list_items(
    mods: &[ModEntry],
    entries: &[ConflictEntry],
    options: &ModsListOptions,
) -> Vec<ModListItem> {
    let mut items: Vec<ModListItem> = mods
        .iter()
        .enumerate()
        .map(|(index, mod_entry)| {
            let (conflicts, status) =
                conflicts::mod_conflict_status(entries, &mod_entry.name, mod_entry.enabled);
            ModListItem {
                order: index + 1,
                name: mod_entry.name.clone(),
                display_name: mod_entry.display_name(),
                kind: mod_entry.kind,
                enabled: mod_entry.enabled,
                modified_at: mod_entry.modified_at,
                relative_path: mod_entry.relative_path.display().to_string(),
                conflicts,
                status,
            }
        })
        .collect();

    if let Some(filter) = &options.filter {
        let needle = filter.to_ascii_lowercase();
        items.retain(|item| item.display_name.to_ascii_lowercase().contains(&needle));
    }

    match options.sort {
        ModSortKey::Order => items.sort_by_key(|item| item.order),
        ModSortKey::Name => items.sort_by(|a, b| a.display_name.cmp(&b.display_name)),
        ModSortKey::Modified => items.sort_by_key(|item| item.modified_at.unwrap_or(0)),
        ModSortKey::Kind => items.sort_by_key(|item| item.kind.label()),
    }

    if options.reverse {
        items.reverse();
    }
    items
}

fn list_mods(items: &[ModListItem], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            for item in items {
                let enabled = if item.enabled { "x" } else { " " };
                let conflicts = if item.conflicts > 0 {
                    format!(
                        "{} conflict(s){}",
                        item.conflicts,
                        item.status
                            .map(|status| format!(", {}", status.label()))
                            .unwrap_or_default()
                    )
                } else {
                    "-".to_string()
                };
                println!(
                    "{order:>3} [{enabled}] {kind:<6} {modified} {path}  {conflicts}",
                    order = item.order,
                    kind = item.kind.label(),
                    modified = format_date_cell(item.modified_at),
                    path = item.relative_path
                );
            }
        }
    }

    Ok(())
}

fn list_conflicts(entries: &[ConflictEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No conflicts detected.");
            }
            for entry in entries {
                println!("{}", entry.asset);
                for candidate in &entry.candidates {
                    let marker = if *candidate == entry.winner { "*" } else { " " };
                    println!("  {marker} {candidate}");
                }
            }
        }
    }
    Ok(())
}

fn show_pak_info(path: &Path, format: OutputFormat) -> Result<()> {
    let info = pak::read_pak_info(path);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => match info {
            Some(info) => {
                println!("Version: {}", info.version);
                println!("Index offset: {}", info.index_offset);
                println!("Index size: {}", info.index_size);
                println!("Mount point: {}", info.mount_point);
            }
            None => println!("Not a recognized pak: {}", path.display()),
        },
    }
    Ok(())
}

fn print_list(values: &[String], format: OutputFormat, empty: &str) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(values)?);
        }
        OutputFormat::Text => {
            if values.is_empty() {
                println!("{empty}");
            }
            for value in values {
                println!("{value}");
            }
        }
    }
    Ok(())
}

fn show_logs(logs: &game_logs::GameLogs, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(logs)?);
        }
        OutputFormat::Text => {
            println!("== Game log ==");
            print_list(&logs.pal, format, "(empty)")?;
            println!();
            println!("== UE4SS log ==");
            print_list(&logs.ue4ss, format, "(empty)")?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PathsOutput {
    install_root: String,
    paks_dir: String,
    script_mods_dir: String,
    logs_dir: String,
    ue4ss_log: String,
    app_log: String,
    error: Option<String>,
}

fn list_paths(session: &Session, format: OutputFormat) -> Result<()> {
    let (paths, error) = match session.game_paths() {
        Ok(paths) => (Some(paths), None),
        Err(err) => (None, Some(format!("{err:#}"))),
    };
    let output = PathsOutput {
        install_root: display_or_empty(paths.as_ref().map(|p| p.install_root.as_path())),
        paks_dir: display_or_empty(paths.as_ref().map(|p| p.paks_dir.as_path())),
        script_mods_dir: display_or_empty(paths.as_ref().map(|p| p.script_mods_dir.as_path())),
        logs_dir: display_or_empty(paths.as_ref().map(|p| p.logs_dir.as_path())),
        ue4ss_log: display_or_empty(paths.as_ref().map(|p| p.ue4ss_log_path.as_path())),
        app_log: session.config.log_path().display().to_string(),
        error,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Install root: {}", output.install_root);
            println!("Paks: {}", output.paks_dir);
            println!("Script mods: {}", output.script_mods_dir);
            println!("Game logs: {}", output.logs_dir);
            println!("UE4SS log: {}", output.ue4ss_log);
            println!("App log: {}", output.app_log);
            if let Some(error) = output.error {
                println!("Warning: {error}");
            }
        }
    }

    Ok(())
}

fn display_or_empty(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_default()
}

fn show_config(config: &AppConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Text => {
            println!("Game: {}", config.active_game.display_name());
            let install = config
                .install_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "(auto-detect)".to_string());
            println!("Install path: {install}");
            println!("Scan ceiling: {} bytes", config.scan.size_ceiling_bytes);
            println!("Extensions: {}", config.scan.extensions.join(", "));
            println!(
                "Content root: {}",
                config
                    .scan
                    .content_root
                    .as_deref()
                    .unwrap_or_else(|| config.active_game.content_root())
            );
            println!("Config dir: {}", config.data_dir.display());
        }
    }
    Ok(())
}

fn print_help() {
    println!("pakwarden v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  pakwarden mods [list]                List pak and script mods");
    println!("  pakwarden conflicts                  Show assets shipped by several enabled paks");
    println!("  pakwarden pak info <file>            Show a pak footer");
    println!("  pakwarden pak assets <file>          List asset paths inside a pak");
    println!("  pakwarden enable <mod>               Enable a mod");
    println!("  pakwarden disable <mod>              Disable a mod");
    println!("  pakwarden order set <mod...>         Load the named paks first, in order");
    println!("  pakwarden order reset                Remove load order prefixes");
    println!("  pakwarden logs [--lines N]           Show the tail of the game and UE4SS logs");
    println!("  pakwarden paths                      Show detected paths");
    println!("  pakwarden config show                Show settings");
    println!("  pakwarden config set-install <path>  Remember the game install directory");
    println!();
    println!("Mods options:");
    println!("  --sort <order|name|modified|kind>    Sort key (default: order)");
    println!("  -r, --reverse                        Reverse the sort");
    println!("  --filter <text>                      Only show matching names");
    println!();
    println!("Global options:");
    println!("  --format <json|text>                 Output format");
    println!("  --install <path>                     Game install directory for this run");
    println!("  -q, --quiet                          Errors only");
    println!("  -v, -vv                              Increase verbosity");
    println!("  --verbosity <level>                  quiet | normal | verbose | debug");
    println!("  -h, --help                           Show help");
    println!("  -V, --version                        Show version");
}

fn format_date_cell(value: Option<i64>) -> String {
    value
        .filter(|timestamp| *timestamp > 0)
        .and_then(|timestamp| OffsetDateTime::from_unix_timestamp(timestamp).ok())
        .and_then(|date| date.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| "---- -- --".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pak::{tests::build_pak, AssetPattern, ScanOptions};
    use std::fs;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn global_options_are_pulled_out_anywhere() {
        let (global, tokens) =
            parse_global_options(&args(&["conflicts", "--format=json", "-vv", "--install", "/g"]))
                .unwrap();
        assert_eq!(global.format, OutputFormat::Json);
        assert_eq!(global.verbosity, Verbosity::Debug);
        assert_eq!(global.install, Some(PathBuf::from("/g")));
        assert_eq!(tokens, args(&["conflicts"]));

        assert!(parse_global_options(&args(&["--format", "xml"])).is_err());
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command(&[]).unwrap(), CliCommand::Help);
        assert_eq!(
            parse_command(&args(&["mods", "list", "--sort=name", "-r"])).unwrap(),
            CliCommand::ModsList(ModsListOptions {
                sort: ModSortKey::Name,
                reverse: true,
                filter: None,
            })
        );
        assert_eq!(
            parse_command(&args(&["pak", "assets", "a.pak"])).unwrap(),
            CliCommand::PakAssets(PathBuf::from("a.pak"))
        );
        assert_eq!(
            parse_command(&args(&["disable", "Hat"])).unwrap(),
            CliCommand::SetEnabled {
                query: "Hat".to_string(),
                enabled: false,
            }
        );
        assert_eq!(
            parse_command(&args(&["logs", "-n", "20"])).unwrap(),
            CliCommand::Logs { lines: 20 }
        );
        assert!(parse_command(&args(&["order", "set"])).is_err());
        assert!(parse_command(&args(&["pak", "info"])).is_err());
        assert!(parse_command(&args(&["frobnicate"])).is_err());
    }

    fn pak_mod(dir: &Path, name: &str, enabled: bool) -> ModEntry {
        ModEntry {
            name: name.to_string(),
            path: dir.join(name),
            relative_path: PathBuf::from(name),
            enabled,
            kind: ModKind::Pak,
            modified_at: None,
        }
    }

    #[test]
    fn load_order_plan_puts_named_paks_first() {
        let dir = Path::new("/paks");
        let mods = vec![
            pak_mod(dir, "z_000_A.pak", true),
            pak_mod(dir, "B.pak.disabled", false),
            pak_mod(dir, "z_001_C.pak", true),
            pak_mod(dir, "D.pak", true),
        ];
        let plan = plan_load_order(&mods, &args(&["D", "A"])).unwrap();
        assert_eq!(
            plan,
            vec![dir.join("D.pak"), dir.join("z_000_A.pak"), dir.join("z_001_C.pak")]
        );
        assert!(plan_load_order(&mods, &args(&["B"])).is_err());
        assert!(plan_load_order(&mods, &args(&["Nope"])).is_err());
    }

    #[test]
    fn conflicts_resolve_to_last_loaded_pak() {
        let dir = tempfile::tempdir().unwrap();
        let body = b"\x00/Pal/Content/Pal/Texture/Hat.uasset\x00";
        let mut mods = Vec::new();
        for (name, enabled) in [
            ("z_000_A.pak", true),
            ("z_001_B.pak", true),
            ("C.pak.disabled", false),
        ] {
            fs::write(dir.path().join(name), build_pak("../../../", body)).unwrap();
            mods.push(pak_mod(dir.path(), name, enabled));
        }
        let scanner = PakScanner::new(ScanOptions::new(
            AssetPattern::new("/Pal/Content/", &pak::DEFAULT_EXTENSIONS).unwrap(),
        ));

        let entries = collect_conflicts(&mods, &scanner);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].asset, "/pal/content/pal/texture/hat.uasset");
        assert_eq!(entries[0].candidates, args(&["z_000_A.pak", "z_001_B.pak"]));
        assert_eq!(entries[0].winner, "z_001_B.pak");
    }

    #[test]
    fn mods_list_marks_winning_and_losing_paks() {
        let dir = tempfile::tempdir().unwrap();
        let shared = b"\x00/Pal/Content/Pal/Texture/Hat.uasset\x00";
        let mut mods = Vec::new();
        for (name, enabled) in [
            ("z_000_A.pak", true),
            ("z_001_B.pak", true),
            ("Solo.pak", true),
            ("Old.pak.disabled", false),
        ] {
            let body: &[u8] = if name == "Solo.pak" {
                b"\x00/Pal/Content/Solo.uasset\x00"
            } else {
                shared
            };
            fs::write(dir.path().join(name), build_pak("../../../", body)).unwrap();
            mods.push(pak_mod(dir.path(), name, enabled));
        }
        let scanner = PakScanner::new(ScanOptions::new(
            AssetPattern::new("/Pal/Content/", &pak::DEFAULT_EXTENSIONS).unwrap(),
        ));
        let entries = collect_conflicts(&mods, &scanner);
        let options = ModsListOptions {
            sort: ModSortKey::Order,
            reverse: false,
            filter: None,
        };

        let items = mod_list_items(&mods, &entries, &options);
        let summary: Vec<(&str, usize, Option<ConflictStatus>)> = items
            .iter()
            .map(|item| (item.name.as_str(), item.conflicts, item.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("z_000_A.pak", 1, Some(ConflictStatus::Loses)),
                ("z_001_B.pak", 1, Some(ConflictStatus::Wins)),
                ("Solo.pak", 0, None),
                ("Old.pak.disabled", 0, None),
            ]
        );

        let json = serde_json::to_value(&items[1]).unwrap();
        assert_eq!(json["conflicts"], 1);
        assert_eq!(json["status"], "wins");
    }

    #[test]
    fn date_cell_formats_or_blanks() {
        assert_eq!(format_date_cell(Some(1_704_067_200)), "2024-01-01");
        assert_eq!(format_date_cell(None), "---- -- --");
        assert_eq!(format_date_cell(Some(0)), "---- -- --");
    }
}
