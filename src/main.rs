mod cli;
mod config;
mod conflicts;
mod game;
mod game_logs;
mod library;
mod load_order;
mod logging;
mod mods_txt;
mod pak;
mod palworld;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
