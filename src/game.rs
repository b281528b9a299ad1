use crate::palworld;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    #[default]
    Palworld,
}

impl GameId {
    pub fn display_name(self) -> &'static str {
        match self {
            GameId::Palworld => palworld::GAME_NAME,
        }
    }

    /// Virtual root every asset path of this game starts with.
    pub fn content_root(self) -> &'static str {
        match self {
            GameId::Palworld => palworld::CONTENT_ROOT,
        }
    }
}

pub fn detect_paths(game: GameId, install_override: Option<&Path>) -> Result<palworld::GamePaths> {
    match game {
        GameId::Palworld => palworld::detect_paths(install_override),
    }
}
