use crate::{
    library::{ModEntry, ModKind},
    pak::AssetSource,
};
use serde::Serialize;
use std::collections::HashMap;

/// An asset shipped by more than one enabled pak, providers in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub asset: String,
    pub mods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    pub asset: String,
    pub candidates: Vec<String>,
    pub winner: String,
}

pub fn scan_conflicts(mods: &[ModEntry], source: &impl AssetSource) -> Vec<ConflictRecord> {
    let mut providers: HashMap<String, Vec<String>> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    let mut scanned = 0usize;

    for mod_entry in mods
        .iter()
        .filter(|mod_entry| mod_entry.kind == ModKind::Pak && mod_entry.enabled)
    {
        scanned += 1;
        for asset in source.asset_paths(&mod_entry.path) {
            let list = providers.entry(asset).or_insert_with_key(|asset| {
                first_seen.push(asset.clone());
                Vec::new()
            });
            list.push(mod_entry.name.clone());
        }
    }

    let conflicts: Vec<ConflictRecord> = first_seen
        .into_iter()
        .filter_map(|asset| {
            let mods = providers.remove(&asset)?;
            (mods.len() > 1).then_some(ConflictRecord { asset, mods })
        })
        .collect();
    log::info!(
        "Conflict scan: {} pak(s) scanned, {} contested asset(s)",
        scanned,
        conflicts.len()
    );
    conflicts
}

/// Picks the provider loaded last according to `load_order`.
///
/// Providers missing from `load_order` rank below every listed mod; among equals
/// the later provider in the record wins.
pub fn resolve_winners(records: &[ConflictRecord], load_order: &[String]) -> Vec<ConflictEntry> {
    let rank: HashMap<&str, usize> = load_order
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index + 1))
        .collect();

    records
        .iter()
        .filter_map(|record| {
            let winner = record
                .mods
                .iter()
                .enumerate()
                .max_by_key(|(index, name)| {
                    (rank.get(name.as_str()).copied().unwrap_or(0), *index)
                })
                .map(|(_, name)| name.clone())?;
            Some(ConflictEntry {
                asset: record.asset.clone(),
                candidates: record.mods.clone(),
                winner,
            })
        })
        .collect()
}

/// How an enabled pak fares across the conflicts it takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Wins,
    Loses,
}

impl ConflictStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConflictStatus::Wins => "wins",
            ConflictStatus::Loses => "loses",
        }
    }
}

/// Counts the conflicts `mod_name` is a candidate in.
///
/// The status is only set for enabled mods with at least one conflict: `Wins` when
/// the mod wins every one of them, `Loses` as soon as it loses any.
pub fn mod_conflict_status(
    entries: &[ConflictEntry],
    mod_name: &str,
    enabled: bool,
) -> (usize, Option<ConflictStatus>) {
    let involved: Vec<&ConflictEntry> = entries
        .iter()
        .filter(|entry| entry.candidates.iter().any(|name| name == mod_name))
        .collect();
    if !enabled || involved.is_empty() {
        return (involved.len(), None);
    }
    let status = if involved.iter().all(|entry| entry.winner == mod_name) {
        ConflictStatus::Wins
    } else {
        ConflictStatus::Loses
    };
    (involved.len(), Some(status))
}
