//! The functional core: grid, classification, config layers and
//! placement. Nothing in here does I/O except through a `SettingsStore`.
pub mod classify;
pub mod config;
pub mod grid;
pub mod hex_map;
pub mod resolver;

pub use config::{FileStore, MemoryStore, SettingsStore, TokenLayers};
pub use grid::{Grid, battle_to_grid, cell_position};
pub use hex_map::{CellView, GridStats, HexGridModel, PlacementReport};
pub use resolver::{PrefixResolver, ResolverChain, SpriteResolver};

use crate::model::{AssetsConfig, BattleData, MapData, TokenConfig, TokenProps};

/// Everything one session loads, already parsed. Absent parts are skipped.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub assets: Option<AssetsConfig>,
    pub token_config: Option<TokenConfig>,
    pub map: Option<MapData>,
    pub battle: Option<BattleData>,
    /// Local passability edits, persisted through the store.
    pub passable_edits: Vec<(char, bool)>,
    pub select: Option<(i32, i32)>,
}

/// Runs every processing pass and returns the model for writers.
pub fn run(session: &Session, store: &mut dyn SettingsStore) -> HexGridModel {
    let mut model = HexGridModel::new();
    if let Some(assets) = &session.assets {
        model.set_assets_config(assets.clone());
    }

    model.load_local_overrides(store);
    if let Some(base) = &session.token_config {
        model.set_token_config(base.clone());
    }
    for &(token, passable) in &session.passable_edits {
        let props = TokenProps {
            passable: Some(passable),
        };
        model.set_token_props(token, props, store);
    }

    if let Some(map) = &session.map {
        model.apply_map_rows(&map.rows);
    }
    if let Some(battle) = &session.battle {
        let report = model.apply_battle_data(battle);
        log::info!(
            "placed {} entities and {} objects",
            report.entities_placed,
            report.objects_placed
        );
    }
    if let Some((x, y)) = session.select {
        model.toggle_selection(x, y);
    }
    model
}
