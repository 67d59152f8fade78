//! The battle map model: grid, token layers, entity placement and
//! selection.
//!
//! Every mutation takes `&mut self` and runs to completion, so a query
//! never sees a half-applied map or battle.

use serde::Serialize;
use std::collections::BTreeMap;

use super::classify::{classify_token, entity_transform, object_transform, tile_transform};
use super::config::{SettingsStore, TokenLayers};
use super::grid::{Cell, Grid, ScreenPos, battle_to_grid, cell_position};
use super::resolver::ResolverChain;
use crate::model::{
    AssetsConfig, BattleData, CellKind, EntityInfo, EntityKind, ObjectInfo, SpriteRef,
    SpriteTransform, TokenConfig, TokenProps, TokenVisual, UNKNOWN_TOKEN,
};

/// Outcome of one `apply_battle_data` call. Drops are diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub entities_placed: usize,
    pub entities_dropped: usize,
    pub objects_placed: usize,
    pub objects_dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStats {
    pub hexes: usize,
    pub monsters: usize,
    pub players: usize,
    pub objects: usize,
    pub selected: usize,
    /// How often each token occurs in the loaded map rows.
    pub token_counts: BTreeMap<char, usize>,
}

/// Read-only projection of one cell for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView<'a> {
    pub x: i32,
    pub y: i32,
    pub label: String,
    pub position: ScreenPos,
    pub kind: CellKind,
    pub token: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite: Option<&'a SpriteRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<&'a EntityInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a ObjectInfo>,
    pub selected: bool,
}

#[derive(Debug)]
pub struct HexGridModel {
    grid: Grid,
    assets: AssetsConfig,
    layers: TokenLayers,
    resolvers: ResolverChain,
    rows: Option<Vec<String>>,
    selected: Option<(i32, i32)>,
}

impl Default for HexGridModel {
    fn default() -> Self {
        Self::new()
    }
}

impl HexGridModel {
    /// A 50×28 grid with default assets.
    pub fn new() -> Self {
        Self::with_grid(Grid::default())
    }

    pub fn with_grid(grid: Grid) -> Self {
        let assets = AssetsConfig::default();
        Self {
            grid,
            resolvers: ResolverChain::from_prefixes(&assets.sprite_prefixes),
            assets,
            layers: TokenLayers::new(),
            rows: None,
            selected: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn assets(&self) -> &AssetsConfig {
        &self.assets
    }

    pub fn layers(&self) -> &TokenLayers {
        &self.layers
    }

    /// Replace the assets config. The resolver chain is rebuilt from the
    /// new prefix rules, so custom strategies must be added afterwards.
    pub fn set_assets_config(&mut self, assets: AssetsConfig) {
        self.resolvers = ResolverChain::from_prefixes(&assets.sprite_prefixes);
        self.assets = assets;
    }

    pub fn resolvers_mut(&mut self) -> &mut ResolverChain {
        &mut self.resolvers
    }

    /// Background tile path, if one is configured.
    pub fn background_tile_src(&self) -> Option<String> {
        self.assets
            .background_tile
            .as_ref()
            .filter(|f| !f.is_empty())
            .map(|f| format!("{}{}", self.assets.tiles_base_path, f))
    }

    // ── token layers ────────────────────────────────────────────────

    /// Install a freshly loaded token-map file as the base layer.
    pub fn set_token_config(&mut self, base: TokenConfig) {
        self.layers.set_base(base);
        self.reapply_map();
    }

    /// Read the persisted overrides and merge them on top of the base.
    pub fn load_local_overrides(&mut self, store: &dyn SettingsStore) {
        self.layers.load_overrides(store);
        self.reapply_map();
    }

    pub fn set_token_props(&mut self, token: char, props: TokenProps, store: &mut dyn SettingsStore) {
        self.layers.set_token_props(token, props, store);
        self.reapply_map();
    }

    pub fn set_token_visual(
        &mut self,
        token: char,
        visual: TokenVisual,
        store: &mut dyn SettingsStore,
    ) {
        self.layers.set_token_visual(token, visual, store);
        self.reapply_map();
    }

    fn reapply_map(&mut self) {
        if let Some(rows) = self.rows.take() {
            self.apply_map_rows(&rows);
        }
    }

    fn sprite_ref(&self, file: &str, transform: SpriteTransform) -> SpriteRef {
        SpriteRef {
            file: file.to_string(),
            src: format!("{}{}", self.assets.sprites_base_path, file),
            transform,
        }
    }

    // ── map data ────────────────────────────────────────────────────

    /// Classify cells from map rows, replacing the previous map. Row `ry`,
    /// column `rx` lands on grid cell `(rx + 1, ry + 1)`; characters outside
    /// the grid are skipped and exit cells keep their kind. Cells the rows do
    /// not cover fall back to passable. Battle markers are kept.
    pub fn apply_map_rows<S: AsRef<str>>(&mut self, rows: &[S]) {
        self.grid.reset_terrain();
        let mut classified = 0usize;
        for (ry, row) in rows.iter().enumerate() {
            for (rx, token) in row.as_ref().chars().enumerate() {
                let (Ok(x), Ok(y)) = (i32::try_from(rx + 1), i32::try_from(ry + 1)) else {
                    continue;
                };
                if !self.grid.contains(x, y) || self.grid.is_exit_zone(x, y) {
                    continue;
                }

                let config = self.layers.merged();
                let kind = CellKind::Terrain(classify_token(token, config));
                let sprite = config.sprites.get(&token).map(|file| {
                    self.sprite_ref(file, tile_transform(config.visual.get(&token)))
                });

                if let Some(cell) = self.grid.get_mut(x, y) {
                    cell.kind = kind;
                    cell.sprite = sprite;
                    classified += 1;
                }
            }
        }
        self.rows = Some(rows.iter().map(|r| r.as_ref().to_string()).collect());
        log::debug!("classified {classified} cells from {} map rows", rows.len());
    }

    /// Map token under grid cell `(x, y)`, or `'?'` when unknown.
    pub fn token_at(&self, x: i32, y: i32) -> char {
        let Some(rows) = &self.rows else {
            return UNKNOWN_TOKEN;
        };
        let (Ok(rx), Ok(ry)) = (usize::try_from(x - 1), usize::try_from(y - 1)) else {
            return UNKNOWN_TOKEN;
        };
        rows.get(ry)
            .and_then(|row| row.chars().nth(rx))
            .unwrap_or(UNKNOWN_TOKEN)
    }

    /// Forget the map and battle, restoring every cell to its base kind.
    pub fn clear_map(&mut self) {
        self.grid.reset();
        self.rows = None;
    }

    // ── battle data ─────────────────────────────────────────────────

    /// Replace all entity and object markers with `battle`.
    pub fn apply_battle_data(&mut self, battle: &BattleData) -> PlacementReport {
        for cell in self.grid.iter_mut() {
            cell.entity = None;
            cell.object = None;
        }

        let mut report = PlacementReport::default();

        for entity in &battle.positions {
            let (x, y) = battle_to_grid(entity.bx, entity.by);
            if !self.grid.contains(x, y) {
                log::debug!(
                    "entity {} out of bounds: bx={}, by={} -> x={x}, y={y}",
                    entity.login,
                    entity.bx,
                    entity.by
                );
                report.entities_dropped += 1;
                continue;
            }

            let file = self
                .resolvers
                .resolve(&entity.login, &self.assets.default_sprite);
            let info = EntityInfo {
                kind: if entity.is_monster() {
                    EntityKind::Monster
                } else {
                    EntityKind::Player
                },
                login: entity.login.clone(),
                hp: entity.hp,
                max_hp: entity.max_hp,
                level: entity.level,
                def: entity.def,
                sprite: self.sprite_ref(&file, entity_transform()),
            };
            log::debug!(
                "entity {} at {x},{y} ({})",
                entity.login,
                self.grid.cell_label(x, y)
            );
            if let Some(cell) = self.grid.get_mut(x, y) {
                cell.entity = Some(info);
                report.entities_placed += 1;
            }
        }

        for object in &battle.objects {
            let (x, y) = battle_to_grid(object.bx, object.by);
            if !self.grid.contains(x, y) {
                log::debug!(
                    "object {} out of bounds: bx={}, by={} -> x={x}, y={y}",
                    object.txt,
                    object.bx,
                    object.by
                );
                report.objects_dropped += 1;
                continue;
            }

            let info = ObjectInfo {
                txt: object.txt.clone(),
                count: object.count,
                sprite: self.sprite_ref(&self.assets.object_sprite, object_transform()),
            };
            if let Some(cell) = self.grid.get_mut(x, y) {
                cell.object = Some(info);
                report.objects_placed += 1;
            }
        }

        if report.entities_dropped + report.objects_dropped > 0 {
            log::info!(
                "dropped {} entities and {} objects outside the grid",
                report.entities_dropped,
                report.objects_dropped
            );
        }
        report
    }

    // ── selection ───────────────────────────────────────────────────

    /// Single selection: toggles off if `(x, y)` is already selected,
    /// otherwise it becomes the only selected cell. Returns whether the
    /// cell ends up selected.
    pub fn toggle_selection(&mut self, x: i32, y: i32) -> bool {
        if !self.grid.contains(x, y) {
            return false;
        }
        if self.selected == Some((x, y)) {
            self.selected = None;
            false
        } else {
            self.selected = Some((x, y));
            true
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<(i32, i32)> {
        self.selected
    }

    // ── read views ──────────────────────────────────────────────────

    fn view<'a>(&'a self, cell: &'a Cell) -> CellView<'a> {
        CellView {
            x: cell.x,
            y: cell.y,
            label: self.grid.cell_label(cell.x, cell.y),
            position: cell_position(cell.x, cell.y),
            kind: cell.kind,
            token: self.token_at(cell.x, cell.y),
            sprite: cell.sprite.as_ref(),
            entity: cell.entity.as_ref(),
            object: cell.object.as_ref(),
            selected: self.selected == Some((cell.x, cell.y)),
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<CellView<'_>> {
        self.grid.get(x, y).map(|c| self.view(c))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellView<'_>> {
        self.grid.iter().map(|c| self.view(c))
    }

    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            hexes: self.grid.len(),
            selected: usize::from(self.selected.is_some()),
            ..GridStats::default()
        };
        for cell in self.grid.iter() {
            match cell.entity.as_ref().map(|e| e.kind) {
                Some(EntityKind::Monster) => stats.monsters += 1,
                Some(EntityKind::Player) => stats.players += 1,
                None => {}
            }
            if cell.object.is_some() {
                stats.objects += 1;
            }
        }
        for token in self.rows.iter().flatten().flat_map(|r| r.chars()) {
            *stats.token_counts.entry(token).or_insert(0) += 1;
        }
        stats
    }
}
