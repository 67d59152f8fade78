// numeric constants that describe the battle map grid
pub const GRID_W: i32 = 50;
pub const GRID_H: i32 = 28;
pub const TOTAL_CELLS: usize = (GRID_W * GRID_H) as usize;

/// Visual size of one cell, in screen units.
pub const CELL_WIDTH: f64 = 36.0;
pub const CELL_HEIGHT: f64 = 19.0;

/// Offset baked into the battle engine's coordinate skew. Kept opaque.
pub const BATTLE_SKEW_ORIGIN: f64 = 24.0;

/// Returned by token lookups before any map is loaded.
pub const UNKNOWN_TOKEN: char = '?';

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Terrain category of a non-exit cell. Exactly one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerrainKind {
    Passable,
    Impassable,
    Wall,
    WallWindow,
    Stone,
    Sandbag,
    BarbedWire,
    Hedgehog,
    Tree,
    Bush,
    Stump,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 11] = [
        TerrainKind::Passable,
        TerrainKind::Impassable,
        TerrainKind::Wall,
        TerrainKind::WallWindow,
        TerrainKind::Stone,
        TerrainKind::Sandbag,
        TerrainKind::BarbedWire,
        TerrainKind::Hedgehog,
        TerrainKind::Tree,
        TerrainKind::Bush,
        TerrainKind::Stump,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TerrainKind::Passable => "passable",
            TerrainKind::Impassable => "impassable",
            TerrainKind::Wall => "wall",
            TerrainKind::WallWindow => "wall-window",
            TerrainKind::Stone => "stone",
            TerrainKind::Sandbag => "sandbag",
            TerrainKind::BarbedWire => "barbed-wire",
            TerrainKind::Hedgehog => "hedgehog",
            TerrainKind::Tree => "tree",
            TerrainKind::Bush => "bush",
            TerrainKind::Stump => "stump",
        }
    }
}

/// What a cell *is*: the exit ring or a classified terrain cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Exit,
    Terrain(TerrainKind),
}

impl CellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CellKind::Exit => "exit",
            CellKind::Terrain(t) => t.as_str(),
        }
    }
}

impl Serialize for CellKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// ─────────────────────────────────────────────────────
/// Token configuration (sprite / props / visual per token)
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TokenProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passable: Option<bool>,
}

/// Placement tweaks for a token sprite. Never affects classification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenVisual {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(deserialize_with = "truthy")]
    pub center: bool,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "layer")]
    pub z: Option<i32>,
}

/// Any JSON value as a flag: `null`, `false`, `0` and `""` are false.
fn truthy<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Stacking layer from a number or numeric string, truncated towards zero.
/// Anything else means "unset".
fn layer<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i32>, D::Error> {
    let z = match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(z.filter(|z| z.is_finite())
        .map(|z| z.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32))
}

/// One layer of token configuration, keyed by token character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenConfig {
    pub sprites: HashMap<char, String>,
    pub props: HashMap<char, TokenProps>,
    pub visual: HashMap<char, TokenVisual>,
}

/// The locally persisted layer. Holds no sprite mapping on purpose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalOverrides {
    pub token_props: HashMap<char, TokenProps>,
    pub token_visual: HashMap<char, TokenVisual>,
}

/// Paths and fallback sprites used when resolving sprite files.
///
/// Every field has a default, so a partial JSON file only replaces what it
/// names.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetsConfig {
    pub sprites_base_path: String,
    pub tiles_base_path: String,
    pub default_sprite: String,
    pub object_sprite: String,
    pub background_tile: Option<String>,
    /// Login-prefix rules tried in order by the entity sprite resolver.
    pub sprite_prefixes: Vec<PrefixRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrefixRule {
    pub prefix: String,
    pub sprite: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            sprites_base_path: "exp/sprites/".into(),
            tiles_base_path: "exp/images/".into(),
            default_sprite: "1128.png".into(),
            object_sprite: "1125.png".into(),
            background_tile: None,
            sprite_prefixes: vec![
                PrefixRule {
                    prefix: "$rat".into(),
                    sprite: "1439.png".into(),
                },
                PrefixRule {
                    prefix: "$stich".into(),
                    sprite: "1441.png".into(),
                },
            ],
        }
    }
}

/// ─────────────────────────────────────────────────────
/// Collaborator data, 1-to-1 with the JSON the backend sends
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MapData {
    pub rows: Vec<String>,
}

/// A battle participant in battle coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Entity {
    pub login: String,
    #[serde(alias = "x")]
    pub bx: f64,
    #[serde(alias = "y")]
    pub by: f64,
    #[serde(default)]
    pub hp: i32,
    #[serde(rename = "maxHP", default)]
    pub max_hp: i32,
    #[serde(alias = "lvl", default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub def: i32,
}

fn default_level() -> i32 {
    1
}

impl Entity {
    /// `$`-prefixed logins are monsters, everything else is a player.
    pub fn is_monster(&self) -> bool {
        self.login.starts_with('$')
    }
}

/// A placed item in battle coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapObject {
    pub txt: String,
    #[serde(default)]
    pub count: u32,
    #[serde(alias = "x")]
    pub bx: f64,
    #[serde(alias = "y")]
    pub by: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BattleData {
    #[serde(default)]
    pub positions: Vec<Entity>,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

/// ─────────────────────────────────────────────────────
/// Per-cell state produced by the processor
/// ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "anchor")]
pub enum Anchor {
    /// Top-left corner of the cell, shifted by the offset.
    TopLeft { offset_x: f64, offset_y: f64 },
    /// Centred on the cell.
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteTransform {
    #[serde(flatten)]
    pub anchor: Anchor,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub z: i32,
}

/// A sprite file plus where and how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteRef {
    pub file: String,
    pub src: String,
    pub transform: SpriteTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Monster,
    Player,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    pub kind: EntityKind,
    pub login: String,
    pub hp: i32,
    #[serde(rename = "maxHP")]
    pub max_hp: i32,
    pub level: i32,
    pub def: i32,
    pub sprite: SpriteRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub txt: String,
    pub count: u32,
    pub sprite: SpriteRef,
}
