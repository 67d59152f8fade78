//! Token classification and sprite placement transforms.

use crate::model::{
    Anchor, CELL_HEIGHT, CELL_WIDTH, SpriteTransform, TerrainKind, TokenConfig, TokenVisual,
};

const TILE_Z: i32 = 5;
const ENTITY_Z: i32 = 10;
const OBJECT_Z: i32 = 5;
const OBJECT_WIDTH: f64 = 30.0;
const OBJECT_HEIGHT: f64 = 15.0;

/// Classify a map token against the merged token config.
///
/// First match wins:
/// 1. explicit `props.passable`
/// 2. any sprite mapping ⇒ passable
/// 3. `'A'..='O'` ⇒ passable
/// 4. the fixed literal table
/// 5. impassable
pub fn classify_token(token: char, config: &TokenConfig) -> TerrainKind {
    if let Some(passable) = config.props.get(&token).and_then(|p| p.passable) {
        return if passable {
            TerrainKind::Passable
        } else {
            TerrainKind::Impassable
        };
    }
    if config.sprites.contains_key(&token) {
        return TerrainKind::Passable;
    }
    if ('A'..='O').contains(&token) {
        return TerrainKind::Passable;
    }
    literal_kind(token).unwrap_or(TerrainKind::Impassable)
}

// B, C and D sit inside 'A'..='O' and never reach this table.
fn literal_kind(token: char) -> Option<TerrainKind> {
    let kind = match token {
        'P' => TerrainKind::Sandbag,
        'D' => TerrainKind::Wall,
        'C' => TerrainKind::WallWindow,
        'B' => TerrainKind::Stone,
        'Z' => TerrainKind::Hedgehog,
        'R' => TerrainKind::Tree,
        'L' => TerrainKind::Bush,
        'K' => TerrainKind::Stump,
        _ => return None,
    };
    Some(kind)
}

/// A zero or missing scale means "unscaled".
fn scale(v: Option<f64>) -> f64 {
    v.filter(|s| *s != 0.0).unwrap_or(1.0)
}

/// Placement of a terrain sprite, full cell size.
pub fn tile_transform(visual: Option<&TokenVisual>) -> SpriteTransform {
    let default = TokenVisual::default();
    let v = visual.unwrap_or(&default);
    let anchor = if v.center {
        Anchor::Center
    } else {
        Anchor::TopLeft {
            offset_x: v.offset_x.unwrap_or(0.0),
            offset_y: v.offset_y.unwrap_or(0.0),
        }
    };
    SpriteTransform {
        anchor,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
        scale_x: scale(v.scale_x),
        scale_y: scale(v.scale_y),
        z: v.z.unwrap_or(TILE_Z),
    }
}

/// Entities are centred, full cell size, above terrain.
pub fn entity_transform() -> SpriteTransform {
    SpriteTransform {
        anchor: Anchor::Center,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
        scale_x: 1.0,
        scale_y: 1.0,
        z: ENTITY_Z,
    }
}

pub fn object_transform() -> SpriteTransform {
    SpriteTransform {
        anchor: Anchor::Center,
        width: OBJECT_WIDTH,
        height: OBJECT_HEIGHT,
        scale_x: 1.0,
        scale_y: 1.0,
        z: OBJECT_Z,
    }
}
