//! Loaders for everything the model consumes.
//!
//! Map and battle data are first read as the JSON the backend produces;
//! if that fails the raw battle log is parsed locally (see [`xml`]).
pub mod lexer;
pub mod xml;

use anyhow::{Result, anyhow};
use serde_json::Value;
use std::collections::HashMap;

use crate::model::{AssetsConfig, BattleData, MapData, TokenConfig, TokenProps, TokenVisual};
use crate::processor::config::token_from_key;

/// Map rows from `{ "rows": [...] }`, falling back to `<MAP v="..."/>` tags.
pub fn load_map(src: &str) -> Result<MapData> {
    match serde_json::from_str::<MapData>(src) {
        Ok(map) => Ok(map),
        Err(e) => {
            log::warn!("map is not JSON ({e}), parsing locally");
            xml::parse_map(src)
        }
    }
}

/// Battle records from `{ "positions": [...], "objects": [...] }`, falling
/// back to the `<BATTLE>` section of a raw log.
pub fn load_battle(src: &str) -> Result<BattleData> {
    match serde_json::from_str::<BattleData>(src) {
        Ok(battle) => Ok(battle),
        Err(e) => {
            log::warn!("battle is not JSON ({e}), parsing locally");
            xml::parse_battle(src)
        }
    }
}

/// Partial assets config; missing fields keep their defaults.
pub fn load_assets(src: &str) -> Result<AssetsConfig> {
    serde_json::from_str(src).map_err(|e| anyhow!("Failed to parse assets config: {}", e))
}

/// Parse a token sprite map in either format:
///
///   • `{ "tokens": { "T": { "sprite", "props", "visual" } } }`
///   • `{ "tokenToSprite": {..}, "tokenProps": {..}, "tokenVisual": {..} }`
///
/// Entries that are not objects, and keys that are not a single character,
/// are skipped.
pub fn load_token_map(json: &str) -> Result<TokenConfig> {
    let root: Value = serde_json::from_str(json)?;
    if !root.is_object() {
        return Err(anyhow!("token map must be a JSON object"));
    }

    let config = match root.get("tokens") {
        Some(tokens) => parse_token_dict(tokens)?,
        None => parse_legacy(&root),
    };
    log::info!(
        "token map: {} sprites, {} props, {} visuals",
        config.sprites.len(),
        config.props.len(),
        config.visual.len()
    );
    Ok(config)
}

fn parse_token_dict(tokens: &Value) -> Result<TokenConfig> {
    let entries = tokens
        .as_object()
        .ok_or_else(|| anyhow!("`tokens` is not an object"))?;

    let mut config = TokenConfig::default();
    for (key, def) in entries {
        let Some(token) = token_from_key(key) else {
            continue;
        };
        if !def.is_object() {
            log::warn!("token `{key}`: definition is not an object, skipped");
            continue;
        }

        if let Some(sprite) = def
            .get("sprite")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            config.sprites.insert(token, sprite.to_string());
        }
        if let Some(props) = typed::<TokenProps>(def.get("props"), key, "props") {
            config.props.insert(token, props);
        }
        if let Some(visual) = typed::<TokenVisual>(def.get("visual"), key, "visual") {
            config.visual.insert(token, visual);
        }
    }
    Ok(config)
}

fn parse_legacy(root: &Value) -> TokenConfig {
    let sprites: HashMap<char, String> = section(root, "tokenToSprite")
        .into_iter()
        .filter_map(|(token, v)| {
            v.as_str()
                .filter(|s| !s.is_empty())
                .map(|s| (token, s.to_string()))
        })
        .collect();
    let props: HashMap<char, TokenProps> = section(root, "tokenProps")
        .into_iter()
        .filter_map(|(token, v)| typed(Some(&v), &token.to_string(), "props").map(|p| (token, p)))
        .collect();
    let visual: HashMap<char, TokenVisual> = section(root, "tokenVisual")
        .into_iter()
        .filter_map(|(token, v)| typed(Some(&v), &token.to_string(), "visual").map(|p| (token, p)))
        .collect();
    TokenConfig {
        sprites,
        props,
        visual,
    }
}

/// Entries of one legacy section keyed by token.
fn section(root: &Value, name: &str) -> Vec<(char, Value)> {
    root.get(name)
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| token_from_key(k).map(|t| (t, v.clone())))
                .collect()
        })
        .unwrap_or_default()
}

/// Decode one token entry, logging and skipping it when malformed.
pub(crate) fn typed<T: serde::de::DeserializeOwned>(
    value: Option<&Value>,
    key: &str,
    what: &str,
) -> Option<T> {
    let value = value.filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("token `{key}`: bad {what} ({e}), skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_dict_format() {
        let json = r#"{
            "tokens": {
                "R": { "sprite": "tree.png", "visual": { "center": true, "scaleX": 1.2, "z": 6 } },
                "A": { "sprite": "s1.png", "props": { "passable": false } },
                "0": { "props": { "passable": true } },
                "X": null,
                "long": { "sprite": "nope.png" },
                "E": { "sprite": "" }
            }
        }"#;
        let cfg = load_token_map(json).unwrap();

        assert_eq!(cfg.sprites.len(), 2);
        assert_eq!(cfg.sprites[&'R'], "tree.png");
        assert_eq!(cfg.props[&'A'].passable, Some(false));
        assert_eq!(cfg.props[&'0'].passable, Some(true));
        let v = &cfg.visual[&'R'];
        assert!(v.center);
        assert_eq!(v.scale_x, Some(1.2));
        assert_eq!(v.z, Some(6));
    }

    #[test]
    fn test_legacy_format() {
        let json = r#"{
            "tokenToSprite": { "R": "tree.png", "L": 5 },
            "tokenProps": { "R": { "passable": false } },
            "tokenVisual": { "R": { "offsetX": 2, "offsetY": -1 } }
        }"#;
        let cfg = load_token_map(json).unwrap();
        assert_eq!(cfg.sprites.len(), 1);
        assert_eq!(cfg.props[&'R'].passable, Some(false));
        assert_eq!(cfg.visual[&'R'].offset_x, Some(2.0));
        assert_eq!(cfg.visual[&'R'].offset_y, Some(-1.0));
        assert!(!cfg.visual[&'R'].center);
    }

    #[test]
    fn test_visual_values_are_coerced() {
        let json = r#"{
            "tokens": {
                "R": { "visual": { "center": null, "z": 5.7 } },
                "L": { "visual": { "center": 1, "z": "7" } },
                "K": { "visual": { "center": "", "z": null } },
                "B": { "visual": { "z": "top" } }
            }
        }"#;
        let cfg = load_token_map(json).unwrap();

        assert!(!cfg.visual[&'R'].center);
        assert_eq!(cfg.visual[&'R'].z, Some(5));
        assert!(cfg.visual[&'L'].center);
        assert_eq!(cfg.visual[&'L'].z, Some(7));
        assert!(!cfg.visual[&'K'].center);
        assert_eq!(cfg.visual[&'K'].z, None);
        assert_eq!(cfg.visual[&'B'].z, None);
    }

    #[test]
    fn test_legacy_empty_sections() {
        let cfg = load_token_map("{}").unwrap();
        assert_eq!(cfg, TokenConfig::default());
        assert!(load_token_map("[1, 2]").is_err());
        assert!(load_token_map("not json").is_err());
    }

    #[test]
    fn test_map_json_then_xml() {
        let map = load_map(r#"{ "rows": ["A0", "PP"] }"#).unwrap();
        assert_eq!(map.rows.len(), 2);

        let map = load_map("<LOG>\n<MAP v=\"AB\"/>\n</LOG>").unwrap();
        assert_eq!(map.rows, vec!["AB".to_string()]);

        assert!(load_map("garbage").is_err());
    }

    #[test]
    fn test_battle_json_field_names() {
        let json = r#"{
            "positions": [
                { "login": "$rat1", "x": 5, "y": 3, "hp": 10, "maxHP": 20, "lvl": 4 },
                { "login": "Player1", "bx": 20, "by": 10, "hp": 80, "maxHP": 100, "level": 9, "def": 3 }
            ],
            "objects": [ { "txt": "Ammo", "count": 30, "x": 21, "y": 11 } ]
        }"#;
        let battle = load_battle(json).unwrap();
        assert_eq!(battle.positions[0].level, 4);
        assert_eq!(battle.positions[0].def, 0);
        assert_eq!(battle.positions[1].def, 3);
        assert_eq!((battle.positions[1].bx, battle.positions[1].by), (20.0, 10.0));
        assert_eq!(battle.objects[0].count, 30);
    }

    #[test]
    fn test_battle_falls_back_to_log() {
        let src = r#"<BATTLE><USER login="P" level="1" HP="1" maxHP="2" bx="20" by="10"/></BATTLE>"#;
        let battle = load_battle(src).unwrap();
        assert_eq!(battle.positions.len(), 1);
        assert!(load_battle("nothing here").is_err());
    }

    #[test]
    fn test_partial_assets_config() {
        let assets = load_assets(r#"{ "defaultSprite": "x.png" }"#).unwrap();
        assert_eq!(assets.default_sprite, "x.png");
        assert_eq!(assets.object_sprite, "1125.png");
        assert_eq!(assets.sprite_prefixes.len(), 2);
    }
}
