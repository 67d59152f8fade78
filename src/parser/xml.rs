//! Local parse path for raw battle logs, used when the JSON form is not
//! available.
//!
//! Map rows come from `<MAP v="..."/>` tags. Entities and objects come from
//! tags inside `<BATTLE>...</BATTLE>` and are recognised by their
//! attributes, not by tag name.

use anyhow::{Result, anyhow};
use std::collections::HashMap;

use super::lexer::{Lexer, Token};
use crate::model::{BattleData, Entity, MapData, MapObject};

/// One tag with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: HashMap<String, String>,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Non-negative integer attribute.
    fn number(&self, name: &str) -> Option<u32> {
        self.attr(name)?.trim().parse().ok()
    }
}

#[derive(Debug)]
enum Item {
    Tag(Tag),
    Close(String),
}

/// Group the token stream into tags and closing tags. Broken tags are
/// dropped.
fn items(src: &str) -> Vec<Item> {
    let mut out = Vec::new();
    let mut current: Option<Tag> = None;

    for tok in Lexer::new(src) {
        let tok = match tok {
            Ok(tok) => tok,
            Err(e) => {
                log::warn!("skipping malformed markup: {e}");
                current = None;
                continue;
            }
        };
        match tok {
            Token::Open(name) => {
                if let Some(tag) = current.take() {
                    out.push(Item::Tag(tag));
                }
                current = Some(Tag {
                    name,
                    attrs: HashMap::new(),
                });
            }
            Token::Attr { name, value } => {
                if let Some(tag) = current.as_mut() {
                    tag.attrs.insert(name, value);
                }
            }
            Token::TagEnd => {
                if let Some(tag) = current.take() {
                    out.push(Item::Tag(tag));
                }
            }
            Token::Close(name) => out.push(Item::Close(name)),
        }
    }
    if let Some(tag) = current {
        out.push(Item::Tag(tag));
    }
    out
}

/// Collect map rows from every `<MAP v="...">` tag, in order.
pub fn parse_map(src: &str) -> Result<MapData> {
    let rows: Vec<String> = items(src)
        .into_iter()
        .filter_map(|item| match item {
            Item::Tag(tag) if tag.name == "MAP" => tag.attr("v").map(str::to_string),
            _ => None,
        })
        .collect();

    if rows.is_empty() {
        return Err(anyhow!("no <MAP v=\"...\"> rows found"));
    }
    log::debug!("found {} map rows", rows.len());
    Ok(MapData { rows })
}

fn entity_from(tag: &Tag) -> Option<Entity> {
    let login = tag.attr("login")?;
    let level = tag.number("level")?;
    let hp = tag.number("HP")?;
    let bx = tag.number("bx")?;
    let by = tag.number("by")?;
    let max_hp = tag.number("maxHP")?;
    Some(Entity {
        login: login.to_string(),
        bx: f64::from(bx),
        by: f64::from(by),
        hp: i32::try_from(hp).ok()?,
        max_hp: i32::try_from(max_hp).ok()?,
        // level 0 in the log means "unknown"
        level: i32::try_from(level).ok().filter(|l| *l > 0).unwrap_or(1),
        // the log carries no defense value
        def: 0,
    })
}

fn object_from(tag: &Tag) -> Option<MapObject> {
    let bx = tag.number("bx")?;
    let by = tag.number("by")?;
    let txt = tag.attr("txt")?;
    let count = tag.number("count")?;
    Some(MapObject {
        txt: txt.to_string(),
        count,
        bx: f64::from(bx),
        by: f64::from(by),
    })
}

/// Entities and objects from the `<BATTLE>` section.
///
/// A tag with `login`, `level`, `HP`, `maxHP`, `bx`, `by` is an entity; one
/// with `bx`, `by`, `txt`, `count` is an object. A tag may be both.
pub fn parse_battle(src: &str) -> Result<BattleData> {
    let items = items(src);
    let start = items
        .iter()
        .position(|item| matches!(item, Item::Tag(tag) if tag.name == "BATTLE"))
        .ok_or_else(|| anyhow!("<BATTLE> tag not found"))?;

    let mut battle = BattleData::default();
    for item in &items[start + 1..] {
        let tag = match item {
            Item::Tag(tag) => tag,
            Item::Close(name) if name == "BATTLE" => break,
            Item::Close(_) => continue,
        };
        if let Some(entity) = entity_from(tag) {
            battle.positions.push(entity);
        }
        if let Some(object) = object_from(tag) {
            battle.objects.push(object);
        }
    }

    log::debug!(
        "found {} entities and {} objects in <BATTLE>",
        battle.positions.len(),
        battle.objects.len()
    );
    Ok(battle)
}
