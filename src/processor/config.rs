//! Layered token configuration.
//!
//! The token-map file is the base layer. Locally persisted overrides are
//! applied on top and may shadow `props`/`visual` per token, but never the
//! token → sprite mapping itself.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::{LocalOverrides, TokenConfig, TokenProps, TokenVisual};
use crate::parser::typed;

/// Key-value persistence for the override layer.
pub trait SettingsStore {
    /// Raw stored payload, `None` if nothing was stored yet.
    fn read(&self) -> Result<Option<String>>;
    fn write(&mut self, raw: &str) -> Result<()>;
}

/// Settings kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Reading {}", self.path.display())),
        }
    }

    fn write(&mut self, raw: &str) -> Result<()> {
        fs::write(&self.path, raw).with_context(|| format!("Writing {}", self.path.display()))
    }
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub raw: Option<String>,
}

impl MemoryStore {
    pub fn with(raw: &str) -> Self {
        Self {
            raw: Some(raw.to_string()),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.raw.clone())
    }

    fn write(&mut self, raw: &str) -> Result<()> {
        self.raw = Some(raw.to_string());
        Ok(())
    }
}

/// On-disk shape of the override layer.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredOverrides {
    token_props: BTreeMap<String, TokenProps>,
    token_visual: BTreeMap<String, TokenVisual>,
}

/// Map keys are single characters; anything else is skipped.
pub(crate) fn token_from_key(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => {
            log::warn!("ignoring token key `{key}`: not a single character");
            None
        }
    }
}

/// Decode the stored layer entry by entry. Only a payload that is not a
/// JSON object fails; malformed entries are skipped and unknown keys
/// (including any stray `tokenToSprite`) are ignored.
fn decode_overrides(raw: &str) -> Result<LocalOverrides> {
    let root: Value = serde_json::from_str(raw)?;
    if !root.is_object() {
        return Err(anyhow!("settings must be a JSON object"));
    }
    Ok(LocalOverrides {
        token_props: decode_section(&root, "tokenProps", "props"),
        token_visual: decode_section(&root, "tokenVisual", "visual"),
    })
}

fn decode_section<T: DeserializeOwned>(root: &Value, name: &str, what: &str) -> HashMap<char, T> {
    let Some(entries) = root.get(name).and_then(Value::as_object) else {
        return HashMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            let token = token_from_key(key)?;
            typed(Some(value), key, what).map(|v| (token, v))
        })
        .collect()
}

fn encode_overrides(overrides: &LocalOverrides) -> Result<String> {
    let stored = StoredOverrides {
        token_props: overrides
            .token_props
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        token_visual: overrides
            .token_visual
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&stored)?)
}

/// Read the override layer. Missing, unreadable or corrupt settings all
/// yield empty overrides.
pub fn read_overrides(store: &dyn SettingsStore) -> LocalOverrides {
    let raw = match store.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return LocalOverrides::default(),
        Err(e) => {
            log::warn!("settings store unreadable, using no overrides: {e:#}");
            return LocalOverrides::default();
        }
    };
    decode_overrides(&raw).unwrap_or_else(|e| {
        log::warn!("corrupt settings ignored: {e}");
        LocalOverrides::default()
    })
}

/// Base layer, override layer and their merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLayers {
    base: TokenConfig,
    overrides: LocalOverrides,
    merged: TokenConfig,
}

impl TokenLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self) -> &TokenConfig {
        &self.base
    }

    pub fn overrides(&self) -> &LocalOverrides {
        &self.overrides
    }

    /// The config classification and sprite lookup read from.
    pub fn merged(&self) -> &TokenConfig {
        &self.merged
    }

    /// Replace the base layer and re-apply the overrides on top.
    pub fn set_base(&mut self, base: TokenConfig) {
        self.base = base;
        self.remerge();
    }

    /// Re-read the override layer from `store`.
    pub fn load_overrides(&mut self, store: &dyn SettingsStore) {
        self.overrides = read_overrides(store);
        self.remerge();
    }

    pub fn set_token_props(&mut self, token: char, props: TokenProps, store: &mut dyn SettingsStore) {
        self.overrides.token_props.insert(token, props);
        self.persist(store);
    }

    pub fn set_token_visual(
        &mut self,
        token: char,
        visual: TokenVisual,
        store: &mut dyn SettingsStore,
    ) {
        self.overrides.token_visual.insert(token, visual);
        self.persist(store);
    }

    /// Write the override layer, then read it back so the store stays the
    /// source of truth. A failed write keeps the in-memory edit.
    fn persist(&mut self, store: &mut dyn SettingsStore) {
        let written = encode_overrides(&self.overrides).and_then(|raw| store.write(&raw));
        match written {
            Ok(()) => self.load_overrides(store),
            Err(e) => {
                log::warn!("could not persist token overrides: {e:#}");
                self.remerge();
            }
        }
    }

    fn remerge(&mut self) {
        let mut merged = self.base.clone();
        for (token, props) in &self.overrides.token_props {
            merged.props.insert(*token, props.clone());
        }
        for (token, visual) in &self.overrides.token_visual {
            merged.visual.insert(*token, visual.clone());
        }
        self.merged = merged;
    }
}
