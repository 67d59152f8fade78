pub mod cli;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use clap::Parser;
use std::path::Path;

use crate::processor::{FileStore, Session};

/// Read an optional input and run `load` on it. A parse failure is logged
/// and the input skipped; only an unreadable file is an error.
fn load_optional<T>(
    path: Option<&Path>,
    what: &str,
    load: impl Fn(&str) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Reading {}", path.display()))?;
    match load(&src) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            log::warn!("{what} {} unusable, skipped: {e:#}", path.display());
            Ok(None)
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Parse ──────────────────────────────────────────────────────
    let session = Session {
        assets: load_optional(args.assets.as_deref(), "assets config", parser::load_assets)?,
        token_config: load_optional(args.token_map.as_deref(), "token map", parser::load_token_map)?,
        map: load_optional(Some(args.map.as_path()), "map", parser::load_map)?,
        battle: load_optional(args.battle.as_deref(), "battle", parser::load_battle)?,
        passable_edits: args.passable.clone(),
        select: args.select,
    };

    // 2. ── Process ────────────────────────────────────────────────────
    let mut store = FileStore::new(&args.settings);
    let model = processor::run(&session, &mut store);

    // 3. ── Write outputs ──────────────────────────────────────────────
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Creating {}", args.output.display()))?;

    writer::json::emit(&model, &args.output).with_context(|| "Writing cells.json")?;
    writer::text::emit(&model, &args.output).with_context(|| "Writing grid.txt")?;

    let stats = model.stats();
    log::info!(
        "{} hexes, {} monsters, {} players, {} objects, {} selected",
        stats.hexes,
        stats.monsters,
        stats.players,
        stats.objects,
        stats.selected
    );
    Ok(())
}
