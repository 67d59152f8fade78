//! Dump the per-cell read view as JSON for a renderer.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::processor::{CellView, GridStats, HexGridModel};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    width: i32,
    height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<String>,
    stats: GridStats,
    cells: Vec<CellView<'a>>,
}

pub fn emit(model: &HexGridModel, out_dir: &Path) -> io::Result<()> {
    let file = File::create(out_dir.join("cells.json"))?;
    let mut w = BufWriter::new(file);
    write_document(model, &mut w)?;
    w.flush()
}

pub fn write_document<W: Write>(model: &HexGridModel, w: W) -> io::Result<()> {
    let doc = Document {
        width: model.grid().width(),
        height: model.grid().height(),
        background: model.background_tile_src(),
        stats: model.stats(),
        cells: model.cells().collect(),
    };
    serde_json::to_writer_pretty(w, &doc)?;
    Ok(())
}
