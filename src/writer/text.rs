//! Emit a plain-text picture of the grid, one line per row.
//!
//! Even rows are indented by one column to show the stagger. Glyphs, by
//! priority: entity, object, exit ring, terrain.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::model::{CellKind, EntityKind, TerrainKind};
use crate::processor::{CellView, HexGridModel};

pub fn emit(model: &HexGridModel, out_dir: &Path) -> io::Result<()> {
    let file = File::create(out_dir.join("grid.txt"))?;
    let mut w = BufWriter::new(file);
    render(model, &mut w)?;
    w.flush()
}

fn glyph(cell: &CellView<'_>) -> char {
    if let Some(entity) = cell.entity {
        return match entity.kind {
            EntityKind::Monster => 'M',
            EntityKind::Player => '@',
        };
    }
    if cell.object.is_some() {
        return 'o';
    }
    match cell.kind {
        CellKind::Exit => '#',
        CellKind::Terrain(TerrainKind::Passable) => '.',
        CellKind::Terrain(TerrainKind::Impassable) => 'X',
        CellKind::Terrain(TerrainKind::Wall) => 'D',
        CellKind::Terrain(TerrainKind::WallWindow) => 'C',
        CellKind::Terrain(TerrainKind::Stone) => 'B',
        CellKind::Terrain(TerrainKind::Sandbag) => 'P',
        CellKind::Terrain(TerrainKind::BarbedWire) => 'W',
        CellKind::Terrain(TerrainKind::Hedgehog) => 'Z',
        CellKind::Terrain(TerrainKind::Tree) => 'R',
        CellKind::Terrain(TerrainKind::Bush) => 'L',
        CellKind::Terrain(TerrainKind::Stump) => 'K',
    }
}

pub fn render<W: Write>(model: &HexGridModel, w: &mut W) -> io::Result<()> {
    let width = usize::try_from(model.grid().width()).unwrap_or(0);
    let mut line = String::with_capacity(width * 2 + 1);

    for (i, cell) in model.cells().enumerate() {
        if width > 0 && i % width == 0 {
            line.clear();
            if cell.y % 2 == 0 {
                line.push(' ');
            }
        }
        line.push(glyph(&cell));
        if cell.selected {
            line.push('*');
        } else {
            line.push(' ');
        }
        if width > 0 && i % width == width - 1 {
            writeln!(w, "{}", line.trim_end())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BattleData, MapObject};

    #[test]
    fn test_render_rows() {
        let mut model = HexGridModel::new();
        model.apply_map_rows(&["PR0"]);
        model.apply_battle_data(&BattleData {
            positions: vec![],
            objects: vec![MapObject {
                txt: "Box".into(),
                count: 1,
                bx: 20.0,
                by: 10.0,
            }],
        });
        model.toggle_selection(2, 1);

        let mut buf = Vec::new();
        render(&model, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 28);
        assert!(lines[0].starts_with(" # # #"));
        assert!(lines[1].starts_with("# P R* X ."), "got: {}", lines[1]);
        assert_eq!(lines[11].chars().nth(14 * 2), Some('o'));
    }
}
