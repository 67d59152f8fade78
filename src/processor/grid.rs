//! Grid shape, cell arena and the two coordinate systems.
//!
//! The grid is a staggered ("brick") layout: every even row is shifted by
//! half a cell. Battle records use their own skewed coordinates which are
//! converted with [`battle_to_grid`].

use serde::Serialize;

use crate::model::{
    BATTLE_SKEW_ORIGIN, CELL_HEIGHT, CELL_WIDTH, CellKind, EntityInfo, GRID_H, GRID_W, ObjectInfo,
    SpriteRef, TerrainKind,
};

/// Screen anchor of a cell, top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPos {
    pub left: f64,
    pub top: f64,
}

/// Screen position of cell `(x, y)`.
///
/// Horizontal stride is one cell width, vertical stride three quarters of a
/// cell height. Even rows are shifted right by half a cell.
pub fn cell_position(x: i32, y: i32) -> ScreenPos {
    let half = CELL_WIDTH / 2.0;
    let x_offset = if (y + 1) % 2 == 0 { 0.0 } else { half };
    ScreenPos {
        left: f64::from(x) * CELL_WIDTH + x_offset,
        top: f64::from(y) * (CELL_HEIGHT * 0.75),
    }
}

/// Convert battle coordinates into grid coordinates.
///
/// The result may lie outside the grid; callers must bounds-check and drop,
/// never clamp.
pub fn battle_to_grid(bx: f64, by: f64) -> (i32, i32) {
    let x = bx - (BATTLE_SKEW_ORIGIN - by) / 2.0 + 1.0;
    let y = by + 1.0;
    (x.floor() as i32, y.floor() as i32)
}

/// Logical state of one cell. Holds plain data only.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub kind: CellKind,
    pub sprite: Option<SpriteRef>,
    pub entity: Option<EntityInfo>,
    pub object: Option<ObjectInfo>,
}

impl Cell {
    /// Drop everything loaded from map or battle data.
    fn reset(&mut self, base: CellKind) {
        self.reset_terrain(base);
        self.entity = None;
        self.object = None;
    }

    fn reset_terrain(&mut self, base: CellKind) {
        self.kind = base;
        self.sprite = None;
    }
}

/// Fixed-size arena of cells, row-major, indexed by `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_W, GRID_H)
    }
}

impl Grid {
    /// Negative dimensions count as zero. A grid whose cell count would not
    /// fit an `i32` index is created empty.
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = match width.max(0).checked_mul(height.max(0)) {
            Some(_) => (width.max(0), height.max(0)),
            None => {
                log::warn!("grid {width}x{height} is too large, using an empty grid");
                (0, 0)
            }
        };
        let capacity = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .unwrap_or(0);
        let mut grid = Self {
            width,
            height,
            cells: Vec::with_capacity(capacity),
        };
        for y in 0..height {
            for x in 0..width {
                let kind = grid.base_kind(x, y);
                grid.cells.push(Cell {
                    x,
                    y,
                    kind,
                    sprite: None,
                    entity: None,
                    object: None,
                });
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y).then(|| (y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).and_then(|i| self.cells.get(i))
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index(x, y).and_then(|i| self.cells.get_mut(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// True iff the cell lies on the outer ring.
    pub fn is_exit_zone(&self, x: i32, y: i32) -> bool {
        x == 0 || x == self.width - 1 || y == 0 || y == self.height - 1
    }

    /// Kind a cell has before any map data is applied.
    pub fn base_kind(&self, x: i32, y: i32) -> CellKind {
        if self.is_exit_zone(x, y) {
            CellKind::Exit
        } else {
            CellKind::Terrain(TerrainKind::Passable)
        }
    }

    /// In-game label: `AA{x}` on the first row, `ZZ{x}` on the last, else a
    /// row letter starting at `A` for row 1.
    pub fn cell_label(&self, x: i32, y: i32) -> String {
        if y == 0 {
            return format!("AA{x}");
        }
        if y == self.height - 1 {
            return format!("ZZ{x}");
        }
        let row = u32::try_from(y - 1)
            .ok()
            .and_then(|off| char::from_u32('A' as u32 + off))
            .unwrap_or('?');
        format!("{row}{x}")
    }

    /// Reset every cell to its base kind and drop all attached data.
    pub fn reset(&mut self) {
        let bases: Vec<CellKind> = self.cells.iter().map(|c| self.base_kind(c.x, c.y)).collect();
        for (cell, base) in self.cells.iter_mut().zip(bases) {
            cell.reset(base);
        }
    }

    /// Like [`Grid::reset`], but entity and object markers stay.
    pub fn reset_terrain(&mut self) {
        let bases: Vec<CellKind> = self.cells.iter().map(|c| self.base_kind(c.x, c.y)).collect();
        for (cell, base) in self.cells.iter_mut().zip(bases) {
            cell.reset_terrain(base);
        }
    }
}
