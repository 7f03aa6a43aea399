use glam::DVec2;

use crate::core::species::Species;

/// Uniform broad-phase grid over the simulation box.
///
/// Cells hold indices into the live particle arena for the current tick only;
/// the grid is cleared and refilled from scratch every tick and is never a
/// source of state on its own. The cell width is fixed at construction from
/// the largest species radius, sized so any true overlap is found within a
/// cell's 3x3 neighborhood.
///
/// If the species set ever grew a radius much larger than the five initial
/// ones, that neighborhood guarantee would silently break; the sizing is a
/// construction-time assumption, not re-checked per tick.
#[derive(Debug)]
pub struct CellGrid {
    cell_width: f64,
    nx: usize,
    ny: usize,
    cells: Vec<Vec<usize>>,
}

impl CellGrid {
    /// Build the grid for a box of `size` nm, sizing cells from the largest
    /// species radius.
    pub fn new(size: DVec2) -> Self {
        let cell_width = Species::max_radius().sqrt() * 6.0;
        let nx = ((size.x / cell_width) as usize).max(1);
        let ny = ((size.y / cell_width) as usize).max(1);
        Self {
            cell_width,
            nx,
            ny,
            cells: vec![Vec::new(); nx * ny],
        }
    }

    /// Cell width in nm.
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Grid dimensions (columns, rows).
    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Remove all particle indices, keeping cell allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Bucket a particle index by its position. Positions on or beyond the
    /// outer edge are clamped into the boundary cells so every particle lands
    /// somewhere valid.
    pub fn insert(&mut self, index: usize, position: DVec2) {
        let (cx, cy) = self.cell_of(position);
        self.cells[cy * self.nx + cx].push(index);
    }

    /// Indices currently bucketed in cell `(cx, cy)`.
    pub fn cell(&self, cx: usize, cy: usize) -> &[usize] {
        &self.cells[cy * self.nx + cx]
    }

    /// Remove and return the front index of cell `(cx, cy)`, if any.
    pub fn pop_front(&mut self, cx: usize, cy: usize) -> Option<usize> {
        let cell = &mut self.cells[cy * self.nx + cx];
        if cell.is_empty() {
            None
        } else {
            Some(cell.remove(0))
        }
    }

    fn cell_of(&self, position: DVec2) -> (usize, usize) {
        let cx = ((position.x / self.cell_width) as isize).clamp(0, self.nx as isize - 1);
        let cy = ((position.y / self.cell_width) as isize).clamp(0, self.ny as isize - 1);
        (cx as usize, cy as usize)
    }
}
