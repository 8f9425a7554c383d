//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom)

use crate::types::{Cell, PieceKind, Pos, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(pos: Pos) -> Option<usize> {
        if !Self::in_bounds(pos) {
            return None;
        }
        Some((pos.y as usize) * (BOARD_WIDTH as usize) + (pos.x as usize))
    }

    /// Column in `[0, 10)` and row in `[0, 20)`.
    #[inline(always)]
    pub fn in_bounds(pos: Pos) -> bool {
        pos.x >= 0 && pos.x < BOARD_WIDTH as i8 && pos.y >= 0 && pos.y < BOARD_HEIGHT as i8
    }

    /// Get cell at a position, `None` if out of bounds
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        Self::index(pos).map(|idx| self.cells[idx])
    }

    /// Set cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, pos: Pos, cell: Cell) -> bool {
        match Self::index(pos) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position holds a locked cell
    ///
    /// Positions outside the grid report `false`; collision checks go through
    /// [`Board::is_free`], which bounds-checks first.
    pub fn is_occupied(&self, pos: Pos) -> bool {
        matches!(self.get(pos), Some(Some(_)))
    }

    /// Check if position is within bounds and empty
    #[inline(always)]
    pub fn is_free(&self, pos: Pos) -> bool {
        matches!(self.get(pos), Some(None))
    }

    /// All four cells are in bounds and empty.
    pub fn fits(&self, cells: &[Pos; 4]) -> bool {
        cells.iter().all(|&p| self.is_free(p))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| cell.is_some())
    }

    /// Lock four cells onto the board with the colour of `kind`
    ///
    /// The caller guarantees every cell is in bounds and empty; the resolver
    /// and the drop search never produce anything else.
    pub fn lock(&mut self, cells: &[Pos; 4], kind: PieceKind) {
        debug_assert!(
            self.fits(cells),
            "lock precondition violated: {:?} not free",
            cells
        );
        for &pos in cells {
            if let Some(idx) = Self::index(pos) {
                self.cells[idx] = Some(kind);
            }
        }
    }

    /// Clear all full rows and return how many were cleared
    ///
    /// Two-pointer compaction from the bottom up: surviving rows are copied
    /// down over the removed ones, then the vacated rows at the top are emptied.
    pub fn clear_full_rows(&mut self) -> usize {
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;
        let mut cleared = 0;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let src_start = read_y * width;
                let dst_start = write_y * width;
                self.cells
                    .copy_within(src_start..src_start + width, dst_start);
            }
        }

        self.cells[..write_y * width].fill(None);
        cleared
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(BOARD_WIDTH as usize)
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of locked cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Create from a 2D vector for testing (converts to flat array)
    #[cfg(test)]
    pub fn from_cells(cells_2d: Vec<Vec<Cell>>) -> Self {
        assert_eq!(cells_2d.len(), BOARD_HEIGHT as usize);
        assert!(cells_2d.iter().all(|row| row.len() == BOARD_WIDTH as usize));

        let mut flat = [None; BOARD_SIZE];
        for (y, row) in cells_2d.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                flat[y * BOARD_WIDTH as usize + x] = *cell;
            }
        }
        Self { cells: flat }
    }

    /// Convert to 2D vector for testing/display
    #[cfg(test)]
    pub fn to_cells(&self) -> Vec<Vec<Cell>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
