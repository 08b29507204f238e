// Board model: cell grid, board configuration and on-screen cell geometry
// The board is the single owner of every cell; all writes go through its methods

use serde::{Deserialize, Serialize};

use crate::xtm_error::{BoardError, Result};

/// Board dimensions and mine count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: u8,
    pub height: u8,
    pub mines: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig::new(8, 8, 10)
    }
}

impl BoardConfig {
    pub const fn new(width: u8, height: u8, mines: u8) -> Self {
        BoardConfig {
            width,
            height,
            mines,
        }
    }

    pub fn total_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Both sides must be non-zero and at least one cell must stay free of mines
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.total_cells() <= self.mines as usize {
            return Err(BoardError::InvalidDimensions {
                width: self.width,
                height: self.height,
                mines: self.mines,
            });
        }
        Ok(())
    }
}

/// A single grid position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    is_mine: bool,
    neighbor_mine_count: u8,
    is_revealed: bool,
    is_flagged: bool,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    /// Meaningless for mine cells; callers only render it for safe cells
    pub fn neighbor_mine_count(&self) -> u8 {
        self.neighbor_mine_count
    }

    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.is_flagged
    }
}

/// Screen rectangle of one cell, in terminal columns/rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    /// Half-open containment: the right and bottom edges belong to the next cell
    pub fn contains(&self, px: u16, py: u16) -> bool {
        px >= self.x
            && py >= self.y
            && (px as u32) < self.x as u32 + self.width as u32
            && (py as u32) < self.y as u32 + self.height as u32
    }
}

/// How cells are laid out on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLayout {
    pub origin_x: u16,
    pub origin_y: u16,
    pub cell_width: u16,
    pub cell_height: u16,
    pub gap: u16,
}

impl CellLayout {
    /// Center a board of the given size inside a viewport
    /// The origin saturates at 0 when the board is larger than the viewport
    pub fn centered(
        config: &BoardConfig,
        cell_width: u16,
        cell_height: u16,
        gap: u16,
        viewport_width: u16,
        viewport_height: u16,
    ) -> Self {
        let mut layout = CellLayout {
            origin_x: 0,
            origin_y: 0,
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
            gap,
        };
        let (board_w, board_h) = layout.extent(config);
        layout.origin_x = viewport_width.saturating_sub(board_w) / 2;
        layout.origin_y = viewport_height.saturating_sub(board_h) / 2;
        layout
    }

    /// Total footprint of a board laid out this way
    pub fn extent(&self, config: &BoardConfig) -> (u16, u16) {
        let span = |n: u8, size: u16| -> u16 {
            let n = n as u32;
            let total = n * size as u32 + n.saturating_sub(1) * self.gap as u32;
            total.min(u16::MAX as u32) as u16
        };
        (
            span(config.width, self.cell_width),
            span(config.height, self.cell_height),
        )
    }

    fn rect_for(&self, x: usize, y: usize) -> CellRect {
        let step_x = self.cell_width as u32 + self.gap as u32;
        let step_y = self.cell_height as u32 + self.gap as u32;
        let px = self.origin_x as u32 + x as u32 * step_x;
        let py = self.origin_y as u32 + y as u32 * step_y;
        CellRect {
            x: px.min(u16::MAX as u32) as u16,
            y: py.min(u16::MAX as u32) as u16,
            width: self.cell_width,
            height: self.cell_height,
        }
    }
}

/// The minefield grid, stored row-major
#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    cells: Vec<Cell>,
    rects: Vec<CellRect>,
}

impl Board {
    /// Allocate a blank board and compute the screen rectangle of every cell
    /// No cell is a mine until the generator runs
    pub fn initialize(config: BoardConfig, layout: &CellLayout) -> Result<Board> {
        config.validate()?;
        let (w, h) = (config.width as usize, config.height as usize);
        let rects = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| layout.rect_for(x, y))
            .collect();
        Ok(Board {
            config,
            cells: vec![Cell::default(); w * h],
            rects,
        })
    }

    pub fn width(&self) -> usize {
        self.config.width as usize
    }

    pub fn height(&self) -> usize {
        self.config.height as usize
    }

    pub fn mine_count(&self) -> usize {
        self.config.mines as usize
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width() || y >= self.height() {
            return Err(BoardError::OutOfBounds { x, y });
        }
        Ok(y * self.width() + x)
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Result<&Cell> {
        let idx = self.index(x, y)?;
        Ok(&self.cells[idx])
    }

    pub fn cell_rect(&self, x: usize, y: usize) -> Result<CellRect> {
        let idx = self.index(x, y)?;
        Ok(self.rects[idx])
    }

    /// Which cell, if any, lies under a pointer position
    pub fn hit_test(&self, px: u16, py: u16) -> Option<(usize, usize)> {
        let w = self.width();
        self.rects
            .iter()
            .position(|r| r.contains(px, py))
            .map(|i| (i % w, i / w))
    }

    /// Coordinates of the (up to 8) cells around (x, y), clipped at the edges
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (w, h) = (self.width(), self.height());
        (y.saturating_sub(1)..=(y + 1).min(h - 1))
            .flat_map(move |ny| (x.saturating_sub(1)..=(x + 1).min(w - 1)).map(move |nx| (nx, ny)))
            .filter(move |&pos| pos != (x, y))
    }

    /// Every cell with its coordinates, row by row
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        let w = self.width();
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| ((i % w, i / w), c))
    }

    pub fn placed_mines(&self) -> usize {
        self.cells.iter().filter(|c| c.is_mine).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_flagged).count()
    }

    pub(crate) fn set_mine(&mut self, x: usize, y: usize) -> Result<bool> {
        let idx = self.index(x, y)?;
        let was_mine = self.cells[idx].is_mine;
        self.cells[idx].is_mine = true;
        Ok(!was_mine)
    }

    pub(crate) fn set_neighbor_count(&mut self, x: usize, y: usize, count: u8) -> Result<()> {
        let idx = self.index(x, y)?;
        self.cells[idx].neighbor_mine_count = count;
        Ok(())
    }

    pub(crate) fn mark_revealed(&mut self, x: usize, y: usize) -> Result<()> {
        let idx = self.index(x, y)?;
        self.cells[idx].is_revealed = true;
        Ok(())
    }

    pub(crate) fn flip_flag(&mut self, x: usize, y: usize) -> Result<()> {
        let idx = self.index(x, y)?;
        self.cells[idx].is_flagged = !self.cells[idx].is_flagged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> CellLayout {
        CellLayout {
            origin_x: 10,
            origin_y: 5,
            cell_width: 3,
            cell_height: 1,
            gap: 0,
        }
    }

    #[test]
    fn initialize_rejects_impossible_configs() {
        for config in [
            BoardConfig::new(0, 8, 0),
            BoardConfig::new(8, 0, 0),
            BoardConfig::new(2, 2, 4),
            BoardConfig::new(3, 3, 10),
        ] {
            let err = Board::initialize(config, &layout()).unwrap_err();
            assert!(matches!(err, BoardError::InvalidDimensions { .. }));
        }
    }

    #[test]
    fn initialize_creates_blank_cells() {
        let board = Board::initialize(BoardConfig::new(4, 3, 5), &layout()).unwrap();

        assert_eq!(board.width(), 4);
        assert_eq!(board.height(), 3);
        assert_eq!(board.mine_count(), 5);
        assert_eq!(board.placed_mines(), 0);
        assert!(board.cells().all(|(_, c)| *c == Cell::default()));
    }

    #[test]
    fn cell_at_out_of_range_is_an_error() {
        let board = Board::initialize(BoardConfig::new(4, 3, 1), &layout()).unwrap();

        assert_eq!(
            board.cell_at(4, 0).unwrap_err(),
            BoardError::OutOfBounds { x: 4, y: 0 }
        );
        assert_eq!(
            board.cell_at(0, 3).unwrap_err(),
            BoardError::OutOfBounds { x: 0, y: 3 }
        );
        assert!(board.cell_at(3, 2).is_ok());
    }

    #[test]
    fn hit_test_maps_pointer_to_cell() {
        let board = Board::initialize(BoardConfig::new(4, 3, 1), &layout()).unwrap();

        assert_eq!(board.hit_test(10, 5), Some((0, 0)));
        assert_eq!(board.hit_test(12, 5), Some((0, 0)));
        assert_eq!(board.hit_test(13, 5), Some((1, 0)));
        assert_eq!(board.hit_test(21, 7), Some((3, 2)));
        assert_eq!(board.hit_test(22, 7), None);
        assert_eq!(board.hit_test(9, 5), None);
        assert_eq!(board.hit_test(10, 8), None);
    }

    #[test]
    fn gaps_are_not_part_of_any_cell() {
        let mut l = layout();
        l.gap = 1;
        let board = Board::initialize(BoardConfig::new(2, 2, 1), &l).unwrap();

        assert_eq!(board.cell_rect(1, 1).unwrap(), CellRect { x: 14, y: 7, width: 3, height: 1 });
        assert_eq!(board.hit_test(13, 5), None);
        assert_eq!(board.hit_test(10, 6), None);
    }

    #[test]
    fn centered_layout_fits_viewport() {
        let config = BoardConfig::default();
        let l = CellLayout::centered(&config, 3, 1, 0, 80, 24);

        assert_eq!(l.extent(&config), (24, 8));
        assert_eq!((l.origin_x, l.origin_y), (28, 8));

        let tiny = CellLayout::centered(&config, 3, 1, 0, 10, 4);
        assert_eq!((tiny.origin_x, tiny.origin_y), (0, 0));
    }

    #[test]
    fn neighbors_are_clipped_at_edges() {
        let board = Board::initialize(BoardConfig::new(4, 3, 1), &layout()).unwrap();

        assert_eq!(board.neighbors(0, 0).count(), 3);
        assert_eq!(board.neighbors(1, 0).count(), 5);
        assert_eq!(board.neighbors(1, 1).count(), 8);
        assert_eq!(board.neighbors(3, 2).count(), 3);
        assert!(!board.neighbors(1, 1).any(|p| p == (1, 1)));
    }

    #[test]
    fn single_row_board_has_side_neighbors_only() {
        let board = Board::initialize(BoardConfig::new(3, 1, 0), &layout()).unwrap();

        let around: Vec<_> = board.neighbors(1, 0).collect();
        assert_eq!(around, vec![(0, 0), (2, 0)]);
    }
}
