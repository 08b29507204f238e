// Reveal engine and win evaluation for a single game
// Handles deferred mine placement, flood fill, flag toggling and the win condition

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

use crate::xtm_board::{Board, BoardConfig, CellLayout};
use crate::xtm_error::Result;
use crate::xtm_gen::{GenerationState, place_mines};

/// What a reveal did to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Continue,
    HitMine,
    AlreadyRevealedOrFlagged,
}

/// Main game state: the board plus its generation flag and mine RNG
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    generation: GenerationState,
    rng: StdRng,
}

impl Game {
    /// Create a new game with the specified dimensions
    /// Board is initially empty (no mines placed yet)
    pub fn new(config: BoardConfig, layout: &CellLayout) -> Result<Self> {
        Self::with_rng(config, layout, StdRng::from_entropy())
    }

    pub fn with_rng(config: BoardConfig, layout: &CellLayout, rng: StdRng) -> Result<Self> {
        Ok(Game {
            board: Board::initialize(config, layout)?,
            generation: GenerationState::Pending,
            rng,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn generation(&self) -> GenerationState {
        self.generation
    }

    /// Reveal a cell at (x, y)
    /// - First reveal places mines with (x, y) as the safe cell
    /// - A zero cell flood-fills through its zero-count neighbors
    pub fn reveal(&mut self, x: usize, y: usize) -> Result<RevealOutcome> {
        let cell = *self.board.cell_at(x, y)?;
        if cell.is_revealed() || cell.is_flagged() {
            return Ok(RevealOutcome::AlreadyRevealedOrFlagged);
        }
        if !self.generation.is_placed() {
            place_mines(&mut self.board, &mut self.generation, (x, y), &mut self.rng)?;
        }

        self.board.mark_revealed(x, y)?;
        let cell = *self.board.cell_at(x, y)?;
        if cell.is_mine() {
            return Ok(RevealOutcome::HitMine);
        }
        if cell.neighbor_mine_count() == 0 {
            self.flood_fill(x, y)?;
        }
        Ok(RevealOutcome::Continue)
    }

    /// Breadth-first expansion from a revealed zero cell
    /// The revealed flag doubles as the visited set: cells are marked before being queued
    fn flood_fill(&mut self, x: usize, y: usize) -> Result<()> {
        let mut queue = VecDeque::from([(x, y)]);
        while let Some((cx, cy)) = queue.pop_front() {
            for (nx, ny) in self.board.neighbors(cx, cy) {
                let next = *self.board.cell_at(nx, ny)?;
                if next.is_revealed() || next.is_flagged() || next.is_mine() {
                    continue;
                }
                self.board.mark_revealed(nx, ny)?;
                if next.neighbor_mine_count() == 0 {
                    queue.push_back((nx, ny));
                }
            }
        }
        Ok(())
    }

    /// Flip the flag on an unrevealed cell; revealed cells are left alone
    pub fn toggle_flag(&mut self, x: usize, y: usize) -> Result<()> {
        if self.board.cell_at(x, y)?.is_revealed() {
            return Ok(());
        }
        self.board.flip_flag(x, y)
    }

    /// Check if all non-mine cells have been revealed (win condition)
    /// Flags play no part in it
    pub fn check_win(&self) -> bool {
        self.board
            .cells()
            .all(|(_, c)| c.is_mine() || c.is_revealed())
    }

    /// Mine counter for display (total mines - flagged cells)
    /// Can be negative if the player places too many flags
    pub fn remaining_mines(&self) -> isize {
        self.board.mine_count() as isize - self.board.flagged_count() as isize
    }

    /// Build a game with a fixed mine layout, already generated
    #[cfg(test)]
    pub(crate) fn from_mines(config: BoardConfig, mines: &[(usize, usize)]) -> Self {
        let layout = CellLayout::centered(&config, 3, 1, 0, 80, 24);
        let mut board = Board::initialize(config, &layout).unwrap();
        for &(x, y) in mines {
            board.set_mine(x, y).unwrap();
        }
        crate::xtm_gen::compute_neighbor_counts(&mut board).unwrap();
        Game {
            board,
            generation: GenerationState::Placed,
            rng: StdRng::seed_from_u64(0),
        }
    }
}
