// Minefield generator: deferred mine placement and neighbor counts

use rand::Rng;
use tracing::debug;

use crate::xtm_board::Board;
use crate::xtm_error::{BoardError, Result};

/// Whether mines have been placed for the current game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationState {
    #[default]
    Pending,
    Placed,
}

impl GenerationState {
    pub fn is_placed(self) -> bool {
        matches!(self, GenerationState::Placed)
    }
}

/// Randomly place the board's mines, never on the safe cell
/// Only the clicked cell is protected, its neighbors may still hold mines
pub fn place_mines<R: Rng + ?Sized>(
    board: &mut Board,
    state: &mut GenerationState,
    safe: (usize, usize),
    rng: &mut R,
) -> Result<()> {
    if state.is_placed() {
        return Err(BoardError::AlreadyGenerated);
    }
    // Validates the safe cell before any mine is written
    board.cell_at(safe.0, safe.1)?;

    let (w, h) = (board.width(), board.height());
    let mines = board.mine_count();
    let mut placed = 0;
    // Rejection sampling terminates because mines < w * h
    while placed < mines {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        if (x, y) == safe {
            continue;
        }
        if board.set_mine(x, y)? {
            placed += 1;
        }
    }

    compute_neighbor_counts(board)?;
    *state = GenerationState::Placed;
    debug!(
        width = w,
        height = h,
        mines = board.placed_mines(),
        safe_x = safe.0,
        safe_y = safe.1,
        "mines placed"
    );
    Ok(())
}

/// Store, for every safe cell, how many of its neighbors are mines
pub(crate) fn compute_neighbor_counts(board: &mut Board) -> Result<()> {
    for y in 0..board.height() {
        for x in 0..board.width() {
            if board.cell_at(x, y)?.is_mine() {
                continue;
            }
            let mut adj = 0u8;
            for (nx, ny) in board.neighbors(x, y) {
                if board.cell_at(nx, ny)?.is_mine() {
                    adj += 1;
                }
            }
            board.set_neighbor_count(x, y, adj)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtm_board::{BoardConfig, CellLayout};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board(w: u8, h: u8, mines: u8) -> Board {
        let config = BoardConfig::new(w, h, mines);
        Board::initialize(config, &CellLayout::centered(&config, 3, 1, 0, 80, 24)).unwrap()
    }

    fn brute_force_count(board: &Board, x: usize, y: usize) -> u8 {
        let mut n = 0;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if nx < 0 || ny < 0 {
                    continue;
                }
                if let Ok(c) = board.cell_at(nx as usize, ny as usize) {
                    if c.is_mine() {
                        n += 1;
                    }
                }
            }
        }
        n
    }

    #[test]
    fn places_exact_count_avoiding_safe_cell() {
        for seed in 0..50 {
            let mut b = board(8, 8, 10);
            let mut state = GenerationState::Pending;
            let mut rng = StdRng::seed_from_u64(seed);

            place_mines(&mut b, &mut state, (3, 3), &mut rng).unwrap();

            assert_eq!(b.placed_mines(), 10);
            assert!(!b.cell_at(3, 3).unwrap().is_mine());
            assert!(state.is_placed());
        }
    }

    #[test]
    fn fills_every_cell_but_the_safe_one() {
        let mut b = board(4, 4, 15);
        let mut state = GenerationState::Pending;
        let mut rng = StdRng::seed_from_u64(7);

        place_mines(&mut b, &mut state, (2, 1), &mut rng).unwrap();

        assert_eq!(b.placed_mines(), 15);
        let safe: Vec<_> = b.cells().filter(|(_, c)| !c.is_mine()).map(|(p, _)| p).collect();
        assert_eq!(safe, vec![(2, 1)]);
    }

    #[test]
    fn neighbor_counts_match_moore_neighborhood() {
        for seed in 0..20 {
            let mut b = board(9, 6, 17);
            let mut state = GenerationState::Pending;
            let mut rng = StdRng::seed_from_u64(seed);

            place_mines(&mut b, &mut state, (0, 0), &mut rng).unwrap();

            for ((x, y), cell) in b.cells() {
                if !cell.is_mine() {
                    assert_eq!(cell.neighbor_mine_count(), brute_force_count(&b, x, y));
                }
            }
        }
    }

    #[test]
    fn second_placement_is_rejected() {
        let mut b = board(8, 8, 10);
        let mut state = GenerationState::Pending;
        let mut rng = StdRng::seed_from_u64(1);
        place_mines(&mut b, &mut state, (0, 0), &mut rng).unwrap();

        let err = place_mines(&mut b, &mut state, (1, 1), &mut rng).unwrap_err();

        assert_eq!(err, BoardError::AlreadyGenerated);
        assert_eq!(b.placed_mines(), 10);
    }

    #[test]
    fn out_of_range_safe_cell_places_nothing() {
        let mut b = board(8, 8, 10);
        let mut state = GenerationState::Pending;
        let mut rng = StdRng::seed_from_u64(1);

        let err = place_mines(&mut b, &mut state, (8, 0), &mut rng).unwrap_err();

        assert_eq!(err, BoardError::OutOfBounds { x: 8, y: 0 });
        assert_eq!(b.placed_mines(), 0);
        assert_eq!(state, GenerationState::Pending);
    }

    #[test]
    fn mine_free_board_still_counts_zero() {
        let mut b = board(3, 3, 0);
        let mut state = GenerationState::Pending;
        let mut rng = StdRng::seed_from_u64(1);

        place_mines(&mut b, &mut state, (1, 1), &mut rng).unwrap();

        assert!(b.cells().all(|(_, c)| !c.is_mine() && c.neighbor_mine_count() == 0));
    }
}
