// Error types for the minefield engine and score storage

use std::io;
use thiserror::Error;

/// Contract violations raised by the board, generator and reveal engine
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid board dimensions {width}x{height} with {mines} mines")]
    InvalidDimensions { width: u8, height: u8, mines: u8 },
    #[error("cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("mines have already been placed for this game")]
    AlreadyGenerated,
}

/// Failures reading or writing the score file
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("score storage unavailable: {0}")]
    Unavailable(#[from] io::Error),
    #[error("malformed score entry #{entry}")]
    Malformed { entry: usize },
}

pub type Result<T> = std::result::Result<T, BoardError>;
