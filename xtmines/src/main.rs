// Entry point for the Minesweeper TUI application
// Loads configuration, sets up file logging and the score ledger, then launches the UI

use std::error::Error;
use std::fs;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Module declarations
mod xtm_board;   // Grid, cells and screen layout
mod xtm_color;   // Terminal color depth detection and theme
mod xtm_config;  // Persistent settings and per-user file locations
mod xtm_error;   // Error types
mod xtm_game;    // Reveal engine and win/loss evaluation
mod xtm_gen;     // Deferred minefield generation
mod xtm_input;   // Edge-detected input snapshots
mod xtm_score;   // Best-times ledger
mod xtm_session; // Title / Playing / Won state machine
mod xtm_ui;      // Terminal rendering and the frame loop

use xtm_config::{load_or_create_config, log_path, score_path};
use xtm_score::ScoreLedger;
use xtm_ui::run as run_ui;

/// Log to a file so the terminal UI stays clean; runs without logging if the file cannot be opened
fn init_logging() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(log_file) = fs::File::create(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    // Load or create user configuration (board, cell size, last player name)
    let mut cfg = load_or_create_config();
    info!(
        width = cfg.board.width,
        height = cfg.board.height,
        mines = cfg.board.mines,
        "starting xtmines"
    );

    let ledger = ScoreLedger::new(score_path());
    match ledger.path() {
        Some(path) => info!(path = %path.display(), "score file"),
        None => warn!("no location for the score file, scores will not be saved"),
    }

    // Launch the main UI loop
    run_ui(&mut cfg, ledger)
}
