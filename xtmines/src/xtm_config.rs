// Configuration management and per-user file locations
// Settings are persisted as TOML; scores and the log live in the data directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::xtm_board::BoardConfig;

const APP_NAME: &str = "xtmines";

/// User configuration
/// Persisted to disk as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Size of one cell on screen, in terminal columns/rows
    pub cell_width: u16,
    pub cell_height: u16,
    pub cell_gap: u16,

    // Last name entered for the score board
    pub player_name: String,

    // Board used for every new game; a TOML table, so it is serialized last
    pub board: BoardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cell_width: 3,
            cell_height: 1,
            cell_gap: 0,
            player_name: String::new(),
            board: BoardConfig::default(),
        }
    }
}

impl Config {
    /// Replace settings the engine cannot work with by their defaults
    fn sanitized(mut self) -> Self {
        if let Err(e) = self.board.validate() {
            warn!("{e}, using the default board");
            self.board = BoardConfig::default();
        }
        if self.cell_width == 0 || self.cell_height == 0 {
            warn!("cell size must be non-zero, using the default");
            let d = Config::default();
            self.cell_width = d.cell_width;
            self.cell_height = d.cell_height;
        }
        self
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "xhbl", APP_NAME)
}

/// Directory for a file, falling back to the current directory
fn file_in(dir: Option<PathBuf>, file: &str) -> Option<PathBuf> {
    let mut path = match dir {
        Some(dir) => dir,
        None => env::current_dir().ok()?,
    };
    path.push(file);
    Some(path)
}

/// Get the configuration file path
/// e.g. ~/.config/xtmines/xtmines.toml on Linux
pub fn config_path() -> Option<PathBuf> {
    file_in(
        project_dirs().map(|p| p.config_dir().to_path_buf()),
        &format!("{APP_NAME}.toml"),
    )
}

/// Score file path, in the per-user data directory
pub fn score_path() -> Option<PathBuf> {
    file_in(project_dirs().map(|p| p.data_dir().to_path_buf()), "scores.txt")
}

/// Log file path, next to the score file
pub fn log_path() -> Option<PathBuf> {
    file_in(
        project_dirs().map(|p| p.data_dir().to_path_buf()),
        &format!("{APP_NAME}.log"),
    )
}

/// Load configuration from disk, or create default if not found
pub fn load_or_create_config() -> Config {
    match config_path() {
        Some(path) => load_or_create_config_at(&path),
        None => Config::default(),
    }
}

pub fn load_or_create_config_at(path: &Path) -> Config {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => return cfg.sanitized(),
                Err(e) => warn!(path = %path.display(), "invalid config, using defaults: {e}"),
            },
            Err(e) => warn!(path = %path.display(), "cannot read config, using defaults: {e}"),
        }
        return Config::default();
    }
    let cfg = Config::default();
    save_config_at(&cfg, path);
    info!(path = %path.display(), "created default config");
    cfg
}

/// Save configuration to disk as TOML
pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        save_config_at(cfg, &path);
    }
}

pub fn save_config_at(cfg: &Config, path: &Path) {
    let s = match toml::to_string(cfg) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot serialize config: {e}");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Err(e) = fs::write(path, s) {
        warn!(path = %path.display(), "cannot save config: {e}");
    }
}
