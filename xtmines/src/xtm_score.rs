// Best-times ledger and its flat score file
// Each line of the file is "<name> <seconds>" with two decimals, fastest first

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::xtm_error::StorageError;

/// Maximum number of entries kept in the ledger
pub const MAX_SCORES: usize = 10;
/// Maximum length of a player name, in characters
pub const MAX_NAME_LEN: usize = 20;
/// Name recorded when the player leaves the prompt empty
pub const DEFAULT_NAME: &str = "Minesweeper";

/// One completed game
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub name: String,
    pub time: f64,
}

impl Score {
    pub fn new(name: &str, time: f64) -> Self {
        Score {
            name: sanitize_name(name),
            time,
        }
    }
}

/// Make a name safe for the whitespace-delimited score file
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(MAX_NAME_LEN)
        .collect();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

/// Parse whitespace-delimited `<name> <time>` pairs
/// Parsing stops at the first bad pair; the entries read before it are kept
pub fn parse_scores(text: &str) -> (Vec<Score>, Option<StorageError>) {
    let mut scores = Vec::new();
    let mut tokens = text.split_whitespace();
    while let Some(name) = tokens.next() {
        let time = tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0);
        match time {
            Some(time) => scores.push(Score::new(name, time)),
            None => {
                let entry = scores.len() + 1;
                return (scores, Some(StorageError::Malformed { entry }));
            }
        }
    }
    (scores, None)
}

pub fn format_scores(scores: &[Score]) -> String {
    scores
        .iter()
        .map(|s| format!("{} {:.2}\n", s.name, s.time))
        .collect()
}

/// Capacity-bounded list of best times, sorted ascending
/// Loaded from disk once; afterwards the in-memory list is authoritative
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    path: Option<PathBuf>,
    scores: Vec<Score>,
    loaded: bool,
}

impl ScoreLedger {
    /// A ledger backed by a score file, read lazily on first use
    pub fn new(path: Option<PathBuf>) -> Self {
        ScoreLedger {
            path,
            scores: Vec::new(),
            loaded: false,
        }
    }

    /// A ledger that never touches the disk
    #[cfg(test)]
    pub fn in_memory() -> Self {
        ScoreLedger {
            path: None,
            scores: Vec::new(),
            loaded: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Entries currently held in memory
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    /// Read the score file the first time it is called; later calls do nothing
    /// A missing file yields an empty ledger; a damaged one keeps its readable entries
    pub fn load(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let Some(path) = self.path.as_deref() else {
            return;
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                let (mut scores, damage) = parse_scores(&text);
                if let Some(e) = damage {
                    warn!(
                        path = %path.display(),
                        kept = scores.len(),
                        "{e}, ignoring the rest of the score file"
                    );
                }
                scores.sort_by(|a, b| a.time.total_cmp(&b.time));
                scores.truncate(MAX_SCORES);
                info!(count = scores.len(), path = %path.display(), "loaded scores");
                self.scores = scores;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no score file yet");
            }
            Err(e) => {
                let e = StorageError::from(e);
                warn!(path = %path.display(), "ignoring score file: {e}");
            }
        }
    }

    /// Would this time make it onto the board?
    pub fn is_qualifying(&mut self, time: f64) -> bool {
        self.load();
        if !time.is_finite() || time < 0.0 {
            return false;
        }
        match self.worst() {
            Some(worst) if self.scores.len() >= MAX_SCORES => time < worst,
            _ => true,
        }
    }

    fn worst(&self) -> Option<f64> {
        self.scores
            .iter()
            .map(|s| s.time)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Insert a qualifying time and persist the whole ledger
    /// Returns false, writing nothing, when the time does not qualify
    pub fn record(&mut self, name: &str, time: f64) -> bool {
        if !self.is_qualifying(time) {
            info!("time {time:.2} is not in top {MAX_SCORES}");
            return false;
        }
        let score = Score::new(name, time);
        if self.scores.len() < MAX_SCORES {
            self.scores.push(score);
        } else if let Some(worst) = self
            .scores
            .iter_mut()
            .max_by(|a, b| a.time.total_cmp(&b.time))
        {
            *worst = score;
        }
        // Stable sort keeps earlier entries ahead of equal later ones
        self.scores.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.scores.truncate(MAX_SCORES);

        if let Err(e) = self.persist() {
            error!("could not save scores, keeping them in memory: {e}");
        }
        true
    }

    fn persist(&self) -> Result<(), StorageError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format_scores(&self.scores))?;
        info!(count = self.scores.len(), path = %path.display(), "saved scores");
        Ok(())
    }
}
