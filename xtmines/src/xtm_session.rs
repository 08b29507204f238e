// Session state machine: Title -> Playing -> (Won) -> Title, plus the Scores screen
// One step per frame, driven by an edge-detected input snapshot

use std::time::Instant;
use tracing::{error, info};

use crate::xtm_board::{BoardConfig, CellLayout, CellRect};
use crate::xtm_game::{Game, RevealOutcome};
use crate::xtm_input::{Button, InputSnapshot};
use crate::xtm_score::{ScoreLedger, sanitize_name};

/// Where the session is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Title,
    Playing,
    /// Board cleared; the score is handled on the next step
    Won { time: f64 },
    Scores,
    Quit,
}

/// Outcome of the previous game, shown on the title screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LastResult {
    Lost,
    Won { time: f64, recorded: bool },
}

/// Title menu controls, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Start,
    Scores,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::Start, MenuItem::Scores, MenuItem::Quit];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Start => "Start",
            MenuItem::Scores => "Scores",
            MenuItem::Quit => "Quit",
        }
    }
}

const MENU_BUTTON_WIDTH: u16 = 20;
const MENU_BUTTON_HEIGHT: u16 = 3;
const MENU_BUTTON_GAP: u16 = 1;

/// Blocking name entry shown when a winning time makes the board
pub trait NamePrompt {
    fn prompt_name(&mut self, time: f64, suggested: &str) -> String;
}

/// One player session: owns the current game, the ledger and the menu state
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    board_config: BoardConfig,
    cell_size: (u16, u16, u16),
    viewport: (u16, u16),
    game: Option<Game>,
    ledger: ScoreLedger,
    started_at: Option<Instant>,
    // Armed when a click switches screens; cleared once that button is seen up
    suppress_click_until_release: bool,
    menu_focus: usize,
    cursor: (usize, usize),
    last_pointer: Option<(u16, u16)>,
    last_result: Option<LastResult>,
    player_name: String,
}

impl Session {
    pub fn new(board_config: BoardConfig, ledger: ScoreLedger) -> Self {
        Session {
            state: SessionState::Title,
            board_config,
            cell_size: (3, 1, 0),
            viewport: (80, 24),
            game: None,
            ledger,
            started_at: None,
            suppress_click_until_release: false,
            menu_focus: 0,
            cursor: (0, 0),
            last_pointer: None,
            last_result: None,
            player_name: String::new(),
        }
    }

    pub fn with_cell_size(mut self, width: u16, height: u16, gap: u16) -> Self {
        self.cell_size = (width.max(1), height.max(1), gap);
        self
    }

    pub fn with_player_name(mut self, name: &str) -> Self {
        self.player_name = name.to_string();
        self
    }

    /// Screen size used for the menu and for the layout of the next board
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn menu_focus(&self) -> MenuItem {
        MenuItem::ALL[self.menu_focus]
    }

    pub fn last_result(&self) -> Option<LastResult> {
        self.last_result
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    #[cfg(test)]
    pub fn is_click_suppressed(&self) -> bool {
        self.suppress_click_until_release
    }

    /// Seconds since the current game started
    pub fn elapsed(&self, now: Instant) -> f64 {
        self.started_at
            .map(|t0| now.saturating_duration_since(t0).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Screen rectangles of the title menu buttons, stacked and centered
    pub fn menu_rects(&self) -> [(MenuItem, CellRect); 3] {
        let (vw, vh) = self.viewport;
        let n = MenuItem::ALL.len() as u16;
        let total_h = n * MENU_BUTTON_HEIGHT + (n - 1) * MENU_BUTTON_GAP;
        let x = vw.saturating_sub(MENU_BUTTON_WIDTH) / 2;
        let top = vh.saturating_sub(total_h) / 2;
        MenuItem::ALL.map(|item| {
            let i = item as u16;
            let rect = CellRect {
                x,
                y: top + i * (MENU_BUTTON_HEIGHT + MENU_BUTTON_GAP),
                width: MENU_BUTTON_WIDTH,
                height: MENU_BUTTON_HEIGHT,
            };
            (item, rect)
        })
    }

    fn menu_hit(&self, (px, py): (u16, u16)) -> Option<MenuItem> {
        self.menu_rects()
            .into_iter()
            .find(|(_, r)| r.contains(px, py))
            .map(|(item, _)| item)
    }

    /// Advance the session by one frame
    pub fn step(
        &mut self,
        input: &InputSnapshot,
        now: Instant,
        prompt: &mut dyn NamePrompt,
    ) -> SessionState {
        if input.close_requested {
            info!("close requested");
            self.state = SessionState::Quit;
            return self.state;
        }
        if self.suppress_click_until_release && !input.is_down(Button::LeftClick) {
            self.suppress_click_until_release = false;
        }

        match self.state {
            SessionState::Title => self.step_title(input, now),
            SessionState::Playing => self.step_playing(input, now),
            SessionState::Won { time } => self.step_won(time, prompt),
            SessionState::Scores => self.step_scores(input),
            SessionState::Quit => {}
        }
        self.last_pointer = Some(input.pointer);
        self.state
    }

    fn clicked(&self, input: &InputSnapshot) -> bool {
        !self.suppress_click_until_release && input.pressed(Button::LeftClick)
    }

    fn pointer_moved(&self, input: &InputSnapshot) -> bool {
        self.last_pointer != Some(input.pointer)
    }

    fn step_title(&mut self, input: &InputSnapshot, now: Instant) {
        let n = MenuItem::ALL.len();
        if input.pressed(Button::Up) || input.pressed(Button::W) {
            self.menu_focus = (self.menu_focus + n - 1) % n;
        }
        if input.pressed(Button::Down) || input.pressed(Button::S) {
            self.menu_focus = (self.menu_focus + 1) % n;
        }
        let hovered = self.menu_hit(input.pointer);
        if let Some(item) = hovered {
            if self.pointer_moved(input) {
                self.menu_focus = item as usize;
            }
        }

        if input.pressed(Button::Escape) {
            self.state = SessionState::Quit;
        } else if let Some(item) = hovered.filter(|_| self.clicked(input)) {
            self.activate(item, true, now);
        } else if input.pressed(Button::Enter) {
            self.activate(self.menu_focus(), false, now);
        }
    }

    fn activate(&mut self, item: MenuItem, by_click: bool, now: Instant) {
        match item {
            MenuItem::Start => self.start_game(now),
            MenuItem::Scores => {
                self.ledger.load();
                self.state = SessionState::Scores;
            }
            MenuItem::Quit => self.state = SessionState::Quit,
        }
        if by_click && self.state != SessionState::Title {
            self.suppress_click_until_release = true;
        }
    }

    fn start_game(&mut self, now: Instant) {
        let (cw, ch, gap) = self.cell_size;
        let (vw, vh) = self.viewport;
        let layout = CellLayout::centered(&self.board_config, cw, ch, gap, vw, vh);
        match Game::new(self.board_config, &layout) {
            Ok(game) => {
                info!(
                    width = self.board_config.width,
                    height = self.board_config.height,
                    mines = self.board_config.mines,
                    "new game"
                );
                self.game = Some(game);
                self.started_at = Some(now);
                self.cursor = (0, 0);
                self.state = SessionState::Playing;
            }
            Err(e) => error!("cannot start a game: {e}"),
        }
    }

    fn step_playing(&mut self, input: &InputSnapshot, now: Instant) {
        if input.pressed(Button::Escape) {
            info!("game abandoned");
            self.game = None;
            self.started_at = None;
            self.state = SessionState::Title;
            return;
        }
        let pointer_moved = self.pointer_moved(input);
        let clicked = self.clicked(input);
        let Some(game) = self.game.as_mut() else {
            self.state = SessionState::Title;
            return;
        };

        let hovered = game.board().hit_test(input.pointer.0, input.pointer.1);
        if let Some(cell) = hovered.filter(|_| pointer_moved) {
            self.cursor = cell;
        }
        let (w, h) = (game.board().width(), game.board().height());
        let (cx, cy) = self.cursor;
        if input.pressed(Button::Up) || input.pressed(Button::W) {
            self.cursor.1 = cy.saturating_sub(1);
        }
        if input.pressed(Button::Down) || input.pressed(Button::S) {
            self.cursor.1 = (cy + 1).min(h - 1);
        }
        if input.pressed(Button::A) {
            self.cursor.0 = cx.saturating_sub(1);
        }
        if input.pressed(Button::D) {
            self.cursor.0 = (cx + 1).min(w - 1);
        }

        let mut outcome = None;
        if let Some((x, y)) = hovered {
            if clicked {
                outcome = Some(game.reveal(x, y));
            } else if input.pressed(Button::RightClick) {
                if let Err(e) = game.toggle_flag(x, y) {
                    error!("flag toggle rejected: {e}");
                }
            }
        }
        if outcome.is_none() && input.pressed(Button::Enter) {
            let (x, y) = self.cursor;
            outcome = Some(game.reveal(x, y));
        }

        match outcome {
            Some(Ok(RevealOutcome::HitMine)) => {
                info!(elapsed = self.elapsed(now), "stepped on a mine");
                self.game = None;
                self.started_at = None;
                self.last_result = Some(LastResult::Lost);
                self.state = SessionState::Title;
            }
            Some(Err(e)) => error!("reveal rejected: {e}"),
            _ => {
                if game.check_win() {
                    let time = self.elapsed(now);
                    info!("board cleared in {time:.2}s");
                    self.state = SessionState::Won { time };
                }
            }
        }
    }

    fn step_won(&mut self, time: f64, prompt: &mut dyn NamePrompt) {
        let recorded = if self.ledger.is_qualifying(time) {
            let name = sanitize_name(&prompt.prompt_name(time, &self.player_name));
            let recorded = self.ledger.record(&name, time);
            self.player_name = name;
            recorded
        } else {
            false
        };
        self.last_result = Some(LastResult::Won { time, recorded });
        self.game = None;
        self.started_at = None;
        self.state = SessionState::Title;
    }

    fn step_scores(&mut self, input: &InputSnapshot) {
        let clicked = self.clicked(input);
        if clicked || input.pressed(Button::Enter) || input.pressed(Button::Escape) {
            self.state = SessionState::Title;
            if clicked {
                self.suppress_click_until_release = true;
            }
        }
    }
}
