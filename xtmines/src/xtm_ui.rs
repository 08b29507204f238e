use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tracing::error;
use unicode_width::UnicodeWidthStr;

use crate::xtm_board::{Cell, CellRect};
use crate::xtm_color::Theme;
use crate::xtm_config::{Config, save_config};
use crate::xtm_input::InputTracker;
use crate::xtm_score::{MAX_NAME_LEN, MAX_SCORES, ScoreLedger};
use crate::xtm_session::{LastResult, NamePrompt, Session, SessionState};

// Upper bound on how long a frame waits for input
const FRAME_TIME: Duration = Duration::from_millis(50);

const GLYPH_HIDDEN: &str = "■";
const GLYPH_FLAG: &str = "⚑";
const GLYPH_MINE: &str = "☼";

pub fn run(cfg: &mut Config, ledger: ScoreLedger) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = frame_loop(&mut terminal, cfg, ledger);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// One iteration per frame: render, gather input, step the session
fn frame_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    cfg: &mut Config,
    ledger: ScoreLedger,
) -> Result<(), Box<dyn Error>> {
    let theme = Theme::detect();
    let mut session = Session::new(cfg.board, ledger)
        .with_cell_size(cfg.cell_width, cfg.cell_height, cfg.cell_gap)
        .with_player_name(&cfg.player_name);
    let mut input = InputTracker::default();

    loop {
        let size = terminal.size()?;
        session.set_viewport(size.width, size.height);
        let now = Instant::now();
        terminal.draw(|f| draw(f, &session, &theme, now))?;

        // Coalesce everything that arrived during this frame
        if event::poll(FRAME_TIME)? {
            loop {
                input.apply(&event::read()?);
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
        let snapshot = input.snapshot();

        let mut prompt = ModalNamePrompt {
            terminal: &mut *terminal,
            theme: &theme,
            shown: false,
        };
        let state = session.step(&snapshot, Instant::now(), &mut prompt);
        // The modal read its own events, so button releases may never have reached the tracker
        if prompt.shown {
            input.reset();
        }

        if session.player_name() != cfg.player_name {
            cfg.player_name = session.player_name().to_string();
            save_config(cfg);
        }
        if state == SessionState::Quit {
            break;
        }
    }
    Ok(())
}

/// Blocking name entry drawn over the whole screen
struct ModalNamePrompt<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    theme: &'a Theme,
    shown: bool,
}

impl<B: Backend> NamePrompt for ModalNamePrompt<'_, B> {
    fn prompt_name(&mut self, time: f64, suggested: &str) -> String {
        self.shown = true;
        let theme = self.theme;
        let mut name: String = suggested.chars().take(MAX_NAME_LEN).collect();
        loop {
            if let Err(e) = self.terminal.draw(|f| draw_name_modal(f, theme, time, &name)) {
                error!("cannot draw name prompt: {e}");
                return name;
            }
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    error!("cannot read name input: {e}");
                    return name;
                }
            };
            let Event::Key(key) = event else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Enter => return name,
                // Empty names are recorded under the default name
                KeyCode::Esc => return String::new(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return name;
                }
                KeyCode::Backspace => {
                    name.pop();
                }
                KeyCode::Char(c) if !c.is_control() => {
                    if name.chars().count() < MAX_NAME_LEN {
                        name.push(c);
                    }
                }
                _ => {}
            }
        }
    }
}

fn draw<B: Backend>(f: &mut Frame<B>, session: &Session, theme: &Theme, now: Instant) {
    let area = f.size();
    f.render_widget(Block::default().style(Style::default().bg(theme.background)), area);
    match session.state() {
        SessionState::Title | SessionState::Quit => draw_title(f, session, theme),
        SessionState::Playing | SessionState::Won { .. } => draw_game(f, session, theme, now),
        SessionState::Scores => draw_scores(f, session, theme),
    }
}

fn draw_title<B: Backend>(f: &mut Frame<B>, session: &Session, theme: &Theme) {
    let area = f.size();
    let menu = session.menu_rects();
    let top = menu[0].1.y;

    let title = Paragraph::new(Span::styled(
        "M I N E S W E E P E R",
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    render_clipped(f, title, Rect::new(0, top.saturating_sub(4), area.width, 1));

    if let Some(result) = session.last_result() {
        let line = match result {
            LastResult::Lost => "Boom! You stepped on a mine.".to_string(),
            LastResult::Won { time, recorded: true } => {
                format!("Cleared in {time:.2}s - added to the score board!")
            }
            LastResult::Won { time, recorded: false } => format!("Cleared in {time:.2}s"),
        };
        let fg = if result == LastResult::Lost { theme.lost } else { theme.text };
        let p = Paragraph::new(Span::styled(line, Style::default().fg(fg)))
            .alignment(Alignment::Center);
        render_clipped(f, p, Rect::new(0, top.saturating_sub(2), area.width, 1));
    }

    let focus = session.menu_focus();
    for (item, rect) in menu {
        let bg = if item == focus { theme.button_hover } else { theme.button };
        let fg = if item == focus { theme.text } else { theme.button_text };
        let style = Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD);
        let button = Paragraph::new(item.label())
            .style(style)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).style(style));
        render_clipped(f, button, to_rect(rect));
    }

    let hint = Paragraph::new(Span::styled(
        "Click or W/S + Enter to choose   Esc: Quit",
        Style::default().fg(theme.text),
    ))
    .alignment(Alignment::Center);
    render_clipped(f, hint, Rect::new(0, area.height.saturating_sub(1), area.width, 1));
}

fn draw_game<B: Backend>(f: &mut Frame<B>, session: &Session, theme: &Theme, now: Instant) {
    let area = f.size();
    let Some(game) = session.game() else {
        return;
    };
    let board = game.board();

    // status row (left info + right-aligned key hint)
    let left = match session.state() {
        SessionState::Won { time } => format!(" Cleared in {time:.2}s "),
        _ if !game.generation().is_placed() => {
            format!(" Mines: {}   First reveal is safe ", game.remaining_mines())
        }
        _ => format!(
            " Mines: {}   Time: {}s ",
            game.remaining_mines(),
            session.elapsed(now) as u64
        ),
    };
    let right = "Esc: Title ";
    let pad = (area.width as usize).saturating_sub(left.as_str().width() + right.width());
    let status = Paragraph::new(Spans::from(vec![
        Span::styled(left, Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(pad)),
        Span::styled(right, Style::default().fg(theme.title)),
    ]));
    render_clipped(f, status, Rect::new(0, 0, area.width, 1));

    // frame around the whole board
    if let (Ok(first), Ok(last)) = (
        board.cell_rect(0, 0),
        board.cell_rect(board.width() - 1, board.height() - 1),
    ) {
        let outer = Rect::new(
            first.x.saturating_sub(1),
            first.y.saturating_sub(1),
            last.x.saturating_add(last.width).saturating_add(1).saturating_sub(first.x.saturating_sub(1)),
            last.y.saturating_add(last.height).saturating_add(1).saturating_sub(first.y.saturating_sub(1)),
        );
        let frame = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(theme.text));
        render_clipped(f, frame, outer);
    }

    let cursor = session.cursor();
    for ((x, y), cell) in board.cells() {
        let Ok(rect) = board.cell_rect(x, y) else {
            continue;
        };
        let (glyph, mut style) = cell_look(cell, theme);
        if (x, y) == cursor && matches!(session.state(), SessionState::Playing) {
            style = style.bg(theme.cursor);
        }
        // glyph on the middle row of the cell
        let mid = rect.height / 2;
        let lines: Vec<Spans> = (0..rect.height)
            .map(|row| {
                if row == mid {
                    Spans::from(glyph.to_string())
                } else {
                    Spans::from("")
                }
            })
            .collect();
        let p = Paragraph::new(Text::from(lines))
            .style(style)
            .alignment(Alignment::Center);
        render_clipped(f, p, to_rect(rect));
    }
}

/// Glyph and style of one cell
fn cell_look(cell: &Cell, theme: &Theme) -> (String, Style) {
    let hidden = Style::default().bg(theme.cell_hidden);
    let open = Style::default().bg(theme.cell_revealed);
    if cell.is_revealed() {
        if cell.is_mine() {
            (GLYPH_MINE.to_string(), open.bg(theme.lost).fg(theme.button_text))
        } else if cell.neighbor_mine_count() > 0 {
            let n = cell.neighbor_mine_count();
            (n.to_string(), open.fg(theme.number(n)).add_modifier(Modifier::BOLD))
        } else {
            (String::new(), open)
        }
    } else if cell.is_flagged() {
        (GLYPH_FLAG.to_string(), hidden.fg(theme.flag).add_modifier(Modifier::BOLD))
    } else {
        (GLYPH_HIDDEN.to_string(), hidden.fg(theme.cell_revealed))
    }
}

fn draw_scores<B: Backend>(f: &mut Frame<B>, session: &Session, theme: &Theme) {
    let area = f.size();
    let scores = session.ledger().scores();
    let mut lines = vec![Spans::from("")];
    if scores.is_empty() {
        lines.push(Spans::from("No scores yet"));
    }
    for (i, s) in scores.iter().enumerate() {
        lines.push(Spans::from(format!(
            "{:>2}. {:<width$} {:>8.2}s",
            i + 1,
            s.name,
            s.time,
            width = MAX_NAME_LEN
        )));
    }
    lines.push(Spans::from(""));
    lines.push(Spans::from(Span::styled(
        "Click, Enter or Esc to go back",
        Style::default().fg(theme.title),
    )));

    let height = MAX_SCORES as u16 + 5;
    let rect = center_rect(40, height, area);
    f.render_widget(Clear, rect);
    let board = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.background))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Score Board ")
                .title_alignment(Alignment::Center),
        );
    f.render_widget(board, rect);
}

fn draw_name_modal<B: Backend>(f: &mut Frame<B>, theme: &Theme, time: f64, name: &str) {
    let area = f.size();
    f.render_widget(Block::default().style(Style::default().bg(theme.background)), area);
    let rect = center_rect(44, 8, area);
    f.render_widget(Clear, rect);

    let field = format!("{:<width$}", name, width = MAX_NAME_LEN);
    let lines = vec![
        Spans::from(""),
        Spans::from(format!("Your time: {time:.2}s")),
        Spans::from(""),
        Spans::from(vec![
            Span::raw("Name: "),
            Span::styled(field, Style::default().bg(theme.button).fg(theme.button_text)),
        ]),
        Spans::from(""),
        Spans::from(Span::styled("Enter: save   Esc: default name", Style::default().fg(theme.title))),
    ];
    let modal = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.background))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" New best time! ")
                .title_alignment(Alignment::Center),
        );
    f.render_widget(modal, rect);
}

fn to_rect(r: CellRect) -> Rect {
    Rect::new(r.x, r.y, r.width, r.height)
}

/// Part of `r` that lies inside `area`, if any
fn clip(r: Rect, area: Rect) -> Option<Rect> {
    let x1 = r.x.max(area.x);
    let y1 = r.y.max(area.y);
    let x2 = (r.x as u32 + r.width as u32).min(area.x as u32 + area.width as u32);
    let y2 = (r.y as u32 + r.height as u32).min(area.y as u32 + area.height as u32);
    if x2 <= x1 as u32 || y2 <= y1 as u32 {
        return None;
    }
    Some(Rect::new(x1, y1, (x2 - x1 as u32) as u16, (y2 - y1 as u32) as u16))
}

fn render_clipped<B: Backend, W: ratatui::widgets::Widget>(f: &mut Frame<B>, widget: W, r: Rect) {
    if let Some(r) = clip(r, f.size()) {
        f.render_widget(widget, r);
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_trims_to_area() {
        let area = Rect::new(0, 0, 10, 5);

        assert_eq!(clip(Rect::new(8, 3, 4, 4), area), Some(Rect::new(8, 3, 2, 2)));
        assert_eq!(clip(Rect::new(10, 0, 3, 1), area), None);
        assert_eq!(clip(Rect::new(2, 2, 3, 1), area), Some(Rect::new(2, 2, 3, 1)));
    }

    #[test]
    fn center_rect_never_exceeds_area() {
        let r = center_rect(40, 15, Rect::new(0, 0, 30, 10));

        assert_eq!(r, Rect::new(0, 0, 30, 10));
        assert_eq!(center_rect(10, 2, Rect::new(0, 0, 30, 10)), Rect::new(10, 4, 10, 2));
    }
}
