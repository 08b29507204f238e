// Edge-detected input snapshots
// All terminal events polled during a frame are folded into one snapshot per frame

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Logical buttons the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    W,
    S,
    A,
    D,
    LeftClick,
    RightClick,
    Enter,
    Escape,
}

impl Button {
    pub const COUNT: usize = 10;

    const fn index(self) -> usize {
        self as usize
    }

    fn is_mouse(self) -> bool {
        matches!(self, Button::LeftClick | Button::RightClick)
    }
}

/// State of one button in a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub is_down: bool,
    pub changed: bool,
}

/// What the game sees in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    buttons: [ButtonState; Button::COUNT],
    pub pointer: (u16, u16),
    pub close_requested: bool,
}

impl InputSnapshot {
    pub fn button(&self, b: Button) -> ButtonState {
        self.buttons[b.index()]
    }

    pub fn is_down(&self, b: Button) -> bool {
        self.button(b).is_down
    }

    /// Went down this frame
    pub fn pressed(&self, b: Button) -> bool {
        let s = self.button(b);
        s.is_down && s.changed
    }

    /// Went up this frame
    #[cfg(test)]
    pub fn released(&self, b: Button) -> bool {
        let s = self.button(b);
        !s.is_down && s.changed
    }

    /// Build a snapshot directly, for driving the session without a terminal
    #[cfg(test)]
    pub fn with(mut self, b: Button, is_down: bool, changed: bool) -> Self {
        self.buttons[b.index()] = ButtonState { is_down, changed };
        self
    }

    #[cfg(test)]
    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.pointer = (x, y);
        self
    }
}

/// Accumulates raw events between frames and produces snapshots
#[derive(Debug, Clone)]
pub struct InputTracker {
    down: [bool; Button::COUNT],
    reported: [bool; Button::COUNT],
    pending_release: [bool; Button::COUNT],
    // A press arrived since the last snapshot, even if the button was already down
    pressed: [bool; Button::COUNT],
    pointer: (u16, u16),
    close_requested: bool,
    // Most terminals only report key presses; releases are synthesized a frame later
    key_release_events: bool,
}

impl Default for InputTracker {
    fn default() -> Self {
        InputTracker::new(cfg!(windows))
    }
}

impl InputTracker {
    pub fn new(key_release_events: bool) -> Self {
        InputTracker {
            down: [false; Button::COUNT],
            reported: [false; Button::COUNT],
            pending_release: [false; Button::COUNT],
            pressed: [false; Button::COUNT],
            pointer: (0, 0),
            close_requested: false,
            key_release_events,
        }
    }

    pub fn press(&mut self, b: Button) {
        let i = b.index();
        self.down[i] = true;
        self.pending_release[i] = false;
        self.pressed[i] = true;
        if !b.is_mouse() && !self.key_release_events {
            self.release(b);
        }
    }

    /// A release of a button pressed during this same frame is held back
    /// one frame so the press is still observed
    pub fn release(&mut self, b: Button) {
        let i = b.index();
        if self.pressed[i] {
            self.pending_release[i] = true;
        } else {
            self.down[i] = false;
        }
    }

    pub fn move_pointer(&mut self, x: u16, y: u16) {
        self.pointer = (x, y);
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Forget every button, for when events were consumed elsewhere
    /// (e.g. by a modal dialog) and releases may have been missed
    pub fn reset(&mut self) {
        self.down = [false; Button::COUNT];
        self.reported = [false; Button::COUNT];
        self.pending_release = [false; Button::COUNT];
        self.pressed = [false; Button::COUNT];
    }

    /// Fold one crossterm event into the pending frame
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::Key(key) => self.apply_key(key),
            Event::Mouse(mouse) => self.apply_mouse(mouse),
            _ => {}
        }
    }

    fn apply_key(&mut self, key: &KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.request_close();
            return;
        }
        let button = match key.code {
            KeyCode::Up => Button::Up,
            KeyCode::Down => Button::Down,
            KeyCode::Enter | KeyCode::Char(' ') => Button::Enter,
            KeyCode::Esc => Button::Escape,
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => Button::W,
                's' => Button::S,
                'a' => Button::A,
                'd' => Button::D,
                _ => return,
            },
            _ => return,
        };
        match key.kind {
            KeyEventKind::Release => {
                // The terminal reports real releases, stop synthesizing them
                self.key_release_events = true;
                self.release(button);
            }
            // Auto-repeat of a key that is still held is not a new press
            KeyEventKind::Repeat if self.down[button.index()] => {}
            KeyEventKind::Press | KeyEventKind::Repeat => self.press(button),
        }
    }

    fn apply_mouse(&mut self, mouse: &MouseEvent) {
        self.move_pointer(mouse.column, mouse.row);
        let button = |b: &MouseButton| match b {
            MouseButton::Left => Some(Button::LeftClick),
            MouseButton::Right => Some(Button::RightClick),
            MouseButton::Middle => None,
        };
        match &mouse.kind {
            MouseEventKind::Down(b) => {
                if let Some(b) = button(b) {
                    self.press(b);
                }
            }
            MouseEventKind::Up(b) => {
                if let Some(b) = button(b) {
                    self.release(b);
                }
            }
            _ => {}
        }
    }

    /// Close the frame: report edges against the previous snapshot and start the next frame
    pub fn snapshot(&mut self) -> InputSnapshot {
        let mut snap = InputSnapshot {
            pointer: self.pointer,
            close_requested: self.close_requested,
            ..InputSnapshot::default()
        };
        for i in 0..Button::COUNT {
            snap.buttons[i] = ButtonState {
                is_down: self.down[i],
                changed: self.down[i] != self.reported[i] || self.pressed[i],
            };
        }
        self.reported = self.down;
        self.pressed = [false; Button::COUNT];
        for i in 0..Button::COUNT {
            if self.pending_release[i] {
                self.pending_release[i] = false;
                self.down[i] = false;
            }
        }
        self.close_requested = false;
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn held_button_is_pressed_exactly_once() {
        let mut input = InputTracker::new(false);
        input.apply(&mouse(MouseEventKind::Down(MouseButton::Left), 4, 2));

        let first = input.snapshot();
        assert!(first.pressed(Button::LeftClick));
        assert_eq!(first.pointer, (4, 2));

        for _ in 0..3 {
            let held = input.snapshot();
            assert!(held.is_down(Button::LeftClick));
            assert!(!held.pressed(Button::LeftClick));
            assert!(!held.released(Button::LeftClick));
        }

        input.apply(&mouse(MouseEventKind::Up(MouseButton::Left), 4, 2));
        assert!(input.snapshot().released(Button::LeftClick));
        assert_eq!(input.snapshot().button(Button::LeftClick), ButtonState::default());
    }

    #[test]
    fn click_within_one_frame_is_not_lost() {
        let mut input = InputTracker::new(false);
        input.apply(&mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
        input.apply(&mouse(MouseEventKind::Up(MouseButton::Right), 1, 1));

        assert!(input.snapshot().pressed(Button::RightClick));
        assert!(input.snapshot().released(Button::RightClick));
        assert!(!input.snapshot().button(Button::RightClick).changed);
    }

    #[test]
    fn keys_get_synthetic_release() {
        let mut input = InputTracker::new(false);
        input.apply(&key(KeyCode::Char('W'), KeyEventKind::Press));

        assert!(input.snapshot().pressed(Button::W));
        assert!(input.snapshot().released(Button::W));
    }

    #[test]
    fn real_key_release_events_are_honored() {
        let mut input = InputTracker::new(true);
        input.apply(&key(KeyCode::Enter, KeyEventKind::Press));

        assert!(input.snapshot().pressed(Button::Enter));
        assert!(input.snapshot().is_down(Button::Enter));

        input.apply(&key(KeyCode::Enter, KeyEventKind::Release));
        assert!(input.snapshot().released(Button::Enter));
    }

    #[test]
    fn repeated_key_press_is_seen_every_frame() {
        let mut input = InputTracker::new(false);
        input.apply(&key(KeyCode::Char('d'), KeyEventKind::Press));
        assert!(input.snapshot().pressed(Button::D));

        input.apply(&key(KeyCode::Char('d'), KeyEventKind::Press));
        assert!(input.snapshot().pressed(Button::D));

        input.apply(&key(KeyCode::Char('d'), KeyEventKind::Press));
        assert!(input.snapshot().pressed(Button::D));
        assert!(input.snapshot().released(Button::D));
    }

    #[test]
    fn click_right_after_a_fast_click_is_seen() {
        let mut input = InputTracker::new(false);
        input.apply(&mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        input.apply(&mouse(MouseEventKind::Up(MouseButton::Left), 2, 2));
        assert!(input.snapshot().pressed(Button::LeftClick));

        input.apply(&mouse(MouseEventKind::Down(MouseButton::Left), 2, 2));
        let second = input.snapshot();
        assert!(second.pressed(Button::LeftClick));

        input.apply(&mouse(MouseEventKind::Up(MouseButton::Left), 2, 2));
        assert!(input.snapshot().released(Button::LeftClick));
    }

    #[test]
    fn held_key_auto_repeat_is_not_a_new_press() {
        let mut input = InputTracker::new(true);
        input.apply(&key(KeyCode::Up, KeyEventKind::Press));
        assert!(input.snapshot().pressed(Button::Up));

        input.apply(&key(KeyCode::Up, KeyEventKind::Repeat));
        let held = input.snapshot();
        assert!(held.is_down(Button::Up));
        assert!(!held.pressed(Button::Up));
    }

    #[test]
    fn reset_recovers_from_a_missed_release() {
        let mut input = InputTracker::new(false);
        input.apply(&mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        assert!(input.snapshot().pressed(Button::LeftClick));
        assert!(input.snapshot().is_down(Button::LeftClick));

        // The release went to a modal dialog instead of the tracker
        input.reset();
        let idle = input.snapshot();
        assert!(!idle.is_down(Button::LeftClick));
        assert!(!idle.button(Button::LeftClick).changed);

        input.apply(&mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        assert!(input.snapshot().pressed(Button::LeftClick));
    }

    #[test]
    fn pointer_follows_mouse_motion() {
        let mut input = InputTracker::new(false);
        input.apply(&mouse(MouseEventKind::Moved, 10, 3));
        input.apply(&mouse(MouseEventKind::Moved, 12, 5));

        let snap = input.snapshot();
        assert_eq!(snap.pointer, (12, 5));
        assert!(!snap.pressed(Button::LeftClick));
    }

    #[test]
    fn ctrl_c_requests_close_once() {
        let mut input = InputTracker::new(false);
        input.apply(&Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));

        assert!(input.snapshot().close_requested);
        assert!(!input.snapshot().close_requested);
    }
}
