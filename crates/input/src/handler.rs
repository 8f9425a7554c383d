//! Hold tracking for terminal environments.
//!
//! Supports terminals that do not emit key release events by using a timeout:
//! a held direction is released once no press or repeat for it has arrived
//! within the timeout.

use crossterm::event::{KeyEvent, KeyEventKind};

use crate::map::{handle_key_event, hold_direction};
use crate::types::{Command, Direction};

// Shorter than the engine's 200ms repeat, so a tap never repeats.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

/// Turns raw key events into commands, deduplicating hold starts.
#[derive(Debug, Clone)]
pub struct InputHandler {
    held: Option<Direction>,
    since_last_key_ms: u32,
    key_release_timeout_ms: u32,
    /// Release events were seen, so timeouts are not needed.
    releases_reported: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            held: None,
            since_last_key_ms: 0,
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
            releases_reported: false,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn held(&self) -> Option<Direction> {
        self.held
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if let Some(direction) = hold_direction(key.code) {
            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => {
                    self.since_last_key_ms = 0;
                    if self.held == Some(direction) {
                        return None;
                    }
                    self.held = Some(direction);
                    return Some(Command::HoldStart(direction));
                }
                KeyEventKind::Release => {
                    self.releases_reported = true;
                    if self.held != Some(direction) {
                        return None;
                    }
                    self.held = None;
                    return Some(Command::HoldStop(direction));
                }
            }
        }
        handle_key_event(key)
    }

    /// Advance the release timeout; returns the stop for a hold that timed out.
    pub fn update(&mut self, elapsed_ms: u32) -> Option<Command> {
        if self.releases_reported {
            return None;
        }
        let direction = self.held?;
        self.since_last_key_ms = self.since_last_key_ms.saturating_add(elapsed_ms);
        if self.since_last_key_ms > self.key_release_timeout_ms {
            self.held = None;
            return Some(Command::HoldStop(direction));
        }
        None
    }

    /// Forget any hold, e.g. after a pause.
    pub fn reset(&mut self) {
        self.held = None;
        self.since_last_key_ms = 0;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn repeated_presses_start_once() {
        let mut h = InputHandler::new();
        assert_eq!(
            h.handle_key(key(KeyCode::Left, KeyEventKind::Press)),
            Some(Command::HoldStart(Direction::Left))
        );
        assert_eq!(h.handle_key(key(KeyCode::Left, KeyEventKind::Press)), None);
        assert_eq!(h.handle_key(key(KeyCode::Left, KeyEventKind::Repeat)), None);
        assert_eq!(
            h.handle_key(key(KeyCode::Right, KeyEventKind::Press)),
            Some(Command::HoldStart(Direction::Right))
        );
    }

    #[test]
    fn tap_times_out_without_release_events() {
        let mut h = InputHandler::new();
        h.handle_key(key(KeyCode::Down, KeyEventKind::Press));
        assert_eq!(h.update(100), None);
        assert_eq!(h.update(100), Some(Command::HoldStop(Direction::Down)));
        assert_eq!(h.held(), None);
        assert_eq!(h.update(100), None);
    }

    #[test]
    fn presses_keep_hold_alive() {
        let mut h = InputHandler::new();
        h.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        for _ in 0..10 {
            assert_eq!(h.update(100), None);
            h.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        }
        assert_eq!(h.held(), Some(Direction::Left));
    }

    #[test]
    fn release_events_disable_timeout() {
        let mut h = InputHandler::new();
        h.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        assert_eq!(
            h.handle_key(key(KeyCode::Left, KeyEventKind::Release)),
            Some(Command::HoldStop(Direction::Left))
        );
        h.handle_key(key(KeyCode::Right, KeyEventKind::Press));
        assert_eq!(h.update(1_000), None);
        assert_eq!(h.held(), Some(Direction::Right));
    }

    #[test]
    fn other_keys_pass_through() {
        let mut h = InputHandler::new();
        assert_eq!(
            h.handle_key(key(KeyCode::Char(' '), KeyEventKind::Press)),
            Some(Command::HardDrop)
        );
    }
}
