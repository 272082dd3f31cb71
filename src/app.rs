use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::{PlaybackClock, SimulatedClock};
use crate::session::TrainingSession;

/// Seconds moved by one seek keypress.
pub const SEEK_STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cue,
    ToggleTraining,
    Reset,
    PlayPause,
    SeekBack,
    SeekForward,
    Quit,
}

/// Keys bound to session controls; none of them can answer a cue.
pub const RESERVED_KEYS: [char; 4] = ['s', 'r', 'q', ' '];

pub fn is_reserved_key(c: char) -> bool {
    RESERVED_KEYS.contains(&c.to_ascii_lowercase())
}

/// Map a key to a command. Session controls win over the cue key.
pub fn command_for(key: &KeyEvent, cue_key: char) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::ToggleTraining),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Reset),
        KeyCode::Char(' ') => Some(Command::PlayPause),
        KeyCode::Left => Some(Command::SeekBack),
        KeyCode::Right => Some(Command::SeekForward),
        KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char(c) if c.eq_ignore_ascii_case(&cue_key) => Some(Command::Cue),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub cue_key: char,
    pub sound: bool,
    pub timings_path: PathBuf,
    /// Shown in the header only; playback comes from the clock.
    pub video: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C: PlaybackClock = SimulatedClock> {
    pub session: TrainingSession<C>,
    pub settings: AppSettings,
}

impl<C: PlaybackClock> App<C> {
    pub fn new(session: TrainingSession<C>, settings: AppSettings) -> Self {
        Self { session, settings }
    }

    /// Advance the scheduler. Returns true when a cue sound should play.
    pub fn on_tick(&mut self) -> bool {
        let report = self.session.poll();
        report.due.is_some() && self.settings.sound
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        let Some(command) = command_for(&key, self.settings.cue_key) else {
            return Flow::Continue;
        };

        match command {
            Command::Cue => {
                self.session.press();
            }
            Command::ToggleTraining => self.session.toggle_training(),
            Command::Reset => self.session.reset_all(),
            Command::PlayPause => self.session.play_pause(),
            Command::SeekBack => self.session.seek_by(-SEEK_STEP),
            Command::SeekForward => self.session.seek_by(SEEK_STEP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_bindings() {
        assert_eq!(command_for(&key(KeyCode::Char('e')), 'e'), Some(Command::Cue));
        assert_eq!(command_for(&key(KeyCode::Char('E')), 'e'), Some(Command::Cue));
        assert_eq!(
            command_for(&key(KeyCode::Char('s')), 'e'),
            Some(Command::ToggleTraining)
        );
        assert_eq!(command_for(&key(KeyCode::Char('r')), 'e'), Some(Command::Reset));
        assert_eq!(command_for(&key(KeyCode::Esc), 'e'), Some(Command::Quit));
        assert_eq!(command_for(&key(KeyCode::Char('x')), 'e'), None);
    }

    #[test]
    fn session_controls_win_over_cue_key() {
        assert_eq!(command_for(&key(KeyCode::Char('r')), 'r'), Some(Command::Reset));
        assert_eq!(
            command_for(&key(KeyCode::Char('S')), 's'),
            Some(Command::ToggleTraining)
        );
        assert!(is_reserved_key('Q'));
        assert!(is_reserved_key(' '));
        assert!(!is_reserved_key('e'));
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(&ev, 'c'), Some(Command::Quit));
    }
}
