use std::path::Path;
use std::sync::mpsc::Receiver;

use log::info;

use crate::clock::PlaybackClock;
use crate::evaluator::{CueEvaluator, CueEvent, PresentationSink, PressOutcome};
use crate::judge::{Band, Outcome};
use crate::report::SessionReport;
use crate::scheduler::{CueScheduler, TickReport};
use crate::stats::{LogRecord, SessionStats};
use crate::timer::Timer;
use crate::timings::{LoadError, TimingSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Training,
    Complete,
}

/// Running tally shown while training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: u32,
    pub early: u32,
    pub late: u32,
    pub miss: u32,
}

/// Latest feedback message. `band: None` renders neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub band: Option<Band>,
}

impl Feedback {
    fn neutral(text: &str) -> Self {
        Self {
            text: text.to_string(),
            band: None,
        }
    }
}

/// Presentation-side state fed by evaluator events.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub tally: Tally,
    pub feedback: Feedback,
    pub report: Option<SessionReport>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            tally: Tally::default(),
            feedback: Feedback::neutral("Ready"),
            report: None,
        }
    }
}

impl PresentationSink for Presentation {
    fn on_classification(&mut self, outcome: Outcome, band: Band, offset_ms: i64) {
        match band {
            Band::Success => self.tally.hits += 1,
            Band::Early => self.tally.early += 1,
            Band::Late => self.tally.late += 1,
        }
        self.feedback = Feedback {
            text: format!("{outcome} ({offset_ms}ms)"),
            band: Some(band),
        };
    }

    fn on_miss(&mut self) {
        self.tally.miss += 1;
        self.feedback = Feedback {
            text: "MISS!".to_string(),
            band: Some(Band::Late),
        };
    }

    fn on_session_complete(&mut self, stats: &SessionStats, log: &[LogRecord]) {
        self.report = Some(SessionReport::new(*stats, log.to_vec()));
    }
}

/// Drives one training run: clock, scheduler and evaluator together.
pub struct TrainingSession<C: PlaybackClock> {
    scheduler: CueScheduler,
    evaluator: CueEvaluator,
    events: Receiver<CueEvent>,
    clock: C,
    state: SessionState,
    presentation: Presentation,
}

impl<C: PlaybackClock> TrainingSession<C> {
    pub fn new<T: Timer>(timings: TimingSequence, clock: C, timer: T) -> Self {
        let (evaluator, events) = CueEvaluator::new(timer);
        Self {
            scheduler: CueScheduler::new(timings),
            evaluator,
            events,
            clock,
            state: SessionState::Idle,
            presentation: Presentation::default(),
        }
    }

    /// Replace the timing sequence and start over.
    pub fn load_timings<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let timings = TimingSequence::load(path)?;
        self.scheduler = CueScheduler::new(timings);
        self.reset_all();
        self.presentation.feedback = Feedback::neutral("timings loaded");
        Ok(())
    }

    /// Start or stop training. Starting a completed session starts it over.
    pub fn toggle_training(&mut self) {
        match self.state {
            SessionState::Training => {
                self.state = SessionState::Idle;
                self.clock.pause();
                info!("training paused at {:.3}", self.clock.current_position());
            }
            SessionState::Complete => {
                self.reset_all();
                self.start();
            }
            SessionState::Idle => self.start(),
        }
    }

    fn start(&mut self) {
        self.state = SessionState::Training;
        self.presentation.feedback = Feedback::neutral("");
        self.clock.play();
        info!("training started at {:.3}", self.clock.current_position());
    }

    /// Stop, rewind to zero and clear every counter.
    pub fn reset_all(&mut self) {
        self.state = SessionState::Idle;
        self.clock.pause();
        self.clock.seek(0.0);
        self.scheduler.reset();
        self.evaluator.reset();
        // Anything still queued belongs to the previous run.
        while self.events.try_recv().is_ok() {}
        self.presentation = Presentation::default();
    }

    /// One polling step at the current playback position.
    pub fn poll(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.state == SessionState::Training {
            report = self.scheduler.on_tick(self.clock.current_position(), &self.evaluator);
            if report.complete {
                self.complete();
            }
        }
        self.drain_events();
        report
    }

    fn complete(&mut self) {
        self.state = SessionState::Complete;
        self.clock.pause();
        let (stats, _) = self.evaluator.finish();
        info!(
            "session complete: {} cues, {} hits, {} misses",
            stats.total(),
            stats.hits(),
            stats.miss
        );
    }

    /// Forward the cue key. Ignored unless training.
    pub fn press(&mut self) -> Option<PressOutcome> {
        if self.state != SessionState::Training {
            return None;
        }
        let outcome = self.evaluator.handle_keypress(self.clock.current_position());
        self.drain_events();
        Some(outcome)
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            event.deliver(&mut self.presentation);
        }
    }

    /// Playback controls are locked while training.
    pub fn play_pause(&mut self) {
        if self.state == SessionState::Training {
            return;
        }
        if self.clock.is_playing() {
            self.clock.pause();
        } else {
            self.clock.play();
        }
    }

    pub fn seek_by(&mut self, delta: f64) {
        if self.state == SessionState::Training {
            return;
        }
        let pos = self.clock.current_position();
        self.clock.seek(pos + delta);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_training(&self) -> bool {
        self.state == SessionState::Training
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn report(&self) -> Option<&SessionReport> {
        self.presentation.report.as_ref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn evaluator(&self) -> &CueEvaluator {
        &self.evaluator
    }

    pub fn progress(&self) -> (usize, usize) {
        self.scheduler.progress()
    }
}
