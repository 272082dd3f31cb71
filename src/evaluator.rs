use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::judge::{self, Band, Outcome, MISS_GRACE};
use crate::stats::{LogRecord, SessionLog, SessionStats};
use crate::timer::Timer;

/// A timestamp currently being tracked for a keypress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub target_time: f64,
    pub armed_at: Instant,
}

/// Events produced by the evaluator, in resolution order.
#[derive(Debug, Clone, PartialEq)]
pub enum CueEvent {
    Classified {
        outcome: Outcome,
        band: Band,
        offset_ms: i64,
    },
    Missed {
        target_time: f64,
    },
    SessionComplete {
        stats: SessionStats,
        log: Vec<LogRecord>,
    },
}

/// Receives evaluator events for rendering.
pub trait PresentationSink {
    fn on_classification(&mut self, outcome: Outcome, band: Band, offset_ms: i64);
    fn on_miss(&mut self);
    fn on_session_complete(&mut self, stats: &SessionStats, log: &[LogRecord]);
}

impl CueEvent {
    pub fn deliver<S: PresentationSink + ?Sized>(&self, sink: &mut S) {
        match self {
            CueEvent::Classified {
                outcome,
                band,
                offset_ms,
            } => sink.on_classification(*outcome, *band, *offset_ms),
            CueEvent::Missed { .. } => sink.on_miss(),
            CueEvent::SessionComplete { stats, log } => sink.on_session_complete(stats, log),
        }
    }
}

/// What a keypress did. Stray and too-early presses are values, not errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressOutcome {
    NoActiveCue,
    Ignored { diff: f64 },
    Classified { outcome: Outcome, offset_ms: i64 },
}

#[derive(Debug, Default)]
struct EvaluatorState {
    active: Option<Cue>,
    // Bumped on reset so timeouts scheduled before it never match again.
    generation: u64,
    stats: SessionStats,
    log: SessionLog,
}

/// Owns the single active-cue slot and resolves each cue exactly once.
///
/// Cheap to clone; clones share state, so the polling loop, the input
/// handler and pending timeouts can each hold one.
#[derive(Clone)]
pub struct CueEvaluator {
    state: Arc<Mutex<EvaluatorState>>,
    timer: Arc<dyn Timer>,
    events: Sender<CueEvent>,
    miss_grace: Duration,
}

impl CueEvaluator {
    pub fn new<T: Timer>(timer: T) -> (Self, Receiver<CueEvent>) {
        let (events, rx) = mpsc::channel();
        let evaluator = Self {
            state: Arc::new(Mutex::new(EvaluatorState::default())),
            timer: Arc::new(timer),
            events,
            miss_grace: Duration::from_secs_f64(MISS_GRACE),
        };
        (evaluator, rx)
    }

    /// Arm a cue unless one is already active. Returns whether it was armed.
    ///
    /// A second cue arriving while the first is unresolved is dropped, not
    /// queued, so closely spaced cues can be skipped entirely.
    pub fn arm(&self, target_time: f64) -> bool {
        let mut state = self.lock();
        if let Some(active) = state.active {
            debug!(
                "arm {target_time:.3} dropped, cue {:.3} still active",
                active.target_time
            );
            return false;
        }

        state.active = Some(Cue {
            target_time,
            armed_at: Instant::now(),
        });
        trace!("armed cue {target_time:.3}");
        true
    }

    /// Schedule the miss check for `target_time` after the grace period.
    pub fn start_timeout(&self, target_time: f64) {
        let generation = self.lock().generation;
        let state = Arc::clone(&self.state);
        let events = self.events.clone();

        self.timer.schedule(
            self.miss_grace,
            Box::new(move || {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                resolve_timeout(&mut state, &events, target_time, generation);
            }),
        );
    }

    pub fn handle_keypress(&self, press_time: f64) -> PressOutcome {
        let mut state = self.lock();
        let Some(cue) = state.active else {
            trace!("stray press at {press_time:.3}");
            return PressOutcome::NoActiveCue;
        };

        let diff = press_time - cue.target_time;
        let Some(outcome) = judge::classify(diff) else {
            trace!(
                "press at {press_time:.3} ignored, {diff:.3}s before cue {:.3}",
                cue.target_time
            );
            return PressOutcome::Ignored { diff };
        };

        let offset_ms = judge::offset_ms(diff);
        state.stats.record(outcome);
        state
            .log
            .push(LogRecord::classified(cue.target_time, outcome, offset_ms));
        emit(
            &self.events,
            CueEvent::Classified {
                outcome,
                band: outcome.band(),
                offset_ms,
            },
        );
        state.active = None;

        debug!(
            "cue {:.3} resolved {outcome} ({offset_ms:+}ms)",
            cue.target_time
        );
        PressOutcome::Classified { outcome, offset_ms }
    }

    /// Close out the session: a cue still waiting on its timeout is scored
    /// as a miss now, then statistics and the drained log are emitted.
    pub fn finish(&self) -> (SessionStats, Vec<LogRecord>) {
        let mut state = self.lock();
        if let Some(cue) = state.active.take() {
            record_miss(&mut state, &self.events, cue.target_time);
        }

        let stats = state.stats;
        let log = state.log.drain();
        emit(
            &self.events,
            CueEvent::SessionComplete {
                stats,
                log: log.clone(),
            },
        );
        (stats, log)
    }

    /// Forget the active cue, zero the counters and empty the log.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.active = None;
        state.generation = state.generation.wrapping_add(1);
        state.stats = SessionStats::default();
        state.log.clear();
        debug!("evaluator reset (generation {})", state.generation);
    }

    pub fn active_cue(&self) -> Option<Cue> {
        self.lock().active
    }

    pub fn stats(&self) -> SessionStats {
        self.lock().stats
    }

    pub fn log(&self) -> SessionLog {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, EvaluatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve_timeout(
    state: &mut EvaluatorState,
    events: &Sender<CueEvent>,
    target_time: f64,
    generation: u64,
) {
    if state.generation != generation {
        trace!("timeout {target_time:.3} from an earlier session, ignored");
        return;
    }

    match state.active {
        Some(cue) if cue.target_time == target_time => {
            state.active = None;
            record_miss(state, events, target_time);
        }
        _ => trace!("timeout {target_time:.3} already resolved"),
    }
}

fn record_miss(state: &mut EvaluatorState, events: &Sender<CueEvent>, target_time: f64) {
    state.stats.record(Outcome::Miss);
    state.log.push(LogRecord::miss(target_time));
    emit(events, CueEvent::Missed { target_time });
    debug!("cue {target_time:.3} missed");
}

/// Scoring stands even when nobody is listening any more.
fn emit(events: &Sender<CueEvent>, event: CueEvent) {
    if let Err(e) = events.send(event) {
        trace!("no listener for {:?}", e.0);
    }
}
