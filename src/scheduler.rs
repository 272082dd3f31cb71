use log::{debug, info};

use crate::evaluator::CueEvaluator;
use crate::timings::TimingSequence;

/// How far ahead of its timestamp a cue is armed, so early presses match it.
pub const ARM_LEAD: f64 = 0.500;
/// How long after the last cue before the session is declared complete.
pub const END_GRACE: f64 = 0.500;

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub armed: Option<f64>,
    /// Set when a cue became due this tick; the host plays the cue sound.
    pub due: Option<f64>,
    pub complete: bool,
}

/// Walks the timing sequence in lockstep with playback position.
#[derive(Debug, Clone)]
pub struct CueScheduler {
    timings: TimingSequence,
    current_index: usize,
    last_armed_index: Option<usize>,
    finished: bool,
}

impl CueScheduler {
    pub fn new(timings: TimingSequence) -> Self {
        Self {
            timings,
            current_index: 0,
            last_armed_index: None,
            finished: false,
        }
    }

    pub fn on_tick(&mut self, current_time: f64, evaluator: &CueEvaluator) -> TickReport {
        let mut report = TickReport::default();
        if self.finished {
            return report;
        }

        let Some(target) = self.timings.get(self.current_index) else {
            let ended = match self.timings.last() {
                Some(last) => current_time >= last + END_GRACE,
                None => true,
            };
            if ended {
                info!("all {} cues played", self.timings.len());
                self.finished = true;
                report.complete = true;
            }
            return report;
        };

        if current_time >= target - ARM_LEAD && self.last_armed_index != Some(self.current_index)
        {
            evaluator.arm(target);
            self.last_armed_index = Some(self.current_index);
            report.armed = Some(target);
        }

        if current_time >= target {
            debug!("cue {target:.3} due at {current_time:.3}");
            evaluator.start_timeout(target);
            self.current_index += 1;
            report.due = Some(target);
        }

        report
    }

    /// Rewind to the first cue.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.last_armed_index = None;
        self.finished = false;
    }

    /// `(cues consumed, total cues)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index, self.timings.len())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn timings(&self) -> &TimingSequence {
        &self.timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::CueEvent;
    use crate::timer::ManualTimer;
    use std::sync::Arc;

    fn setup(times: &[f64]) -> (CueScheduler, CueEvaluator, Arc<ManualTimer>) {
        let timer = Arc::new(ManualTimer::new());
        let (ev, _rx) = CueEvaluator::new(Arc::clone(&timer));
        let sched = CueScheduler::new(TimingSequence::from_times(times.to_vec()));
        (sched, ev, timer)
    }

    #[test]
    fn arms_half_a_second_early() {
        let (mut sched, ev, timer) = setup(&[10.0]);

        assert_eq!(sched.on_tick(9.0, &ev), TickReport::default());
        assert!(ev.active_cue().is_none());

        let r = sched.on_tick(9.5, &ev);
        assert_eq!(r.armed, Some(10.0));
        assert_eq!(r.due, None);
        assert_eq!(ev.active_cue().map(|c| c.target_time), Some(10.0));
        assert_eq!(timer.pending(), 0);

        // Not re-armed on later ticks.
        assert_eq!(sched.on_tick(9.7, &ev).armed, None);
    }

    #[test]
    fn due_starts_timeout_and_advances() {
        let (mut sched, ev, timer) = setup(&[10.0, 12.0]);
        sched.on_tick(9.6, &ev);

        let r = sched.on_tick(10.001, &ev);
        assert_eq!(r.due, Some(10.0));
        assert_eq!(timer.pending(), 1);
        assert_eq!(sched.progress(), (1, 2));
    }

    #[test]
    fn large_jump_arms_and_fires_in_one_tick() {
        let (mut sched, ev, timer) = setup(&[1.0]);
        let r = sched.on_tick(1.2, &ev);
        assert_eq!(r.armed, Some(1.0));
        assert_eq!(r.due, Some(1.0));
        assert_eq!(timer.pending(), 1);
    }

    #[test]
    fn completes_after_end_grace() {
        let (mut sched, ev, _timer) = setup(&[1.0]);
        sched.on_tick(1.0, &ev);

        assert!(!sched.on_tick(1.4, &ev).complete);
        assert!(sched.on_tick(1.5, &ev).complete);
        assert!(sched.is_finished());
        // Emitted once.
        assert!(!sched.on_tick(2.0, &ev).complete);
    }

    #[test]
    fn empty_sequence_completes_immediately() {
        let (mut sched, ev, _timer) = setup(&[]);
        assert!(sched.on_tick(0.0, &ev).complete);
    }

    #[test]
    fn reset_rewinds() {
        let (mut sched, ev, _timer) = setup(&[0.2]);
        sched.on_tick(0.3, &ev);
        sched.on_tick(1.0, &ev);
        assert!(sched.is_finished());

        sched.reset();
        ev.reset();
        assert_eq!(sched.progress(), (0, 1));
        assert_eq!(sched.on_tick(0.0, &ev).armed, Some(0.2));
    }

    #[test]
    fn close_cues_skip_the_second_arm() {
        // Second cue comes due before the first has timed out, so its arm is
        // dropped and it can never be scored.
        let timer = Arc::new(ManualTimer::new());
        let (ev, rx) = CueEvaluator::new(Arc::clone(&timer));
        let mut sched = CueScheduler::new(TimingSequence::from_times(vec![1.0, 1.2]));

        sched.on_tick(1.0, &ev);
        sched.on_tick(1.2, &ev);
        assert_eq!(ev.active_cue().map(|c| c.target_time), Some(1.0));

        timer.fire_all();
        let events: Vec<CueEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![CueEvent::Missed { target_time: 1.0 }]);
        assert_eq!(ev.stats().total(), 1);
    }
}
