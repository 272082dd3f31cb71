use std::time::Instant;

/// Playback position source. Video decoding lives behind this trait.
pub trait PlaybackClock {
    /// Current playback position in seconds.
    fn current_position(&self) -> f64;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn is_playing(&self) -> bool;
    /// Media length in seconds, when known.
    fn duration(&self) -> Option<f64>;
}

/// Wall-clock playback: advances in real time while playing. Seeking clamps
/// to the duration, if one is set; playback itself keeps running past it so
/// cues near the end still come due.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    base: f64,
    started: Option<Instant>,
    duration: Option<f64>,
}

impl SimulatedClock {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            base: 0.0,
            started: None,
            duration,
        }
    }

    fn clamp_to_media(&self, pos: f64) -> f64 {
        let pos = pos.max(0.0);
        match self.duration {
            Some(d) => pos.min(d),
            None => pos,
        }
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlaybackClock for SimulatedClock {
    fn current_position(&self) -> f64 {
        let elapsed = self
            .started
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base + elapsed).max(0.0)
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if self.started.is_some() {
            self.base = self.current_position();
            self.started = None;
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.base = self.clamp_to_media(seconds);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

/// Position as shown to the user, never beyond the media length.
pub fn display_position<C: PlaybackClock + ?Sized>(clock: &C) -> f64 {
    let pos = clock.current_position();
    clock.duration().map_or(pos, |d| pos.min(d))
}

/// Formats seconds as `mm:ss`.
pub fn format_mmss(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn paused_clock_does_not_move() {
        let clock = SimulatedClock::default();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.current_position(), 0.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn playing_clock_advances_and_pause_holds() {
        let mut clock = SimulatedClock::default();
        clock.play();
        thread::sleep(Duration::from_millis(20));
        clock.pause();

        let held = clock.current_position();
        assert!(held >= 0.02);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.current_position(), held);
    }

    #[test]
    fn seek_clamps_to_bounds() {
        let mut clock = SimulatedClock::new(Some(30.0));
        clock.seek(45.0);
        assert_eq!(clock.current_position(), 30.0);
        clock.seek(-3.0);
        assert_eq!(clock.current_position(), 0.0);
        clock.seek(12.5);
        assert_eq!(clock.current_position(), 12.5);
        assert_eq!(clock.duration(), Some(30.0));
    }

    #[test]
    fn playback_runs_past_duration() {
        let mut clock = SimulatedClock::new(Some(0.01));
        clock.play();
        thread::sleep(Duration::from_millis(30));
        clock.pause();

        assert!(clock.current_position() > 0.01);
        assert_eq!(display_position(&clock), 0.01);

        clock.seek(5.0);
        assert_eq!(clock.current_position(), 0.01);
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0.0), "00:00");
        assert_eq!(format_mmss(75.9), "01:15");
        assert_eq!(format_mmss(3600.0), "60:00");
    }
}
