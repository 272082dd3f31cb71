use std::collections::VecDeque;

use crate::judge::Outcome;

/// Per-outcome counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub perfect: u32,
    pub good: u32,
    pub ok: u32,
    pub early: u32,
    pub late: u32,
    pub miss: u32,
}

impl SessionStats {
    pub fn record(&mut self, outcome: Outcome) {
        *self.slot(outcome) += 1;
    }

    pub fn count(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Perfect => self.perfect,
            Outcome::Good => self.good,
            Outcome::Ok => self.ok,
            Outcome::Early => self.early,
            Outcome::Late => self.late,
            Outcome::Miss => self.miss,
        }
    }

    pub fn total(&self) -> u32 {
        Outcome::ALL.iter().map(|o| self.count(*o)).sum()
    }

    pub fn hits(&self) -> u32 {
        self.perfect + self.good + self.ok
    }

    fn slot(&mut self, outcome: Outcome) -> &mut u32 {
        match outcome {
            Outcome::Perfect => &mut self.perfect,
            Outcome::Good => &mut self.good,
            Outcome::Ok => &mut self.ok,
            Outcome::Early => &mut self.early,
            Outcome::Late => &mut self.late,
            Outcome::Miss => &mut self.miss,
        }
    }
}

/// One resolved cue. `offset_ms` is `None` for misses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub target_time: f64,
    pub outcome: Outcome,
    pub offset_ms: Option<i64>,
}

impl LogRecord {
    pub fn classified(target_time: f64, outcome: Outcome, offset_ms: i64) -> Self {
        Self {
            target_time,
            outcome,
            offset_ms: Some(offset_ms),
        }
    }

    pub fn miss(target_time: f64) -> Self {
        Self {
            target_time,
            outcome: Outcome::Miss,
            offset_ms: None,
        }
    }
}

/// Append-only, first-in-first-out record of resolutions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionLog {
    records: VecDeque<LogRecord>,
}

impl SessionLog {
    pub fn push(&mut self, record: LogRecord) {
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Take every record in arrival order, leaving the log empty.
    pub fn drain(&mut self) -> Vec<LogRecord> {
        self.records.drain(..).collect()
    }
}
