use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::judge::Outcome;
use crate::stats::{LogRecord, SessionStats};
use crate::util::{mean, std_dev};

/// End-of-session summary handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub log: Vec<LogRecord>,
    pub finished_at: DateTime<Local>,
}

impl SessionReport {
    pub fn new(stats: SessionStats, log: Vec<LogRecord>) -> Self {
        Self {
            stats,
            log,
            finished_at: Local::now(),
        }
    }

    /// Share of cues landing in a success band, as a percentage.
    pub fn accuracy(&self) -> f64 {
        let total = self.stats.total();
        if total == 0 {
            return 0.0;
        }
        self.stats.hits() as f64 / total as f64 * 100.0
    }

    fn offsets(&self) -> Vec<f64> {
        self.log
            .iter()
            .filter_map(|r| r.offset_ms.map(|ms| ms as f64))
            .collect()
    }

    /// Mean signed offset of answered cues; negative means early on average.
    pub fn mean_offset_ms(&self) -> Option<f64> {
        mean(&self.offsets())
    }

    pub fn offset_spread_ms(&self) -> Option<f64> {
        std_dev(&self.offsets())
    }

    /// `None` when no cue was answered.
    pub fn timing_line(&self) -> Option<String> {
        let avg = self.mean_offset_ms()?;
        let spread = self.offset_spread_ms()?;
        Some(format!("Mean offset: {avg:+.1}ms | Spread: {spread:.1}ms"))
    }

    pub fn summary_lines(&self) -> [String; 2] {
        let s = &self.stats;
        [
            format!("Perfect: {} | Good: {} | OK: {}", s.perfect, s.good, s.ok),
            format!("EARLY: {} | LATE: {} | MISS: {}", s.early, s.late, s.miss),
        ]
    }

    pub fn log_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.log.iter().map(format_record)
    }

    /// Plain-text report: accuracy, summary, then one line per cue.
    pub fn render_text(&self) -> String {
        let header = format!(
            "Training Accuracy: {:.2}%  ({})",
            self.accuracy(),
            self.finished_at.format("%Y-%m-%d %H:%M")
        );
        let [first, second] = self.summary_lines();

        std::iter::once(header)
            .chain([first, second])
            .chain(self.timing_line())
            .chain(std::iter::once("-".repeat(40)))
            .chain(self.log_lines())
            .join("\n")
    }
}

pub fn format_record(record: &LogRecord) -> String {
    let target = record.target_time.to_string();
    match (record.outcome, record.offset_ms) {
        (Outcome::Miss, _) | (_, None) => format!("TIMING: {target:<8} | Result: MISS"),
        (outcome, Some(ms)) => {
            let label = outcome.to_string();
            format!("TIMING: {target:<8} | Result: {label:<8} | Offset: {ms:>+4}ms")
        }
    }
}
