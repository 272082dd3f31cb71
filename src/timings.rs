use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read timing file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: not a number: {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: timestamp must be finite and non-negative, got {value}")]
    Invalid { line: usize, value: f64 },
}

/// Cue timestamps in seconds, strictly ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSequence {
    times: Vec<f64>,
}

impl TimingSequence {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let seq = Self::parse(&text)?;
        info!("loaded {} cues from {}", seq.len(), path.display());
        Ok(seq)
    }

    /// Parse newline-separated seconds. Blank lines are skipped, any other
    /// unparseable line fails the whole load.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut times = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let value: f64 = line.parse().map_err(|_| LoadError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(LoadError::Invalid {
                    line: idx + 1,
                    value,
                });
            }
            times.push(value);
        }

        times.sort_by(f64::total_cmp);
        let before = times.len();
        times.dedup();
        if times.len() != before {
            warn!("dropped {} duplicate timestamps", before - times.len());
        }

        Ok(Self { times })
    }

    pub fn from_times(mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite() && *t >= 0.0);
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self { times }
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.times.get(idx).copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }
}
