//! Writer for the per-frame analysis log: a header naming the crate version
//! and channel count, followed by one line per analyzed frame of
//! `channels * 3` tab-separated gain values (raw, minimum-filtered,
//! Gaussian-smoothed), with channels separated by a double tab.
//!
//! Each channel keeps its own queue of raw/min/smoothed values, pushed as
//! they become available from the gain history filter chain (raw on every
//! update, minimum and smoothed only once their respective filter windows
//! fill). A line is written only once a channel's three queues each have a
//! value ready, so the three-stage filter lag shows up directly as a delay
//! in when that channel starts appearing in the log, rather than being
//! papered over with placeholder zeros.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::version;

/// Accumulates per-channel gain-history values and writes them out in the
/// engine's log file format as they become available.
pub struct AnalysisLog {
    sink: Box<dyn Write + Send>,
    channels: usize,
    header_written: bool,
    raw: Vec<VecDeque<f64>>,
    minimum: Vec<VecDeque<f64>>,
    smoothed: Vec<VecDeque<f64>>,
}

impl AnalysisLog {
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>, channels: usize) -> Self {
        Self {
            sink,
            channels,
            header_written: false,
            raw: vec![VecDeque::new(); channels],
            minimum: vec![VecDeque::new(); channels],
            smoothed: vec![VecDeque::new(); channels],
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        let (major, minor, patch) = version::version();
        writeln!(self.sink, "DynamicAudioNormalizer Logfile v{major}.{minor:02}-{patch}")?;
        writeln!(self.sink, "CHANNEL_COUNT:{}", self.channels)?;
        writeln!(self.sink)
    }

    /// Queues a raw (post-analysis) gain value for `channel`. Called once
    /// per channel on every analyzed frame.
    pub fn record_raw(&mut self, channel: usize, value: f64) {
        self.raw[channel].push_back(value);
    }

    /// Queues a minimum-filtered gain value for `channel`, once the minimum
    /// filter's window has filled enough to emit one.
    pub fn record_minimum(&mut self, channel: usize, value: f64) {
        self.minimum[channel].push_back(value);
    }

    /// Queues a Gaussian-smoothed gain value for `channel`, once the
    /// Gaussian filter's window has filled enough to emit one.
    pub fn record_smoothed(&mut self, channel: usize, value: f64) {
        self.smoothed[channel].push_back(value);
    }

    /// Writes one log line, draining the oldest queued triple from every
    /// channel whose raw/minimum/smoothed queues are all non-empty. Called
    /// once per analyzed frame; channels not yet far enough along the
    /// filter chain are silently skipped rather than padded.
    pub fn flush_frame(&mut self) -> io::Result<()> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }

        let mut wrote_any = false;
        for c in 0..self.channels {
            if self.raw[c].is_empty() || self.minimum[c].is_empty() || self.smoothed[c].is_empty() {
                continue;
            }

            if wrote_any {
                write!(self.sink, "\t\t")?;
            }

            let raw = self.raw[c].pop_front().expect("checked non-empty above");
            let minimum = self.minimum[c].pop_front().expect("checked non-empty above");
            let smoothed = self.smoothed[c].pop_front().expect("checked non-empty above");
            write!(self.sink, "{raw:.5}\t{minimum:.5}\t{smoothed:.5}")?;
            wrote_any = true;
        }

        if wrote_any {
            writeln!(self.sink)?;
        }
        Ok(())
    }

    /// Drops all queued-but-unwritten values. Does not rewrite the header;
    /// a fresh engine run after `reset` continues the same log file.
    pub fn reset(&mut self) {
        for c in 0..self.channels {
            self.raw[c].clear();
            self.minimum[c].clear();
            self.smoothed[c].clear();
        }
    }
}
