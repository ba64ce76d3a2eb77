//! Per-channel gain history: the three-stage deque chain that turns one raw
//! gain value per frame into a smoothed value, lagged by the filter window.
//!
//! Each channel keeps three sequences — raw, minimum-filtered, and
//! Gaussian-smoothed — modeled here as parallel `VecDeque<f64>` chains. A
//! value only moves from one sequence to the next once enough raw values
//! have accumulated to fill the filter window; see [`GainHistory::update`].

use std::collections::VecDeque;

use crate::filters::{GaussianFilter, MinimumFilter};

/// What happened to a channel's history as a result of one [`GainHistory::update`]
/// call, so the caller can mirror it into an attached analysis log and seed
/// its own previous-gain state.
#[derive(Debug, Clone, Copy, Default)]
pub struct GainHistoryEvent {
    /// Set on the first update for a channel: the value the caller should
    /// use to seed its "previous amplification factor" state.
    pub seed: Option<f64>,
    /// A minimum-filtered value was produced this call.
    pub minimum: Option<f64>,
    /// A Gaussian-smoothed value was produced this call.
    pub smoothed: Option<f64>,
}

#[derive(Debug, Clone)]
struct ChannelHistory {
    raw: VecDeque<f64>,
    minimum: VecDeque<f64>,
    smoothed: VecDeque<f64>,
}

impl ChannelHistory {
    fn new() -> Self {
        Self {
            raw: VecDeque::new(),
            minimum: VecDeque::new(),
            smoothed: VecDeque::new(),
        }
    }

    fn clear(&mut self) {
        self.raw.clear();
        self.minimum.clear();
        self.smoothed.clear();
    }
}

#[derive(Debug, Clone)]
pub struct GainHistory {
    filter_size: usize,
    alt_boundary_mode: bool,
    min_filter: MinimumFilter,
    gauss_filter: GaussianFilter,
    channels: Vec<ChannelHistory>,
}

impl GainHistory {
    #[must_use]
    pub fn new(channels: usize, filter_size: usize, sigma: f64, alt_boundary_mode: bool) -> Self {
        Self {
            filter_size,
            alt_boundary_mode,
            min_filter: MinimumFilter,
            gauss_filter: GaussianFilter::new(filter_size, sigma),
            channels: (0..channels).map(|_| ChannelHistory::new()).collect(),
        }
    }

    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.clear();
        }
    }

    /// Feeds one frame's raw gain for `channel` into the chain, returning
    /// whatever downstream values fell out of the minimum and Gaussian
    /// filters as a result.
    pub fn update(&mut self, channel: usize, current_gain: f64) -> GainHistoryEvent {
        let mut event = GainHistoryEvent::default();
        let seed_value = if self.alt_boundary_mode { current_gain } else { 1.0 };
        let ch = &mut self.channels[channel];

        if ch.raw.is_empty() || ch.minimum.is_empty() {
            let pre_fill_size = self.filter_size / 2;
            event.seed = Some(seed_value);
            while ch.raw.len() < pre_fill_size {
                ch.raw.push_back(seed_value);
            }
            while ch.minimum.len() < pre_fill_size {
                ch.minimum.push_back(seed_value);
            }
        }

        ch.raw.push_back(current_gain);

        while ch.raw.len() >= self.filter_size {
            debug_assert_eq!(ch.raw.len(), self.filter_size);
            let minimum = self.min_filter.apply(&ch.raw);
            ch.minimum.push_back(minimum);
            event.minimum = Some(minimum);
            ch.raw.pop_front();
        }

        while ch.minimum.len() >= self.filter_size {
            debug_assert_eq!(ch.minimum.len(), self.filter_size);
            let smoothed = self.gauss_filter.apply(&ch.minimum);
            ch.smoothed.push_back(smoothed);
            event.smoothed = Some(smoothed);
            ch.minimum.pop_front();
        }

        event
    }

    #[must_use]
    pub fn smoothed_is_empty(&self, channel: usize) -> bool {
        self.channels[channel].smoothed.is_empty()
    }

    pub fn pop_smoothed(&mut self, channel: usize) -> Option<f64> {
        self.channels[channel].smoothed.pop_front()
    }
}
