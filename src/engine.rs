//! The streaming normalizer pipeline: buffers input into frames, analyzes
//! and amplifies them, and maintains the engine's declared end-to-end
//! sample delay.
//!
//! The four-action loop (ingest, analyze, amplify, emit) repeats until a
//! full pass makes no further progress, which is the shape
//! [`Engine::pump_inplace`]/[`Engine::pump_two`] both follow.

use std::io;

use crate::analysis_log::AnalysisLog;
use crate::config::Config;
use crate::delay_ring::FrameDelayRing;
use crate::error::{Error, Result};
use crate::fifo::SampleFifo;
use crate::gain_history::GainHistory;
use crate::math::{bound, fade, setup_compress_thresh, update_value};

/// Sample and clip counters accumulated since the engine was constructed or
/// last reset, exposed as a read-only snapshot.
///
/// `samples_total` counts every sample position the amplify stage has
/// touched, including the silent tail emitted during flush, so
/// `samples_clipped as f64 / samples_total as f64` is a lower bound on the
/// fraction of *audible* samples that clipped, not an exact ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub samples_total: u64,
    pub samples_clipped: u64,
}

/// The streaming normalization engine.
///
/// One instance processes one stream end to end: construct with a
/// validated [`Config`], feed it samples via [`Engine::process`] or
/// [`Engine::process_inplace`], then drain the trailing delayed samples
/// with [`Engine::flush`]. Call [`Engine::reset`] before reusing an
/// instance that has been flushed.
pub struct Engine {
    config: Config,

    b_src: SampleFifo,
    b_out: SampleFifo,
    ring: FrameDelayRing,
    gain_history: GainHistory,

    fade_prev: Vec<f64>,
    fade_next: Vec<f64>,

    prev_gain: Vec<Option<f64>>,

    dc_prev: Vec<f64>,
    dc_curr: Vec<f64>,
    dc_initialized: bool,

    compress_prev: Vec<f64>,
    compress_curr: Vec<f64>,
    compress_initialized: bool,

    /// Input samples accepted but not yet handed back to the caller.
    delayed: u64,
    /// Set by [`Engine::flush`]; blocks further calls to
    /// `process`/`process_inplace` until [`Engine::reset`].
    flushing: bool,

    stats: Stats,
    log: Option<AnalysisLog>,
}

impl Engine {
    /// Builds an engine for `config`. `Config` is already validated at its
    /// own construction time in [`crate::config::Config::new`], so this
    /// cannot fail.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let channels = config.channels() as usize;
        let frame_len = config.frame_len() as usize;
        let filter_size = config.filter_size() as usize;

        let (fade_prev, fade_next) = precompute_fade_tables(frame_len);

        Self {
            b_src: SampleFifo::new(channels, frame_len),
            b_out: SampleFifo::new(channels, frame_len),
            ring: FrameDelayRing::new(channels, frame_len, filter_size + 1),
            gain_history: GainHistory::new(channels, filter_size, config.sigma(), config.alt_boundary_mode()),
            fade_prev,
            fade_next,
            prev_gain: vec![None; channels],
            dc_prev: vec![0.0; channels],
            dc_curr: vec![0.0; channels],
            dc_initialized: false,
            compress_prev: vec![0.0; channels],
            compress_curr: vec![0.0; channels],
            compress_initialized: false,
            delayed: 0,
            flushing: false,
            stats: Stats::default(),
            log: None,
            config,
        }
    }

    /// Returns all buffers and per-channel state to their post-construction
    /// values without reallocating. Required before reusing an instance
    /// that has been flushed.
    pub fn reset(&mut self) {
        self.b_src.reset(true);
        self.b_out.reset(true);
        self.ring.reset();
        self.gain_history.reset();

        self.prev_gain.fill(None);
        self.dc_prev.fill(0.0);
        self.dc_curr.fill(0.0);
        self.dc_initialized = false;
        self.compress_prev.fill(0.0);
        self.compress_curr.fill(0.0);
        self.compress_initialized = false;

        self.delayed = 0;
        self.flushing = false;
        self.stats = Stats::default();

        if let Some(log) = &mut self.log {
            log.reset();
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The engine's fixed end-to-end sample delay, `frame_len * filter_size`.
    #[must_use]
    pub fn internal_delay(&self) -> u64 {
        self.config.delay()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Attaches a sink that receives the per-frame analysis log. A write
    /// failure downgrades to a logged warning and disables logging for the
    /// rest of this instance's lifetime via `Error::LogFileUnusable`'s
    /// handling here; it is never propagated to the caller of
    /// `process`/`flush`.
    pub fn attach_log<W: io::Write + Send + 'static>(&mut self, sink: W) {
        self.log = Some(AnalysisLog::new(Box::new(sink), self.config.channels() as usize));
    }

    /// Processes `input` into `output`, both planar `[channel][sample]`
    /// buffers, returning the number of samples written per channel into
    /// `output`. Fails with [`Error::InvalidState`] if called after
    /// [`Engine::flush`] without an intervening [`Engine::reset`].
    pub fn process(&mut self, input: &[Vec<f64>], output: &mut [Vec<f64>]) -> Result<usize> {
        self.require_running()?;
        let input_len = input.first().map_or(0, Vec::len);
        let output_cap = output.first().map_or(0, Vec::len);
        self.pump_two(input, input_len, output, output_cap)
    }

    /// Processes `samples` in place: reads input from it, then overwrites
    /// it with however many output samples became available. Returns the
    /// number of valid samples written. Safe because output never overtakes
    /// unread input — the engine's declared delay guarantees the read
    /// cursor always leads the write cursor by at least one frame.
    pub fn process_inplace(&mut self, samples: &mut [Vec<f64>]) -> Result<usize> {
        self.require_running()?;
        let len = samples.first().map_or(0, Vec::len);
        self.pump_inplace(samples, 0, len)
    }

    /// Drains the engine's remaining delayed samples into `output` by
    /// padding whatever partial frame is buffered with synthetic "silence"
    /// samples so analysis can complete it, then running the normal
    /// analyze/amplify/emit steps until every real delayed sample has been
    /// accounted for. Returns the number of real samples written, which may
    /// be less than `output`'s capacity if fewer than that remained
    /// delayed. Once called, the instance accepts no further
    /// `process`/`process_inplace` calls until [`Engine::reset`].
    ///
    /// The silence fed to complete a trailing partial frame is itself
    /// never counted against `delayed` — only genuinely unemitted input
    /// samples are. Routing synthetic padding through the same counter
    /// real input uses would double-count it and let the engine emit more
    /// samples than were ever fed in. See `DESIGN.md`.
    pub fn flush(&mut self, output: &mut [Vec<f64>]) -> Result<usize> {
        self.flushing = true;
        let channels = self.config.channels() as usize;
        let cap = output.first().map_or(0, Vec::len);
        let mut total = 0usize;

        while total < cap && self.delayed > 0 {
            let mut progressed = false;

            let feed_len = self.b_src.samples_left_put();
            if feed_len > 0 {
                let mut silence = vec![vec![0.0; feed_len]; channels];
                self.fill_synthetic_tail(&mut silence, 0, feed_len);
                self.b_src.put_samples(&silence, 0, feed_len)?;
                progressed = true;
            }

            progressed |= self.try_analyze()?;
            progressed |= self.try_amplify()?;

            while total < cap && self.delayed > 0 && self.b_out.samples_left_get() > 0 {
                let copy_len = (cap - total).min(self.b_out.samples_left_get()).min(self.delayed as usize);
                if copy_len == 0 {
                    break;
                }
                self.b_out.get_samples(output, total, copy_len)?;
                total += copy_len;
                self.delayed -= copy_len as u64;
                progressed = true;

                if self.b_out.samples_left_get() == 0 && self.b_out.samples_left_put() == 0 {
                    self.b_out.reset(false);
                }
            }

            if !progressed {
                break;
            }
        }

        Ok(total)
    }

    fn require_running(&self) -> Result<()> {
        if self.flushing {
            return Err(Error::InvalidState(
                "process called after flush without an intervening reset".into(),
            ));
        }
        Ok(())
    }

    /// Fills `output[c][offset..offset + len]` with the synthetic tail
    /// samples `flush` feeds through the pipeline to push genuinely
    /// buffered frames out: machine epsilon in alt-boundary mode, otherwise
    /// `min(peak, target_rms)` (or just `peak` when RMS targeting is
    /// disabled), optionally sign-alternated and DC-corrected.
    fn fill_synthetic_tail(&self, output: &mut [Vec<f64>], offset: usize, len: usize) {
        let base = if self.config.alt_boundary_mode() {
            f64::EPSILON
        } else if self.config.target_rms() > f64::EPSILON {
            self.config.peak().min(self.config.target_rms())
        } else {
            self.config.peak()
        };

        for (c, channel_out) in output.iter_mut().enumerate() {
            for i in 0..len {
                let mut sample = base;
                if self.config.dc_correction() {
                    if i % 2 == 1 {
                        sample = -sample;
                    }
                    sample += self.dc_curr[c];
                }
                channel_out[offset + i] = sample;
            }
        }
    }

    /// One pass of the pipeline's ingest step, operating on a single
    /// `buf[c][offset..]` window shared by input and output (the in-place
    /// contract). Returns whether any samples were consumed.
    fn pump_inplace(&mut self, buf: &mut [Vec<f64>], offset: usize, len: usize) -> Result<usize> {
        let delay = self.config.delay();

        let mut input_pos = offset;
        let mut input_left = len;
        let mut output_pos = offset;
        let mut output_left = len;

        loop {
            let mut progressed = false;

            while input_left > 0 && self.b_src.samples_left_put() > 0 {
                let copy_len = input_left.min(self.b_src.samples_left_put());
                self.b_src.put_samples(buf, input_pos, copy_len)?;
                input_pos += copy_len;
                input_left -= copy_len;
                self.delayed += copy_len as u64;
                progressed = true;
            }

            progressed |= self.try_analyze()?;
            progressed |= self.try_amplify()?;

            while output_left > 0 && self.b_out.samples_left_get() > 0 && self.delayed > delay {
                let available = output_left.min((self.delayed - delay) as usize);
                let copy_len = available.min(self.b_out.samples_left_get());
                if copy_len == 0 {
                    break;
                }
                self.b_out.get_samples(buf, output_pos, copy_len)?;
                output_pos += copy_len;
                output_left -= copy_len;
                self.delayed -= copy_len as u64;
                progressed = true;

                if self.b_out.samples_left_get() == 0 && self.b_out.samples_left_put() == 0 {
                    self.b_out.reset(false);
                }
            }

            if !progressed {
                break;
            }
        }

        Ok(output_pos - offset)
    }

    /// Same pipeline pass as [`Engine::pump_inplace`], but reading input and
    /// writing output from/to two independently sized, independently owned
    /// buffers (the out-of-place contract used by [`Engine::process`]).
    fn pump_two(
        &mut self,
        input: &[Vec<f64>],
        input_len: usize,
        output: &mut [Vec<f64>],
        output_cap: usize,
    ) -> Result<usize> {
        let delay = self.config.delay();

        let mut input_pos = 0usize;
        let mut input_left = input_len;
        let mut output_pos = 0usize;
        let mut output_left = output_cap;

        loop {
            let mut progressed = false;

            while input_left > 0 && self.b_src.samples_left_put() > 0 {
                let copy_len = input_left.min(self.b_src.samples_left_put());
                self.b_src.put_samples(input, input_pos, copy_len)?;
                input_pos += copy_len;
                input_left -= copy_len;
                self.delayed += copy_len as u64;
                progressed = true;
            }

            progressed |= self.try_analyze()?;
            progressed |= self.try_amplify()?;

            while output_left > 0 && self.b_out.samples_left_get() > 0 && self.delayed > delay {
                let available = output_left.min((self.delayed - delay) as usize);
                let copy_len = available.min(self.b_out.samples_left_get());
                if copy_len == 0 {
                    break;
                }
                self.b_out.get_samples(output, output_pos, copy_len)?;
                output_pos += copy_len;
                output_left -= copy_len;
                self.delayed -= copy_len as u64;
                progressed = true;

                if self.b_out.samples_left_get() == 0 && self.b_out.samples_left_put() == 0 {
                    self.b_out.reset(false);
                }
            }

            if !progressed {
                break;
            }
        }

        Ok(output_pos)
    }

    /// If a full frame of input is ready, analyzes it and moves it into the
    /// delay ring. Returns whether it did.
    fn try_analyze(&mut self) -> Result<bool> {
        let frame_len = self.config.frame_len() as usize;
        if self.b_src.samples_left_get() < frame_len {
            return Ok(false);
        }

        self.analyze_frame();
        self.write_log_frame();
        self.ring.put_frame(&mut self.b_src)?;
        self.b_src.reset(false);
        Ok(true)
    }

    /// If the output FIFO has room for a frame, the delay ring has one
    /// buffered, and a smoothed gain is available to apply, pops the oldest
    /// frame and amplifies it in place. Returns whether it did.
    fn try_amplify(&mut self) -> Result<bool> {
        let frame_len = self.config.frame_len() as usize;
        if self.b_out.samples_left_put() < frame_len
            || self.ring.frames_used() == 0
            || self.gain_history.smoothed_is_empty(0)
        {
            return Ok(false);
        }

        self.ring.get_frame(&mut self.b_out)?;
        self.amplify_frame()?;
        Ok(true)
    }

    /// Optional DC correction, optional compression, then per-channel (or
    /// coupled) local gain derivation feeding the gain history.
    fn analyze_frame(&mut self) {
        if self.config.dc_correction() {
            self.correct_dc();
        }
        if self.config.compress_factor() > 0.0 {
            self.compress_frame();
        }

        let channels = self.config.channels() as usize;

        if self.config.channels_coupled() {
            let (peak_mag, rms) = self.frame_peak_and_rms(None);
            let gain = self.local_gain(peak_mag, rms);
            for c in 0..channels {
                self.update_channel_gain(c, gain);
            }
        } else {
            for c in 0..channels {
                let (peak_mag, rms) = self.frame_peak_and_rms(Some(c));
                let gain = self.local_gain(peak_mag, rms);
                self.update_channel_gain(c, gain);
            }
        }
    }

    /// Peak magnitude and RMS of the current input frame: across all
    /// channels jointly when `channel` is `None` (coupled mode), or of just
    /// that one channel otherwise.
    fn frame_peak_and_rms(&self, channel: Option<usize>) -> (f64, f64) {
        let channels = self.config.channels() as usize;
        let frame_len = self.config.frame_len() as usize;
        let eps = f64::EPSILON;

        let mut peak_mag = eps;
        let mut sum_sq = 0.0;
        let mut count = 0usize;

        let range = match channel {
            Some(c) => c..c + 1,
            None => 0..channels,
        };
        for c in range {
            for &s in self.b_src.frame().data(c) {
                peak_mag = peak_mag.max(s.abs());
                sum_sq += s * s;
            }
            count += frame_len;
        }

        let rms = (sum_sq / count as f64).sqrt();
        (peak_mag, rms)
    }

    /// Peak and RMS candidate gains, soft-knee capped at `max_gain`.
    fn local_gain(&self, peak_mag: f64, rms: f64) -> f64 {
        let eps = f64::EPSILON;
        let peak_gain = self.config.peak() / peak_mag;
        let rms_gain = if self.config.target_rms() > eps {
            self.config.target_rms() / rms.max(eps)
        } else {
            f64::INFINITY
        };
        let raw = peak_gain.min(rms_gain);
        bound(self.config.max_gain(), raw)
    }

    /// Feeds `gain` into `channel`'s gain history, seeding its previous-gain
    /// state on first use and forwarding whatever raw/minimum/smoothed
    /// values fell out to the attached analysis log.
    fn update_channel_gain(&mut self, channel: usize, gain: f64) {
        let event = self.gain_history.update(channel, gain);
        if let Some(seed) = event.seed {
            self.prev_gain[channel] = Some(seed);
        }

        if let Some(log) = &mut self.log {
            log.record_raw(channel, gain);
            if let Some(minimum) = event.minimum {
                log.record_minimum(channel, minimum);
            }
            if let Some(smoothed) = event.smoothed {
                log.record_smoothed(channel, smoothed);
            }
        }
    }

    fn write_log_frame(&mut self) {
        let Some(log) = &mut self.log else { return };
        if let Err(err) = log.flush_frame() {
            log::warn!("analysis log write failed, disabling further logging: {err}");
            self.log = None;
        }
    }

    /// Subtracts a running per-channel DC estimate, faded in linearly
    /// across the frame from the previous estimate to the newly
    /// updated one.
    fn correct_dc(&mut self) {
        let channels = self.config.channels() as usize;
        let frame_len = self.config.frame_len() as usize;
        let first_frame = !self.dc_initialized;

        for c in 0..channels {
            let mean = self.b_src.frame().data(c).iter().sum::<f64>() / frame_len as f64;
            let new_curr = if first_frame { mean } else { update_value(mean, self.dc_curr[c], 0.1) };
            let prev = if first_frame { new_curr } else { self.dc_curr[c] };
            self.dc_prev[c] = prev;
            self.dc_curr[c] = new_curr;
        }
        self.dc_initialized = true;

        for c in 0..channels {
            let prev = self.dc_prev[c];
            let curr = self.dc_curr[c];
            let data = self.b_src.frame_mut().data_mut(c);
            for i in 0..frame_len {
                data[i] -= fade(prev, curr, self.fade_prev[i], self.fade_next[i]);
            }
        }
    }

    /// Soft-clips the frame toward a running RMS-derived threshold, faded
    /// in linearly across the frame like DC correction.
    fn compress_frame(&mut self) {
        let channels = self.config.channels() as usize;
        let frame_len = self.config.frame_len() as usize;
        let first_frame = !self.compress_initialized;
        let factor = self.config.compress_factor();

        if self.config.channels_coupled() {
            let std_dev = self.frame_std_dev(None);
            let target = (factor * std_dev).min(1.0);
            let prev = if first_frame { target } else { self.compress_curr[0] };
            let curr = if first_frame { target } else { update_value(target, self.compress_curr[0], 1.0 / 3.0) };
            for c in 0..channels {
                self.compress_prev[c] = prev;
                self.compress_curr[c] = curr;
            }
        } else {
            // Unlike the coupled branch, the per-channel target is run through
            // `setup_compress_thresh` before it's stored and blended, not only
            // at point of use below — so uncoupled channels get the inverse-erf
            // adjustment applied twice per sample, coupled channels once.
            for c in 0..channels {
                let std_dev = self.frame_std_dev(Some(c));
                let target = setup_compress_thresh((factor * std_dev).min(1.0));
                let prev = if first_frame { target } else { self.compress_curr[c] };
                let curr = if first_frame { target } else { update_value(target, self.compress_curr[c], 1.0 / 3.0) };
                self.compress_prev[c] = prev;
                self.compress_curr[c] = curr;
            }
        }
        self.compress_initialized = true;

        for c in 0..channels {
            let thresh_prev = setup_compress_thresh(self.compress_prev[c]);
            let thresh_curr = setup_compress_thresh(self.compress_curr[c]);
            let data = self.b_src.frame_mut().data_mut(c);
            for i in 0..frame_len {
                let thresh = fade(thresh_prev, thresh_curr, self.fade_prev[i], self.fade_next[i]);
                data[i] = bound(thresh, data[i]);
            }
        }
    }

    /// Standard deviation of the current input frame assuming zero mean,
    /// jointly across all channels when `channel` is `None`, or of just
    /// that one channel otherwise. Uses Bessel's correction (`count - 1`)
    /// and floors the result at `f64::EPSILON` so a silent frame yields a
    /// tiny but nonzero spread rather than exactly zero, which would make
    /// `compress_frame`'s threshold collapse to zero and send `bound` an
    /// indeterminate `0.0 / 0.0`.
    fn frame_std_dev(&self, channel: Option<usize>) -> f64 {
        let channels = self.config.channels() as usize;
        let frame_len = self.config.frame_len() as usize;

        let mut sum_sq = 0.0;
        let mut count = 0usize;
        let range = match channel {
            Some(c) => c..c + 1,
            None => 0..channels,
        };
        for c in range {
            sum_sq += self.b_src.frame().data(c).iter().map(|s| s * s).sum::<f64>();
            count += frame_len;
        }
        (sum_sq / (count - 1) as f64).sqrt().max(f64::EPSILON)
    }

    /// Pops each channel's oldest smoothed gain, ramps per-sample
    /// amplification linearly from the previous frame's endpoint gain to
    /// this one's, and clips any sample that still exceeds the target peak.
    fn amplify_frame(&mut self) -> Result<()> {
        let channels = self.config.channels() as usize;
        let frame_len = self.config.frame_len() as usize;
        let peak = self.config.peak();

        for c in 0..channels {
            let gain_curr = self.gain_history.pop_smoothed(c).ok_or_else(|| {
                Error::BufferInsufficient(format!("channel {c} smoothed gain history empty during amplify"))
            })?;
            let gain_prev = self.prev_gain[c].unwrap_or(gain_curr);

            let data = self.b_out.frame_mut().data_mut(c);
            for i in 0..frame_len {
                let alpha = fade(gain_prev, gain_curr, self.fade_prev[i], self.fade_next[i]);
                let mut sample = data[i] * alpha;
                if sample.abs() > peak {
                    sample = peak.copysign(sample);
                    self.stats.samples_clipped += 1;
                }
                data[i] = sample;
            }

            self.prev_gain[c] = Some(gain_curr);
        }

        self.stats.samples_total += frame_len as u64;
        Ok(())
    }
}

/// `fade_prev[i] = 1 - (i + 1) / N`, `fade_next[i] = 1 - fade_prev[i]`.
fn precompute_fade_tables(frame_len: usize) -> (Vec<f64>, Vec<f64>) {
    let n = frame_len as f64;
    let mut fade_prev = vec![0.0; frame_len];
    let mut fade_next = vec![0.0; frame_len];
    for i in 0..frame_len {
        let fp = 1.0 - (i as f64 + 1.0) / n;
        fade_prev[i] = fp;
        fade_next[i] = 1.0 - fp;
    }
    (fade_prev, fade_next)
}
