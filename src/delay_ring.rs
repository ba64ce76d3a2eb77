//! Circular buffer of whole frames, providing the lookahead a filter window
//! of size `W` requires: a frame analyzed now won't be amplified and emitted
//! until `W` more frames have been analyzed after it.

use crate::error::{Error, Result};
use crate::fifo::SampleFifo;
use crate::frame::Frame;

#[derive(Debug)]
pub struct FrameDelayRing {
    frames: Vec<Frame>,
    frame_len: usize,
    frame_count: usize,
    frames_free: usize,
    frames_used: usize,
    pos_put: usize,
    pos_get: usize,
}

impl FrameDelayRing {
    /// `frame_count` is `W + 1`: the filter window's worth of frames plus one
    /// spare slot, which is exactly enough capacity given the engine only
    /// ever calls [`Self::put_frame`] once a full frame is available and
    /// calls [`Self::get_frame`] as soon as a slot frees up.
    #[must_use]
    pub fn new(channels: usize, frame_len: usize, frame_count: usize) -> Self {
        Self {
            frames: (0..frame_count).map(|_| Frame::new(channels, frame_len)).collect(),
            frame_len,
            frame_count,
            frames_free: frame_count,
            frames_used: 0,
            pos_put: 0,
            pos_get: 0,
        }
    }

    #[must_use]
    pub fn frames_free(&self) -> usize {
        self.frames_free
    }

    #[must_use]
    pub fn frames_used(&self) -> usize {
        self.frames_used
    }

    /// Moves one frame's worth of samples out of `src` and into the ring's
    /// next free slot.
    ///
    /// Fails only when the ring has no free slots *and* `src` doesn't have a
    /// full frame ready. In steady-state operation the ring's `W + 1` sizing
    /// guarantees
    /// this is never both true at once, so the check is defensive rather
    /// than load-bearing.
    pub fn put_frame(&mut self, src: &mut SampleFifo) -> Result<()> {
        if self.frames_free < 1 && src.samples_left_get() < self.frame_len {
            return Err(Error::BufferInsufficient(
                "delay ring full and source has less than a full frame".into(),
            ));
        }
        src.get_samples_into_frame(&mut self.frames[self.pos_put], 0, self.frame_len)?;
        self.pos_put = (self.pos_put + 1) % self.frame_count;
        self.frames_used += 1;
        self.frames_free -= 1;
        Ok(())
    }

    /// Moves the oldest buffered frame out of the ring and into `dest`.
    ///
    /// Fails only when the ring is empty *and* `dest` doesn't have room for a
    /// full frame, mirroring [`Self::put_frame`]'s defensive check.
    pub fn get_frame(&mut self, dest: &mut SampleFifo) -> Result<()> {
        if self.frames_used < 1 && dest.samples_left_put() < self.frame_len {
            return Err(Error::BufferInsufficient(
                "delay ring empty and destination has less than a full frame of room".into(),
            ));
        }
        dest.put_samples_from_frame(&self.frames[self.pos_get], 0, self.frame_len)?;
        self.pos_get = (self.pos_get + 1) % self.frame_count;
        self.frames_used -= 1;
        self.frames_free += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        for frame in &mut self.frames {
            frame.clear();
        }
        self.frames_free = self.frame_count;
        self.frames_used = 0;
        self.pos_put = 0;
        self.pos_get = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_a_frame() {
        let mut ring = FrameDelayRing::new(1, 2, 3);
        let mut src = SampleFifo::new(1, 2);
        src.put_samples(&vec![vec![1.0, 2.0]], 0, 2).unwrap();
        ring.put_frame(&mut src).unwrap();
        assert_eq!(ring.frames_used(), 1);
        assert_eq!(ring.frames_free(), 2);

        let mut dest = SampleFifo::new(1, 2);
        ring.get_frame(&mut dest).unwrap();
        assert_eq!(ring.frames_used(), 0);
        let mut out = vec![vec![0.0; 2]];
        dest.get_samples(&mut out, 0, 2).unwrap();
        assert_eq!(out, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn wraps_around_frame_count() {
        let mut ring = FrameDelayRing::new(1, 1, 2);
        let mut fifo = SampleFifo::new(1, 1);
        for i in 0..5 {
            fifo.put_samples(&vec![vec![i as f64]], 0, 1).unwrap();
            ring.put_frame(&mut fifo).unwrap();
            fifo.reset(true);

            let mut dest = SampleFifo::new(1, 1);
            ring.get_frame(&mut dest).unwrap();
            let mut out = vec![vec![0.0]];
            dest.get_samples(&mut out, 0, 1).unwrap();
            assert_eq!(out[0][0], i as f64);
        }
    }

    #[test]
    fn reset_clears_contents_and_counters() {
        let mut ring = FrameDelayRing::new(1, 1, 2);
        let mut fifo = SampleFifo::new(1, 1);
        fifo.put_samples(&vec![vec![42.0]], 0, 1).unwrap();
        ring.put_frame(&mut fifo).unwrap();
        ring.reset();
        assert_eq!(ring.frames_used(), 0);
        assert_eq!(ring.frames_free(), 2);
    }
}
