//! Single-pass, frame-sized sample buffer: filled once, then drained once,
//! then reset before it's reused.
//!
//! Despite the name this isn't a circular queue — it's a `frame_len`-sample
//! scratch buffer with independent write and read cursors, used both as the
//! engine's input staging area (fill from caller input, then hand a whole
//! frame to the delay ring) and its output staging area (fill one frame at a
//! time from the delay ring, then drain into caller output).

use crate::error::{Error, Result};
use crate::frame::Frame;

#[derive(Debug, Clone)]
pub struct SampleFifo {
    data: Frame,
    pos_put: usize,
    pos_get: usize,
    left_put: usize,
    left_get: usize,
}

impl SampleFifo {
    #[must_use]
    pub fn new(channels: usize, frame_len: usize) -> Self {
        Self {
            data: Frame::new(channels, frame_len),
            pos_put: 0,
            pos_get: 0,
            left_put: frame_len,
            left_get: 0,
        }
    }

    #[must_use]
    pub fn samples_left_put(&self) -> usize {
        self.left_put
    }

    #[must_use]
    pub fn samples_left_get(&self) -> usize {
        self.left_get
    }

    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.data
    }

    /// Mutable access to the underlying frame, used by the engine to apply
    /// DC correction, compression and amplification in place before the
    /// frame moves on to its next stage.
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.data
    }

    /// Writes `len` samples from planar `src[channel][src_offset..]` into
    /// the buffer, advancing the write cursor.
    pub fn put_samples(&mut self, src: &[Vec<f64>], src_offset: usize, len: usize) -> Result<()> {
        if len > self.left_put {
            return Err(Error::BufferInsufficient(format!(
                "put_samples: requested {len}, only {} free",
                self.left_put
            )));
        }
        self.data.copy_from_slices(src, src_offset, self.pos_put, len);
        self.pos_put += len;
        self.left_put -= len;
        self.left_get += len;
        Ok(())
    }

    /// Writes `len` samples from `src` into the buffer, advancing the write
    /// cursor. Used when moving a whole frame out of the delay ring.
    pub fn put_samples_from_frame(&mut self, src: &Frame, src_offset: usize, len: usize) -> Result<()> {
        if len > self.left_put {
            return Err(Error::BufferInsufficient(format!(
                "put_samples_from_frame: requested {len}, only {} free",
                self.left_put
            )));
        }
        self.data.copy_from(src, src_offset, self.pos_put, len);
        self.pos_put += len;
        self.left_put -= len;
        self.left_get += len;
        Ok(())
    }

    /// Reads `len` samples into planar `dest[channel][dest_offset..]`,
    /// advancing the read cursor.
    pub fn get_samples(&mut self, dest: &mut [Vec<f64>], dest_offset: usize, len: usize) -> Result<()> {
        if len > self.left_get {
            return Err(Error::BufferInsufficient(format!(
                "get_samples: requested {len}, only {} available",
                self.left_get
            )));
        }
        self.data.copy_into_slices(dest, dest_offset, self.pos_get, len);
        self.pos_get += len;
        self.left_get -= len;
        Ok(())
    }

    /// Reads `len` samples into `dest`, advancing the read cursor. Used when
    /// handing a filled frame to the delay ring.
    pub fn get_samples_into_frame(&mut self, dest: &mut Frame, dest_offset: usize, len: usize) -> Result<()> {
        if len > self.left_get {
            return Err(Error::BufferInsufficient(format!(
                "get_samples_into_frame: requested {len}, only {} available",
                self.left_get
            )));
        }
        dest.copy_from(&self.data, self.pos_get, dest_offset, len);
        self.pos_get += len;
        self.left_get -= len;
        Ok(())
    }

    /// Rewinds both cursors to the start of the buffer, ready for another
    /// fill/drain cycle. `force_clear` also zeroes the backing storage (the
    /// engine only skips this on the very first reset, right after
    /// allocation, when the storage is already zeroed).
    pub fn reset(&mut self, force_clear: bool) {
        if force_clear {
            self.data.clear();
        }
        self.pos_put = 0;
        self.pos_get = 0;
        self.left_get = 0;
        self.left_put = self.data.frame_len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_drains_once() {
        let mut fifo = SampleFifo::new(1, 4);
        assert_eq!(fifo.samples_left_put(), 4);
        assert_eq!(fifo.samples_left_get(), 0);

        let src = vec![vec![1.0, 2.0, 3.0, 4.0]];
        fifo.put_samples(&src, 0, 4).unwrap();
        assert_eq!(fifo.samples_left_put(), 0);
        assert_eq!(fifo.samples_left_get(), 4);

        let mut dest = vec![vec![0.0; 4]];
        fifo.get_samples(&mut dest, 0, 4).unwrap();
        assert_eq!(dest, src);
        assert_eq!(fifo.samples_left_get(), 0);
    }

    #[test]
    fn overfill_is_rejected() {
        let mut fifo = SampleFifo::new(1, 2);
        let src = vec![vec![1.0, 2.0, 3.0]];
        assert!(fifo.put_samples(&src, 0, 3).is_err());
    }

    #[test]
    fn reset_rewinds_cursors() {
        let mut fifo = SampleFifo::new(1, 2);
        let src = vec![vec![1.0, 2.0]];
        fifo.put_samples(&src, 0, 2).unwrap();
        fifo.reset(true);
        assert_eq!(fifo.samples_left_put(), 2);
        assert_eq!(fifo.samples_left_get(), 0);
        assert_eq!(fifo.frame().data(0), &[0.0, 0.0]);
    }
}
