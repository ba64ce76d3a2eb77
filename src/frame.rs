//! Planar, fixed-length sample storage shared by the FIFO and delay ring.

/// One frame of planar audio: `channels` independent `f64` planes, each
/// exactly `frame_len` samples long.
///
/// `Frame` itself carries no read/write cursors; those live in
/// [`crate::fifo::SampleFifo`] and [`crate::delay_ring::FrameDelayRing`].
/// `Frame` only owns storage and the two bulk copy primitives they're built
/// on top of.
#[derive(Debug, Clone)]
pub struct Frame {
    frame_len: usize,
    planes: Vec<Vec<f64>>,
}

impl Frame {
    /// Allocates a zeroed frame for `channels` planes of `frame_len` samples
    /// each.
    #[must_use]
    pub fn new(channels: usize, frame_len: usize) -> Self {
        Self {
            frame_len,
            planes: vec![vec![0.0; frame_len]; channels],
        }
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    #[must_use]
    pub fn data(&self, channel: usize) -> &[f64] {
        &self.planes[channel]
    }

    pub fn data_mut(&mut self, channel: usize) -> &mut [f64] {
        &mut self.planes[channel]
    }

    /// Zeroes every sample in every plane.
    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.fill(0.0);
        }
    }

    /// Copies `len` samples from `src[channel][src_offset..]` into
    /// `self[channel][dest_offset..]`, for every channel.
    ///
    /// # Panics
    ///
    /// Panics (via slice bounds checks) if `src_offset + len` or
    /// `dest_offset + len` exceed either frame's length, or if the channel
    /// counts differ. Both FIFO and delay ring only ever call this with
    /// lengths they've already validated against their own cursors, so a
    /// panic here means a bug in this crate, not bad caller input.
    pub fn copy_from(&mut self, src: &Frame, src_offset: usize, dest_offset: usize, len: usize) {
        debug_assert_eq!(self.channels(), src.channels());
        for c in 0..self.channels() {
            let s = &src.planes[c][src_offset..src_offset + len];
            self.planes[c][dest_offset..dest_offset + len].copy_from_slice(s);
        }
    }

    /// Copies `len` samples from planar `src[channel][src_offset..]` slices
    /// into `self[channel][dest_offset..]`.
    ///
    /// # Panics
    ///
    /// See [`Frame::copy_from`].
    pub fn copy_from_slices(
        &mut self,
        src: &[Vec<f64>],
        src_offset: usize,
        dest_offset: usize,
        len: usize,
    ) {
        debug_assert_eq!(self.channels(), src.len());
        for c in 0..self.channels() {
            let s = &src[c][src_offset..src_offset + len];
            self.planes[c][dest_offset..dest_offset + len].copy_from_slice(s);
        }
    }

    /// Copies `len` samples from `self[channel][src_offset..]` into planar
    /// `dest[channel][dest_offset..]` slices.
    ///
    /// # Panics
    ///
    /// See [`Frame::copy_from`].
    pub fn copy_into_slices(
        &self,
        dest: &mut [Vec<f64>],
        dest_offset: usize,
        src_offset: usize,
        len: usize,
    ) {
        debug_assert_eq!(self.channels(), dest.len());
        for c in 0..self.channels() {
            let s = &self.planes[c][src_offset..src_offset + len];
            dest[c][dest_offset..dest_offset + len].copy_from_slice(s);
        }
    }
}
