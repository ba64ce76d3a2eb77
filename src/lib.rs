//! Streaming dynamic audio normalization engine.
//!
//! **dynaudnorm-core** implements dynamic range normalization for PCM audio:
//! frame-based gain analysis, a two-stage (minimum then Gaussian) smoothing
//! filter over the gain trajectory, and per-sample amplification that ramps
//! smoothly between frames rather than stepping. It provides:
//!
//! # Core Features
//!
//! * **Streaming Processing**: Accepts audio in arbitrarily sized chunks and
//!   emits normalized output with a small, fixed, declared end-to-end delay
//! * **Two-Pass-Free Operation**: Unlike a true loudness normalizer, runs in
//!   a single forward pass, trading unbounded lookahead for a bounded one
//! * **Optional DC Correction**: Running per-channel DC offset removal
//! * **Optional RMS Compression**: Soft-knee compression toward a running
//!   RMS-derived threshold, ahead of the gain stage
//! * **Analysis Logging**: Per-frame raw/minimum/smoothed gain values for
//!   offline inspection of the filter chain's behavior
//!
//! # Architecture
//!
//! The crate is organized into the stages of the processing pipeline, plus
//! the ambient pieces around it:
//!
//! * **Pipeline**
//!   - [`fifo`]: Single-pass sample buffer used to stage input and output
//!   - [`frame`]: Planar, fixed-length sample storage
//!   - [`delay_ring`]: Lookahead buffer of whole analyzed frames
//!   - [`gain_history`]: The minimum/Gaussian filter chain over gain values
//!   - [`filters`]: The two filter kernels themselves
//!   - [`engine`]: Orchestrates the above into [`engine::Engine`]
//!
//! * **Support**
//!   - [`math`]: Soft-knee saturator, fades, and other small numerics
//!   - [`config`]: Validated engine configuration
//!   - [`analysis_log`]: Per-frame gain log writer
//!   - [`mod@error`]: Error types and handling
//!   - [`version`]: Crate version and build metadata
//!
//! # Example
//!
//! ```rust,no_run
//! use dynaudnorm_core::{config::Config, engine::Engine};
//!
//! fn example() -> dynaudnorm_core::error::Result<()> {
//!     let config = Config::default();
//!     let mut engine = Engine::new(config);
//!
//!     let input = vec![vec![0.0_f64; 4096]; 2];
//!     let mut output = vec![vec![0.0_f64; 4096]; 2];
//!     engine.process(&input, &mut output)?;
//!
//!     let mut tail = vec![vec![0.0_f64; engine.internal_delay() as usize]; 2];
//!     engine.flush(&mut tail)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Errors are handled through the types in the [`mod@error`] module, with
//! every fallible method returning [`Result`](error::Result).
//!
//! # Concurrency
//!
//! [`engine::Engine`] holds mutable processing state and is not
//! internally synchronized; a single instance processes one stream and is
//! not meant to be shared across threads without external locking. Separate
//! instances (e.g. one per channel group in a multi-stream pipeline) are
//! fully independent and can run concurrently.

#![deny(clippy::all)]
#![doc(test(attr(ignore)))]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(rust_2024_compatibility)]
#![warn(future_incompatible)]

#[macro_use]
extern crate log;

pub mod analysis_log;
pub mod config;
pub mod delay_ring;
pub mod engine;
pub mod error;
pub mod fifo;
pub mod filters;
pub mod frame;
pub mod gain_history;
pub mod math;
pub mod version;
