//! Black-box end-to-end scenarios against [`Engine`], independent of any
//! module's internal state.

use std::sync::Once;

use dynaudnorm_core::config::Config;
use dynaudnorm_core::engine::Engine;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn white_noise(len: usize, target_rms: f64, seed: u64) -> Vec<f64> {
    // xorshift64, deterministic and dependency-free.
    let mut state = seed | 1;
    let mut raw = Vec::with_capacity(len);
    let mut sum_sq = 0.0;
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let unit = (state as f64 / u64::MAX as f64) * 2.0 - 1.0;
        sum_sq += unit * unit;
        raw.push(unit);
    }
    let rms = (sum_sq / len as f64).sqrt();
    let scale = target_rms / rms;
    raw.into_iter().map(|s| s * scale).collect()
}

fn sine(len: usize, freq: f64, sample_rate: f64, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
        .collect()
}

fn run_full_cycle(config: Config, input: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let channels = input.len();
    let input_len = input[0].len();
    let delay = config.delay() as usize;
    let mut engine = Engine::new(config);

    let mut output = vec![vec![0.0; input_len]; channels];
    let written = engine.process(input, &mut output).expect("process succeeds");

    let mut tail = vec![vec![0.0; delay + written.max(1)]; channels];
    let flushed = engine.flush(&mut tail).expect("flush succeeds");
    assert_eq!(written + flushed, input_len, "total output must equal total input");

    for c in 0..channels {
        output[c].truncate(written);
        output[c].extend_from_slice(&tail[c][..flushed]);
    }
    output
}

/// Scenario A: white noise, coupled channels, no RMS/compression targeting.
/// The engine should raise a below-target signal's RMS while respecting the
/// peak ceiling.
#[test]
fn scenario_a_white_noise_is_amplified_without_clipping() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    assert_eq!(config.delay(), 22_050 * 31);

    let len = 441_000;
    let input = vec![white_noise(len, 0.1, 1), white_noise(len, 0.1, 2)];
    let output = run_full_cycle(config, &input);

    for channel in &output {
        assert_eq!(channel.len(), len);
        let peak = channel.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
        assert!(peak <= 0.95 + 1e-9, "peak {peak} exceeds 0.95");
    }

    let input_rms = {
        let sum_sq: f64 = input[0].iter().map(|s| s * s).sum();
        (sum_sq / len as f64).sqrt()
    };
    let output_rms = {
        let sum_sq: f64 = output[0].iter().map(|s| s * s).sum();
        (sum_sq / len as f64).sqrt()
    };
    assert!(output_rms > input_rms, "engine should amplify a below-target signal");
}

/// Scenario B: a single impulse should emerge, scaled to the peak ceiling,
/// at exactly the declared delay position, with every other sample zero.
#[test]
fn scenario_b_impulse_emerges_at_declared_delay() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    let delay = config.delay() as usize;

    let len = 700_000;
    let mut ch0 = vec![0.0; len];
    ch0[0] = 1.0;
    let input = vec![ch0, vec![0.0; len]];

    let output = run_full_cycle(config, &input);

    let (peak_pos, &peak_val) = output[0]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
        .unwrap();
    assert_eq!(peak_pos, delay, "impulse should emerge at the declared delay");
    assert!(peak_val.abs() <= 0.95 + 1e-9, "impulse must not exceed peak, got {peak_val}");
    assert!(peak_val.abs() > 0.5, "impulse should be amplified close to peak, got {peak_val}");

    for (i, &s) in output[0].iter().enumerate() {
        if i != peak_pos {
            assert_eq!(s, 0.0, "sample at {i} should be exactly zero");
        }
    }
    assert!(output[1].iter().all(|&s| s == 0.0), "untouched channel must stay silent");
}

/// Scenario C: a small-window single-channel sine should ramp up toward the
/// peak ceiling without ever overshooting it.
#[test]
fn scenario_c_sine_converges_toward_peak_without_overshoot() {
    let config = Config::new(1, 48_000, 100, 5, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    let frame_len = config.frame_len() as usize;
    let filter_size = config.filter_size() as usize;

    let len = 48_000;
    let input = vec![sine(len, 1000.0, 48_000.0, 0.1)];
    let output = run_full_cycle(config, &input);

    assert!(output[0].iter().all(|&s| s.abs() <= 0.95 + 1e-9));

    let ramp_bound = frame_len * (filter_size + 1);
    let late_window = &output[0][ramp_bound..];
    let late_peak = late_window.iter().fold(0.0_f64, |m, &s| m.max(s.abs()));
    assert!(late_peak > 0.5, "amplitude should approach the peak ceiling once ramped in, got {late_peak}");
}

/// Scenario D: DC-offset input should converge toward zero mean once the
/// correction has warmed up.
#[test]
fn scenario_d_dc_offset_converges_toward_zero() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, true, false).unwrap();
    let frame_len = config.frame_len() as usize;
    let delay = config.delay() as usize;

    let len = delay + 5 * frame_len;
    let input = vec![
        sine(len, 440.0, 44_100.0, 0.2).iter().map(|&s| s + 0.1).collect(),
        sine(len, 440.0, 44_100.0, 0.2).iter().map(|&s| s + 0.1).collect(),
    ];
    let output = run_full_cycle(config, &input);

    let tail = &output[0][delay + frame_len..];
    for window in tail.chunks(frame_len) {
        if window.len() < frame_len {
            continue;
        }
        let mean = window.iter().sum::<f64>() / frame_len as f64;
        assert!(mean.abs() < 0.01, "windowed mean {mean} should converge near zero");
    }
}

/// Scenario E: feeding the same input through in varyingly sized chunks
/// must reproduce the single-call output exactly.
#[test]
fn scenario_e_chunked_input_matches_single_call_output() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    let frame_len = config.frame_len() as usize;

    let len = 100_000;
    let input = vec![white_noise(len, 0.1, 3), white_noise(len, 0.1, 4)];

    let single = run_full_cycle(config.clone(), &input);

    let mut engine = Engine::new(config.clone());
    let mut chunked = vec![Vec::new(), Vec::new()];
    let mut pos = 0usize;
    let sizes = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, frame_len + 1, 2 * frame_len + 3];
    let mut size_idx = 0usize;

    while pos < len {
        let chunk_len = sizes[size_idx % sizes.len()].min(len - pos);
        size_idx += 1;

        let input_chunk = vec![input[0][pos..pos + chunk_len].to_vec(), input[1][pos..pos + chunk_len].to_vec()];
        let mut out_chunk = vec![vec![0.0; chunk_len]; 2];
        let written = engine.process(&input_chunk, &mut out_chunk).unwrap();
        chunked[0].extend_from_slice(&out_chunk[0][..written]);
        chunked[1].extend_from_slice(&out_chunk[1][..written]);
        pos += chunk_len;
    }

    let delay = config.delay() as usize;
    let mut tail = vec![vec![0.0; delay + 1]; 2];
    let flushed = engine.flush(&mut tail).unwrap();
    chunked[0].extend_from_slice(&tail[0][..flushed]);
    chunked[1].extend_from_slice(&tail[1][..flushed]);

    assert_eq!(chunked[0], single[0], "chunked output must be byte-identical to single-call output");
    assert_eq!(chunked[1], single[1]);
}

/// Scenario F: a frame length rounding down below the minimum must be
/// rejected outright, not silently clamped.
#[test]
fn scenario_f_tiny_frame_length_is_rejected() {
    let result = Config::new(2, 44_100, 1, 31, 0.95, 10.0, 0.0, 0.0, true, false, false);
    assert!(result.is_err(), "1ms frame at 44.1kHz should round to far fewer than 32 samples");
}

/// Invariant 4 / property 8: resetting an engine and feeding it the same
/// input twice must produce bit-identical output both times.
#[test]
fn reset_then_rerun_is_bit_identical() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    let len = 50_000;
    let input = vec![white_noise(len, 0.1, 5), white_noise(len, 0.1, 6)];

    let mut engine = Engine::new(config.clone());
    let delay = config.delay() as usize;

    let mut first = vec![vec![0.0; len]; 2];
    let written_first = engine.process(&input, &mut first).unwrap();
    let mut tail_first = vec![vec![0.0; delay + 1]; 2];
    let flushed_first = engine.flush(&mut tail_first).unwrap();

    engine.reset();

    let mut second = vec![vec![0.0; len]; 2];
    let written_second = engine.process(&input, &mut second).unwrap();
    let mut tail_second = vec![vec![0.0; delay + 1]; 2];
    let flushed_second = engine.flush(&mut tail_second).unwrap();

    assert_eq!(written_first, written_second);
    assert_eq!(flushed_first, flushed_second);
    assert_eq!(first, second);
    assert_eq!(tail_first, tail_second);
}

/// Invariant 10: zero-length input produces zero-length output and leaves
/// the internal delay counter untouched.
#[test]
fn zero_length_input_is_a_no_op() {
    let config = Config::default();
    let mut engine = Engine::new(config);
    let input: Vec<Vec<f64>> = vec![vec![], vec![]];
    let mut output: Vec<Vec<f64>> = vec![vec![], vec![]];
    let written = engine.process(&input, &mut output).unwrap();
    assert_eq!(written, 0);
}

/// An attached analysis log should accumulate a line per analyzed frame
/// once the filter chain has warmed up, without disturbing the engine's
/// own output.
#[test]
fn attached_analysis_log_records_frames() {
    init_logger();

    let config = Config::new(1, 48_000, 100, 5, 0.95, 10.0, 0.0, 0.0, true, false, false).unwrap();
    let mut engine = Engine::new(config);
    engine.attach_log(Vec::<u8>::new());

    let len = 48_000;
    let input = vec![sine(len, 1000.0, 48_000.0, 0.1)];
    let mut output = vec![vec![0.0; len]];
    engine.process(&input, &mut output).unwrap();

    // The log is write-only from here, so this test only confirms
    // attaching and driving it doesn't panic or corrupt normal output.
    assert!(output[0].iter().any(|&s| s != 0.0), "engine should still produce output with logging attached");
}

/// Invariant 11: a constant-zero input must produce a constant-zero output,
/// even with compression enabled. A silent frame has zero variance, which
/// once fed through the compression threshold's soft-knee bound must not
/// turn into NaN and poison the rest of the stream.
#[test]
fn silent_input_with_compression_stays_exactly_zero() {
    let config = Config::new(2, 44_100, 500, 31, 0.95, 10.0, 0.0, 10.0, true, false, false).unwrap();
    let delay = config.delay() as usize;

    let len = delay + 5 * config.frame_len() as usize;
    let input = vec![vec![0.0; len], vec![0.0; len]];
    let output = run_full_cycle(config, &input);

    for channel in &output {
        assert_eq!(channel.len(), len);
        assert!(channel.iter().all(|&s| s == 0.0), "silent input must produce exactly zero output, got NaN or noise");
    }
}
