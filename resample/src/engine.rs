//! Streaming sample-rate conversion engine.
//!
//! A [`Resampler`] converts one mono stream of `f32` samples on top of
//! rubato's asynchronous sinc resampler. Rubato works on fixed-size blocks,
//! so the engine keeps a small input FIFO and a block of pending output
//! between calls; callers may hand in and take out any number of samples.
//! Output sample `k` corresponds to input time `k / ratio`.
//!
//! # Example
//!
//! ```rust
//! use giztoy_resample::{Quality, Resampler};
//!
//! let input: Vec<f32> = (0..480).map(|i| (i as f32 * 0.05).sin()).collect();
//! let mut resampler = Resampler::with_quality(Quality::High, 0.5, 0.5)?;
//!
//! let mut output = vec![0.0f32; 512];
//! let (consumed, produced) = resampler.process(0.5, &input, true, &mut output);
//! assert_eq!(consumed, 480);
//! assert_eq!(produced, 240);
//! # Ok::<(), giztoy_resample::Error>(())
//! ```

use std::fmt;

use rubato::{ResampleResult, Resampler as RubatoResampler, SincFixedOut};

use crate::error::Result;
use crate::prefs::Prefs;
use crate::quality::Quality;

/// Filter recipe used whenever the ratio may change while streaming.
const VARIABLE_RATE_QUALITY: Quality = Quality::High;

/// Rubato output block size in constant-ratio mode.
const BLOCK_FRAMES: usize = 256;

/// Rubato output block size in variable-ratio mode. Single-frame blocks
/// leave nothing pending between calls, so a new ratio applies from the
/// first output sample of the call that sets it.
const VARIABLE_BLOCK_FRAMES: usize = 1;

/// Output block size used by [`Resampler::process_all`].
const PROCESS_ALL_BLOCK: usize = 4096;

/// Whether the conversion ratio is fixed or may change on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioMode {
    /// The ratio given at construction is used for the whole stream.
    Constant,
    /// Every `process` call supplies the ratio for that call.
    Variable,
}

/// Lifecycle of a [`Resampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed; no `process` call yet.
    Initialized,
    /// Accepting input.
    Streaming,
    /// End of stream signalled; emitting the remaining tail.
    Draining,
    /// Every output sample has been emitted. Terminal.
    Exhausted,
}

/// Mono streaming resampler.
///
/// Construct one per stream, call [`process`](Self::process) with successive
/// chunks, then keep calling it with `is_final` set until it produces
/// nothing. All buffers are allocated at construction and released on drop.
pub struct Resampler {
    quality: Quality,
    mode: RatioMode,
    state: State,
    inner: SincFixedOut<f32>,

    min_ratio: f64,
    max_ratio: f64,
    /// Current ratio (output rate / input rate).
    ratio: f64,

    /// Input accepted but not yet handed to rubato.
    fifo: Vec<f32>,
    /// Last block rubato produced; `block[block_read..block_len]` is pending.
    block: Vec<f32>,
    block_read: usize,
    block_len: usize,
    /// Input samples per output sample for the pending block.
    block_step: f64,

    /// Input time of the next output sample.
    position: f64,
    /// Input samples accepted so far.
    accepted: u64,
    /// Stream length, known once the final input has been accepted.
    end: Option<u64>,
}

impl Resampler {
    /// Creates a resampler whose quality is read from `prefs`.
    ///
    /// `use_best_quality` selects the high-quality preference slot instead
    /// of the fast one. `min_ratio == max_ratio` selects constant-ratio
    /// mode; otherwise the ratio may vary within `[min_ratio, max_ratio]`.
    ///
    /// Ratios must be finite and positive, with `min_ratio <= max_ratio`.
    pub fn create(
        prefs: &dyn Prefs,
        use_best_quality: bool,
        min_ratio: f64,
        max_ratio: f64,
    ) -> Result<Self> {
        let quality = Quality::resolve(prefs, use_best_quality);
        Self::with_quality(quality, min_ratio, max_ratio)
    }

    /// Creates a resampler for an explicit quality preset.
    ///
    /// In variable-ratio mode the [`Quality::High`] filter is used whatever
    /// `quality` says; [`quality`](Self::quality) still reports the request.
    pub fn with_quality(quality: Quality, min_ratio: f64, max_ratio: f64) -> Result<Self> {
        debug_assert!(
            min_ratio.is_finite() && min_ratio > 0.0,
            "min_ratio must be finite and positive, got {min_ratio}"
        );
        debug_assert!(
            max_ratio.is_finite() && max_ratio >= min_ratio,
            "max_ratio must be finite and >= min_ratio, got {max_ratio}"
        );

        let mode = if min_ratio == max_ratio {
            RatioMode::Constant
        } else {
            RatioMode::Variable
        };

        // The sinc cutoff is fixed at construction, so variable mode builds
        // the filter at the lowest ratio it may be asked for.
        let inner = match mode {
            RatioMode::Constant => {
                SincFixedOut::<f32>::new(min_ratio, 1.0, quality.recipe(), BLOCK_FRAMES, 1)?
            }
            RatioMode::Variable => SincFixedOut::<f32>::new(
                min_ratio,
                max_ratio / min_ratio,
                VARIABLE_RATE_QUALITY.recipe(),
                VARIABLE_BLOCK_FRAMES,
                1,
            )?,
        };
        let fifo = Vec::with_capacity(inner.input_frames_max());
        let block = vec![0.0f32; inner.output_frames_max()];

        tracing::debug!(
            %quality,
            ?mode,
            min_ratio,
            max_ratio,
            input_frames_max = fifo.capacity(),
            block = block.len(),
            "created resampler"
        );

        Ok(Self {
            quality,
            mode,
            state: State::Initialized,
            inner,
            min_ratio,
            max_ratio,
            ratio: min_ratio,
            fifo,
            block,
            block_read: 0,
            block_len: 0,
            block_step: 1.0 / min_ratio,
            position: 0.0,
            accepted: 0,
            end: None,
        })
    }

    /// The requested quality preset.
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// The preset whose filter is actually in use.
    pub fn filter_quality(&self) -> Quality {
        match self.mode {
            RatioMode::Constant => self.quality,
            RatioMode::Variable => VARIABLE_RATE_QUALITY,
        }
    }

    /// Constant or variable ratio.
    pub fn mode(&self) -> RatioMode {
        self.mode
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Ratio currently applied (output rate / input rate).
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Filter lookahead in output samples at the current ratio.
    pub fn delay(&self) -> usize {
        self.inner.output_delay()
    }

    /// Input samples still missing before the next block can be computed.
    pub fn input_needed(&self) -> usize {
        self.inner.input_frames_next().saturating_sub(self.fifo.len())
    }

    /// Expected total output length for `input_len` input samples at the
    /// current ratio. The actual count may differ by one from rounding of
    /// the output position.
    pub fn output_len_hint(&self, input_len: usize) -> usize {
        (input_len as f64 * self.ratio).ceil() as usize
    }

    /// Runs one streaming step.
    ///
    /// `ratio` is ignored in constant mode. In variable mode it is clamped to
    /// the construction range and applies from the first output sample of
    /// this call.
    ///
    /// Input is consumed only as far as needed to fill `output`; in constant
    /// mode that is one rubato block of 256 output samples at a time.
    /// Unconsumed input is left to the caller, who passes it again on the
    /// next call.
    /// With `is_final` set, `input` is the whole remaining stream. Once it
    /// has all been consumed, the filter tail is flushed over as many calls
    /// as `output` space requires.
    ///
    /// Returns `(consumed, produced)`. After the stream is exhausted every
    /// call returns `(0, 0)`.
    pub fn process(
        &mut self,
        ratio: f64,
        input: &[f32],
        is_final: bool,
        output: &mut [f32],
    ) -> (usize, usize) {
        if self.state == State::Exhausted {
            return (0, 0);
        }
        if self.mode == RatioMode::Variable {
            self.set_ratio(ratio);
        }
        if is_final && self.state != State::Draining {
            tracing::debug!(
                accepted = self.accepted,
                pending = input.len(),
                "resampler draining"
            );
            self.state = State::Draining;
        } else if self.state == State::Initialized {
            self.state = State::Streaming;
        }

        let mut consumed = 0;
        let mut produced = 0;

        while produced < output.len() {
            if self.at_end() {
                break;
            }
            if self.block_read == self.block_len {
                match self.run_block(input, &mut consumed, is_final) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => {
                        tracing::error!(%err, "resampler block failed");
                        self.state = State::Exhausted;
                        return (consumed, produced);
                    }
                }
            }

            output[produced] = self.block[self.block_read];
            self.block_read += 1;
            produced += 1;
            self.position += self.block_step;
        }

        if is_final && self.end.is_none() && consumed == input.len() {
            self.end = Some(self.accepted);
        }
        if self.at_end() {
            tracing::debug!(accepted = self.accepted, "resampler exhausted");
            self.state = State::Exhausted;
        }

        (consumed, produced)
    }

    /// Converts a complete buffer in one go and returns the whole output,
    /// tail included. The resampler is exhausted afterwards.
    pub fn process_all(&mut self, ratio: f64, input: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.output_len_hint(input.len()) + 1);
        let mut block = vec![0.0f32; PROCESS_ALL_BLOCK];
        let mut rest = input;

        loop {
            let (consumed, produced) = self.process(ratio, rest, true, &mut block);
            rest = &rest[consumed..];
            out.extend_from_slice(&block[..produced]);
            if produced == 0 {
                break;
            }
        }
        out
    }

    fn set_ratio(&mut self, ratio: f64) {
        let ratio = ratio.max(self.min_ratio).min(self.max_ratio);
        if ratio == self.ratio {
            return;
        }
        match self.inner.set_resample_ratio(ratio, false) {
            Ok(()) => self.ratio = ratio,
            Err(err) => tracing::warn!(%err, ratio, "keeping previous ratio"),
        }
    }

    fn at_end(&self) -> bool {
        self.end.is_some_and(|end| self.position >= end as f64)
    }

    /// Refills the FIFO from `input` and runs rubato once. Returns
    /// `Ok(false)` when more input is needed or the stream has ended.
    fn run_block(
        &mut self,
        input: &[f32],
        consumed: &mut usize,
        is_final: bool,
    ) -> ResampleResult<bool> {
        let need = self.inner.input_frames_next();

        if self.end.is_none() && self.fifo.len() < need {
            let take = (need - self.fifo.len()).min(input.len() - *consumed);
            self.fifo.extend_from_slice(&input[*consumed..*consumed + take]);
            *consumed += take;
            self.accepted += take as u64;
        }

        let (used, written) = if self.fifo.len() >= need {
            self.inner.process_into_buffer(
                &[&self.fifo[..need]][..],
                &mut [&mut self.block[..]][..],
                None,
            )?
        } else if is_final || self.end.is_some() {
            if self.end.is_none() {
                tracing::debug!(accepted = self.accepted, "resampler flushing tail");
                self.end = Some(self.accepted);
                if self.at_end() {
                    return Ok(false);
                }
            }
            // Past the end of input the stream is silence.
            let result = if self.fifo.is_empty() {
                self.inner.process_partial_into_buffer(
                    None::<&[&[f32]]>,
                    &mut [&mut self.block[..]][..],
                    None,
                )?
            } else {
                self.inner.process_partial_into_buffer(
                    Some(&[&self.fifo[..]][..]),
                    &mut [&mut self.block[..]][..],
                    None,
                )?
            };
            self.fifo.clear();
            result
        } else {
            return Ok(false);
        };

        self.fifo.drain(..used.min(self.fifo.len()));
        self.block_read = 0;
        self.block_len = written;
        self.block_step = 1.0 / self.ratio;
        Ok(written > 0)
    }
}

impl fmt::Debug for Resampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resampler")
            .field("quality", &self.quality)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("ratio", &self.ratio)
            .field("accepted", &self.accepted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{MemoryPrefs, NoPrefs};
    use crate::quality::{best_config_key, fast_config_key};

    fn tone(len: usize, cycles_per_sample: f64, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * cycles_per_sample * i as f64;
                amplitude * phase.sin() as f32
            })
            .collect()
    }

    #[test]
    fn test_mode_selection() {
        let r = Resampler::with_quality(Quality::Low, 1.5, 1.5).unwrap();
        assert_eq!(r.mode(), RatioMode::Constant);
        assert_eq!(r.filter_quality(), Quality::Low);

        let r = Resampler::with_quality(Quality::Low, 0.5, 2.0).unwrap();
        assert_eq!(r.mode(), RatioMode::Variable);
        assert_eq!(r.quality(), Quality::Low);
        assert_eq!(r.filter_quality(), Quality::High);
    }

    #[test]
    fn test_create_reads_prefs() {
        let r = Resampler::create(&NoPrefs, false, 1.0, 1.0).unwrap();
        assert_eq!(r.quality(), Quality::Medium);
        let r = Resampler::create(&NoPrefs, true, 1.0, 1.0).unwrap();
        assert_eq!(r.quality(), Quality::Best);

        let prefs = MemoryPrefs::new();
        prefs.write_int(fast_config_key(), 0);
        prefs.write_int(best_config_key(), 2);
        let r = Resampler::create(&prefs, false, 2.0, 2.0).unwrap();
        assert_eq!(r.quality(), Quality::Low);
        let r = Resampler::create(&prefs, true, 2.0, 2.0).unwrap();
        assert_eq!(r.quality(), Quality::High);
    }

    #[test]
    fn test_state_transitions() {
        let mut r = Resampler::with_quality(Quality::Medium, 1.0, 1.0).unwrap();
        assert_eq!(r.state(), State::Initialized);

        let input = tone(2000, 0.01, 0.5);
        let mut out = vec![0.0f32; 64];

        let (consumed, produced) = r.process(1.0, &input, false, &mut out);
        assert_eq!(produced, 64);
        assert!(consumed < input.len());
        assert_eq!(r.state(), State::Streaming);

        let mut rest = &input[consumed..];
        let mut total = produced;
        loop {
            let (c, p) = r.process(1.0, rest, true, &mut out);
            rest = &rest[c..];
            total += p;
            if p == 0 {
                break;
            }
            assert_ne!(r.state(), State::Initialized);
        }
        assert!(rest.is_empty());
        assert_eq!(r.state(), State::Exhausted);
        assert_eq!(total, 2000);

        // no way back
        assert_eq!(r.process(1.0, &input, false, &mut out), (0, 0));
        assert_eq!(r.process(1.0, &input, true, &mut out), (0, 0));
        assert_eq!(r.state(), State::Exhausted);
    }

    #[test]
    fn test_empty_stream() {
        let mut r = Resampler::with_quality(Quality::High, 2.0, 2.0).unwrap();
        let mut out = vec![0.0f32; 16];
        assert_eq!(r.process(2.0, &[], true, &mut out), (0, 0));
        assert_eq!(r.state(), State::Exhausted);
    }

    #[test]
    fn test_insufficient_input_produces_nothing() {
        let mut r = Resampler::with_quality(Quality::High, 1.0, 1.0).unwrap();
        let mut out = vec![0.0f32; 16];
        let input = vec![0.25f32; r.input_needed() - 1];
        let (consumed, produced) = r.process(1.0, &input, false, &mut out);
        assert_eq!(consumed, input.len());
        assert_eq!(produced, 0);
        assert_eq!(r.input_needed(), 1);

        let (consumed, produced) = r.process(1.0, &[0.25], false, &mut out);
        assert_eq!((consumed, produced), (1, 16));
    }

    #[test]
    fn test_zero_capacity_consumes_nothing() {
        let mut r = Resampler::with_quality(Quality::Medium, 1.0, 1.0).unwrap();
        let input = vec![0.5f32; 1000];
        assert_eq!(r.process(1.0, &input, false, &mut []), (0, 0));
    }

    #[test]
    fn test_constant_mode_ignores_ratio_argument() {
        let input = tone(1500, 0.03, 0.8);

        let mut a = Resampler::with_quality(Quality::Medium, 0.75, 0.75).unwrap();
        let mut b = Resampler::with_quality(Quality::Medium, 0.75, 0.75).unwrap();
        let out_a = a.process_all(0.75, &input);
        let out_b = b.process_all(3.0, &input);

        assert_eq!(out_a, out_b);
        assert_eq!(b.ratio(), 0.75);
    }

    #[test]
    fn test_variable_ratio_is_clamped() {
        let mut r = Resampler::with_quality(Quality::Best, 0.5, 2.0).unwrap();
        let mut out = vec![0.0f32; 8];
        r.process(10.0, &[], false, &mut out);
        assert_eq!(r.ratio(), 2.0);
        r.process(0.1, &[], false, &mut out);
        assert_eq!(r.ratio(), 0.5);
    }

    #[test]
    fn test_fifo_never_grows() {
        let mut r = Resampler::with_quality(Quality::Best, 0.25, 4.0).unwrap();
        let capacity = r.fifo.capacity();
        let block = r.block.len();
        let input = tone(5000, 0.02, 0.5);
        let mut out = vec![0.0f32; 300];
        let mut rest = &input[..];
        let mut ratio = 0.25;
        while r.state() != State::Exhausted {
            let (c, _) = r.process(ratio, rest, rest.len() < 700, &mut out);
            rest = &rest[c..];
            ratio = if ratio > 3.0 { 0.25 } else { ratio * 1.7 };
            assert!(r.fifo.len() <= capacity);
        }
        assert_eq!(r.fifo.capacity(), capacity);
        assert_eq!(r.block.len(), block);
    }

    #[test]
    fn test_flush_spans_multiple_calls() {
        let mut r = Resampler::with_quality(Quality::High, 2.0, 2.0).unwrap();
        let input = tone(100, 0.05, 0.5);
        let mut out = vec![0.0f32; 7];

        let mut rest = &input[..];
        let mut total = 0;
        let mut calls = 0;
        loop {
            let (c, p) = r.process(2.0, rest, true, &mut out);
            rest = &rest[c..];
            total += p;
            calls += 1;
            if p == 0 {
                break;
            }
        }
        assert!(rest.is_empty());
        assert_eq!(total, 200);
        assert!(calls > 200 / 7);
    }

    #[test]
    fn test_identity_ratio_reproduces_tone() {
        let input = tone(1000, 0.05, 0.5);
        let mut r = Resampler::with_quality(Quality::Best, 1.0, 1.0).unwrap();
        let output = r.process_all(1.0, &input);

        assert_eq!(output.len(), 1000);
        for i in 150..850 {
            let err = (output[i] - input[i]).abs();
            assert!(err < 5e-3, "sample {i}: {} vs {}", output[i], input[i]);
        }
    }

    #[test]
    fn test_output_len_hint() {
        let r = Resampler::with_quality(Quality::Low, 0.5, 0.5).unwrap();
        assert_eq!(r.output_len_hint(2000), 1000);
        assert_eq!(r.output_len_hint(2001), 1001);
        let r = Resampler::with_quality(Quality::Low, 1.5, 1.5).unwrap();
        assert_eq!(r.output_len_hint(100), 150);
    }

    #[test]
    fn test_delay_follows_ratio() {
        // High uses a 128-tap sinc; rubato reports half of it in output samples.
        let r = Resampler::with_quality(Quality::High, 1.0, 1.0).unwrap();
        assert_eq!(r.delay(), 64);
        let r = Resampler::with_quality(Quality::High, 0.5, 0.5).unwrap();
        assert_eq!(r.delay(), 32);

        let mut r = Resampler::with_quality(Quality::Low, 0.5, 2.0).unwrap();
        assert_eq!(r.delay(), 32);
        r.process(2.0, &[], false, &mut []);
        assert_eq!(r.delay(), 128);
    }

    #[test]
    fn test_resampler_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Resampler>();
    }

    #[test]
    fn test_debug_format() {
        let r = Resampler::with_quality(Quality::Medium, 1.0, 1.0).unwrap();
        let s = format!("{:?}", r);
        assert!(s.contains("Resampler"));
        assert!(s.contains("Medium"));
    }
}
