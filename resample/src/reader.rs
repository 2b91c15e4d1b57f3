//! `io::Read` adapter over a [`Resampler`].

use std::io::{self, Read};

use crate::engine::{Resampler, State};
use crate::sample_reader::SampleReader;

/// Bytes per little-endian `f32` sample.
const SAMPLE_BYTES: usize = 4;

/// Source samples pulled per refill.
const READ_CHUNK: usize = 1024;

/// Resamples a byte stream of little-endian `f32` mono samples.
///
/// Reads from the source as needed, runs the samples through the resampler
/// and returns little-endian `f32` bytes at the output rate. At source EOF
/// the resampler is flushed; after the tail has been returned, reads return
/// `Ok(0)`.
///
/// ```rust
/// use std::io::{Cursor, Read};
/// use giztoy_resample::{Quality, Reader, Resampler};
///
/// let samples: Vec<u8> = (0..400)
///     .flat_map(|i| ((i as f32) * 0.01).sin().to_le_bytes())
///     .collect();
/// let resampler = Resampler::with_quality(Quality::Medium, 2.0, 2.0)?;
/// let mut reader = Reader::new(Cursor::new(samples), resampler, 2.0);
///
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out)?;
/// assert_eq!(out.len(), 800 * 4);
/// # Ok::<(), giztoy_resample::Error>(())
/// ```
pub struct Reader<R: Read> {
    src: SampleReader<R>,
    resampler: Resampler,
    ratio: f64,
    /// Source samples read but not yet consumed by the resampler.
    pending: Vec<f32>,
    read_buf: Vec<u8>,
    out_buf: Vec<f32>,
    eof: bool,
}

impl<R: Read> Reader<R> {
    /// Creates a reader that resamples `src` with `resampler` at `ratio`.
    ///
    /// `ratio` only matters for variable-ratio resamplers; see
    /// [`set_ratio`](Self::set_ratio).
    pub fn new(src: R, resampler: Resampler, ratio: f64) -> Self {
        Self {
            src: SampleReader::new(src, SAMPLE_BYTES),
            resampler,
            ratio,
            pending: Vec::with_capacity(READ_CHUNK),
            read_buf: vec![0u8; READ_CHUNK * SAMPLE_BYTES],
            out_buf: Vec::new(),
            eof: false,
        }
    }

    /// Sets the ratio used from the next read on.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
    }

    /// Returns the wrapped resampler.
    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    /// Consumes the reader, returning the source and the resampler.
    pub fn into_inner(self) -> (R, Resampler) {
        (self.src.into_inner(), self.resampler)
    }

    fn fill(&mut self) -> io::Result<()> {
        let n = self.src.read(&mut self.read_buf)?;
        if n == 0 {
            self.eof = true;
            return Ok(());
        }
        self.pending.extend(
            self.read_buf[..n]
                .chunks_exact(SAMPLE_BYTES)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
        Ok(())
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if buf.len() < SAMPLE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer too small",
            ));
        }
        if self.resampler.state() == State::Exhausted {
            return Ok(0);
        }

        let capacity = buf.len() / SAMPLE_BYTES;
        if self.out_buf.len() < capacity {
            self.out_buf.resize(capacity, 0.0);
        }

        loop {
            if !self.eof && self.pending.len() < READ_CHUNK {
                self.fill()?;
            }

            let (consumed, produced) = self.resampler.process(
                self.ratio,
                &self.pending,
                self.eof,
                &mut self.out_buf[..capacity],
            );
            self.pending.drain(..consumed);

            if produced > 0 {
                let samples = &self.out_buf[..produced];
                for (dst, sample) in buf.chunks_exact_mut(SAMPLE_BYTES).zip(samples) {
                    dst.copy_from_slice(&sample.to_le_bytes());
                }
                return Ok(produced * SAMPLE_BYTES);
            }
            if self.eof {
                return Ok(0);
            }
        }
    }
}
