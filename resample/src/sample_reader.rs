//! Sample-aligned reader wrapper.

use std::io::{self, Read};

/// Wraps an io::Read so each read returns a multiple of `sample_size` bytes.
/// Partial samples are held back until the rest of their bytes arrive.
pub(crate) struct SampleReader<R: Read> {
    /// Holds leftover bytes (up to sample_size - 1)
    buffer: Vec<u8>,
    /// Number of valid bytes in buffer
    buffered: usize,
    sample_size: usize,
    inner: R,
}

impl<R: Read> SampleReader<R> {
    /// Creates a new SampleReader that returns data in multiples of sample_size bytes.
    pub fn new(reader: R, sample_size: usize) -> Self {
        Self {
            buffer: vec![0u8; sample_size.saturating_sub(1)],
            buffered: 0,
            sample_size,
            inner: reader,
        }
    }

    /// Unwraps the inner reader. Held-back bytes are discarded.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for SampleReader<R> {
    /// Reads whole samples into buf.
    ///
    /// Returns 0 only at end of input; a trailing partial sample is dropped.
    /// Returns io::ErrorKind::InvalidInput if len(buf) < sample_size.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.len() < self.sample_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer too small for sample",
            ));
        }

        // Truncate buf to a multiple of sample_size
        let aligned_len = (buf.len() / self.sample_size) * self.sample_size;
        let buf = &mut buf[..aligned_len];

        let mut n = self.buffered;
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffered = 0;

        // Keep reading until at least one whole sample is available.
        loop {
            let rn = match self.inner.read(&mut buf[n..]) {
                Ok(rn) => rn,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer[..n].copy_from_slice(&buf[..n]);
                    self.buffered = n;
                    return Err(e);
                }
            };
            n += rn;
            if rn == 0 || n >= self.sample_size {
                break;
            }
        }

        // Save unaligned remainder for next call
        let remainder = n % self.sample_size;
        let start = n - remainder;
        if remainder != 0 && start > 0 {
            self.buffer[..remainder].copy_from_slice(&buf[start..n]);
            self.buffered = remainder;
        }

        Ok(start)
    }
}
