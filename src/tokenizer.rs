//! Tokenizer: splits a byte stream on whitespace and folds ASCII case.
//!
//! Tokens may straddle chunk boundaries; the partial token is kept in a
//! reusable buffer owned by the tokenizer until the next whitespace byte (or
//! [`Tokenizer::finish`]) completes it.

use thiserror::Error;

const INITIAL_TOKEN_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("failed to allocate token buffer")]
    BufferAllocation,
    #[error("token buffer capacity overflow")]
    BufferOverflow,
    #[error("failed to grow token buffer")]
    BufferGrowth,
}

/// Whitespace as classified by C's `isspace` in the "C" locale.
#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

#[derive(Debug)]
pub struct Tokenizer {
    buf: Vec<u8>,
}

impl Tokenizer {
    pub fn try_new() -> Result<Self, TokenizeError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(INITIAL_TOKEN_CAPACITY)
            .map_err(|_| TokenizeError::BufferAllocation)?;
        Ok(Self { buf })
    }

    /// Scan `bytes`, handing each completed, lower-cased token to `sink`.
    ///
    /// Stops at the first error from `sink` or from buffer growth.
    pub fn feed<E, F>(&mut self, bytes: &[u8], mut sink: F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
        E: From<TokenizeError>,
    {
        for &b in bytes {
            if is_space(b) {
                if !self.buf.is_empty() {
                    sink(self.buf.as_slice())?;
                    self.buf.clear();
                }
            } else {
                self.push(b.to_ascii_lowercase())?;
            }
        }
        Ok(())
    }

    /// Emit the pending token, if any, at end of input.
    pub fn finish<E, F>(&mut self, mut sink: F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        if !self.buf.is_empty() {
            sink(self.buf.as_slice())?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Bytes of the token currently being assembled.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    fn push(&mut self, b: u8) -> Result<(), TokenizeError> {
        if self.buf.len() == self.buf.capacity() {
            let cap = self.buf.capacity();
            let new_cap = cap
                .checked_mul(2)
                .ok_or(TokenizeError::BufferOverflow)?
                .max(INITIAL_TOKEN_CAPACITY);
            self.buf
                .try_reserve_exact(new_cap - self.buf.len())
                .map_err(|_| TokenizeError::BufferGrowth)?;
        }
        self.buf.push(b);
        Ok(())
    }
}
