//! The chunked transform contract shared by every pipeline stage

use crate::Result;

/// Why a transform call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// All of the source was consumed (and flushed, at end of stream)
    Done,
    /// The source ends inside a character; call again with the remainder
    /// followed by more bytes
    NeedMoreSource,
    /// The destination has no room for the next whole character; drain it
    /// and call again with the unconsumed remainder
    DestinationFull,
}

/// Outcome of one transform call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes consumed from the front of the source
    pub consumed: usize,
    /// Bytes written to the front of the destination
    pub written: usize,
    /// What the caller should do next
    pub status: Status,
}

impl Progress {
    /// Create a progress report
    pub fn new(consumed: usize, written: usize, status: Status) -> Self {
        Self {
            consumed,
            written,
            status,
        }
    }
}

/// A resumable byte-to-byte transformation step
///
/// Calls never block. `consumed` always ends on a character boundary and
/// `written` never exceeds `dst.len()`; the caller owns all buffering and
/// retries according to the returned [`Status`].
pub trait Transform {
    /// Transform as much of `src` into `dst` as possible
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> Result<Progress>;

    /// Prepare the transformer for a new stream
    fn reset(&mut self) {}
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> Result<Progress> {
        (**self).transform(dst, src, at_eof)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
