//! Two-stage composition through a bounded intermediate buffer

use crate::Result;
use crate::transform::{Progress, Status, Transform};

/// Intermediate buffer size used by [`Chain::new`]
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Smallest intermediate buffer that can always hold one UTF-8 character
const MIN_BUFFER_SIZE: usize = 4;

/// Runs `first`, then feeds its output to `second`
pub struct Chain<A, B> {
    first: A,
    second: B,
    buffer: Vec<u8>,
    filled: usize,
}

impl<A: Transform, B: Transform> Chain<A, B> {
    /// Chain two stages with the default intermediate buffer
    pub fn new(first: A, second: B) -> Self {
        Self::with_capacity(first, second, DEFAULT_BUFFER_SIZE)
    }

    /// Chain two stages with an intermediate buffer of `capacity` bytes
    pub fn with_capacity(first: A, second: B, capacity: usize) -> Self {
        Self {
            first,
            second,
            buffer: vec![0; capacity.max(MIN_BUFFER_SIZE)],
            filled: 0,
        }
    }

    /// First stage
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Second stage
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: Transform, B: Transform> Transform for Chain<A, B> {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> Result<Progress> {
        let mut consumed = 0;
        let mut written = 0;

        loop {
            let upstream =
                self.first
                    .transform(&mut self.buffer[self.filled..], &src[consumed..], at_eof)
                    .map_err(|e| e.offset_by(consumed))?;
            self.filled += upstream.written;
            consumed += upstream.consumed;

            let drained = upstream.status == Status::Done && consumed == src.len();
            let downstream = self.second.transform(
                &mut dst[written..],
                &self.buffer[..self.filled],
                at_eof && drained,
            )?;
            self.buffer.copy_within(downstream.consumed..self.filled, 0);
            self.filled -= downstream.consumed;
            written += downstream.written;

            match (upstream.status, downstream.status) {
                (_, Status::DestinationFull) => {
                    return Ok(Progress::new(consumed, written, Status::DestinationFull));
                }
                // The intermediate buffer drained, so the first stage can continue
                (Status::DestinationFull, _) if downstream.consumed > 0 => continue,
                (status, _) => return Ok(Progress::new(consumed, written, status)),
            }
        }
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EncodeStage, EncoderProbe, Encoding, Error, Replacer, ReplacerConfig, Strictness,
        new_transformer, transform_bytes,
    };

    /// Upper-cases ASCII one byte at a time
    struct Upper;

    impl Transform for Upper {
        fn transform(&mut self, dst: &mut [u8], src: &[u8], _at_eof: bool) -> Result<Progress> {
            let n = dst.len().min(src.len());
            for (out, byte) in dst.iter_mut().zip(&src[..n]) {
                *out = byte.to_ascii_uppercase();
            }
            let status = if n < src.len() {
                Status::DestinationFull
            } else {
                Status::Done
            };
            Ok(Progress::new(n, n, status))
        }
    }

    #[test]
    fn test_chain_small_intermediate_buffer() {
        let mut chain = Chain::with_capacity(Upper, Upper, 1);
        let output = transform_bytes(&mut chain, b"hello, world").unwrap();
        assert_eq!(output, b"HELLO, WORLD");
    }

    #[test]
    fn test_chain_reports_destination_full() {
        let mut chain = Chain::new(Upper, Upper);
        let mut dst = [0u8; 4];
        let progress = chain.transform(&mut dst, b"abcdef", true).unwrap();
        // Everything was pulled into the intermediate buffer
        assert_eq!(progress, Progress::new(6, 4, Status::DestinationFull));
        assert_eq!(&dst, b"ABCD");

        let progress = chain.transform(&mut dst, b"", true).unwrap();
        assert_eq!(progress, Progress::new(0, 2, Status::Done));
        assert_eq!(&dst[..2], b"EF");
    }

    fn drive(encoding: Encoding, src: &[u8], src_chunk: usize, dst_len: usize) -> Vec<u8> {
        let mut transformer = new_transformer(encoding, '?').unwrap();
        let mut pending = Vec::new();
        let mut output = Vec::new();
        let mut dst = vec![0u8; dst_len];
        let mut chunks = src.chunks(src_chunk).peekable();

        loop {
            if let Some(chunk) = chunks.next() {
                pending.extend_from_slice(chunk);
            }
            let at_eof = chunks.peek().is_none();
            loop {
                let progress = transformer.transform(&mut dst, &pending, at_eof).unwrap();
                output.extend_from_slice(&dst[..progress.written]);
                pending.drain(..progress.consumed);
                if progress.status != Status::DestinationFull {
                    break;
                }
            }
            if at_eof {
                return output;
            }
        }
    }

    #[test]
    fn test_chain_chunk_invariance() {
        let text = "一二三四🍣五六七八九🍺十拾壱ABC".repeat(40);
        let src = text.as_bytes();

        for encoding in [Encoding::SHIFT_JIS, Encoding::ISO_2022_JP, Encoding::BIG5] {
            let whole = drive(encoding, src, src.len(), src.len() * 2);
            for (src_chunk, dst_len) in [(1, 5), (2, 6), (5, 5), (7, 16), (4096, 5)] {
                assert_eq!(
                    drive(encoding, src, src_chunk, dst_len),
                    whole,
                    "{} src_chunk={src_chunk} dst_len={dst_len}",
                    encoding.name()
                );
            }
        }
    }

    #[test]
    fn test_chain_reset_starts_a_new_stream() {
        let mut transformer = new_transformer(Encoding::ISO_2022_JP, '?').unwrap();
        let first = transform_bytes(&mut transformer, "一".as_bytes()).unwrap();
        transformer.reset();
        let second = transform_bytes(&mut transformer, "一".as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chain_reports_offset_from_start_of_source() {
        let config = ReplacerConfig::new('?').with_strictness(Strictness::Strict);
        let replacer = Replacer::new(EncoderProbe::new(Encoding::SHIFT_JIS), config).unwrap();
        let mut chain = Chain::with_capacity(replacer, EncodeStage::new(Encoding::SHIFT_JIS), 4);
        assert_eq!(chain.second().encoding(), Encoding::SHIFT_JIS);

        // The intermediate buffer forces a second pass before the bad byte
        let mut dst = [0u8; 32];
        let result = chain.transform(&mut dst, b"abcdef\xff", true);
        assert_eq!(result, Err(Error::InvalidInput { offset: 6, len: 1 }));
    }
}
