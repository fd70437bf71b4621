//! Stream drivers for [`Transform`] implementations
//!
//! The transform contract leaves buffering and retries to the caller. These
//! drivers own that loop: [`transform_bytes`] for whole buffers and
//! [`TransformWriter`] for plugging a transformer in front of any
//! [`io::Write`].

use std::io::{self, Write};

use tracing::debug;

use crate::{Error, Result};
use crate::transform::{Status, Transform};

/// Scratch size used by [`TransformWriter::new`]
const DEFAULT_SCRATCH_SIZE: usize = 64 * 1024;

/// Smallest scratch buffer; grown on demand when a unit does not fit
const MIN_SCRATCH_SIZE: usize = 16;

/// Transform a complete input in one go
pub fn transform_bytes<T: Transform + ?Sized>(transformer: &mut T, input: &[u8]) -> Result<Vec<u8>> {
    let mut output = vec![0u8; input.len().max(MIN_SCRATCH_SIZE)];
    let mut consumed = 0;
    let mut written = 0;

    loop {
        let progress = transformer.transform(&mut output[written..], &input[consumed..], true)?;
        consumed += progress.consumed;
        written += progress.written;

        match progress.status {
            Status::DestinationFull => {
                let len = output.len();
                output.resize(len * 2, 0);
            }
            // At end of stream every stage either finishes or fails
            Status::Done | Status::NeedMoreSource => break,
        }
    }

    output.truncate(written);
    Ok(output)
}

/// [`io::Write`] adapter that pushes everything written through a transformer
///
/// Call [`TransformWriter::finish`] to flush the end of the stream; dropping
/// the writer discards any unconsumed remainder and pending encoder state.
///
/// Bytes passed to [`Write::write`] are owned by the writer once accepted.
/// If the wrapped writer fails, the transformed output is kept and retried
/// on the next `write`, `flush` or `finish`. A transform error is terminal
/// and reported again by every later call.
pub struct TransformWriter<W: Write, T: Transform> {
    inner: W,
    transformer: T,
    pending: Vec<u8>,
    scratch: Vec<u8>,
    unsent: Vec<u8>,
    failed: Option<Error>,
    bytes_in: u64,
    bytes_out: u64,
}

impl<W: Write, T: Transform> TransformWriter<W, T> {
    /// Wrap `inner` with the default 64KB scratch buffer
    pub fn new(inner: W, transformer: T) -> Self {
        Self::with_buffer_size(inner, transformer, DEFAULT_SCRATCH_SIZE)
    }

    /// Wrap `inner` with a scratch buffer of `buffer_size` bytes
    pub fn with_buffer_size(inner: W, transformer: T, buffer_size: usize) -> Self {
        Self {
            inner,
            transformer,
            pending: Vec::new(),
            scratch: vec![0; buffer_size.max(MIN_SCRATCH_SIZE)],
            unsent: Vec::new(),
            failed: None,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// The wrapped transformer
    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// The wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Bytes accepted by the transformer so far
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Bytes handed to the wrapped writer so far
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Drive the end of the stream and return the wrapped writer
    pub fn finish(mut self) -> io::Result<W> {
        self.drive(true)?;
        self.inner.flush()?;
        debug!(
            bytes_in = self.bytes_in,
            bytes_out = self.bytes_out,
            "Finished transform stream"
        );
        Ok(self.inner)
    }

    fn check_failed(&self) -> io::Result<()> {
        match &self.failed {
            Some(error) => Err(io::Error::new(io::ErrorKind::InvalidData, error.clone())),
            None => Ok(()),
        }
    }

    fn flush_unsent(&mut self) -> io::Result<()> {
        while !self.unsent.is_empty() {
            match self.inner.write(&self.unsent) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write transformed output",
                    ));
                }
                Ok(n) => {
                    self.unsent.drain(..n);
                    self.bytes_out += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn drive(&mut self, at_eof: bool) -> io::Result<()> {
        self.check_failed()?;
        self.flush_unsent()?;

        loop {
            let result = self
                .transformer
                .transform(&mut self.scratch, &self.pending, at_eof);
            let progress = match result {
                Ok(progress) => progress,
                Err(error) => {
                    let error = error.offset_by(self.bytes_in as usize);
                    self.failed = Some(error);
                    return self.check_failed();
                }
            };

            self.pending.drain(..progress.consumed);
            self.bytes_in += progress.consumed as u64;
            self.unsent.extend_from_slice(&self.scratch[..progress.written]);
            self.flush_unsent()?;

            match progress.status {
                Status::DestinationFull => {
                    if progress.consumed == 0 && progress.written == 0 {
                        let len = self.scratch.len();
                        self.scratch.resize(len * 2, 0);
                    }
                }
                Status::Done | Status::NeedMoreSource => return Ok(()),
            }
        }
    }
}

impl<W: Write, T: Transform> Write for TransformWriter<W, T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_failed()?;
        self.pending.extend_from_slice(buf);
        match self.drive(false) {
            Ok(()) => Ok(buf.len()),
            // The input is accepted; its output waits for the next call
            Err(_) if self.failed.is_none() => Ok(buf.len()),
            Err(e) => Err(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drive(false)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Encoding, ReplacerConfig, Strictness, new_transformer, with_config};

    /// Refuses the first `failures` writes with `WouldBlock`
    struct Flaky {
        failures: usize,
        written: Vec<u8>,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(io::ErrorKind::WouldBlock.into());
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn decode(encoding: Encoding, bytes: &[u8]) -> String {
        encoding
            .codec()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .unwrap()
            .into_owned()
    }

    #[test]
    fn test_writer_matches_one_shot() {
        let text = "一二三四🍣五六七八九🍺十拾壱".repeat(3000);
        let mut transformer = new_transformer(Encoding::SHIFT_JIS, '?').unwrap();
        let one_shot = transform_bytes(&mut transformer, text.as_bytes()).unwrap();

        let transformer = new_transformer(Encoding::SHIFT_JIS, '?').unwrap();
        let mut writer = TransformWriter::with_buffer_size(Vec::new(), transformer, 100);
        for chunk in text.as_bytes().chunks(1000) {
            writer.write_all(chunk).unwrap();
        }
        assert_eq!(writer.transformer().first().replacements(), 6000);
        let output = writer.finish().unwrap();

        assert_eq!(output, one_shot);
        assert_eq!(
            decode(Encoding::SHIFT_JIS, &output),
            "一二三四?五六七八九?十拾壱".repeat(3000)
        );
    }

    #[test]
    fn test_writer_flushes_stateful_encoder_on_finish() {
        let transformer = new_transformer(Encoding::ISO_2022_JP, '?').unwrap();
        let mut writer = TransformWriter::new(Vec::new(), transformer);
        writer.write_all("🍺一".as_bytes()).unwrap();
        writer.flush().unwrap();
        assert!(!writer.get_ref().ends_with(b"\x1b(B"));

        let output = writer.finish().unwrap();
        assert!(output.ends_with(b"\x1b(B"));
        assert_eq!(decode(Encoding::ISO_2022_JP, &output), "?一");
    }

    #[test]
    fn test_writer_with_minimal_scratch() {
        let transformer = new_transformer(Encoding::ISO_2022_JP, '?').unwrap();
        let mut writer = TransformWriter::with_buffer_size(Vec::new(), transformer, 0);
        writer.write_all("一二三".repeat(20).as_bytes()).unwrap();
        let output = writer.finish().unwrap();
        assert_eq!(decode(Encoding::ISO_2022_JP, &output), "一二三".repeat(20));
    }

    #[test]
    fn test_writer_counts_bytes() {
        let transformer = new_transformer(Encoding::WINDOWS_1252, '?').unwrap();
        let mut writer = TransformWriter::new(Vec::new(), transformer);
        writer.write_all("é😀".as_bytes()).unwrap();
        assert_eq!(writer.bytes_in(), 6);
        assert_eq!(writer.bytes_out(), 2);
        assert_eq!(writer.finish().unwrap(), vec![0xE9, b'?']);
    }

    #[test]
    fn test_writer_holds_split_character() {
        let transformer = new_transformer(Encoding::EUC_JP, '?').unwrap();
        let mut writer = TransformWriter::new(Vec::new(), transformer);
        let bytes = "一".as_bytes();
        writer.write_all(&bytes[..1]).unwrap();
        assert_eq!(writer.bytes_in(), 0);
        writer.write_all(&bytes[1..]).unwrap();
        assert_eq!(writer.bytes_in(), 3);
        assert_eq!(decode(Encoding::EUC_JP, &writer.finish().unwrap()), "一");
    }

    #[test]
    fn test_writer_strict_error_is_invalid_data() {
        let config = ReplacerConfig::new('?').with_strictness(Strictness::Strict);
        let transformer = with_config(Encoding::SHIFT_JIS, config).unwrap();
        let mut writer = TransformWriter::new(Vec::new(), transformer);
        let err = writer.write_all(b"ok\xff").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // The stream stays failed
        let err = writer.write(b"more").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_writer_strict_error_offset_counts_from_stream_start() {
        let config = ReplacerConfig::new('?').with_strictness(Strictness::Strict);
        let transformer = with_config(Encoding::SHIFT_JIS, config).unwrap();
        let mut writer = TransformWriter::new(Vec::new(), transformer);
        writer.write_all(b"ok").unwrap();

        let err = writer.write_all(b"x\xff").unwrap_err();
        let error = err.get_ref().and_then(|e| e.downcast_ref::<Error>());
        assert_eq!(error, Some(&Error::InvalidInput { offset: 3, len: 1 }));
    }

    #[test]
    fn test_writer_keeps_output_when_inner_writer_fails() {
        let transformer = new_transformer(Encoding::SHIFT_JIS, '?').unwrap();
        let inner = Flaky {
            failures: 1,
            written: Vec::new(),
        };
        let mut writer = TransformWriter::new(inner, transformer);

        assert_eq!(writer.write(b"abc").unwrap(), 3);
        assert_eq!(writer.bytes_in(), 3);
        assert_eq!(writer.bytes_out(), 0);
        assert!(writer.get_ref().written.is_empty());

        let inner = writer.finish().unwrap();
        assert_eq!(inner.written, b"abc");
    }

    #[test]
    fn test_writer_retries_unsent_output_on_flush() {
        let transformer = new_transformer(Encoding::EUC_JP, '?').unwrap();
        let inner = Flaky {
            failures: 2,
            written: Vec::new(),
        };
        let mut writer = TransformWriter::new(inner, transformer);

        writer.write_all("一🍣".as_bytes()).unwrap();
        assert!(writer.flush().is_err());
        writer.flush().unwrap();
        assert_eq!(writer.bytes_out(), 3);

        let inner = writer.finish().unwrap();
        assert_eq!(decode(Encoding::EUC_JP, &inner.written), "一?");
    }

    #[test]
    fn test_truncated_input_at_eof_lenient() {
        let mut transformer = new_transformer(Encoding::SHIFT_JIS, '?').unwrap();
        let output = transform_bytes(&mut transformer, b"AB\xe4\xb8").unwrap();
        assert_eq!(output, b"AB");
    }
}
