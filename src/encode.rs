//! Encode stage: sanitized UTF-8 in, target encoding bytes out

use encoding_rs::EncoderResult;
use tracing::debug;

use crate::transform::{Progress, Status, Transform};
use crate::{Encoding, Error, Result};

/// Owns the stream's real encoder and writes target bytes
///
/// Feed it text that went through a [`crate::Replacer`]; anything the
/// encoder still cannot map is reported as [`Error::UnmappableTarget`].
pub struct EncodeStage {
    encoding: Encoding,
    encoder: encoding_rs::Encoder,
    finished: bool,
}

impl EncodeStage {
    /// Create an encode stage for the given target encoding
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            encoder: encoding.codec().new_encoder(),
            finished: false,
        }
    }

    /// Target encoding
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether the end-of-stream flush has completed
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Transform for EncodeStage {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> Result<Progress> {
        if self.finished {
            if src.is_empty() {
                return Ok(Progress::new(0, 0, Status::Done));
            }
            return Err(Error::StreamFinished(self.encoding.name()));
        }

        let (text, pending) = match std::str::from_utf8(src) {
            Ok(text) => (text, false),
            Err(error) if error.error_len().is_none() && !at_eof => {
                let text = std::str::from_utf8(&src[..error.valid_up_to()]).unwrap_or_default();
                (text, true)
            }
            Err(error) => {
                return Err(Error::InvalidInput {
                    offset: error.valid_up_to(),
                    len: error.error_len().unwrap_or(src.len() - error.valid_up_to()),
                });
            }
        };

        let last = at_eof && !pending;
        let (result, read, written) =
            self.encoder
                .encode_from_utf8_without_replacement(text, dst, last);

        match result {
            EncoderResult::InputEmpty if pending => {
                Ok(Progress::new(read, written, Status::NeedMoreSource))
            }
            EncoderResult::InputEmpty => {
                if last {
                    self.finished = true;
                    debug!(encoding = self.encoding.name(), "Flushed encoder state");
                }
                Ok(Progress::new(read, written, Status::Done))
            }
            EncoderResult::OutputFull => Ok(Progress::new(read, written, Status::DestinationFull)),
            EncoderResult::Unmappable(character) => Err(Error::UnmappableTarget {
                character,
                position: read - character.len_utf8(),
            }),
        }
    }

    fn reset(&mut self) {
        self.encoder = self.encoding.codec().new_encoder();
        self.finished = false;
    }
}
