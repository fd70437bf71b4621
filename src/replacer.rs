//! Replacement stage: UTF-8 in, sanitized UTF-8 out

use tracing::{debug, trace};

use crate::config::{ReplacerConfig, Strictness};
use crate::probe::Probe;
use crate::scanner::{Scan, scan};
use crate::transform::{Progress, Status, Transform};
use crate::{Error, Result};

/// Substitutes every code point the probe rejects with the configured
/// replacement, copying whole code points only
pub struct Replacer<P> {
    probe: P,
    config: ReplacerConfig,
    replacements: u64,
}

impl<P: Probe> Replacer<P> {
    /// Create a replacer, rejecting a replacement the probe cannot encode
    pub fn new(mut probe: P, config: ReplacerConfig) -> Result<Self> {
        if !probe.can_encode(config.replacement) {
            return Err(Error::UnencodableReplacement {
                replacement: config.replacement,
            });
        }

        debug!(
            replacement = ?config.replacement,
            strictness = ?config.strictness,
            "Created replacer"
        );

        Ok(Self {
            probe,
            config,
            replacements: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ReplacerConfig {
        &self.config
    }

    /// Number of code points substituted so far
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    /// Underlying probe
    pub fn probe(&self) -> &P {
        &self.probe
    }
}

impl<P: Probe> Transform for Replacer<P> {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> Result<Progress> {
        let mut consumed = 0;
        let mut written = 0;

        while consumed < src.len() {
            let (ch, len) = match scan(&src[consumed..], at_eof) {
                Scan::Char { ch, len } => (ch, len),
                Scan::Incomplete => {
                    return Ok(Progress::new(consumed, written, Status::NeedMoreSource));
                }
                Scan::Malformed { len } => match self.config.strictness {
                    Strictness::Strict => {
                        return Err(Error::InvalidInput {
                            offset: consumed,
                            len,
                        });
                    }
                    Strictness::Lenient => {
                        trace!(offset = consumed, len, "Skipping malformed input");
                        consumed += len;
                        continue;
                    }
                },
                Scan::Empty => break,
            };

            let emitted = if self.probe.can_encode(ch) {
                ch
            } else {
                trace!(character = ?ch, offset = consumed, "Replacing unrepresentable character");
                self.config.replacement
            };

            let mut buf = [0u8; 4];
            let bytes = emitted.encode_utf8(&mut buf).as_bytes();
            let Some(slot) = dst.get_mut(written..written + bytes.len()) else {
                return Ok(Progress::new(consumed, written, Status::DestinationFull));
            };

            slot.copy_from_slice(bytes);
            if emitted != ch {
                self.replacements += 1;
            }
            written += bytes.len();
            consumed += len;
        }

        Ok(Progress::new(consumed, written, Status::Done))
    }

    fn reset(&mut self) {
        self.probe.reset();
    }
}
