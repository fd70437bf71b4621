//! Encodability probes
//!
//! A probe answers one question per code point: can the target encoding
//! represent it? [`EncoderProbe`] asks a private `encoding_rs` encoder of the
//! target encoding. Because it never shares that encoder with the stage that
//! produces the real output, a failed attempt cannot disturb the shift state
//! of a stateful encoding such as ISO-2022-JP.

use encoding_rs::EncoderResult;

use crate::Encoding;

/// Room for one escape sequence plus one encoded character
const SCRATCH_LEN: usize = 16;

/// Representability test for a single code point
pub trait Probe {
    /// Whether `ch` can be represented in the target encoding
    fn can_encode(&mut self, ch: char) -> bool;

    /// Prepare the probe for a new stream
    fn reset(&mut self) {}
}

/// Probe backed by a shadow encoder of the target encoding
pub struct EncoderProbe {
    encoding: Encoding,
    encoder: encoding_rs::Encoder,
    scratch: [u8; SCRATCH_LEN],
}

impl EncoderProbe {
    /// Create a probe for the given target encoding
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            encoder: encoding.codec().new_encoder(),
            scratch: [0; SCRATCH_LEN],
        }
    }

    /// Target encoding being probed
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Probe for EncoderProbe {
    fn can_encode(&mut self, ch: char) -> bool {
        if ch.is_ascii() && self.encoding.is_ascii_compatible() {
            return true;
        }

        let mut buf = [0u8; 4];
        let text = ch.encode_utf8(&mut buf);
        let (result, _, _) =
            self.encoder
                .encode_from_utf8_without_replacement(text, &mut self.scratch, false);

        matches!(result, EncoderResult::InputEmpty)
    }

    fn reset(&mut self) {
        self.encoder = self.encoding.codec().new_encoder();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_jis_probe() {
        let mut probe = EncoderProbe::new(Encoding::SHIFT_JIS);
        assert_eq!(probe.encoding(), Encoding::SHIFT_JIS);
        assert!(probe.can_encode('A'));
        assert!(probe.can_encode('一'));
        assert!(probe.can_encode('拾'));
        assert!(!probe.can_encode('🍣'));
        assert!(!probe.can_encode('\u{FFFD}'));
    }

    #[test]
    fn test_single_byte_probe() {
        let mut probe = EncoderProbe::new(Encoding::WINDOWS_1252);
        assert!(probe.can_encode('€'));
        assert!(probe.can_encode('é'));
        assert!(!probe.can_encode('一'));
        assert!(!probe.can_encode('Ж'));

        let mut probe = EncoderProbe::new(Encoding::KOI8_R);
        assert!(probe.can_encode('Ж'));
        assert!(!probe.can_encode('€'));
    }

    #[test]
    fn test_stateful_probe_is_order_independent() {
        let mut probe = EncoderProbe::new(Encoding::ISO_2022_JP);
        assert!(probe.can_encode('一'));
        assert!(!probe.can_encode('🍣'));
        assert!(probe.can_encode('A'));
        assert!(!probe.can_encode('🍺'));
        assert!(!probe.can_encode('🍺'));
        assert!(probe.can_encode('二'));
        assert!(probe.can_encode('B'));
    }

    #[test]
    fn test_utf8_probe_accepts_everything() {
        let mut probe = EncoderProbe::new(Encoding::UTF8);
        for ch in ['A', 'é', '一', '🍣', '\u{FFFD}'] {
            assert!(probe.can_encode(ch));
        }
    }
}
