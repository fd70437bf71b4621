//! # Garbled Replacer - Lossless-by-substitution Charset Encoding
//!
//! Streaming conversion of Unicode text into legacy and regional byte
//! encodings (Shift_JIS, EUC-JP, ISO-2022-JP, Big5, Windows code pages, ...)
//! where every character the target cannot represent is replaced by a single
//! configured placeholder instead of garbling the output or failing the
//! whole stream.
//!
//! ## Features
//!
//! - **Chunked transform contract** that tolerates arbitrarily small source
//!   and destination buffers
//! - **One-to-one substitution** of unrepresentable characters
//! - **Stateful encoders** (ISO-2022-JP) that are never fed a failed attempt
//! - **Strict or lenient** handling of malformed UTF-8 input
//! - **`io::Write` adapter** for plugging into existing writers
//!
//! ## Quick Start
//!
//! ```rust
//! use garbled_replacer::{Encoding, encode_lossy};
//!
//! let bytes = encode_lossy(Encoding::SHIFT_JIS, '?', "A\u{1F600}B").unwrap();
//! assert_eq!(bytes, b"A?B");
//! ```
//!
//! The pipeline is made of two stages that can be driven independently: a
//! [`Replacer`] that sanitizes UTF-8 and an [`EncodeStage`] that produces the
//! target bytes. [`new_transformer`] chains them.

#![deny(missing_docs)]

use std::str::FromStr;

mod chain;
pub mod config;
mod encode;
pub mod probe;
mod replacer;
mod scanner;
pub mod stream;
mod transform;

pub use chain::{Chain, DEFAULT_BUFFER_SIZE};
pub use config::{ReplacerConfig, Strictness};
pub use encode::EncodeStage;
pub use probe::{EncoderProbe, Probe};
pub use replacer::Replacer;
pub use stream::{TransformWriter, transform_bytes};
pub use transform::{Progress, Status, Transform};

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during encoding operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Source bytes are not valid UTF-8
    ///
    /// Terminal for the stream: output produced earlier in the failing call
    /// is discarded. [`Transform::transform`] reports `offset` from the start
    /// of that call's source buffer; [`TransformWriter`] reports it from the
    /// start of the stream.
    #[error("Invalid input: malformed UTF-8 ({len} byte(s) at offset {offset})")]
    InvalidInput {
        /// Offset of the malformed run
        offset: usize,
        /// Length of the malformed run
        len: usize,
    },
    /// Character cannot be encoded in target encoding
    #[error("Cannot encode character '{character}' at position {position}")]
    UnmappableTarget {
        /// The unmappable character
        character: char,
        /// Position of the character in the source buffer of the call
        position: usize,
    },
    /// The configured replacement is itself unrepresentable
    #[error("Replacement character {replacement:?} is not representable in the target encoding")]
    UnencodableReplacement {
        /// The rejected replacement character
        replacement: char,
    },
    /// Encoding label not recognized
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
    /// Input arrived after the encoder flushed its final state
    #[error("Encoder for {0} already finished its stream")]
    StreamFinished(&'static str),
}

impl Error {
    /// Shift a source offset by `base` bytes consumed before the failing slice
    pub(crate) fn offset_by(self, base: usize) -> Self {
        match self {
            Error::InvalidInput { offset, len } => Error::InvalidInput {
                offset: offset + base,
                len,
            },
            other => other,
        }
    }
}

/// Supported target encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    // Japanese
    /// Shift_JIS (Japanese, Windows-31J flavour)
    SHIFT_JIS,
    /// EUC-JP (Japanese)
    EUC_JP,
    /// ISO-2022-JP (Japanese, stateful escape sequences)
    ISO_2022_JP,

    // Chinese and Korean
    /// Big5 (Traditional Chinese, with HKSCS extensions)
    BIG5,
    /// GBK (Simplified Chinese)
    GBK,
    /// GB18030 (Simplified Chinese, full Unicode coverage)
    GB18030,
    /// EUC-KR (Korean, Windows-949 flavour)
    EUC_KR,

    // Windows code pages
    /// Windows-874 (Thai)
    WINDOWS_874,
    /// Windows-1250 (Central/Eastern European)
    WINDOWS_1250,
    /// Windows-1251 (Cyrillic)
    WINDOWS_1251,
    /// Windows-1252 (Western European)
    WINDOWS_1252,
    /// Windows-1253 (Greek)
    WINDOWS_1253,
    /// Windows-1254 (Turkish)
    WINDOWS_1254,
    /// Windows-1255 (Hebrew)
    WINDOWS_1255,
    /// Windows-1256 (Arabic)
    WINDOWS_1256,
    /// Windows-1257 (Baltic)
    WINDOWS_1257,
    /// Windows-1258 (Vietnamese)
    WINDOWS_1258,

    // ISO-8859 series
    /// ISO-8859-2 (Latin-2) - Central/Eastern European
    ISO_8859_2,
    /// ISO-8859-3 (Latin-3) - South European
    ISO_8859_3,
    /// ISO-8859-4 (Latin-4) - North European
    ISO_8859_4,
    /// ISO-8859-5 (Cyrillic)
    ISO_8859_5,
    /// ISO-8859-6 (Arabic)
    ISO_8859_6,
    /// ISO-8859-7 (Greek)
    ISO_8859_7,
    /// ISO-8859-8 (Hebrew)
    ISO_8859_8,
    /// ISO-8859-10 (Latin-6) - Nordic
    ISO_8859_10,
    /// ISO-8859-13 (Latin-7) - Baltic Rim
    ISO_8859_13,
    /// ISO-8859-14 (Latin-8) - Celtic
    ISO_8859_14,
    /// ISO-8859-15 (Latin-9) - Western European with Euro
    ISO_8859_15,
    /// ISO-8859-16 (Latin-10) - South-Eastern European
    ISO_8859_16,

    // Cyrillic and Mac
    /// KOI8-R (Russian)
    KOI8_R,
    /// KOI8-U (Ukrainian)
    KOI8_U,
    /// DOS Code Page 866 (Russian OEM)
    IBM866,
    /// Macintosh Roman
    MAC_ROMAN,
    /// Macintosh Cyrillic
    MAC_CYRILLIC,

    // Unicode
    /// UTF-8 (every character is representable)
    UTF8,
}

impl Encoding {
    /// Every supported target encoding, in listing order
    pub const ALL: [Encoding; 35] = [
        Encoding::SHIFT_JIS,
        Encoding::EUC_JP,
        Encoding::ISO_2022_JP,
        Encoding::BIG5,
        Encoding::GBK,
        Encoding::GB18030,
        Encoding::EUC_KR,
        Encoding::WINDOWS_874,
        Encoding::WINDOWS_1250,
        Encoding::WINDOWS_1251,
        Encoding::WINDOWS_1252,
        Encoding::WINDOWS_1253,
        Encoding::WINDOWS_1254,
        Encoding::WINDOWS_1255,
        Encoding::WINDOWS_1256,
        Encoding::WINDOWS_1257,
        Encoding::WINDOWS_1258,
        Encoding::ISO_8859_2,
        Encoding::ISO_8859_3,
        Encoding::ISO_8859_4,
        Encoding::ISO_8859_5,
        Encoding::ISO_8859_6,
        Encoding::ISO_8859_7,
        Encoding::ISO_8859_8,
        Encoding::ISO_8859_10,
        Encoding::ISO_8859_13,
        Encoding::ISO_8859_14,
        Encoding::ISO_8859_15,
        Encoding::ISO_8859_16,
        Encoding::KOI8_R,
        Encoding::KOI8_U,
        Encoding::IBM866,
        Encoding::MAC_ROMAN,
        Encoding::MAC_CYRILLIC,
        Encoding::UTF8,
    ];

    /// The `encoding_rs` codec backing this encoding
    pub fn codec(self) -> &'static encoding_rs::Encoding {
        match self {
            Encoding::SHIFT_JIS => encoding_rs::SHIFT_JIS,
            Encoding::EUC_JP => encoding_rs::EUC_JP,
            Encoding::ISO_2022_JP => encoding_rs::ISO_2022_JP,
            Encoding::BIG5 => encoding_rs::BIG5,
            Encoding::GBK => encoding_rs::GBK,
            Encoding::GB18030 => encoding_rs::GB18030,
            Encoding::EUC_KR => encoding_rs::EUC_KR,

            Encoding::WINDOWS_874 => encoding_rs::WINDOWS_874,
            Encoding::WINDOWS_1250 => encoding_rs::WINDOWS_1250,
            Encoding::WINDOWS_1251 => encoding_rs::WINDOWS_1251,
            Encoding::WINDOWS_1252 => encoding_rs::WINDOWS_1252,
            Encoding::WINDOWS_1253 => encoding_rs::WINDOWS_1253,
            Encoding::WINDOWS_1254 => encoding_rs::WINDOWS_1254,
            Encoding::WINDOWS_1255 => encoding_rs::WINDOWS_1255,
            Encoding::WINDOWS_1256 => encoding_rs::WINDOWS_1256,
            Encoding::WINDOWS_1257 => encoding_rs::WINDOWS_1257,
            Encoding::WINDOWS_1258 => encoding_rs::WINDOWS_1258,

            Encoding::ISO_8859_2 => encoding_rs::ISO_8859_2,
            Encoding::ISO_8859_3 => encoding_rs::ISO_8859_3,
            Encoding::ISO_8859_4 => encoding_rs::ISO_8859_4,
            Encoding::ISO_8859_5 => encoding_rs::ISO_8859_5,
            Encoding::ISO_8859_6 => encoding_rs::ISO_8859_6,
            Encoding::ISO_8859_7 => encoding_rs::ISO_8859_7,
            Encoding::ISO_8859_8 => encoding_rs::ISO_8859_8,
            Encoding::ISO_8859_10 => encoding_rs::ISO_8859_10,
            Encoding::ISO_8859_13 => encoding_rs::ISO_8859_13,
            Encoding::ISO_8859_14 => encoding_rs::ISO_8859_14,
            Encoding::ISO_8859_15 => encoding_rs::ISO_8859_15,
            Encoding::ISO_8859_16 => encoding_rs::ISO_8859_16,

            Encoding::KOI8_R => encoding_rs::KOI8_R,
            Encoding::KOI8_U => encoding_rs::KOI8_U,
            Encoding::IBM866 => encoding_rs::IBM866,
            Encoding::MAC_ROMAN => encoding_rs::MACINTOSH,
            Encoding::MAC_CYRILLIC => encoding_rs::X_MAC_CYRILLIC,

            Encoding::UTF8 => encoding_rs::UTF_8,
        }
    }

    /// Map an `encoding_rs` codec back to a supported encoding
    pub fn from_codec(codec: &'static encoding_rs::Encoding) -> Option<Self> {
        Self::ALL.into_iter().find(|encoding| encoding.codec() == codec)
    }

    /// Get the canonical (WHATWG) name of this encoding
    pub fn name(self) -> &'static str {
        self.codec().name()
    }

    /// Check if this encoding is ASCII-compatible (ASCII bytes 0-127 have same meaning)
    pub fn is_ascii_compatible(self) -> bool {
        self.codec().is_ascii_compatible()
    }

    /// Check if this encoding uses variable-length character representation
    pub fn is_multibyte(self) -> bool {
        matches!(
            self,
            Encoding::SHIFT_JIS
                | Encoding::EUC_JP
                | Encoding::ISO_2022_JP
                | Encoding::BIG5
                | Encoding::GBK
                | Encoding::GB18030
                | Encoding::EUC_KR
                | Encoding::UTF8
        )
    }

    /// Check if the encoder carries shift state between characters
    pub fn is_stateful(self) -> bool {
        matches!(self, Encoding::ISO_2022_JP)
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let encoding = match s.to_uppercase().as_str() {
            "SHIFTJIS" | "SHIFT-JIS" | "SHIFT_JIS" | "SJIS" => Encoding::SHIFT_JIS,
            "EUCJP" | "EUC-JP" | "EUC_JP" => Encoding::EUC_JP,
            "ISO2022JP" | "ISO-2022-JP" | "JIS" => Encoding::ISO_2022_JP,
            "EUCKR" | "EUC-KR" | "EUC_KR" => Encoding::EUC_KR,
            "UTF8" | "UTF-8" => Encoding::UTF8,
            "MACROMAN" | "MAC-ROMAN" => Encoding::MAC_ROMAN,
            "MACCYRILLIC" | "MAC-CYRILLIC" => Encoding::MAC_CYRILLIC,
            "CP866" | "DOS866" => Encoding::IBM866,

            // Anything else goes through the WHATWG label table
            _ => encoding_rs::Encoding::for_label(s.trim().as_bytes())
                .and_then(Encoding::from_codec)
                .ok_or_else(|| Error::UnknownEncoding(s.to_string()))?,
        };

        Ok(encoding)
    }
}

/// The full sanitize-then-encode pipeline
pub type GarbledReplacer = Chain<Replacer<EncoderProbe>, EncodeStage>;

/// Build the two-stage pipeline for `encoding` with the default (lenient) policy
pub fn new_transformer(encoding: Encoding, replacement: char) -> Result<GarbledReplacer> {
    with_config(encoding, ReplacerConfig::new(replacement))
}

/// Build the two-stage pipeline for `encoding` from a full configuration
pub fn with_config(encoding: Encoding, config: ReplacerConfig) -> Result<GarbledReplacer> {
    let replacer = Replacer::new(EncoderProbe::new(encoding), config)?;
    Ok(Chain::new(replacer, EncodeStage::new(encoding)))
}

/// Encode a whole string in one call, substituting unrepresentable characters
pub fn encode_lossy(encoding: Encoding, replacement: char, text: &str) -> Result<Vec<u8>> {
    let mut transformer = new_transformer(encoding, replacement)?;
    transform_bytes(&mut transformer, text.as_bytes())
}
