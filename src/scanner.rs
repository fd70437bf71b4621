//! Code-point scanner over unconsumed UTF-8 source bytes

/// Longest UTF-8 encoding of a single code point
const MAX_UTF8_LEN: usize = 4;

/// Result of scanning the front of a source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// A complete code point and its byte length
    Char { ch: char, len: usize },
    /// A valid prefix cut short before end of stream
    Incomplete,
    /// Bytes that can never start a valid code point
    Malformed { len: usize },
    /// Nothing left to scan
    Empty,
}

/// Decode the next code point from the front of `src`
pub(crate) fn scan(src: &[u8], at_eof: bool) -> Scan {
    let window = &src[..src.len().min(MAX_UTF8_LEN)];

    let error = match std::str::from_utf8(window) {
        Ok(text) => return leading(text),
        Err(error) => error,
    };

    if error.valid_up_to() > 0 {
        let valid = std::str::from_utf8(&window[..error.valid_up_to()]).unwrap_or_default();
        return leading(valid);
    }

    match error.error_len() {
        Some(len) => Scan::Malformed { len },
        // A window shorter than four bytes ends inside a valid prefix
        None if at_eof => Scan::Malformed { len: window.len() },
        None => Scan::Incomplete,
    }
}

fn leading(text: &str) -> Scan {
    match text.chars().next() {
        Some(ch) => Scan::Char {
            ch,
            len: ch.len_utf8(),
        },
        None => Scan::Empty,
    }
}
