//! Incremental byte-to-text decoder chain.
//!
//! PTY output arrives as raw bytes in arbitrary chunks. Each chunk is
//! tried against an ordered list of `(encoding, error policy)` entries;
//! the first entry that decodes the chunk wins, and its undecoded tail
//! (an incomplete UTF-8 sequence) carries over to the next call. The
//! default chain is strict UTF-8, then CP437, then UTF-8 with
//! replacement, which cannot fail.

use codepage_437::{CP437_CONTROL, FromCp437};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Cp437,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    Strict,
    Replace,
}

pub struct ByteDecoder {
    entries: Vec<(Encoding, ErrorPolicy)>,
    pending: Vec<u8>,
}

impl Default for ByteDecoder {
    fn default() -> Self {
        ByteDecoder::new(vec![
            (Encoding::Utf8, ErrorPolicy::Strict),
            (Encoding::Cp437, ErrorPolicy::Strict),
            (Encoding::Utf8, ErrorPolicy::Replace),
        ])
    }
}

impl ByteDecoder {
    pub fn new(entries: Vec<(Encoding, ErrorPolicy)>) -> Self {
        ByteDecoder {
            entries,
            pending: Vec::new(),
        }
    }

    /// Decode a chunk. Every byte is consumed exactly once: either it
    /// becomes part of the returned text or it is carried over as an
    /// incomplete sequence for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        for &(encoding, policy) in &self.entries {
            let attempt = match encoding {
                Encoding::Utf8 => decode_utf8(&input, policy == ErrorPolicy::Replace),
                Encoding::Cp437 => Some((String::from_cp437(input.clone(), &CP437_CONTROL), Vec::new())),
            };
            if let Some((text, rest)) = attempt {
                self.pending = rest;
                return text;
            }
        }

        // The default chain ends in a policy that cannot fail; a custom
        // chain without one falls back to replacement decoding here.
        decode_utf8(&input, true).map(|(text, _)| text).unwrap_or_default()
    }
}

/// Incremental UTF-8 decoding: valid prefixes are appended verbatim, an
/// incomplete sequence at the end of input is returned as the carry-over
/// tail. Invalid bytes either fail the attempt (strict) or decode as
/// U+FFFD (replace).
fn decode_utf8(input: &[u8], replace: bool) -> Option<(String, Vec<u8>)> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return Some((out, Vec::new()));
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }

                match err.error_len() {
                    Some(invalid_len) => {
                        if !replace {
                            return None;
                        }
                        out.push('\u{fffd}');
                        rest = &after[invalid_len..];
                    }
                    None => {
                        // Incomplete multibyte sequence at the end of the
                        // chunk; keep it for the next call.
                        return Some((out, after.to_vec()));
                    }
                }
            }
        }
    }
}
