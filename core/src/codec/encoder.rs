/*
 * encoder.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Lettera, an RFC 5322 / MIME mail message library.
 *
 * Lettera is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Lettera is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Lettera.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Charset-aware header encoder: folds header lines at whitespace and turns
//! non-ASCII runs into RFC 2047 encoded-words. Output is deterministic for a
//! given input, charset, and column limit.

use encoding_rs::Encoding;

use crate::codec::base64;
use crate::error::ParseError;

/// Default column limit for folded header lines.
pub const DEFAULT_FOLD_LIMIT: usize = 76;

/// Input-byte budget per encoded-word chunk, before base64 expansion.
const CHUNK_BYTE_BUDGET: usize = 60;

enum Kind {
    Plain(String),
    Encoded(String),
}

struct Item {
    sep: String,
    kind: Kind,
}

pub struct HeaderEncoder {
    charset: &'static Encoding,
    label: String,
    limit: usize,
}

impl HeaderEncoder {
    pub fn new(charset: &str, limit: usize) -> Result<Self, ParseError> {
        let enc = Encoding::for_label(charset.trim().as_bytes())
            .ok_or_else(|| ParseError::charset(charset, "unknown header charset"))?;
        Ok(HeaderEncoder {
            charset: enc,
            label: enc.name().to_ascii_lowercase(),
            limit: limit.max(40),
        })
    }

    /// Render `Name: value` with folding (CRLF + TAB). Words that carry
    /// non-ASCII characters become encoded-words; adjacent ones merge into a
    /// single logical run whose chunks a decoder reassembles.
    pub fn encode_field(&self, name: &str, value: &str) -> String {
        let items = segment(value);
        let mut out = String::with_capacity(name.len() + value.len() + 16);
        out.push_str(name);
        out.push(':');
        let mut col = name.len() + 1;
        if items.is_empty() {
            return out;
        }
        for (idx, item) in items.iter().enumerate() {
            let sep = if idx == 0 { " " } else { item.sep.as_str() };
            match &item.kind {
                Kind::Plain(word) => {
                    self.push_word(&mut out, &mut col, sep, word, idx == 0);
                }
                Kind::Encoded(run) => {
                    let (enc, label) = self.run_encoding(run);
                    let words = self.chunk_run(run, enc, label);
                    for (ci, word) in words.iter().enumerate() {
                        if ci == 0 {
                            // an encoded word may fold onto its own line even
                            // at the start of the value
                            self.push_word(&mut out, &mut col, sep, word, false);
                        } else {
                            // chunks of one run always fold, so the decoder
                            // sees them joined by folding whitespace alone
                            out.push_str("\r\n\t");
                            out.push_str(word);
                            col = 1 + word.len();
                        }
                    }
                }
            }
        }
        out
    }

    fn push_word(&self, out: &mut String, col: &mut usize, sep: &str, word: &str, first: bool) {
        if !first && *col + sep.len() + word.len() > self.limit && *col > 1 {
            out.push_str("\r\n\t");
            out.push_str(word);
            *col = 1 + word.len();
        } else {
            out.push_str(sep);
            out.push_str(word);
            *col += sep.len() + word.len();
        }
    }

    /// Wire charset for one run; falls back to UTF-8 when the configured
    /// charset cannot represent the text.
    fn run_encoding(&self, run: &str) -> (&'static Encoding, &str) {
        let (_, _, had_errors) = self.charset.encode(run);
        if had_errors {
            log::debug!(
                "text not representable in {}, encoding run as utf-8",
                self.label
            );
            (encoding_rs::UTF_8, "utf-8")
        } else {
            (self.charset, &self.label)
        }
    }

    /// Slice a run into encoded-words. Chunk boundaries are character
    /// boundaries only; each complete word respects both the input-byte
    /// budget and the column limit (minus the folding TAB).
    fn chunk_run(&self, run: &str, enc: &'static Encoding, label: &str) -> Vec<String> {
        let max_word = self.limit - 1;
        let wrapper = label.len() + 7;
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for c in run.chars() {
            let mut candidate = current.clone();
            candidate.push(c);
            let byte_len = enc.encode(&candidate).0.len();
            let word_len = wrapper + base64_len(byte_len);
            if !current.is_empty() && (byte_len > CHUNK_BYTE_BUDGET || word_len > max_word) {
                chunks.push(current);
                current = c.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
            .into_iter()
            .map(|chunk| {
                let bytes = enc.encode(&chunk).0.into_owned();
                format!("=?{}?B?{}?=", label, base64::encode(&bytes))
            })
            .collect()
    }
}

fn base64_len(n: usize) -> usize {
    4 * ((n + 2) / 3)
}

fn needs_encoding(word: &str) -> bool {
    word.bytes().any(|b| b >= 0x80 || b < 0x09)
}

/// Split a logical value into separator/word items, merging adjacent
/// non-ASCII words (and the whitespace between them) into single runs.
fn segment(value: &str) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    let mut chars = value.char_indices().peekable();
    while let Some(&(start, _)) = chars.peek() {
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                chars.next();
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        let sep = value[start..end].to_string();
        let word_start = end;
        let mut word_end = word_start;
        while let Some(&(i, c)) = chars.peek() {
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                break;
            }
            chars.next();
            word_end = i + c.len_utf8();
        }
        if word_end == word_start {
            break; // trailing whitespace
        }
        let word = &value[word_start..word_end];
        if needs_encoding(word) {
            if let Some(Item {
                kind: Kind::Encoded(run),
                ..
            }) = items.last_mut()
            {
                run.push_str(&sep);
                run.push_str(word);
                continue;
            }
            items.push(Item {
                sep,
                kind: Kind::Encoded(word.to_string()),
            });
        } else {
            items.push(Item {
                sep,
                kind: Kind::Plain(word.to_string()),
            });
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::unquoter;

    fn unfold(wire: &str) -> String {
        wire.replace("\r\n\t", " ").replace("\r\n ", " ")
    }

    fn decode_field(wire: &str) -> String {
        let unfolded = unfold(wire);
        let body = unfolded.splitn(2, ": ").nth(1).unwrap_or("").to_string();
        unquoter::unquote(&body, true).unwrap()
    }

    #[test]
    fn ascii_passes_through() {
        let e = HeaderEncoder::new("utf-8", 76).unwrap();
        assert_eq!(e.encode_field("Subject", "plain text"), "Subject: plain text");
    }

    #[test]
    fn ascii_folds_at_whitespace() {
        let e = HeaderEncoder::new("utf-8", 76).unwrap();
        let value = "word ".repeat(30);
        let wire = e.encode_field("Subject", value.trim_end());
        for line in wire.split("\r\n") {
            assert!(line.len() <= 76, "line too long: {:?}", line);
        }
        assert_eq!(unfold(&wire), format!("Subject: {}", value.trim_end()));
    }

    #[test]
    fn oversized_first_token_is_not_folded_before() {
        let e = HeaderEncoder::new("utf-8", 76).unwrap();
        let token = "x".repeat(100);
        let wire = e.encode_field("Subject", &token);
        assert!(wire.starts_with("Subject: x"));
        assert!(!wire.contains("\r\n"));
    }

    #[test]
    fn non_ascii_becomes_encoded_word() {
        let e = HeaderEncoder::new("utf-8", 76).unwrap();
        let wire = e.encode_field("Subject", "caf\u{E9} time");
        assert!(wire.contains("=?utf-8?B?"), "wire: {}", wire);
        assert_eq!(decode_field(&wire), "caf\u{E9} time");
    }

    #[test]
    fn long_japanese_run_splits_into_folded_words() {
        let e = HeaderEncoder::new("iso-2022-jp", 76).unwrap();
        let run: String = "\u{3042}\u{3044}\u{3046}\u{3048}\u{304A}".repeat(21);
        let value = format!("a cde {}", run);
        let wire = e.encode_field("Subject", &value);

        let word_count = wire.matches("=?iso-2022-jp?B?").count();
        assert!(word_count > 1, "expected multiple encoded words: {}", wire);
        assert!(wire.contains("?=\r\n\t=?iso-2022-jp?B?"));
        for line in wire.split("\r\n") {
            assert!(line.len() <= 76, "line too long: {:?}", line);
        }
        assert_eq!(decode_field(&wire), value);
    }

    #[test]
    fn mixed_ascii_words_inside_run_are_absorbed() {
        let e = HeaderEncoder::new("iso-2022-jp", 76).unwrap();
        let value = "a\u{3042}a a\u{3042}a a\u{3042}a a\u{3042}a a\u{3042}a a\u{3042}a";
        let wire = e.encode_field("Subject", value);
        // every word is tainted, so the whole value is one encoded run and
        // no literal text survives outside the encoded words
        let unfolded = unfold(&wire);
        let body = unfolded.splitn(2, ": ").nth(1).unwrap();
        for piece in body.split_whitespace() {
            assert!(piece.starts_with("=?iso-2022-jp?B?"), "piece: {}", piece);
        }
        for line in wire.split("\r\n") {
            assert!(line.len() <= 76, "line too long: {:?}", line);
        }
        assert_eq!(decode_field(&wire), value);
    }

    #[test]
    fn chunking_never_splits_a_character() {
        let e = HeaderEncoder::new("utf-8", 76).unwrap();
        let value = "\u{1F600}".repeat(60);
        let wire = e.encode_field("Subject", &value);
        assert_eq!(decode_field(&wire), value);
    }

    #[test]
    fn unrepresentable_text_falls_back_to_utf8() {
        let e = HeaderEncoder::new("iso-8859-1", 76).unwrap();
        let value = "\u{30C6}\u{30B9}\u{30C8}";
        let wire = e.encode_field("Subject", value);
        assert!(wire.contains("=?utf-8?B?"), "wire: {}", wire);
        assert_eq!(decode_field(&wire), value);
    }

    #[test]
    fn deterministic_output() {
        let e = HeaderEncoder::new("iso-2022-jp", 76).unwrap();
        let value = "mixed \u{3042}\u{3044} and ascii";
        assert_eq!(
            e.encode_field("Subject", value),
            e.encode_field("Subject", value)
        );
    }
}
