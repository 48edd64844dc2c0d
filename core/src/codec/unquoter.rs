/*
 * unquoter.rs
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

//! RFC 2047 encoded-word decoding with charset conversion
//! (e.g. `=?iso-2022-jp?B?...?=` embedded in header text).

use encoding_rs::Encoding;

use crate::codec::{base64, quoted_printable};
use crate::error::ParseError;

/// One well-formed encoded-word located in header text.
struct EncodedWord<'a> {
    charset: &'a str,
    encoding: u8,
    payload: &'a str,
    start: usize,
    end: usize,
}

/// Decode every encoded-word in `text` to a UTF-8 string. Adjacent words
/// separated only by folding whitespace and sharing charset and encoding are
/// concatenated before charset conversion, so multi-byte characters split
/// across words reassemble correctly.
pub fn unquote(text: &str, strict: bool) -> Result<String, ParseError> {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(word) = find_encoded_word(text, pos) {
        out.push_str(&text[pos..word.start]);
        let charset = word.charset;
        let encoding = word.encoding;
        let mut payload = decode_payload(&word, strict)?;
        pos = word.end;
        // coalesce the chain of compatible words that follows
        while let Some(next) = next_adjacent_word(text, pos) {
            if !next.charset.eq_ignore_ascii_case(charset) || next.encoding != encoding {
                break;
            }
            payload.extend_from_slice(&decode_payload(&next, strict)?);
            pos = next.end;
        }
        out.push_str(&convert_to_utf8(&payload, charset, strict)?);
    }
    out.push_str(&text[pos..]);
    Ok(out)
}

/// Decode encoded-words and convert the result to the named target charset.
pub fn unquote_and_convert_to(
    text: &str,
    target: &str,
    strict: bool,
) -> Result<Vec<u8>, ParseError> {
    let decoded = unquote(text, strict)?;
    match Encoding::for_label(target.trim().as_bytes()) {
        Some(enc) => {
            let (bytes, _, had_errors) = enc.encode(&decoded);
            if had_errors && strict {
                return Err(ParseError::charset(
                    target,
                    "text not representable in target charset",
                ));
            }
            Ok(bytes.into_owned())
        }
        None if strict => Err(ParseError::charset(target, "unknown target charset")),
        None => {
            log::debug!("unknown target charset {:?}, returning UTF-8", target);
            Ok(decoded.into_bytes())
        }
    }
}

/// Convert raw bytes from a declared charset to a UTF-8 string. The lenient
/// policy falls back to UTF-8 and then ISO-8859-1 when the declared charset
/// is unknown or disagrees with the bytes; strict raises instead.
pub fn convert_to_utf8(
    bytes: &[u8],
    charset: &str,
    strict: bool,
) -> Result<String, ParseError> {
    match Encoding::for_label(charset.trim().as_bytes()) {
        Some(enc) => {
            let (text, _, had_errors) = enc.decode(bytes);
            if !had_errors {
                return Ok(text.into_owned());
            }
            if strict {
                return Err(ParseError::charset(
                    charset,
                    "bytes inconsistent with declared charset",
                ));
            }
            log::debug!("bytes disagree with charset {:?}, trying fallbacks", charset);
            Ok(fallback_to_utf8(bytes))
        }
        None => {
            if strict {
                return Err(ParseError::charset(charset, "unknown charset"));
            }
            log::debug!("unknown charset {:?}, trying fallbacks", charset);
            Ok(fallback_to_utf8(bytes))
        }
    }
}

/// Fixed fallback chain: valid UTF-8 wins, otherwise a Latin-1 view, which
/// cannot fail.
fn fallback_to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
    }
}

fn decode_payload(word: &EncodedWord<'_>, strict: bool) -> Result<Vec<u8>, ParseError> {
    match word.encoding {
        b'b' => base64::decode(word.payload, strict),
        b'q' => {
            let underscored: Vec<u8> = word
                .payload
                .bytes()
                .map(|b| if b == b'_' { b' ' } else { b })
                .collect();
            Ok(quoted_printable::decode(&underscored))
        }
        _ => unreachable!("find_encoded_word only yields B or Q"),
    }
}

/// Locate the next well-formed encoded-word at or after `from`.
fn find_encoded_word(text: &str, from: usize) -> Option<EncodedWord<'_>> {
    let bytes = text.as_bytes();
    let mut search = from;
    while search + 4 <= bytes.len() {
        let start = match find_marker(bytes, search) {
            Some(i) => i,
            None => return None,
        };
        if let Some(word) = parse_encoded_word(text, start) {
            return Some(word);
        }
        search = start + 2;
    }
    None
}

/// An encoded-word immediately following `pos` with nothing but folding
/// whitespace in between. The whitespace is absorbed (decoders reassemble
/// split runs as one).
fn next_adjacent_word(text: &str, pos: usize) -> Option<EncodedWord<'_>> {
    let bytes = text.as_bytes();
    let mut i = pos;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r' | b'\n') {
        i += 1;
    }
    if i == pos {
        return None;
    }
    parse_encoded_word(text, i)
}

fn find_marker(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .windows(2)
        .position(|w| w == b"=?")
        .map(|i| from + i)
}

/// Parse `=?charset?X?payload?=` at exactly `start`.
fn parse_encoded_word(text: &str, start: usize) -> Option<EncodedWord<'_>> {
    let bytes = text.as_bytes();
    if !bytes[start..].starts_with(b"=?") {
        return None;
    }
    let charset_start = start + 2;
    let q1 = find_byte(bytes, charset_start, b'?')?;
    if q1 == charset_start {
        return None;
    }
    let encoding_pos = q1 + 1;
    let encoding = *bytes.get(encoding_pos)?;
    let encoding = encoding.to_ascii_lowercase();
    if encoding != b'b' && encoding != b'q' {
        return None;
    }
    if *bytes.get(encoding_pos + 1)? != b'?' {
        return None;
    }
    let payload_start = encoding_pos + 2;
    let mut i = payload_start;
    while i + 1 < bytes.len() {
        if bytes[i] == b'?' && bytes[i + 1] == b'=' {
            let charset = text.get(charset_start..q1)?;
            let payload = text.get(payload_start..i)?;
            if payload.contains(' ') {
                return None;
            }
            return Some(EncodedWord {
                charset: charset.trim(),
                encoding,
                payload,
                start,
                end: i + 2,
            });
        }
        i += 1;
    }
    None
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_b_and_q() {
        assert_eq!(unquote("=?UTF-8?B?SGVsbG8=?=", true).unwrap(), "Hello");
        assert_eq!(
            unquote("=?UTF-8?Q?Hello_World?=", true).unwrap(),
            "Hello World"
        );
    }

    #[test]
    fn literal_text_is_preserved() {
        assert_eq!(
            unquote("Hello =?UTF-8?B?V29ybGQ=?=!", true).unwrap(),
            "Hello World!"
        );
        assert_eq!(unquote("no encoded words", true).unwrap(), "no encoded words");
        assert_eq!(unquote("broken =?utf-8?X?zzz?=", true).unwrap(), "broken =?utf-8?X?zzz?=");
    }

    #[test]
    fn iso_2022_jp_b_word() {
        // ESC$B %F %9 %H ESC(B : katakana "TESUTO"
        let decoded = unquote("=?iso-2022-jp?B?GyRCJUYlOSVIGyhC?=", true).unwrap();
        assert_eq!(decoded, "\u{30C6}\u{30B9}\u{30C8}");
    }

    #[test]
    fn adjacent_words_coalesce_before_conversion() {
        // One two-byte UTF-8 character split across two encoded-words;
        // conversion must happen after concatenation.
        // "é" = C3 A9
        let text = "=?utf-8?B?ww==?=\r\n\t=?utf-8?B?qQ==?=";
        assert_eq!(unquote(text, true).unwrap(), "\u{E9}");
    }

    #[test]
    fn incompatible_words_do_not_coalesce() {
        let text = "=?utf-8?B?YQ==?= =?iso-8859-1?B?5A==?=";
        assert_eq!(unquote(text, true).unwrap(), "a\u{E4}");
    }

    #[test]
    fn whitespace_between_word_and_text_is_kept() {
        assert_eq!(
            unquote("=?utf-8?B?YQ==?= tail", true).unwrap(),
            "a tail"
        );
    }

    #[test]
    fn mislabeled_charset_falls_back_when_lenient() {
        // UTF-8 bytes labeled iso-2022-jp: ESC-less 8-bit data is invalid
        // there, so the lenient path re-reads them as UTF-8.
        let bytes = "caf\u{E9}".as_bytes();
        assert_eq!(convert_to_utf8(bytes, "iso-2022-jp", false).unwrap(), "caf\u{E9}");
        assert!(convert_to_utf8(bytes, "iso-2022-jp", true).is_err());
    }

    #[test]
    fn unknown_charset_strictness() {
        assert!(convert_to_utf8(b"abc", "x-klingon", true).is_err());
        assert_eq!(convert_to_utf8(b"abc", "x-klingon", false).unwrap(), "abc");
    }

    #[test]
    fn converts_to_target_charset() {
        let bytes = unquote_and_convert_to("=?utf-8?B?Y2Fmw6k=?=", "iso-8859-1", true).unwrap();
        assert_eq!(bytes, b"caf\xE9");
    }
}
