/*
 * mod.rs
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

//! Codec primitives: transfer encodings, RFC 2047 encoded-words, and the
//! charset-aware header encoder.

pub mod base64;
pub mod encoder;
pub mod quoted_printable;
pub mod unquoter;

pub use encoder::HeaderEncoder;

use crate::error::ParseError;

/// Reverse a Content-Transfer-Encoding over body bytes. Identity encodings
/// (7bit, 8bit, binary) and unknown tokens pass through unchanged.
pub fn decode_transfer(body: &[u8], encoding: &str, strict: bool) -> Result<Vec<u8>, ParseError> {
    let encoding = encoding.trim();
    if encoding.eq_ignore_ascii_case("base64") {
        base64::decode(&String::from_utf8_lossy(body), strict)
    } else if encoding.eq_ignore_ascii_case("quoted-printable") {
        Ok(quoted_printable::decode(body))
    } else {
        if !encoding.is_empty()
            && !["7bit", "8bit", "binary"]
                .iter()
                .any(|e| encoding.eq_ignore_ascii_case(e))
        {
            log::debug!("unknown transfer encoding {:?}, passing through", encoding);
        }
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_encodings_pass_through() {
        assert_eq!(decode_transfer(b"abc", "7bit", true).unwrap(), b"abc");
        assert_eq!(decode_transfer(b"abc", "", true).unwrap(), b"abc");
        assert_eq!(decode_transfer(b"abc", "x-unknown", false).unwrap(), b"abc");
    }

    #[test]
    fn dispatches_base64_and_qp() {
        assert_eq!(
            decode_transfer(b"aGVsbG8=", "Base64", true).unwrap(),
            b"hello"
        );
        assert_eq!(
            decode_transfer(b"hi=21", "Quoted-Printable", true).unwrap(),
            b"hi!"
        );
    }
}
