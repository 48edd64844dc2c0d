/*
 * base64.rs
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

//! Base64 transfer encoding (RFC 2045).

use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine};

use crate::error::ParseError;

/// Accepts missing padding and nonzero trailing bits; wire data folded by
/// other producers is rarely canonical.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encode with a line break every `limit` output characters, for use as a
/// message body. The result ends with CRLF.
pub fn folding_encode(data: &[u8], limit: usize) -> String {
    let flat = STANDARD.encode(data);
    let limit = limit.max(4);
    let mut out = String::with_capacity(flat.len() + 2 * (flat.len() / limit + 1));
    let mut rest = flat.as_str();
    while rest.len() > limit {
        let (line, tail) = rest.split_at(limit);
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out.push_str(rest);
    out.push_str("\r\n");
    out
}

/// Decode base64 text. Line folding is always tolerated. Under the strict
/// policy any other malformation is an error; under the lenient policy
/// non-alphabet bytes are dropped first, and input that still does not
/// decode is substituted unchanged.
pub fn decode(text: &str, strict: bool) -> Result<Vec<u8>, ParseError> {
    let mut cleaned: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if strict {
        return FORGIVING
            .decode(&cleaned)
            .map_err(|e| ParseError::syntax(format!("malformed base64: {}", e)));
    }
    cleaned.retain(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
    while cleaned.len() % 4 == 1 {
        cleaned.pop();
    }
    match FORGIVING.decode(&cleaned) {
        Ok(data) => Ok(data),
        Err(e) => {
            log::debug!("base64 decode failed ({}), substituting raw input", e);
            Ok(text.as_bytes().to_vec())
        }
    }
}
