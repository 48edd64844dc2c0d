/*
 * quoted_printable.rs
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

//! Quoted-printable codec (RFC 2045).

const HEX_DECODE: [i8; 256] = {
    let mut t = [-1i8; 256];
    let mut i = 0u8;
    while i < 10 {
        t[(b'0' + i) as usize] = i as i8;
        i += 1;
    }
    let mut i = 0u8;
    while i < 6 {
        t[(b'A' + i) as usize] = (10 + i) as i8;
        t[(b'a' + i) as usize] = (10 + i) as i8;
        i += 1;
    }
    t
};

const HEX_ENCODE: &[u8; 16] = b"0123456789ABCDEF";

/// Decode quoted-printable text: `=XX` escapes, soft line breaks (`=CRLF`,
/// `=LF`, `=CR`), and stray `=` passed through unchanged.
pub fn decode(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut pos = 0;
    while pos < src.len() {
        let b = src[pos];
        if b != b'=' {
            out.push(b);
            pos += 1;
            continue;
        }
        match (src.get(pos + 1).copied(), src.get(pos + 2).copied()) {
            (Some(h1), Some(h2))
                if HEX_DECODE[h1 as usize] >= 0 && HEX_DECODE[h2 as usize] >= 0 =>
            {
                out.push(((HEX_DECODE[h1 as usize] << 4) | HEX_DECODE[h2 as usize]) as u8);
                pos += 3;
            }
            (Some(b'\r'), Some(b'\n')) => pos += 3,
            (Some(b'\r'), _) | (Some(b'\n'), _) => pos += 2,
            _ => {
                out.push(b);
                pos += 1;
            }
        }
    }
    out
}

/// Encode bytes as quoted-printable with soft line breaks at 76 columns.
/// Binary safe: CR and LF are escaped, so `decode(encode(b)) == b` for any
/// input, including data that contains its own line structure.
pub fn encode(src: &[u8]) -> String {
    // one column is reserved for the soft-break '='
    const LIMIT: usize = 75;
    let mut out = String::with_capacity(src.len() + src.len() / 2);
    let mut col = 0;
    for (i, &b) in src.iter().enumerate() {
        let last = i + 1 == src.len();
        let literal = match b {
            b'=' => false,
            b' ' | b'\t' => !last,
            33..=126 => true,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };
        if col + width > LIMIT {
            out.push_str("=\r\n");
            col = 0;
        }
        if literal {
            out.push(b as char);
        } else {
            out.push('=');
            out.push(HEX_ENCODE[(b >> 4) as usize] as char);
            out.push(HEX_ENCODE[(b & 0x0f) as usize] as char);
        }
        col += width;
    }
    out
}
