/*
 * mime_version.rs
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

//! MIME-Version field (RFC 2045 section 4): two dot-separated integers.

use std::fmt;

use crate::config::Config;
use crate::error::ParseError;
use crate::scanner::{Token, TokenCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeVersionValue {
    pub major: u32,
    pub minor: u32,
}

impl MimeVersionValue {
    pub fn new(major: u32, minor: u32) -> Self {
        MimeVersionValue { major, minor }
    }
}

impl fmt::Display for MimeVersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parse `major "." minor`; comments anywhere are tolerated.
pub fn parse(text: &str, config: &Config) -> Result<MimeVersionValue, ParseError> {
    let mut cursor = TokenCursor::new(text, config.strict_header_parsing, config.scanner);
    let major = expect_number(&mut cursor)?;
    match cursor.next()? {
        Some(Token::Special('.')) => {}
        _ => return Err(ParseError::syntax("expected '.' in mime version")),
    }
    let minor = expect_number(&mut cursor)?;
    Ok(MimeVersionValue::new(major, minor))
}

fn expect_number(cursor: &mut TokenCursor<'_>) -> Result<u32, ParseError> {
    match cursor.next()? {
        Some(Token::Atom(text)) if text.bytes().all(|b| b.is_ascii_digit()) && !text.is_empty() => {
            text.parse()
                .map_err(|_| ParseError::syntax(format!("version number out of range: {}", text)))
        }
        other => Err(ParseError::syntax(format!(
            "expected version number, got {:?}",
            other
        ))),
    }
}
