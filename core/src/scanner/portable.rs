/*
 * portable.rs
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

//! Portable reference scanner: straightforward byte walk, no tables.

use super::{is_lwsp, is_special, Scan, Token};
use crate::error::ParseError;

pub struct PortableScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    strict: bool,
}

impl<'a> PortableScanner<'a> {
    pub fn new(text: &'a str, strict: bool) -> Self {
        PortableScanner {
            bytes: text.as_bytes(),
            pos: 0,
            strict,
        }
    }

    /// Lenient recovery: the rest of the field from `start` becomes one
    /// atom-like remainder token.
    fn remainder(&mut self, start: usize) -> Token {
        let text = String::from_utf8_lossy(&self.bytes[start..]).into_owned();
        self.pos = self.bytes.len();
        Token::Atom(text)
    }

    fn quoted_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = Vec::new();
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\\' && self.pos + 1 < self.bytes.len() {
                value.push(self.bytes[self.pos + 1]);
                self.pos += 2;
            } else if b == b'"' {
                self.pos += 1;
                return Ok(Token::QuotedString(
                    String::from_utf8_lossy(&value).into_owned(),
                ));
            } else {
                value.push(b);
                self.pos += 1;
            }
        }
        if self.strict {
            Err(ParseError::syntax("unterminated quoted string"))
        } else {
            log::debug!("unterminated quoted string, absorbing remainder");
            Ok(self.remainder(start))
        }
    }

    fn domain_literal(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = Vec::new();
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\\' && self.pos + 1 < self.bytes.len() {
                value.push(self.bytes[self.pos + 1]);
                self.pos += 2;
            } else if b == b']' {
                self.pos += 1;
                let mut text = String::with_capacity(value.len() + 2);
                text.push('[');
                text.push_str(&String::from_utf8_lossy(&value));
                text.push(']');
                return Ok(Token::DomainLiteral(text));
            } else {
                value.push(b);
                self.pos += 1;
            }
        }
        if self.strict {
            Err(ParseError::syntax("unterminated domain literal"))
        } else {
            log::debug!("unterminated domain literal, absorbing remainder");
            Ok(self.remainder(start))
        }
    }

    fn comment(&mut self) -> Result<Token, ParseError> {
        self.pos += 1;
        let mut value = Vec::new();
        let mut depth = 1usize;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\\' && self.pos + 1 < self.bytes.len() {
                value.push(self.bytes[self.pos + 1]);
                self.pos += 2;
            } else if b == b'(' {
                depth += 1;
                value.push(b);
                self.pos += 1;
            } else if b == b')' {
                depth -= 1;
                self.pos += 1;
                if depth == 0 {
                    return Ok(Token::Comment(
                        String::from_utf8_lossy(&value).into_owned(),
                    ));
                }
                value.push(b);
            } else {
                value.push(b);
                self.pos += 1;
            }
        }
        if self.strict {
            Err(ParseError::syntax("unterminated comment"))
        } else {
            log::debug!("unterminated comment, absorbing to end of field");
            Ok(Token::Comment(String::from_utf8_lossy(&value).into_owned()))
        }
    }

    fn atom(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if is_lwsp(b) || is_special(b) {
                break;
            }
            self.pos += 1;
        }
        Token::Atom(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }
}

impl Scan for PortableScanner<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        while self.pos < self.bytes.len() && is_lwsp(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let b = self.bytes[self.pos];
        let token = match b {
            b'"' => self.quoted_string()?,
            b'[' => self.domain_literal()?,
            b'(' => self.comment()?,
            _ if is_special(b) => {
                self.pos += 1;
                Token::Special(b as char)
            }
            _ => self.atom(),
        };
        Ok(Some(token))
    }
}
