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

//! Header field tokenizer (RFC 822 lexical layer). Two interchangeable
//! implementations of one contract; field parsers never know which one runs.

mod portable;
mod quick;

pub use portable::PortableScanner;
pub use quick::QuickScanner;

use crate::config::ScannerKind;
use crate::error::ParseError;

/// One lexical token of a structured header field. Whitespace outside
/// quoted/comment regions is insignificant and never surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Run of non-special, non-whitespace characters.
    Atom(String),
    /// Double-quoted string with backslash escapes resolved.
    QuotedString(String),
    /// Bracketed domain literal, brackets included in the value.
    DomainLiteral(String),
    /// Parenthesized comment, outer parentheses stripped, nesting kept.
    Comment(String),
    /// One of `( ) < > @ , ; : \ " . [ ]`.
    Special(char),
}

impl Token {
    /// True for tokens that can act as a word in a phrase or local part.
    pub fn is_word(&self) -> bool {
        matches!(self, Token::Atom(_) | Token::QuotedString(_))
    }

    /// Wire-shaped text of the token, used to reconstruct literal spans
    /// (message ids). Insignificant whitespace is already gone.
    pub fn text(&self) -> String {
        match self {
            Token::Atom(s) => s.clone(),
            Token::QuotedString(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
                out
            }
            Token::DomainLiteral(s) => s.clone(),
            Token::Comment(s) => format!("({})", s),
            Token::Special(c) => c.to_string(),
        }
    }
}

/// Scanner contract: a lazy, finite token sequence over one unfolded header
/// field. `Ok(None)` is end of field. Restart by constructing a new scanner
/// over the same text.
pub trait Scan {
    fn next_token(&mut self) -> Result<Option<Token>, ParseError>;
}

/// The special characters of the header grammar.
pub const SPECIALS: &[u8] = b"()<>@,;:\\\".[]";

#[inline]
pub fn is_special(b: u8) -> bool {
    SPECIALS.contains(&b)
}

#[inline]
pub fn is_lwsp(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

pub fn new_scanner(text: &str, strict: bool, kind: ScannerKind) -> Box<dyn Scan + '_> {
    match kind {
        ScannerKind::Portable => Box::new(PortableScanner::new(text, strict)),
        ScannerKind::Quick => Box::new(QuickScanner::new(text, strict)),
    }
}

/// Pull cursor with single-token lookahead. Comments are collected on the
/// side and never surface to the grammar.
pub struct TokenCursor<'a> {
    scanner: Box<dyn Scan + 'a>,
    peeked: Option<Option<Token>>,
    comments: Vec<String>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(text: &'a str, strict: bool, kind: ScannerKind) -> Self {
        TokenCursor {
            scanner: new_scanner(text, strict, kind),
            peeked: None,
            comments: Vec::new(),
        }
    }

    fn pull(&mut self) -> Result<Option<Token>, ParseError> {
        loop {
            match self.scanner.next_token()? {
                Some(Token::Comment(text)) => self.comments.push(text),
                other => return Ok(other),
            }
        }
    }

    pub fn next(&mut self) -> Result<Option<Token>, ParseError> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.pull(),
        }
    }

    pub fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        if self.peeked.is_none() {
            let tok = self.pull()?;
            self.peeked = Some(tok);
        }
        match &self.peeked {
            Some(tok) => Ok(tok.as_ref()),
            None => Ok(None),
        }
    }

    /// Comments seen so far (lookahead included).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn comments_len(&self) -> usize {
        self.comments.len()
    }

    pub fn comments_since(&self, mark: usize) -> &[String] {
        &self.comments[mark.min(self.comments.len())..]
    }

    pub fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments)
    }
}
