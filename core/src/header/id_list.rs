/*
 * id_list.rs
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

//! Id-list fields (Message-Id, In-Reply-To, References): every `<...>` span,
//! content taken literally with no internal validation.

use crate::config::Config;
use crate::error::ParseError;
use crate::scanner::{Token, TokenCursor};

/// Extract each bracketed id. Free text between ids (legal in the obsolete
/// In-Reply-To grammar) is skipped; an empty `<>` is not an id.
pub fn parse(text: &str, config: &Config) -> Result<Vec<String>, ParseError> {
    let mut cursor = TokenCursor::new(text, config.strict_header_parsing, config.scanner);
    let mut out = Vec::new();
    while let Some(token) = cursor.next()? {
        if token != Token::Special('<') {
            continue;
        }
        let mut body = String::new();
        let mut closed = false;
        while let Some(inner) = cursor.next()? {
            if inner == Token::Special('>') {
                closed = true;
                break;
            }
            body.push_str(&inner.text());
        }
        if !closed {
            if config.strict_header_parsing {
                return Err(ParseError::syntax("unterminated message id"));
            }
            log::debug!("unterminated message id, dropping remainder");
            break;
        }
        if body.is_empty() {
            if config.strict_header_parsing {
                return Err(ParseError::syntax("empty message id"));
            }
            continue;
        }
        out.push(body);
    }
    Ok(out)
}

/// Wire rendering: `<id>` tokens joined by single spaces.
pub fn render(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("<{}>", id))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> Config {
        Config::new()
    }

    #[test]
    fn single_id() {
        let ids = parse("<20040315104624.GA12776@example.net>", &lenient()).unwrap();
        assert_eq!(ids, ["20040315104624.GA12776@example.net"]);
    }

    #[test]
    fn multiple_ids_and_noise() {
        let ids = parse(
            "<a@b> your message of Fri <c.d@e.f>",
            &lenient(),
        )
        .unwrap();
        assert_eq!(ids, ["a@b", "c.d@e.f"]);
    }

    #[test]
    fn comments_are_ignored() {
        let ids = parse("<a@b> (added by gateway)", &lenient()).unwrap();
        assert_eq!(ids, ["a@b"]);
    }

    #[test]
    fn empty_brackets_are_skipped() {
        let ids = parse("<> <real@id>", &lenient()).unwrap();
        assert_eq!(ids, ["real@id"]);
    }

    #[test]
    fn strict_rejects_unterminated() {
        assert!(parse("<open@forever", &Config::strict()).is_err());
        assert_eq!(parse("<open@forever", &lenient()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn render_joins_with_spaces() {
        let ids = vec!["a@b".to_string(), "c@d".to_string()];
        assert_eq!(render(&ids), "<a@b> <c@d>");
    }
}
