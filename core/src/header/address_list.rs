/*
 * address_list.rs
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

//! Address-list field parser: mailboxes, angle-addr with obsolete routes,
//! and group syntax. Lenient parsing skips a malformed entry to the next
//! top-level comma instead of failing the field.

use crate::address::{Address, AddressGroup, AddressOrGroup};
use crate::config::Config;
use crate::error::ParseError;
use crate::scanner::{Token, TokenCursor};

enum Word {
    Text(String),
    Dot,
}

/// Parse a full address-list. Comments encountered anywhere in the field are
/// returned through `comments_out` (and attached to the entry they follow).
/// An empty or all-separator field parses to an empty list.
pub fn parse(
    text: &str,
    config: &Config,
    comments_out: &mut Vec<String>,
) -> Result<Vec<AddressOrGroup>, ParseError> {
    let strict = config.strict_header_parsing;
    let mut cursor = TokenCursor::new(text, strict, config.scanner);
    let mut out = Vec::new();
    loop {
        while matches!(cursor.peek()?, Some(Token::Special(','))) {
            cursor.next()?;
        }
        if cursor.peek()?.is_none() {
            break;
        }
        let mark = cursor.comments_len();
        match parse_entry(&mut cursor, true) {
            Ok(Some(mut entry)) => {
                if let AddressOrGroup::Mailbox(addr) = &mut entry {
                    for comment in cursor.comments_since(mark) {
                        addr.add_comment(comment.clone());
                    }
                }
                out.push(entry);
            }
            Ok(None) => {
                // nothing consumed; drop one token so the scan advances
                match cursor.peek()? {
                    Some(Token::Special(',')) | None => {}
                    Some(other) => {
                        if strict {
                            return Err(ParseError::syntax(format!(
                                "unexpected {:?} in address list",
                                other.text()
                            )));
                        }
                        let skipped = cursor.next()?;
                        log::debug!("skipping stray token {:?}", skipped);
                    }
                }
            }
            Err(e) => {
                if strict {
                    return Err(e);
                }
                log::debug!("skipping unparsable address entry: {}", e);
                skip_to_comma(&mut cursor)?;
            }
        }
    }
    *comments_out = cursor.take_comments();
    Ok(out)
}

/// One list entry. Group syntax is only allowed at the top level.
fn parse_entry(
    cursor: &mut TokenCursor<'_>,
    allow_group: bool,
) -> Result<Option<AddressOrGroup>, ParseError> {
    let mut words: Vec<Word> = Vec::new();
    loop {
        match cursor.peek()? {
            Some(Token::Atom(_)) | Some(Token::QuotedString(_)) => {
                if let Some(token) = cursor.next()? {
                    let text = match token {
                        Token::Atom(t) | Token::QuotedString(t) => t,
                        _ => unreachable!(),
                    };
                    words.push(Word::Text(text));
                }
            }
            Some(Token::Special('.')) => {
                cursor.next()?;
                words.push(Word::Dot);
            }
            Some(Token::Special('@')) if !words.is_empty() => {
                cursor.next()?;
                let domains = parse_domain(cursor)?;
                return Ok(Some(AddressOrGroup::Mailbox(Address::new(
                    words_to_locals(&words),
                    domains,
                ))));
            }
            Some(Token::Special('<')) => {
                cursor.next()?;
                let mut addr = parse_angle(cursor)?;
                let phrase = words_to_phrase(&words);
                if !phrase.is_empty() {
                    addr.set_phrase(Some(phrase));
                }
                return Ok(Some(AddressOrGroup::Mailbox(addr)));
            }
            Some(Token::Special(':')) if allow_group => {
                cursor.next()?;
                let name = words_to_phrase(&words);
                let members = parse_group_members(cursor)?;
                return Ok(Some(AddressOrGroup::Group(AddressGroup::new(
                    name, members,
                ))));
            }
            _ => break,
        }
    }
    if words.is_empty() {
        return Ok(None);
    }
    // bare words with no @: a local-only mailbox such as "root"
    Ok(Some(AddressOrGroup::Mailbox(Address::new(
        words_to_locals(&words),
        Vec::new(),
    ))))
}

fn parse_group_members(cursor: &mut TokenCursor<'_>) -> Result<Vec<Address>, ParseError> {
    let mut members = Vec::new();
    loop {
        while matches!(cursor.peek()?, Some(Token::Special(','))) {
            cursor.next()?;
        }
        match cursor.peek()? {
            None => break,
            Some(Token::Special(';')) => {
                cursor.next()?;
                break;
            }
            _ => match parse_entry(cursor, false)? {
                Some(AddressOrGroup::Mailbox(addr)) => members.push(addr),
                Some(AddressOrGroup::Group(_)) => unreachable!("groups do not nest"),
                None => {
                    // stray token inside the group; drop it to advance
                    if cursor.next()?.is_none() {
                        break;
                    }
                }
            },
        }
    }
    Ok(members)
}

/// Inside `<...>`: optional source route, then addr-spec or nothing (`<>`).
fn parse_angle(cursor: &mut TokenCursor<'_>) -> Result<Address, ParseError> {
    let mut routes = Vec::new();
    if matches!(cursor.peek()?, Some(Token::Special('@'))) {
        loop {
            cursor.next()?; // '@'
            let domain = parse_domain(cursor)?;
            routes.push(domain.join("."));
            match cursor.next()? {
                Some(Token::Special(',')) => {
                    if !matches!(cursor.peek()?, Some(Token::Special('@'))) {
                        return Err(ParseError::syntax("malformed source route"));
                    }
                }
                Some(Token::Special(':')) => break,
                other => {
                    return Err(ParseError::syntax(format!(
                        "malformed source route near {:?}",
                        other.map(|t| t.text())
                    )))
                }
            }
        }
    }
    if matches!(cursor.peek()?, Some(Token::Special('>'))) {
        cursor.next()?;
        let mut addr = Address::default();
        addr.set_routes(routes);
        return Ok(addr);
    }
    let mut words: Vec<Word> = Vec::new();
    loop {
        match cursor.peek()? {
            Some(Token::Atom(_)) | Some(Token::QuotedString(_)) => {
                if let Some(token) = cursor.next()? {
                    let text = match token {
                        Token::Atom(t) | Token::QuotedString(t) => t,
                        _ => unreachable!(),
                    };
                    words.push(Word::Text(text));
                }
            }
            Some(Token::Special('.')) => {
                cursor.next()?;
                words.push(Word::Dot);
            }
            _ => break,
        }
    }
    let domains = if matches!(cursor.peek()?, Some(Token::Special('@'))) {
        cursor.next()?;
        parse_domain(cursor)?
    } else {
        Vec::new()
    };
    match cursor.next()? {
        Some(Token::Special('>')) => {}
        other => {
            return Err(ParseError::syntax(format!(
                "missing '>' near {:?}",
                other.map(|t| t.text())
            )))
        }
    }
    let mut addr = Address::new(words_to_locals(&words), domains);
    addr.set_routes(routes);
    Ok(addr)
}

/// Dot-separated domain atoms or a bracketed literal.
fn parse_domain(cursor: &mut TokenCursor<'_>) -> Result<Vec<String>, ParseError> {
    let mut out = Vec::new();
    loop {
        match cursor.peek()? {
            Some(Token::Atom(_)) => {
                if let Some(Token::Atom(t)) = cursor.next()? {
                    out.push(t);
                }
            }
            Some(Token::DomainLiteral(_)) => {
                if let Some(Token::DomainLiteral(t)) = cursor.next()? {
                    out.push(t);
                }
            }
            Some(Token::Special('.')) => {
                cursor.next()?;
            }
            _ => break,
        }
    }
    if out.is_empty() {
        return Err(ParseError::syntax("missing domain"));
    }
    Ok(out)
}

fn words_to_locals(words: &[Word]) -> Vec<String> {
    words
        .iter()
        .filter_map(|w| match w {
            Word::Text(t) => Some(t.clone()),
            Word::Dot => None,
        })
        .collect()
}

fn words_to_phrase(words: &[Word]) -> String {
    let mut out = String::new();
    let mut prev_dot = false;
    for w in words {
        match w {
            Word::Dot => {
                out.push('.');
                prev_dot = true;
            }
            Word::Text(t) => {
                if !out.is_empty() && !prev_dot {
                    out.push(' ');
                }
                out.push_str(t);
                prev_dot = false;
            }
        }
    }
    out
}

/// Forward progress guarantee of the lenient policy: drop tokens through the
/// next top-level comma.
fn skip_to_comma(cursor: &mut TokenCursor<'_>) -> Result<(), ParseError> {
    let mut depth = 0usize;
    while let Some(token) = cursor.next()? {
        match token {
            Token::Special('<') => depth += 1,
            Token::Special('>') => depth = depth.saturating_sub(1),
            Token::Special(',') if depth == 0 => break,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> (Vec<AddressOrGroup>, Vec<String>) {
        let mut comments = Vec::new();
        let list = parse(text, &Config::new(), &mut comments).unwrap();
        (list, comments)
    }

    fn single_mailbox(text: &str) -> Address {
        let (list, _) = parse_ok(text);
        assert_eq!(list.len(), 1, "expected one entry for {:?}", text);
        match &list[0] {
            AddressOrGroup::Mailbox(a) => a.clone(),
            other => panic!("expected mailbox, got {:?}", other),
        }
    }

    #[test]
    fn phrase_and_angle_addr() {
        let a = single_mailbox("Minero Aoki <aamine@loveruby.net>");
        assert_eq!(a.phrase(), Some("Minero Aoki"));
        assert_eq!(a.spec(), "aamine@loveruby.net");
        assert_eq!(a.locals(), ["aamine"]);
        assert_eq!(a.domains(), ["loveruby", "net"]);
    }

    #[test]
    fn bare_addr_spec() {
        let a = single_mailbox("hoge@example.jp");
        assert_eq!(a.phrase(), None);
        assert_eq!(a.spec(), "hoge@example.jp");
    }

    #[test]
    fn quoted_phrase() {
        let a = single_mailbox("\"Aoki, Minero\" <aamine@loveruby.net>");
        assert_eq!(a.phrase(), Some("Aoki, Minero"));
        assert_eq!(a.spec(), "aamine@loveruby.net");
    }

    #[test]
    fn dotted_local_part() {
        let a = single_mailbox("first.last@example.com");
        assert_eq!(a.locals(), ["first", "last"]);
        assert_eq!(a.local(), "first.last");
    }

    #[test]
    fn quoted_local_part() {
        let a = single_mailbox("\"john smith\"@example.com");
        assert_eq!(a.locals(), ["john smith"]);
        assert_eq!(a.spec(), "\"john smith\"@example.com");
    }

    #[test]
    fn domain_literal() {
        let a = single_mailbox("root@[192.168.1.1]");
        assert_eq!(a.domains(), ["[192.168.1.1]"]);
        assert_eq!(a.spec(), "root@[192.168.1.1]");
    }

    #[test]
    fn null_return_path() {
        let a = single_mailbox("<>");
        assert!(a.is_empty());
        assert_eq!(a.spec(), "");
    }

    #[test]
    fn local_only_mailbox() {
        let a = single_mailbox("root");
        assert_eq!(a.spec(), "root");
        assert_eq!(a.domains().len(), 0);
    }

    #[test]
    fn source_route() {
        let a = single_mailbox("<@relay1.example,@relay2.example:user@final.example>");
        assert_eq!(a.routes(), ["relay1.example", "relay2.example"]);
        assert_eq!(a.spec(), "user@final.example");
    }

    #[test]
    fn comma_separated_list() {
        let (list, _) = parse_ok("a@b.c, D E <d@e.f>, g@h.i");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn empty_entries_are_dropped() {
        let (list, _) = parse_ok(", a@b.c, , d@e.f,");
        assert_eq!(list.len(), 2);
        let (list, _) = parse_ok("");
        assert!(list.is_empty());
        let (list, _) = parse_ok("   ");
        assert!(list.is_empty());
    }

    #[test]
    fn group_syntax() {
        let (list, _) = parse_ok("team: a@b.c, d@e.f;, solo@x.y");
        assert_eq!(list.len(), 2);
        match &list[0] {
            AddressOrGroup::Group(g) => {
                assert_eq!(g.name(), "team");
                assert_eq!(g.members().len(), 2);
            }
            other => panic!("expected group, got {:?}", other),
        }
        match &list[1] {
            AddressOrGroup::Mailbox(a) => assert_eq!(a.spec(), "solo@x.y"),
            other => panic!("expected mailbox, got {:?}", other),
        }
    }

    #[test]
    fn empty_group() {
        let (list, _) = parse_ok("undisclosed-recipients: ;");
        assert_eq!(list.len(), 1);
        match &list[0] {
            AddressOrGroup::Group(g) => {
                assert_eq!(g.name(), "undisclosed-recipients");
                assert!(g.members().is_empty());
                assert!(list[0].addresses().is_empty());
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn comments_are_collected_and_attached() {
        let (list, comments) = parse_ok("hoge@example.jp (TESUTO)");
        assert_eq!(comments, ["TESUTO"]);
        match &list[0] {
            AddressOrGroup::Mailbox(a) => assert_eq!(a.comments(), ["TESUTO"]),
            other => panic!("expected mailbox, got {:?}", other),
        }
    }

    #[test]
    fn lenient_skips_bad_entry_to_comma() {
        let (list, _) = parse_ok("good@a.b, bad@@, ok@c.d");
        assert_eq!(list.len(), 2);
        match (&list[0], &list[1]) {
            (AddressOrGroup::Mailbox(a), AddressOrGroup::Mailbox(b)) => {
                assert_eq!(a.spec(), "good@a.b");
                assert_eq!(b.spec(), "ok@c.d");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn strict_fails_on_bad_entry() {
        let mut comments = Vec::new();
        assert!(parse("good@a.b, bad@@", &Config::strict(), &mut comments).is_err());
    }

    #[test]
    fn round_trip_formatting() {
        for text in [
            "aamine@loveruby.net",
            "Minero Aoki <aamine@loveruby.net>",
            "root@[192.168.1.1]",
        ] {
            let a = single_mailbox(text);
            let reparsed = single_mailbox(&a.to_string());
            assert_eq!(a.spec(), reparsed.spec());
            assert_eq!(a.phrase(), reparsed.phrase());
        }
    }
}
