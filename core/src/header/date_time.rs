/*
 * date_time.rs
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

//! Date-time field parsing (RFC 822 section 5 plus the obsolete forms that
//! are still common on the wire: two-digit years, named zones).

use chrono::{DateTime, FixedOffset};

/// Parse a date-time header value. Returns None when the text is not a
/// recognizable date; a bad date never aborts the message parse.
pub fn parse(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = strip_comments(value);
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .or_else(|| parse_obsolete(value))
}

/// Obsolete forms: optional day-of-week, 2-digit years, legacy zone names,
/// optional seconds.
fn parse_obsolete(value: &str) -> Option<DateTime<FixedOffset>> {
    let mut tokens: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return None;
    }
    // drop a leading day-of-week ("Fri," or "Fri")
    if tokens[0]
        .trim_end_matches(',')
        .chars()
        .all(|c| c.is_ascii_alphabetic())
        && tokens[0].trim_end_matches(',').len() >= 3
        && tokens.len() > 1
    {
        tokens.remove(0);
    }
    if let Some(last) = tokens.last_mut() {
        if let Some(numeric) = zone_to_offset(last) {
            *last = numeric.to_string();
        }
    }
    let joined = convert_two_digit_year(&tokens.join(" "));
    for format in ["%d %b %Y %H:%M:%S %z", "%d %b %Y %H:%M %z"] {
        if let Ok(dt) = DateTime::parse_from_str(&joined, format) {
            return Some(dt);
        }
    }
    None
}

/// Legacy named zones (RFC 822 section 5.1). Unknown alphabetic zones read
/// as "-0000": no usable offset information.
fn zone_to_offset(zone: &str) -> Option<&'static str> {
    match zone.to_ascii_uppercase().as_str() {
        "GMT" | "UT" | "UTC" => Some("+0000"),
        "EST" => Some("-0500"),
        "EDT" => Some("-0400"),
        "CST" => Some("-0600"),
        "CDT" => Some("-0500"),
        "MST" => Some("-0700"),
        "MDT" => Some("-0600"),
        "PST" => Some("-0800"),
        "PDT" => Some("-0700"),
        z if !z.is_empty() && z.chars().all(|c| c.is_ascii_alphabetic()) => Some("-0000"),
        _ => None,
    }
}

/// 2-digit years follow a month name: 00-49 is 2000-2049, 50-99 is 1950-1999.
fn convert_two_digit_year(s: &str) -> String {
    const MONTHS: &[&str] = &[
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let tokens: Vec<&str> = s.split(' ').collect();
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for (i, tok) in tokens.iter().enumerate() {
        let after_month = i > 0
            && MONTHS
                .iter()
                .any(|m| m.eq_ignore_ascii_case(tokens[i - 1]));
        if after_month && tok.len() == 2 && tok.bytes().all(|b| b.is_ascii_digit()) {
            let yy: u32 = tok.parse().unwrap_or(0);
            let full = if yy <= 49 { 2000 + yy } else { 1900 + yy };
            out.push(full.to_string());
        } else {
            out.push((*tok).to_string());
        }
    }
    out.join(" ")
}

/// Drop RFC 822 comments, honoring nesting and escapes.
fn strip_comments(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && i + 1 < bytes.len() && depth > 0 {
            i += 2;
            continue;
        }
        if b == b'(' {
            depth += 1;
        } else if b == b')' && depth > 0 {
            depth -= 1;
        } else if depth == 0 {
            out.push(b);
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Canonical RFC 2822 rendering.
pub fn render(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc2822() {
        let dt = parse("Fri, 21 Nov 1997 09:55:06 -0600").unwrap();
        assert_eq!(dt.second(), 6);
        assert_eq!(dt.offset().local_minus_utc(), -6 * 3600);
    }

    #[test]
    fn parses_without_day_of_week() {
        assert!(parse("21 Nov 1997 09:55:06 -0600").is_some());
    }

    #[test]
    fn parses_two_digit_year() {
        let dt = parse("21 Nov 97 09:55:06 -0600").unwrap();
        assert_eq!(render(&dt), "Fri, 21 Nov 1997 09:55:06 -0600");
        let dt = parse("1 Feb 04 12:00:00 +0000").unwrap();
        assert!(render(&dt).contains("2004"));
    }

    #[test]
    fn parses_named_zones() {
        let dt = parse("Fri, 21 Nov 1997 09:55:06 CST").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), -6 * 3600);
        let dt = parse("Fri, 21 Nov 1997 09:55:06 GMT").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn parses_without_seconds() {
        let dt = parse("21 Nov 1997 09:55 +0900").unwrap();
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn comments_are_ignored() {
        assert!(parse("Fri, 21 Nov 1997 09:55:06 -0600 (CST)").is_some());
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse("not a date").is_none());
        assert!(parse("").is_none());
    }
}
