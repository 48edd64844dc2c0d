/*
 * content_type.rs
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

//! Content-Type and Content-Disposition values (RFC 2045 / RFC 2183):
//! type tokens plus an ordered, case-insensitively named parameter list.

use crate::config::Config;
use crate::error::ParseError;

/// One `name=value` parameter, remembering whether the source quoted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    value: String,
    quoted: bool,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn quoted(&self) -> bool {
        self.quoted
    }
}

/// Insertion-ordered parameter list with case-insensitive names. A duplicate
/// name keeps the first occurrence's position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    params: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        ParameterList { params: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.set_full(name, value, !is_token(value));
    }

    fn set_full(&mut self, name: &str, value: &str, quoted: bool) {
        match self
            .params
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(p) => {
                p.value = value.to_string();
                p.quoted = quoted;
            }
            None => self.params.push(Parameter {
                name: name.to_string(),
                value: value.to_string(),
                quoted,
            }),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
        before != self.params.len()
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    fn render_into(&self, out: &mut String) {
        for p in &self.params {
            out.push_str("; ");
            out.push_str(&p.name);
            out.push('=');
            if p.quoted || !is_token(&p.value) {
                out.push('"');
                for c in p.value.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            } else {
                out.push_str(&p.value);
            }
        }
    }
}

/// Parsed Content-Type: `main/sub` plus parameters. Types are stored
/// lowercase; the original parameter order and quoting survive for
/// re-emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeValue {
    main: String,
    sub: String,
    pub params: ParameterList,
}

impl ContentTypeValue {
    pub fn new(main: &str, sub: &str) -> Result<Self, ParseError> {
        if main.trim().is_empty() || sub.trim().is_empty() {
            return Err(ParseError::argument(format!(
                "sub type missing: {:?}",
                format!("{}/{}", main, sub)
            )));
        }
        Ok(ContentTypeValue {
            main: main.trim().to_ascii_lowercase(),
            sub: sub.trim().to_ascii_lowercase(),
            params: ParameterList::new(),
        })
    }

    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn sub_type(&self) -> &str {
        &self.sub
    }

    /// `main/sub` without parameters.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn set_types(&mut self, main: &str, sub: &str) -> Result<(), ParseError> {
        let fresh = ContentTypeValue::new(main, sub)?;
        self.main = fresh.main;
        self.sub = fresh.sub;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = self.mime_type();
        self.params.render_into(&mut out);
        out
    }
}

/// Parsed Content-Disposition: disposition token plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDispositionValue {
    disposition: String,
    pub params: ParameterList,
}

impl ContentDispositionValue {
    pub fn new(disposition: &str) -> Self {
        ContentDispositionValue {
            disposition: disposition.trim().to_ascii_lowercase(),
            params: ParameterList::new(),
        }
    }

    pub fn disposition(&self) -> &str {
        &self.disposition
    }

    pub fn render(&self) -> String {
        let mut out = self.disposition.clone();
        self.params.render_into(&mut out);
        out
    }
}

/// Parse a Content-Type value. The type tokens are required; parameter
/// parsing tolerates the unquoted junk real producers emit.
pub fn parse_content_type(value: &str, config: &Config) -> Result<ContentTypeValue, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::syntax("empty content-type"));
    }
    let (type_part, params_part) = match value.find(';') {
        Some(i) => (value[..i].trim(), &value[i + 1..]),
        None => (value, ""),
    };
    let (main, sub) = match type_part.find('/') {
        Some(slash) => (type_part[..slash].trim(), type_part[slash + 1..].trim()),
        None => return Err(ParseError::syntax(format!("no sub type in {:?}", type_part))),
    };
    if main.is_empty() || sub.is_empty() {
        return Err(ParseError::syntax(format!("bad mime type {:?}", type_part)));
    }
    if config.strict_header_parsing && (!is_token(main) || !is_token(sub)) {
        return Err(ParseError::syntax(format!("bad mime type {:?}", type_part)));
    }
    let mut ct = ContentTypeValue {
        main: main.to_ascii_lowercase(),
        sub: sub.to_ascii_lowercase(),
        params: ParameterList::new(),
    };
    parse_parameters(params_part, config, &mut ct.params)?;
    Ok(ct)
}

/// Parse a Content-Disposition value.
pub fn parse_content_disposition(
    value: &str,
    config: &Config,
) -> Result<ContentDispositionValue, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::syntax("empty content-disposition"));
    }
    let (token_part, params_part) = match value.find(';') {
        Some(i) => (value[..i].trim(), &value[i + 1..]),
        None => (value, ""),
    };
    if token_part.is_empty() {
        return Err(ParseError::syntax("missing disposition token"));
    }
    let mut cd = ContentDispositionValue::new(token_part);
    parse_parameters(params_part, config, &mut cd.params)?;
    Ok(cd)
}

/// Walk a `;`-separated parameter region. Quoted values are unescaped; bare
/// values run to the next `;` verbatim, even when they contain characters
/// that formally require quoting.
fn parse_parameters(
    text: &str,
    config: &Config,
    params: &mut ParameterList,
) -> Result<(), ParseError> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut pos = 0;
    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let name_start = pos;
        while pos < len && bytes[pos] != b'=' && bytes[pos] != b';' {
            pos += 1;
        }
        if pos >= len || bytes[pos] == b';' {
            let stray = text[name_start..pos].trim();
            if config.strict_header_parsing {
                return Err(ParseError::syntax(format!(
                    "parameter without value: {:?}",
                    stray
                )));
            }
            log::debug!("skipping parameter without value: {:?}", stray);
            continue;
        }
        let name = text[name_start..pos].trim();
        pos += 1; // consume '='
        while pos < len && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
            pos += 1;
        }
        if name.is_empty() || (config.strict_header_parsing && !is_token(name)) {
            if config.strict_header_parsing {
                return Err(ParseError::syntax(format!("bad parameter name {:?}", name)));
            }
            // skip to next parameter
            while pos < len && bytes[pos] != b';' {
                pos += 1;
            }
            continue;
        }
        if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut value = Vec::new();
            let mut closed = false;
            while pos < len {
                let b = bytes[pos];
                if b == b'\\' && pos + 1 < len {
                    value.push(bytes[pos + 1]);
                    pos += 2;
                } else if b == b'"' {
                    pos += 1;
                    closed = true;
                    break;
                } else {
                    value.push(b);
                    pos += 1;
                }
            }
            if !closed && config.strict_header_parsing {
                return Err(ParseError::syntax(format!(
                    "unterminated quoted parameter value for {:?}",
                    name
                )));
            }
            params.set_full(name, &String::from_utf8_lossy(&value), true);
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| pos + i)
                .unwrap_or(len);
            let value = text[pos..end].trim();
            pos = end;
            params.set_full(name, value, false);
        }
    }
    Ok(())
}

/// RFC 2045 token check.
#[inline]
pub fn is_token_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~'
    )
}

pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// RFC 2046 boundary check: 1-70 characters from the boundary set.
#[inline]
pub fn is_boundary_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b' ' |
        b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' |
        b'/' | b':' | b'=' | b'?'
    )
}

pub fn is_valid_boundary(boundary: &str) -> bool {
    let b = boundary.as_bytes();
    (1..=70).contains(&b.len()) && b.iter().copied().all(is_boundary_char) && !b.ends_with(b" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> Config {
        Config::new()
    }

    #[test]
    fn parses_type_and_params() {
        let ct = parse_content_type("text/plain; charset=utf-8", &lenient()).unwrap();
        assert_eq!(ct.main_type(), "text");
        assert_eq!(ct.sub_type(), "plain");
        assert_eq!(ct.params.get("Charset"), Some("utf-8"));
    }

    #[test]
    fn types_are_lowercased() {
        let ct = parse_content_type("Multipart/Mixed; Boundary=\"B1\"", &lenient()).unwrap();
        assert_eq!(ct.main_type(), "multipart");
        assert_eq!(ct.mime_type(), "multipart/mixed");
        assert_eq!(ct.params.get("boundary"), Some("B1"));
    }

    #[test]
    fn quoted_values_unescape_and_re_quote() {
        let ct =
            parse_content_type("application/x-stuff; name=\"a \\\"b\\\".txt\"", &lenient())
                .unwrap();
        assert_eq!(ct.params.get("name"), Some("a \"b\".txt"));
        assert_eq!(
            ct.render(),
            "application/x-stuff; name=\"a \\\"b\\\".txt\""
        );
    }

    #[test]
    fn bare_values_with_junk_are_verbatim() {
        let ct = parse_content_type(
            "multipart/mixed; boundary==_NextPart_000.ABC",
            &lenient(),
        )
        .unwrap();
        assert_eq!(ct.params.get("boundary"), Some("=_NextPart_000.ABC"));
    }

    #[test]
    fn duplicate_parameter_last_wins_first_position() {
        let ct = parse_content_type(
            "text/plain; charset=us-ascii; format=flowed; charset=utf-8",
            &lenient(),
        )
        .unwrap();
        assert_eq!(ct.params.get("charset"), Some("utf-8"));
        let names: Vec<&str> = ct.params.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["charset", "format"]);
    }

    #[test]
    fn missing_sub_type_is_a_syntax_error() {
        assert!(parse_content_type("text", &lenient()).is_err());
        assert!(parse_content_type("text/", &lenient()).is_err());
    }

    #[test]
    fn new_requires_sub_type() {
        assert!(ContentTypeValue::new("text", "").is_err());
        assert!(ContentTypeValue::new("text", "plain").is_ok());
    }

    #[test]
    fn unquoted_render_only_when_token() {
        let mut ct = ContentTypeValue::new("text", "plain").unwrap();
        ct.params.set("charset", "utf-8");
        ct.params.set("name", "two words");
        assert_eq!(
            ct.render(),
            "text/plain; charset=utf-8; name=\"two words\""
        );
    }

    #[test]
    fn disposition_round_trip() {
        let cd = parse_content_disposition(
            "attachment; filename=\"report.pdf\"",
            &lenient(),
        )
        .unwrap();
        assert_eq!(cd.disposition(), "attachment");
        assert_eq!(cd.params.get("filename"), Some("report.pdf"));
        assert_eq!(cd.render(), "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn strict_rejects_stray_parameter() {
        let strict = Config::strict();
        assert!(parse_content_type("text/plain; charset", &strict).is_err());
        assert!(parse_content_type("text/plain; charset", &lenient()).is_ok());
    }

    #[test]
    fn boundary_validation() {
        assert!(is_valid_boundary("B1"));
        assert!(is_valid_boundary("=_NextPart_000.ABC"));
        assert!(!is_valid_boundary(""));
        assert!(!is_valid_boundary(&"x".repeat(71)));
        assert!(!is_valid_boundary("bad[chars]"));
    }
}
