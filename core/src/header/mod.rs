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

//! Header fields: one grammar family per field name, parsed values, and the
//! case-insensitive, insertion-ordered header map.

mod address_list;
mod content_type;
mod date_time;
mod id_list;
mod mime_version;

pub use content_type::{
    is_token, is_valid_boundary, ContentDispositionValue, ContentTypeValue, Parameter,
    ParameterList,
};
pub use mime_version::MimeVersionValue;

use chrono::{DateTime, FixedOffset};

use crate::address::{Address, AddressOrGroup};
use crate::codec::unquoter;
use crate::config::Config;
use crate::error::ParseError;

/// Closed set of field grammar families. Unknown field names fall back to
/// Unstructured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGrammar {
    AddressList,
    DateTime,
    ContentType,
    ContentDisposition,
    IdList,
    MimeVersion,
    Unstructured,
}

/// Static name-to-grammar table.
pub fn grammar_for(name: &str) -> FieldGrammar {
    match name.to_ascii_lowercase().as_str() {
        "from" | "sender" | "reply-to" | "to" | "cc" | "bcc" | "return-path"
        | "resent-from" | "resent-sender" | "resent-to" | "resent-cc" | "resent-bcc"
        | "resent-reply-to" | "errors-to" | "delivered-to" | "envelope-to"
        | "x-original-to" | "apparently-to" => FieldGrammar::AddressList,
        "date" | "resent-date" => FieldGrammar::DateTime,
        "content-type" => FieldGrammar::ContentType,
        "content-disposition" => FieldGrammar::ContentDisposition,
        "message-id" | "resent-message-id" | "in-reply-to" | "references" | "content-id" => {
            FieldGrammar::IdList
        }
        "mime-version" => FieldGrammar::MimeVersion,
        _ => FieldGrammar::Unstructured,
    }
}

/// Fields that may occur more than once; everything else is single-instance
/// and the last occurrence wins.
pub fn allows_multiple(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "received"
            | "resent-date"
            | "resent-from"
            | "resent-sender"
            | "resent-to"
            | "resent-cc"
            | "resent-bcc"
            | "resent-message-id"
            | "comments"
            | "keywords"
    )
}

/// Canonical output order of well-known fields; anything else follows in
/// insertion order.
pub const FIELD_ORDER: &[&str] = &[
    "return-path",
    "received",
    "resent-date",
    "resent-from",
    "resent-sender",
    "resent-to",
    "resent-cc",
    "resent-bcc",
    "resent-message-id",
    "date",
    "from",
    "sender",
    "reply-to",
    "to",
    "cc",
    "bcc",
    "message-id",
    "in-reply-to",
    "references",
    "subject",
    "comments",
    "keywords",
    "mime-version",
    "content-type",
    "content-transfer-encoding",
    "content-disposition",
    "content-description",
];

/// Canonical capitalization for a known field name ("content-type" becomes
/// "Content-Type").
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Parsed value of a header field, shaped by its grammar family.
#[derive(Debug, Clone)]
pub enum FieldValue {
    AddressList(Vec<AddressOrGroup>),
    DateTime(DateTime<FixedOffset>),
    ContentType(ContentTypeValue),
    ContentDisposition(ContentDispositionValue),
    IdList(Vec<String>),
    MimeVersion(MimeVersionValue),
    Unstructured(String),
}

/// One header field: original name, raw source text, and the parsed value.
/// A `None` value means the source text failed its grammar and the field is
/// treated as absent (lenient mode only).
#[derive(Debug, Clone)]
pub struct HeaderField {
    name: String,
    raw: String,
    value: Option<FieldValue>,
    comments: Vec<String>,
}

impl HeaderField {
    /// Parse a field from its unfolded source text. In lenient mode a value
    /// that fails its grammar is downgraded to absent; strict mode fails,
    /// naming the field.
    pub fn parse(name: &str, raw: &str, config: &Config) -> Result<HeaderField, ParseError> {
        let mut comments = Vec::new();
        match Self::parse_value(name, raw, config, &mut comments) {
            Ok(value) => Ok(HeaderField {
                name: name.to_string(),
                raw: raw.to_string(),
                value,
                comments,
            }),
            Err(e) if !config.strict_header_parsing && e.recoverable() => {
                log::debug!("dropping value of field {:?}: {}", name, e);
                Ok(HeaderField {
                    name: name.to_string(),
                    raw: raw.to_string(),
                    value: None,
                    comments,
                })
            }
            Err(e) => Err(e.in_field(name)),
        }
    }

    fn parse_value(
        name: &str,
        raw: &str,
        config: &Config,
        comments: &mut Vec<String>,
    ) -> Result<Option<FieldValue>, ParseError> {
        Ok(match grammar_for(name) {
            FieldGrammar::AddressList => Some(FieldValue::AddressList(address_list::parse(
                raw, config, comments,
            )?)),
            FieldGrammar::DateTime => date_time::parse(raw).map(FieldValue::DateTime),
            FieldGrammar::ContentType => Some(FieldValue::ContentType(
                content_type::parse_content_type(raw, config)?,
            )),
            FieldGrammar::ContentDisposition => Some(FieldValue::ContentDisposition(
                content_type::parse_content_disposition(raw, config)?,
            )),
            FieldGrammar::IdList => Some(FieldValue::IdList(id_list::parse(raw, config)?)),
            FieldGrammar::MimeVersion => Some(FieldValue::MimeVersion(mime_version::parse(
                raw, config,
            )?)),
            FieldGrammar::Unstructured => {
                Some(FieldValue::Unstructured(raw.trim().to_string()))
            }
        })
    }

    /// Build a field directly from a structured value.
    pub fn from_value(name: &str, value: FieldValue) -> HeaderField {
        HeaderField {
            name: name.to_string(),
            raw: String::new(),
            value: Some(value),
            comments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut FieldValue> {
        self.value.as_mut()
    }

    /// Comments extracted from the field (address fields collect them for
    /// the phrase fallback).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Address entries, or empty for other grammars.
    pub fn entries(&self) -> &[AddressOrGroup] {
        match &self.value {
            Some(FieldValue::AddressList(entries)) => entries,
            _ => &[],
        }
    }

    /// All mailboxes in the field, group members flattened.
    pub fn addrs(&self) -> Vec<&Address> {
        self.entries()
            .iter()
            .flat_map(|e| e.addresses())
            .collect()
    }

    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        match &self.value {
            Some(FieldValue::DateTime(dt)) => Some(*dt),
            _ => None,
        }
    }

    pub fn content_type(&self) -> Option<&ContentTypeValue> {
        match &self.value {
            Some(FieldValue::ContentType(ct)) => Some(ct),
            _ => None,
        }
    }

    pub fn content_type_mut(&mut self) -> Option<&mut ContentTypeValue> {
        match &mut self.value {
            Some(FieldValue::ContentType(ct)) => Some(ct),
            _ => None,
        }
    }

    pub fn disposition_value(&self) -> Option<&ContentDispositionValue> {
        match &self.value {
            Some(FieldValue::ContentDisposition(cd)) => Some(cd),
            _ => None,
        }
    }

    pub fn ids(&self) -> &[String] {
        match &self.value {
            Some(FieldValue::IdList(ids)) => ids,
            _ => &[],
        }
    }

    pub fn mime_version(&self) -> Option<MimeVersionValue> {
        match &self.value {
            Some(FieldValue::MimeVersion(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn unstructured(&self) -> Option<&str> {
        match &self.value {
            Some(FieldValue::Unstructured(s)) => Some(s),
            _ => None,
        }
    }

    /// Decoded (RFC 2047) text of an unstructured field.
    pub fn decoded(&self, strict: bool) -> Result<String, ParseError> {
        let text = self.unstructured().unwrap_or(self.raw.trim());
        unquoter::unquote(text, strict)
    }

    /// Canonical value text for wire emission, before folding. A field whose
    /// value was dropped re-emits its raw source text.
    pub fn encoded_body(&self) -> String {
        match &self.value {
            Some(FieldValue::AddressList(entries)) => {
                if entries.is_empty() {
                    self.raw.trim().to_string()
                } else {
                    entries
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            }
            Some(FieldValue::DateTime(dt)) => date_time::render(dt),
            Some(FieldValue::ContentType(ct)) => ct.render(),
            Some(FieldValue::ContentDisposition(cd)) => cd.render(),
            Some(FieldValue::IdList(ids)) => id_list::render(ids),
            Some(FieldValue::MimeVersion(v)) => v.to_string(),
            Some(FieldValue::Unstructured(s)) => s.clone(),
            None => self.raw.trim().to_string(),
        }
    }
}

/// Storage shape of one header name: exactly one field, or an ordered list
/// for the multi-instance names.
#[derive(Debug, Clone)]
pub enum HeaderEntry {
    Single(HeaderField),
    Multiple(Vec<HeaderField>),
}

impl HeaderEntry {
    pub fn fields(&self) -> Vec<&HeaderField> {
        match self {
            HeaderEntry::Single(f) => vec![f],
            HeaderEntry::Multiple(fs) => fs.iter().collect(),
        }
    }

    pub fn first(&self) -> Option<&HeaderField> {
        match self {
            HeaderEntry::Single(f) => Some(f),
            HeaderEntry::Multiple(fs) => fs.first(),
        }
    }
}

/// Case-insensitively keyed header map preserving insertion order and the
/// original spelling of each field name.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, HeaderEntry)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap {
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let lower = name.to_ascii_lowercase();
        self.entries.iter().position(|(k, _)| *k == lower)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// First field stored under the name.
    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.position(name)
            .and_then(|i| self.entries[i].1.first())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut HeaderField> {
        let i = self.position(name)?;
        match &mut self.entries[i].1 {
            HeaderEntry::Single(f) => Some(f),
            HeaderEntry::Multiple(fs) => fs.first_mut(),
        }
    }

    /// Every field stored under the name, in order.
    pub fn all(&self, name: &str) -> Vec<&HeaderField> {
        match self.position(name) {
            Some(i) => self.entries[i].1.fields(),
            None => Vec::new(),
        }
    }

    /// Store one field. Multi-instance names accumulate; anything else is
    /// replaced in place.
    pub fn add(&mut self, field: HeaderField) {
        let lower = field.name().to_ascii_lowercase();
        if allows_multiple(&lower) {
            match self.position(&lower) {
                Some(i) => {
                    let entry = &mut self.entries[i].1;
                    if let HeaderEntry::Multiple(fs) = entry {
                        fs.push(field);
                    } else {
                        let old = std::mem::replace(entry, HeaderEntry::Multiple(Vec::new()));
                        let mut fields = old.fields().into_iter().cloned().collect::<Vec<_>>();
                        fields.push(field);
                        *entry = HeaderEntry::Multiple(fields);
                    }
                }
                None => self
                    .entries
                    .push((lower, HeaderEntry::Multiple(vec![field]))),
            }
        } else {
            match self.position(&lower) {
                Some(i) => self.entries[i].1 = HeaderEntry::Single(field),
                None => self.entries.push((lower, HeaderEntry::Single(field))),
            }
        }
    }

    /// Replace a name with an explicit list of fields. Only valid for the
    /// multi-instance names; anything else is an API misuse.
    pub fn set_multiple(
        &mut self,
        name: &str,
        fields: Vec<HeaderField>,
    ) -> Result<(), ParseError> {
        if !allows_multiple(name) {
            return Err(ParseError::argument(format!(
                "multiple {}: header fields are not allowed",
                name
            )));
        }
        let lower = name.to_ascii_lowercase();
        match self.position(&lower) {
            Some(i) => self.entries[i].1 = HeaderEntry::Multiple(fields),
            None => self.entries.push((lower, HeaderEntry::Multiple(fields))),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored fields (multi-instance names count each instance).
    pub fn field_count(&self) -> usize {
        self.entries.iter().map(|(_, e)| e.fields().len()).sum()
    }

    /// Flattened fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderField)> {
        self.entries.iter().flat_map(|(name, entry)| {
            entry
                .fields()
                .into_iter()
                .map(move |f| (name.as_str(), f))
        })
    }

    /// Fields in canonical wire order: well-known names first, the rest in
    /// insertion order. The returned name is the one to write: canonical
    /// capitalization for known names, original spelling for the rest.
    pub fn ordered(&self) -> Vec<(String, &HeaderField)> {
        let mut out = Vec::with_capacity(self.field_count());
        let mut emitted = vec![false; self.entries.len()];
        for known in FIELD_ORDER {
            for (i, (name, entry)) in self.entries.iter().enumerate() {
                if !emitted[i] && name == known {
                    emitted[i] = true;
                    for f in entry.fields() {
                        out.push((canonical_name(name), f));
                    }
                }
            }
        }
        for (i, (_, entry)) in self.entries.iter().enumerate() {
            if !emitted[i] {
                for f in entry.fields() {
                    out.push((f.name().to_string(), f));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> Config {
        Config::new()
    }

    #[test]
    fn grammar_table() {
        assert_eq!(grammar_for("From"), FieldGrammar::AddressList);
        assert_eq!(grammar_for("DATE"), FieldGrammar::DateTime);
        assert_eq!(grammar_for("content-type"), FieldGrammar::ContentType);
        assert_eq!(grammar_for("References"), FieldGrammar::IdList);
        assert_eq!(grammar_for("Mime-Version"), FieldGrammar::MimeVersion);
        assert_eq!(grammar_for("X-Mailer"), FieldGrammar::Unstructured);
        assert_eq!(grammar_for("Subject"), FieldGrammar::Unstructured);
    }

    #[test]
    fn multiple_table() {
        assert!(allows_multiple("Received"));
        assert!(allows_multiple("resent-to"));
        assert!(!allows_multiple("To"));
        assert!(!allows_multiple("Subject"));
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("return-path"), "Return-Path");
        assert_eq!(canonical_name("date"), "Date");
    }

    #[test]
    fn parse_address_field() {
        let f = HeaderField::parse("To", "Minero Aoki <aamine@loveruby.net>", &lenient())
            .unwrap();
        let addrs = f.addrs();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].spec(), "aamine@loveruby.net");
        assert_eq!(
            f.encoded_body(),
            "Minero Aoki <aamine@loveruby.net>"
        );
    }

    #[test]
    fn bad_value_degrades_to_absent_when_lenient() {
        let f = HeaderField::parse("Content-Type", "not a mime type", &lenient()).unwrap();
        assert!(f.value().is_none());
        assert_eq!(f.encoded_body(), "not a mime type");
    }

    #[test]
    fn bad_value_fails_when_strict() {
        let err =
            HeaderField::parse("Content-Type", "not a mime type", &Config::strict()).unwrap_err();
        assert!(err.to_string().contains("Content-Type"));
    }

    #[test]
    fn bad_date_is_recoverable_even_when_strict() {
        let f = HeaderField::parse("Date", "yesterday-ish", &Config::strict()).unwrap();
        assert!(f.value().is_none());
        assert!(f.date().is_none());
    }

    #[test]
    fn unstructured_decodes_encoded_words() {
        let f = HeaderField::parse("Subject", "=?utf-8?B?SGVsbG8=?= world", &lenient()).unwrap();
        assert_eq!(f.decoded(false).unwrap(), "Hello world");
    }

    #[test]
    fn map_is_case_insensitive_and_ordered() {
        let mut map = HeaderMap::new();
        map.add(HeaderField::parse("Subject", "one", &lenient()).unwrap());
        map.add(HeaderField::parse("X-Custom", "keep", &lenient()).unwrap());
        assert!(map.contains("sUbJeCt"));
        assert_eq!(map.get("SUBJECT").unwrap().unstructured(), Some("one"));

        // single-instance replacement keeps position
        map.add(HeaderField::parse("Subject", "two", &lenient()).unwrap());
        let names: Vec<&str> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["subject", "x-custom"]);
        assert_eq!(map.get("subject").unwrap().unstructured(), Some("two"));
    }

    #[test]
    fn multi_instance_accumulates() {
        let mut map = HeaderMap::new();
        map.add(HeaderField::parse("Received", "from a by b", &lenient()).unwrap());
        map.add(HeaderField::parse("Received", "from c by d", &lenient()).unwrap());
        assert_eq!(map.all("received").len(), 2);
        assert_eq!(map.field_count(), 2);
    }

    #[test]
    fn set_multiple_rejects_single_instance_names() {
        let mut map = HeaderMap::new();
        let fields = vec![HeaderField::parse("To", "a@b.c", &lenient()).unwrap()];
        let err = map.set_multiple("To", fields).unwrap_err();
        assert!(matches!(err, ParseError::Argument(_)));
        assert!(map
            .set_multiple(
                "Comments",
                vec![HeaderField::parse("Comments", "x", &lenient()).unwrap()]
            )
            .is_ok());
    }

    #[test]
    fn ordered_puts_known_fields_first() {
        let mut map = HeaderMap::new();
        map.add(HeaderField::parse("X-Mailer", "lettera", &lenient()).unwrap());
        map.add(HeaderField::parse("Subject", "hi", &lenient()).unwrap());
        map.add(HeaderField::parse("From", "a@b.c", &lenient()).unwrap());
        let names: Vec<String> = map.ordered().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["From", "Subject", "X-Mailer"]);
    }

    #[test]
    fn unknown_names_keep_their_spelling() {
        let mut map = HeaderMap::new();
        map.add(HeaderField::parse("X-SPAM-Score", "5", &lenient()).unwrap());
        let ordered = map.ordered();
        assert_eq!(ordered[0].0, "X-SPAM-Score");
    }
}
