/*
 * message.rs
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

//! The message aggregate: header block, body, and multipart structure.
//! Headers parse eagerly at construction; the body (and any parts) parse
//! lazily on first access, unless the source port is not reproducible.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::address::{Address, AddressOrGroup};
use crate::codec::{self, base64, HeaderEncoder};
use crate::config::Config;
use crate::error::ParseError;
use crate::header::{
    is_valid_boundary, ContentTypeValue, FieldValue, HeaderField, HeaderMap, MimeVersionValue,
};
use crate::port::{Port, StringPort};

pub struct Message {
    config: Arc<Config>,
    port: Box<dyn Port>,
    header: HeaderMap,
    body_parsed: bool,
    body_port: Box<dyn Port>,
    preamble: String,
    epilogue: String,
    parts: Vec<Message>,
}

impl Message {
    /// Empty message with its own configuration.
    pub fn new(config: Config) -> Message {
        Message::with_config(Arc::new(config))
    }

    /// Empty message sharing an existing configuration.
    pub fn with_config(config: Arc<Config>) -> Message {
        let body_port = config.new_body_port();
        Message {
            config,
            port: Box::new(StringPort::new()),
            header: HeaderMap::new(),
            body_parsed: true,
            body_port,
            preamble: String::new(),
            epilogue: String::new(),
            parts: Vec::new(),
        }
    }

    /// Parse a message from text with the default configuration.
    pub fn parse(text: &str) -> Result<Message, ParseError> {
        Message::parse_with_config(text, Config::new())
    }

    pub fn parse_with_config(text: &str, config: Config) -> Result<Message, ParseError> {
        Message::from_port(Box::new(StringPort::from_str(text)), Arc::new(config))
    }

    /// Parse a message from a byte port. The header is read now; the body is
    /// deferred unless the port cannot be read twice.
    pub fn from_port(port: Box<dyn Port>, config: Arc<Config>) -> Result<Message, ParseError> {
        let body_port = config.new_body_port();
        let mut msg = Message {
            config,
            port,
            header: HeaderMap::new(),
            body_parsed: false,
            body_port,
            preamble: String::new(),
            epilogue: String::new(),
            parts: Vec::new(),
        };
        let data = msg.port.read_all()?;
        let (header, body_offset, unix_from) = parse_header_block(&data, &msg.config)?;
        msg.header = header;
        if let Some(addr) = unix_from {
            if !msg.header.contains("return-path") {
                let field =
                    HeaderField::parse("Return-Path", &format!("<{}>", addr), &msg.config)?;
                msg.header.add(field);
            }
        }
        if !msg.port.reproducible() {
            let body = data[body_offset..].to_vec();
            msg.parse_body_bytes(&body)?;
        }
        Ok(msg)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn port(&self) -> &dyn Port {
        self.port.as_ref()
    }

    ///
    /// Direct header access
    ///

    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut HeaderMap {
        &mut self.header
    }

    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.header.get(name)
    }

    /// Parse and store a field from text. Multi-instance names accumulate.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let field = HeaderField::parse(name, value, &self.config)?;
        self.header.add(field);
        Ok(())
    }

    /// Replace a multi-instance field with several values at once. Fails
    /// with an argument error for single-instance names.
    pub fn set_all(&mut self, name: &str, values: &[&str]) -> Result<(), ParseError> {
        let mut fields = Vec::with_capacity(values.len());
        for value in values {
            fields.push(HeaderField::parse(name, value, &self.config)?);
        }
        self.header.set_multiple(name, fields)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.header.remove(name)
    }

    /// Canonical value text of a field, if present.
    pub fn header_string(&self, name: &str) -> Option<String> {
        self.header.get(name).map(|f| f.encoded_body())
    }

    ///
    /// Header facade
    ///

    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.header.get("date").and_then(|f| f.date())
    }

    pub fn set_date(&mut self, date: Option<DateTime<FixedOffset>>) {
        match date {
            Some(d) => self
                .header
                .add(HeaderField::from_value("Date", FieldValue::DateTime(d))),
            None => {
                self.header.remove("date");
            }
        }
    }

    fn addr_field(&self, name: &str) -> Vec<&Address> {
        self.header.get(name).map(|f| f.addrs()).unwrap_or_default()
    }

    fn addr_specs(&self, name: &str) -> Vec<String> {
        self.addr_field(name).iter().map(|a| a.spec()).collect()
    }

    fn set_addr_field(&mut self, name: &str, addrs: Vec<Address>) {
        if addrs.is_empty() {
            self.header.remove(name);
        } else {
            let entries = addrs.into_iter().map(AddressOrGroup::Mailbox).collect();
            self.header
                .add(HeaderField::from_value(name, FieldValue::AddressList(entries)));
        }
    }

    pub fn from_addrs(&self) -> Vec<&Address> {
        self.addr_field("from")
    }

    pub fn to_addrs(&self) -> Vec<&Address> {
        self.addr_field("to")
    }

    pub fn cc_addrs(&self) -> Vec<&Address> {
        self.addr_field("cc")
    }

    pub fn bcc_addrs(&self) -> Vec<&Address> {
        self.addr_field("bcc")
    }

    pub fn reply_to_addrs(&self) -> Vec<&Address> {
        self.addr_field("reply-to")
    }

    pub fn set_from_addrs(&mut self, addrs: Vec<Address>) {
        self.set_addr_field("From", addrs);
    }

    pub fn set_to_addrs(&mut self, addrs: Vec<Address>) {
        self.set_addr_field("To", addrs);
    }

    pub fn set_cc_addrs(&mut self, addrs: Vec<Address>) {
        self.set_addr_field("Cc", addrs);
    }

    pub fn set_bcc_addrs(&mut self, addrs: Vec<Address>) {
        self.set_addr_field("Bcc", addrs);
    }

    pub fn set_reply_to_addrs(&mut self, addrs: Vec<Address>) {
        self.set_addr_field("Reply-To", addrs);
    }

    /// Spec strings of the From field; empty means field absent.
    pub fn from(&self) -> Vec<String> {
        self.addr_specs("from")
    }

    pub fn to(&self) -> Vec<String> {
        self.addr_specs("to")
    }

    pub fn cc(&self) -> Vec<String> {
        self.addr_specs("cc")
    }

    pub fn bcc(&self) -> Vec<String> {
        self.addr_specs("bcc")
    }

    pub fn reply_to(&self) -> Vec<String> {
        self.addr_specs("reply-to")
    }

    pub fn sender(&self) -> Option<String> {
        self.addr_field("sender").first().map(|a| a.spec())
    }

    /// Human-readable name of the first From address: its display phrase,
    /// else the field's comments, else the bare spec. None when the field
    /// has no address at all.
    pub fn friendly_from(&self) -> Option<String> {
        let field = self.header.get("from")?;
        let addrs = field.addrs();
        let first = addrs.first()?;
        if let Some(phrase) = first.phrase() {
            if !phrase.is_empty() {
                return Some(phrase.to_string());
            }
        }
        if !field.comments().is_empty() {
            return Some(field.comments().join(" "));
        }
        Some(first.spec())
    }

    pub fn from_address(&self) -> Option<String> {
        self.from_addrs().first().map(|a| a.spec())
    }

    /// Every recipient spec: To, Cc, and Bcc combined.
    pub fn destinations(&self) -> Vec<String> {
        let mut out = self.to();
        out.extend(self.cc());
        out.extend(self.bcc());
        out
    }

    /// Where a reply should go: Reply-To, else From.
    pub fn reply_addresses(&self) -> Vec<Address> {
        let reply_to: Vec<Address> =
            self.reply_to_addrs().into_iter().cloned().collect();
        if !reply_to.is_empty() {
            return reply_to;
        }
        self.from_addrs().into_iter().cloned().collect()
    }

    /// Where delivery errors should go: Sender, else From.
    pub fn error_reply_addresses(&self) -> Vec<Address> {
        let senders: Vec<Address> = self
            .addr_field("sender")
            .into_iter()
            .cloned()
            .collect();
        if !senders.is_empty() {
            return senders;
        }
        self.from_addrs().into_iter().cloned().collect()
    }

    /// Raw subject text (encoded-words untouched).
    pub fn subject(&self) -> Option<String> {
        self.header
            .get("subject")
            .and_then(|f| f.unstructured())
            .map(str::to_string)
    }

    /// Subject with RFC 2047 encoded-words decoded.
    pub fn decoded_subject(&self) -> Result<Option<String>, ParseError> {
        match self.header.get("subject") {
            Some(f) => f.decoded(self.config.strict_transfer_decoding).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_subject(&mut self, subject: &str) {
        self.header.add(HeaderField::from_value(
            "Subject",
            FieldValue::Unstructured(subject.to_string()),
        ));
    }

    /// First Message-Id literal (without the angle brackets).
    pub fn message_id(&self) -> Option<&str> {
        self.header
            .get("message-id")
            .and_then(|f| f.ids().first())
            .map(String::as_str)
    }

    pub fn set_message_id(&mut self, id: &str) {
        let inner = id.trim().trim_start_matches('<').trim_end_matches('>');
        self.header.add(HeaderField::from_value(
            "Message-Id",
            FieldValue::IdList(vec![inner.to_string()]),
        ));
    }

    pub fn in_reply_to(&self) -> Vec<String> {
        self.header
            .get("in-reply-to")
            .map(|f| f.ids().to_vec())
            .unwrap_or_default()
    }

    pub fn set_in_reply_to(&mut self, ids: &[String]) {
        if ids.is_empty() {
            self.header.remove("in-reply-to");
        } else {
            self.header.add(HeaderField::from_value(
                "In-Reply-To",
                FieldValue::IdList(ids.to_vec()),
            ));
        }
    }

    pub fn references(&self) -> Vec<String> {
        self.header
            .get("references")
            .map(|f| f.ids().to_vec())
            .unwrap_or_default()
    }

    pub fn set_references(&mut self, ids: &[String]) {
        if ids.is_empty() {
            self.header.remove("references");
        } else {
            self.header.add(HeaderField::from_value(
                "References",
                FieldValue::IdList(ids.to_vec()),
            ));
        }
    }

    pub fn mime_version(&self) -> Option<(u32, u32)> {
        self.header
            .get("mime-version")
            .and_then(|f| f.mime_version())
            .map(|v| (v.major, v.minor))
    }

    pub fn set_mime_version(&mut self, major: u32, minor: u32) {
        self.header.add(HeaderField::from_value(
            "Mime-Version",
            FieldValue::MimeVersion(MimeVersionValue::new(major, minor)),
        ));
    }

    fn content_type_value(&self) -> Option<&ContentTypeValue> {
        self.header.get("content-type").and_then(|f| f.content_type())
    }

    pub fn main_type(&self) -> Option<String> {
        self.content_type_value().map(|ct| ct.main_type().to_string())
    }

    pub fn sub_type(&self) -> Option<String> {
        self.content_type_value().map(|ct| ct.sub_type().to_string())
    }

    /// `main/sub` of the Content-Type field.
    pub fn content_type(&self) -> Option<String> {
        self.content_type_value().map(|ct| ct.mime_type())
    }

    /// Set the media type. `main` may be a full `main/sub` when `sub` is
    /// None; a missing sub-type is an argument error. Existing parameters
    /// are discarded.
    pub fn set_content_type(&mut self, main: &str, sub: Option<&str>) -> Result<(), ParseError> {
        let (main, sub) = match sub {
            Some(s) => (main, s),
            None => main
                .split_once('/')
                .ok_or_else(|| ParseError::argument(format!("sub type missing: {:?}", main)))?,
        };
        let value = ContentTypeValue::new(main, sub)?;
        if let Some(ct) = self
            .header
            .get_mut("content-type")
            .and_then(|f| f.content_type_mut())
        {
            let (main, sub) = (value.main_type().to_string(), value.sub_type().to_string());
            ct.set_types(&main, &sub)?;
            ct.params.clear();
        } else {
            self.header.add(HeaderField::from_value(
                "Content-Type",
                FieldValue::ContentType(value),
            ));
        }
        Ok(())
    }

    pub fn type_param(&self, name: &str) -> Option<String> {
        self.content_type_value()
            .and_then(|ct| ct.params.get(name))
            .map(str::to_string)
    }

    pub fn charset(&self) -> Option<String> {
        self.type_param("charset")
    }

    pub fn set_charset(&mut self, charset: &str) -> Result<(), ParseError> {
        if let Some(ct) = self
            .header
            .get_mut("content-type")
            .and_then(|f| f.content_type_mut())
        {
            ct.params.set("charset", charset);
            return Ok(());
        }
        self.set_content_type("text", Some("plain"))?;
        if let Some(ct) = self
            .header
            .get_mut("content-type")
            .and_then(|f| f.content_type_mut())
        {
            ct.params.set("charset", charset);
        }
        Ok(())
    }

    /// Content-Transfer-Encoding token, lowercased.
    pub fn transfer_encoding(&self) -> Option<String> {
        self.header
            .get("content-transfer-encoding")
            .and_then(|f| f.unstructured())
            .and_then(|s| s.split_whitespace().next())
            .map(|s| s.to_ascii_lowercase())
    }

    pub fn set_transfer_encoding(&mut self, encoding: &str) {
        self.header.add(HeaderField::from_value(
            "Content-Transfer-Encoding",
            FieldValue::Unstructured(encoding.to_string()),
        ));
    }

    pub fn disposition(&self) -> Option<String> {
        self.header
            .get("content-disposition")
            .and_then(|f| f.disposition_value())
            .map(|cd| cd.disposition().to_string())
    }

    pub fn disposition_param(&self, name: &str) -> Option<String> {
        self.header
            .get("content-disposition")
            .and_then(|f| f.disposition_value())
            .and_then(|cd| cd.params.get(name))
            .map(str::to_string)
    }

    /// Replace the Content-Disposition field; None removes it.
    pub fn set_disposition(
        &mut self,
        disposition: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<(), ParseError> {
        let token = match disposition {
            Some(d) if !d.trim().is_empty() => d,
            Some(_) => return Err(ParseError::argument("empty disposition token")),
            None => {
                self.header.remove("content-disposition");
                return Ok(());
            }
        };
        let mut value = crate::header::ContentDispositionValue::new(token);
        for (name, v) in params {
            value.params.set(name, v);
        }
        self.header.add(HeaderField::from_value(
            "Content-Disposition",
            FieldValue::ContentDisposition(value),
        ));
        Ok(())
    }

    /// Declared Content-Type main-type is "multipart".
    pub fn is_multipart(&self) -> bool {
        self.main_type().as_deref() == Some("multipart")
    }

    ///
    /// High level utilities
    ///

    /// Skeleton reply: Re: subject, recipients from Reply-To/From, threading
    /// fields chained onto this message's ids.
    pub fn create_reply(&self) -> Message {
        let mut reply = Message::with_config(self.config.clone());
        let base = self.subject().unwrap_or_default();
        reply.set_subject(&format!("Re: {}", strip_reply_prefixes(&base)));
        let to = self.reply_addresses();
        if !to.is_empty() {
            reply.set_to_addrs(to);
        }
        if let Some(id) = self.message_id().map(str::to_string) {
            reply.set_in_reply_to(std::slice::from_ref(&id));
            let mut refs = self.references();
            refs.push(id);
            reply.set_references(&refs);
        }
        reply.set_mime_version(1, 0);
        reply
    }

    /// Base64-encode the body in place and mark the transfer encoding.
    pub fn base64_encode_body(&mut self) -> Result<(), ParseError> {
        let body = self.body_bytes()?;
        let encoded = base64::folding_encode(&body, 60);
        self.set_transfer_encoding("base64");
        self.body_port.write_all_bytes(encoded.as_bytes())?;
        Ok(())
    }

    /// Decode a base64 body in place (honoring the strict decode policy) and
    /// mark it 8bit. Does nothing unless the transfer encoding says base64.
    pub fn base64_decode_body(&mut self) -> Result<(), ParseError> {
        match self.transfer_encoding() {
            Some(enc) if enc.contains("base64") => {}
            _ => return Ok(()),
        }
        let body = self.body()?;
        let decoded = base64::decode(&body, self.config.strict_transfer_decoding)?;
        self.set_transfer_encoding("8bit");
        self.body_port.write_all_bytes(&decoded)?;
        Ok(())
    }

    ///
    /// Message body
    ///

    fn ensure_body(&mut self) -> Result<(), ParseError> {
        if self.body_parsed {
            return Ok(());
        }
        let data = self.port.read_all()?;
        let offset = skip_header(&data);
        let body = data[offset..].to_vec();
        self.parse_body_bytes(&body)
    }

    fn parse_body_bytes(&mut self, body: &[u8]) -> Result<(), ParseError> {
        match self.multipart_boundary() {
            Some(boundary) => self.split_multipart(body, &boundary)?,
            None => self.body_port.write_all_bytes(body)?,
        }
        self.body_parsed = true;
        Ok(())
    }

    /// The boundary to split on: declared multipart with a usable boundary
    /// parameter. A multipart claim without one degrades to a single body.
    fn multipart_boundary(&self) -> Option<String> {
        if !self.is_multipart() {
            return None;
        }
        match self.type_param("boundary") {
            Some(b) if is_valid_boundary(&b) => Some(b),
            Some(b) => {
                log::debug!("ignoring unusable boundary {:?}", b);
                None
            }
            None => {
                log::debug!("multipart content-type without boundary, treating as single part");
                None
            }
        }
    }

    fn split_multipart(&mut self, body: &[u8], boundary: &str) -> Result<(), ParseError> {
        let mut preamble: Vec<u8> = Vec::new();
        let mut part_sources: Vec<Vec<u8>> = Vec::new();
        let mut epilogue: Vec<u8> = Vec::new();
        let mut state = SplitState::Preamble;
        let mut pos = 0;
        while let Some((line, next)) = next_line(body, pos) {
            let raw = &body[pos..next];
            if state != SplitState::Epilogue && is_closing_delimiter(line, boundary) {
                state = SplitState::Epilogue;
            } else if state != SplitState::Epilogue && is_delimiter(line, boundary) {
                part_sources.push(Vec::new());
                state = SplitState::InPart;
            } else {
                match state {
                    SplitState::Preamble => preamble.extend_from_slice(raw),
                    SplitState::InPart => {
                        if let Some(last) = part_sources.last_mut() {
                            last.extend_from_slice(raw);
                        }
                    }
                    SplitState::Epilogue => epilogue.extend_from_slice(raw),
                }
            }
            pos = next;
        }
        self.preamble = String::from_utf8_lossy(&preamble).into_owned();
        self.epilogue = String::from_utf8_lossy(&epilogue).into_owned();
        self.parts.clear();
        for source in part_sources {
            let mut part_port = self.config.new_body_port();
            part_port.write_all_bytes(&source)?;
            self.parts
                .push(Message::from_port(part_port, self.config.clone())?);
        }
        self.body_port.write_all_bytes(b"")?;
        Ok(())
    }

    /// Single-part payload as text. For a multipart message this is empty;
    /// see preamble/parts/epilogue.
    pub fn body(&mut self) -> Result<String, ParseError> {
        let bytes = self.body_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn body_bytes(&mut self) -> Result<Vec<u8>, ParseError> {
        self.ensure_body()?;
        Ok(self.body_port.read_all()?)
    }

    /// Body with its Content-Transfer-Encoding reversed.
    pub fn transfer_decoded_body(&mut self) -> Result<Vec<u8>, ParseError> {
        let encoding = self.transfer_encoding().unwrap_or_default();
        let strict = self.config.strict_transfer_decoding;
        let body = self.body_bytes()?;
        codec::decode_transfer(&body, &encoding, strict)
    }

    /// Replace the body. Any previously materialized parts of this message
    /// are dropped (children already handed out are unaffected).
    pub fn set_body(&mut self, body: &str) -> Result<(), ParseError> {
        self.set_body_bytes(body.as_bytes())
    }

    pub fn set_body_bytes(&mut self, body: &[u8]) -> Result<(), ParseError> {
        self.ensure_body()?;
        self.body_port.write_all_bytes(body)?;
        if !self.parts.is_empty() {
            log::debug!("body replaced, dropping {} materialized parts", self.parts.len());
            self.parts.clear();
        }
        Ok(())
    }

    pub fn preamble(&mut self) -> Result<&str, ParseError> {
        self.ensure_body()?;
        Ok(&self.preamble)
    }

    pub fn set_preamble(&mut self, text: &str) -> Result<(), ParseError> {
        self.ensure_body()?;
        self.preamble = text.to_string();
        Ok(())
    }

    pub fn epilogue(&mut self) -> Result<&str, ParseError> {
        self.ensure_body()?;
        Ok(&self.epilogue)
    }

    pub fn set_epilogue(&mut self, text: &str) -> Result<(), ParseError> {
        self.ensure_body()?;
        self.epilogue = text.to_string();
        Ok(())
    }

    pub fn parts(&mut self) -> Result<&[Message], ParseError> {
        self.ensure_body()?;
        Ok(&self.parts)
    }

    pub fn parts_mut(&mut self) -> Result<&mut Vec<Message>, ParseError> {
        self.ensure_body()?;
        Ok(&mut self.parts)
    }

    /// Attach a child part. The part must have been detached from any other
    /// message first; parts have exactly one owner.
    pub fn add_part(&mut self, part: Message) -> Result<(), ParseError> {
        self.ensure_body()?;
        self.parts.push(part);
        Ok(())
    }

    /// Detach and return the part at `index`, releasing ownership.
    pub fn detach_part(&mut self, index: usize) -> Result<Option<Message>, ParseError> {
        self.ensure_body()?;
        if index < self.parts.len() {
            Ok(Some(self.parts.remove(index)))
        } else {
            Ok(None)
        }
    }

    ///
    /// Wire output
    ///

    /// Render the whole message as wire text (CRLF line endings, folded
    /// headers, multipart structure re-assembled). A message with parts gets
    /// a boundary generated and injected when none is set; a message with an
    /// empty part list renders as a plain single-part message.
    pub fn encoded(&mut self) -> Result<String, ParseError> {
        self.ensure_body()?;
        if !self.parts.is_empty() {
            self.ensure_boundary()?;
        }
        let encoder = HeaderEncoder::new(&self.config.header_charset, self.config.fold_limit)?;
        let mut out = String::new();
        for (name, field) in self.header.ordered() {
            out.push_str(&encoder.encode_field(&name, &field.encoded_body()));
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        if self.parts.is_empty() {
            let body = self.body_port.read_all()?;
            out.push_str(&String::from_utf8_lossy(&body));
        } else {
            let boundary = self
                .type_param("boundary")
                .ok_or_else(|| ParseError::argument("multipart message without boundary"))?;
            out.push_str(&self.preamble);
            let epilogue = self.epilogue.clone();
            for part in &mut self.parts {
                out.push_str("\r\n--");
                out.push_str(&boundary);
                out.push_str("\r\n");
                out.push_str(&part.encoded()?);
            }
            out.push_str("\r\n--");
            out.push_str(&boundary);
            out.push_str("--\r\n");
            out.push_str(&epilogue);
        }
        Ok(out)
    }

    /// Render and write back to the source port.
    pub fn write_back(&mut self) -> Result<(), ParseError> {
        let text = self.encoded()?;
        self.port.write_all_bytes(text.as_bytes())?;
        Ok(())
    }

    /// Guarantee a boundary parameter before rendering parts. Uniqueness is
    /// only needed within this message tree, which the generator provides.
    fn ensure_boundary(&mut self) -> Result<(), ParseError> {
        if self.type_param("boundary").is_some() {
            return Ok(());
        }
        let boundary = self.config.generator().new_boundary();
        if let Some(ct) = self
            .header
            .get_mut("content-type")
            .and_then(|f| f.content_type_mut())
        {
            ct.params.set("boundary", &boundary);
            return Ok(());
        }
        let mut ct = ContentTypeValue::new("multipart", "mixed")?;
        ct.params.set("boundary", &boundary);
        self.header.add(HeaderField::from_value(
            "Content-Type",
            FieldValue::ContentType(ct),
        ));
        Ok(())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("fields", &self.header.field_count())
            .field("body_parsed", &self.body_parsed)
            .field("parts", &self.parts.len())
            .finish()
    }
}

#[derive(PartialEq, Clone, Copy)]
enum SplitState {
    Preamble,
    InPart,
    Epilogue,
}

/// Split one wire line at LF, CRLF, or bare CR. Returns the line without its
/// terminator plus the offset just past it.
fn next_line(data: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    if pos >= data.len() {
        return None;
    }
    let mut i = pos;
    while i < data.len() {
        match data[i] {
            b'\n' => return Some((&data[pos..i], i + 1)),
            b'\r' => {
                let next = if data.get(i + 1) == Some(&b'\n') {
                    i + 2
                } else {
                    i + 1
                };
                return Some((&data[pos..i], next));
            }
            _ => i += 1,
        }
    }
    Some((&data[pos..], data.len()))
}

/// Header terminator: an empty line, or one of only dashes and whitespace
/// (not starting with whitespace, which would be a continuation).
fn is_header_terminator(line: &[u8]) -> bool {
    if line.is_empty() {
        return true;
    }
    if line[0] == b' ' || line[0] == b'\t' {
        return false;
    }
    line.iter()
        .all(|&b| b == b'-' || b == b' ' || b == b'\t')
}

/// `name ":" value` where the name has no whitespace.
fn split_field_line(line: &[u8]) -> Option<(String, String)> {
    let colon = line.iter().position(|&b| b == b':')?;
    if colon == 0 {
        return None;
    }
    let name = &line[..colon];
    if name.iter().any(|&b| b == b' ' || b == b'\t') {
        return None;
    }
    let value = &line[colon + 1..];
    let value = String::from_utf8_lossy(value);
    Some((
        String::from_utf8_lossy(name).into_owned(),
        value.trim_start().to_string(),
    ))
}

fn parse_header_block(
    data: &[u8],
    config: &Config,
) -> Result<(HeaderMap, usize, Option<String>), ParseError> {
    let mut map = HeaderMap::new();
    let mut current: Option<(String, String)> = None;
    let mut unix_from: Option<String> = None;
    let mut pos = 0;

    let flush = |map: &mut HeaderMap,
                 current: &mut Option<(String, String)>|
     -> Result<(), ParseError> {
        if let Some((name, value)) = current.take() {
            let field = HeaderField::parse(&name, value.trim(), config)?;
            map.add(field);
        }
        Ok(())
    };

    while let Some((line, next)) = next_line(data, pos) {
        if !line.is_empty() && (line[0] == b' ' || line[0] == b'\t') {
            match current.as_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(String::from_utf8_lossy(line).trim());
                }
                None => {
                    return Err(ParseError::syntax("header begins with whitespace"));
                }
            }
        } else if let Some((name, value)) = split_field_line(line) {
            flush(&mut map, &mut current)?;
            current = Some((name, value));
        } else if is_header_terminator(line) {
            flush(&mut map, &mut current)?;
            return Ok((map, next, unix_from));
        } else if line.starts_with(b"From ") {
            let addr = String::from_utf8_lossy(&line[5..]);
            let addr = addr.split_whitespace().next().unwrap_or("").to_string();
            if !addr.is_empty() {
                unix_from = Some(addr);
            }
        } else {
            return Err(ParseError::syntax(format!(
                "malformed header line: {:?}",
                String::from_utf8_lossy(line)
            )));
        }
        pos = next;
    }
    flush(&mut map, &mut current)?;
    Ok((map, data.len(), unix_from))
}

/// Offset of the first body byte (just past the header terminator).
fn skip_header(data: &[u8]) -> usize {
    let mut pos = 0;
    while let Some((line, next)) = next_line(data, pos) {
        if is_header_terminator(line) {
            return next;
        }
        pos = next;
    }
    data.len()
}

fn trim_trailing_ws(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b' ' || line[end - 1] == b'\t') {
        end -= 1;
    }
    &line[..end]
}

fn is_delimiter(line: &[u8], boundary: &str) -> bool {
    let t = trim_trailing_ws(line);
    t.len() == boundary.len() + 2 && t.starts_with(b"--") && &t[2..] == boundary.as_bytes()
}

fn is_closing_delimiter(line: &[u8], boundary: &str) -> bool {
    let t = trim_trailing_ws(line);
    t.len() == boundary.len() + 4
        && t.starts_with(b"--")
        && t.ends_with(b"--")
        && &t[2..t.len() - 2] == boundary.as_bytes()
}

/// Strip an optional leading `[list-tag]` and any pile of `Re:` markers.
fn strip_reply_prefixes(subject: &str) -> String {
    let mut rest = subject.trim_start();
    if rest.starts_with('[') {
        if let Some(end) = rest.find(']') {
            rest = rest[end + 1..].trim_start();
        }
    }
    while rest
        .get(..3)
        .map_or(false, |p| p.eq_ignore_ascii_case("re:"))
    {
        rest = rest[3..].trim_start();
    }
    rest.to_string()
}
