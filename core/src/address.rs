/*
 * address.rs
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

//! Address model: one mailbox (phrase, local part, domain, legacy route,
//! comments) or a named group of mailboxes.

use std::fmt;

/// One mailbox address. The local part and domain are kept as ordered atom
/// sequences; a domain atom may be a bracketed literal like `[192.168.1.1]`.
#[derive(Debug, Clone, Default)]
pub struct Address {
    phrase: Option<String>,
    locals: Vec<String>,
    domains: Vec<String>,
    routes: Vec<String>,
    comments: Vec<String>,
}

impl Address {
    pub fn new(locals: Vec<String>, domains: Vec<String>) -> Self {
        Address {
            phrase: None,
            locals,
            domains,
            routes: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Convenience constructor from a `local@domain` spec string.
    pub fn from_spec(spec: &str) -> Self {
        match spec.split_once('@') {
            Some((local, domain)) => Address::new(
                local.split('.').map(str::to_string).collect(),
                domain.split('.').map(str::to_string).collect(),
            ),
            None if spec.is_empty() => Address::default(),
            None => Address::new(
                spec.split('.').map(str::to_string).collect(),
                Vec::new(),
            ),
        }
    }

    pub fn phrase(&self) -> Option<&str> {
        self.phrase.as_deref()
    }

    pub fn set_phrase(&mut self, phrase: Option<String>) {
        self.phrase = phrase;
    }

    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    pub fn set_routes(&mut self, routes: Vec<String>) {
        self.routes = routes;
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, text: String) {
        self.comments.push(text);
    }

    /// Local part joined with dots; atoms that need quoting are quoted.
    pub fn local(&self) -> String {
        self.locals
            .iter()
            .map(|a| quote_atom(a))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Domain joined with dots.
    pub fn domain(&self) -> String {
        self.domains.join(".")
    }

    /// `local@domain`, the identity of the address. Empty for the null
    /// return path `<>`.
    pub fn spec(&self) -> String {
        let local = self.local();
        let domain = self.domain();
        if domain.is_empty() {
            local
        } else {
            format!("{}@{}", local, domain)
        }
    }

    /// True for the null address `<>`.
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.domains.is_empty()
    }
}

/// Equality is identity of the addressed mailbox: local part (exact) and
/// domain (case-insensitive). Phrase, route, and comments do not count.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.locals == other.locals
            && self.domains.len() == other.domains.len()
            && self
                .domains
                .iter()
                .zip(other.domains.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.spec();
        if let Some(phrase) = self.phrase.as_deref() {
            if !phrase.is_empty() {
                write!(f, "{} ", quote_phrase(phrase))?;
                return self.write_angle(f, &spec);
            }
        }
        if !self.routes.is_empty() || spec.is_empty() {
            self.write_angle(f, &spec)
        } else {
            f.write_str(&spec)
        }
    }
}

impl Address {
    fn write_angle(&self, f: &mut fmt::Formatter<'_>, spec: &str) -> fmt::Result {
        f.write_str("<")?;
        if !self.routes.is_empty() {
            let route = self
                .routes
                .iter()
                .map(|d| format!("@{}", d))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{}:", route)?;
        }
        write!(f, "{}>", spec)
    }
}

/// A named group of mailboxes, e.g. `undisclosed-recipients: ;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressGroup {
    name: String,
    members: Vec<Address>,
}

impl AddressGroup {
    pub fn new(name: String, members: Vec<Address>) -> Self {
        AddressGroup { name, members }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Address] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut Vec<Address> {
        &mut self.members
    }
}

impl fmt::Display for AddressGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self
            .members
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}: {};", self.name, members)
    }
}

/// One entry of an address-list field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOrGroup {
    Mailbox(Address),
    Group(AddressGroup),
}

impl AddressOrGroup {
    /// The mailboxes this entry contributes (group members flattened).
    pub fn addresses(&self) -> Vec<&Address> {
        match self {
            AddressOrGroup::Mailbox(a) => vec![a],
            AddressOrGroup::Group(g) => g.members().iter().collect(),
        }
    }
}

impl fmt::Display for AddressOrGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressOrGroup::Mailbox(a) => a.fmt(f),
            AddressOrGroup::Group(g) => g.fmt(f),
        }
    }
}

/// Quote a local-part atom when it contains characters outside the dot-atom
/// set.
fn quote_atom(atom: &str) -> String {
    if !atom.is_empty() && atom.bytes().all(is_atom_char) {
        atom.to_string()
    } else {
        quote_string(atom)
    }
}

/// Quote a display phrase when it contains more than atoms and spaces.
/// Non-ASCII phrases are left bare for the header encoder to turn into
/// encoded-words.
pub(crate) fn quote_phrase(phrase: &str) -> String {
    let plain = phrase
        .split(' ')
        .all(|w| w.is_empty() || w.bytes().all(is_atom_char));
    let ascii = phrase.bytes().all(|b| b < 0x80);
    if plain || !ascii {
        phrase.to_string()
    } else {
        quote_string(phrase)
    }
}

fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn is_atom_char(b: u8) -> bool {
    matches!(b,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' |
        b'/' | b'=' | b'?' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~'
    ) || b >= 0x80
}
