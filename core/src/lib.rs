/*
 * lib.rs
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

//! Lettera core: parse RFC 822/2822 mail messages into a mutable structure
//! and write them back as wire-correct text, including MIME multipart
//! bodies and RFC 2047 charset-aware header encoding.
//!
//! Input flows bytes -> tokens -> structured header values -> [`Message`];
//! output mirrors it: structured values -> folded text -> bytes. Each
//! message owns its header map, body, parts, and [`Config`], so distinct
//! messages can be processed on independent threads.

pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod message;
pub mod port;
pub mod scanner;

pub use address::{Address, AddressGroup, AddressOrGroup};
pub use config::{Config, ScannerKind, UniqueTokenGenerator};
pub use error::ParseError;
pub use header::{
    ContentDispositionValue, ContentTypeValue, FieldGrammar, FieldValue, HeaderEntry,
    HeaderField, HeaderMap, MimeVersionValue, Parameter, ParameterList,
};
pub use message::Message;
pub use port::{MemoryPortFactory, Port, PortFactory, StringPort};
