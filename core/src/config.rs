/*
 * config.rs
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

//! Per-message configuration and the unique-token generator used for
//! multipart boundaries and message ids.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::codec::encoder::DEFAULT_FOLD_LIMIT;
use crate::port::{MemoryPortFactory, Port, PortFactory};

/// Scanner implementation selector. Both implementations honor the same
/// contract and produce identical token sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerKind {
    /// Straightforward character-walk scanner.
    Portable,
    /// Classification-table scanner.
    Quick,
}

/// Immutable-per-message configuration. A message shares its Config with all
/// recursively parsed child parts.
pub struct Config {
    /// Fail fast on header grammar violations instead of best-effort
    /// recovery (skip bad addresses, absorb unterminated literals).
    pub strict_header_parsing: bool,
    /// Fail on malformed base64 or a charset inconsistent with its bytes
    /// instead of substituting a best-effort result.
    pub strict_transfer_decoding: bool,
    pub scanner: ScannerKind,
    /// Wire charset for RFC 2047 header encoding.
    pub header_charset: String,
    /// Column limit for header folding.
    pub fold_limit: usize,
    body_ports: Box<dyn PortFactory>,
    generator: UniqueTokenGenerator,
}

impl Config {
    pub fn new() -> Self {
        Config {
            strict_header_parsing: false,
            strict_transfer_decoding: false,
            scanner: ScannerKind::Quick,
            header_charset: "utf-8".to_string(),
            fold_limit: DEFAULT_FOLD_LIMIT,
            body_ports: Box::new(MemoryPortFactory),
            generator: UniqueTokenGenerator::new(),
        }
    }

    /// Strict parsing and strict transfer decoding.
    pub fn strict() -> Self {
        Config {
            strict_header_parsing: true,
            strict_transfer_decoding: true,
            ..Config::new()
        }
    }

    /// Install a body storage strategy. Bodies of messages parsed under this
    /// config are written to ports from this factory.
    pub fn set_port_factory(&mut self, factory: Box<dyn PortFactory>) {
        self.body_ports = factory;
    }

    pub fn new_body_port(&self) -> Box<dyn Port> {
        self.body_ports.new_port()
    }

    pub fn generator(&self) -> &UniqueTokenGenerator {
        &self.generator
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("strict_header_parsing", &self.strict_header_parsing)
            .field("strict_transfer_decoding", &self.strict_transfer_decoding)
            .field("scanner", &self.scanner)
            .field("header_charset", &self.header_charset)
            .field("fold_limit", &self.fold_limit)
            .finish()
    }
}

/// Boundary and message-id source: a per-generator random tag plus an atomic
/// sequence counter. Tokens are unique within one generator's lifetime,
/// which is all multipart reassembly requires.
pub struct UniqueTokenGenerator {
    tag: u64,
    sequence: AtomicU64,
}

impl UniqueTokenGenerator {
    pub fn new() -> Self {
        UniqueTokenGenerator {
            tag: rand::random(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_serial(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Fresh multipart boundary, e.g. `mimepart.5f3a....0`. Uses only
    /// RFC 2046 boundary characters.
    pub fn new_boundary(&self) -> String {
        format!("mimepart.{:016x}.{:x}", self.tag, self.next_serial())
    }

    /// Fresh message id literal including the angle brackets.
    pub fn new_message_id(&self, fqdn: &str) -> String {
        let host = if fqdn.is_empty() { "localhost" } else { fqdn };
        format!(
            "<{:016x}.{:x}.lettera@{}>",
            self.tag ^ rand::random::<u64>(),
            self.next_serial(),
            host
        )
    }
}

impl Default for UniqueTokenGenerator {
    fn default() -> Self {
        UniqueTokenGenerator::new()
    }
}
