/*
 * port.rs
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

//! Byte ports: the source/sink abstraction the message aggregate reads from
//! and writes to. Mailbox backends supply their own implementations; the
//! in-memory StringPort ships with the core.

use std::io::{self, Read, Write};

/// A readable/writable byte container. Readers and writers are scoped
/// borrows, so release is guaranteed on every exit path.
pub trait Port: Send {
    /// True if reading the port twice yields identical bytes. When false,
    /// the message aggregate caches the body on first read.
    fn reproducible(&self) -> bool {
        false
    }

    /// Current content size in bytes.
    fn size(&self) -> io::Result<u64>;

    /// Sequential reader over the current content.
    fn open_read(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Fresh write stream. Prior content is discarded; the stream commits
    /// as it is written and closes when dropped.
    fn open_write(&mut self) -> io::Result<Box<dyn Write + '_>>;

    fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.open_read()?.read_to_end(&mut out)?;
        Ok(out)
    }

    fn write_all_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        let mut w = self.open_write()?;
        w.write_all(data)?;
        w.flush()
    }
}

/// Produces ports for body storage. The default factory keeps bodies in
/// memory; backends that spill large bodies to external storage provide
/// their own.
pub trait PortFactory: Send + Sync {
    fn new_port(&self) -> Box<dyn Port>;
}

/// In-memory port backed by a byte buffer.
#[derive(Debug, Default)]
pub struct StringPort {
    buffer: Vec<u8>,
}

impl StringPort {
    pub fn new() -> Self {
        StringPort { buffer: Vec::new() }
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        StringPort {
            buffer: data.into(),
        }
    }

    pub fn from_str(text: &str) -> Self {
        StringPort {
            buffer: text.as_bytes().to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl Port for StringPort {
    fn reproducible(&self) -> bool {
        true
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.buffer.len() as u64)
    }

    fn open_read(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(&self.buffer[..]))
    }

    fn open_write(&mut self) -> io::Result<Box<dyn Write + '_>> {
        self.buffer.clear();
        Ok(Box::new(&mut self.buffer))
    }
}

/// Default body storage: in-memory string ports.
#[derive(Debug, Default)]
pub struct MemoryPortFactory;

impl PortFactory for MemoryPortFactory {
    fn new_port(&self) -> Box<dyn Port> {
        Box::new(StringPort::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_port_read_write() {
        let mut port = StringPort::from_str("hello");
        assert_eq!(port.size().unwrap(), 5);
        assert!(port.reproducible());
        assert_eq!(port.read_all().unwrap(), b"hello");
        // reading twice yields the same bytes
        assert_eq!(port.read_all().unwrap(), b"hello");

        port.write_all_bytes(b"replaced").unwrap();
        assert_eq!(port.read_all().unwrap(), b"replaced");
    }

    #[test]
    fn write_replaces_prior_content() {
        let mut port = StringPort::from_str("a long initial body");
        {
            let mut w = port.open_write().unwrap();
            w.write_all(b"x").unwrap();
        }
        assert_eq!(port.read_all().unwrap(), b"x");
    }

    #[test]
    fn factory_makes_empty_ports() {
        let factory = MemoryPortFactory;
        let port = factory.new_port();
        assert_eq!(port.size().unwrap(), 0);
    }
}
