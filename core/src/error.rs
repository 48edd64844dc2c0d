/*
 * error.rs
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

//! Parse, decode, and API errors.

use std::fmt;
use std::io;

/// Errors from message parsing, transfer decoding, or API misuse.
#[derive(Debug)]
pub enum ParseError {
    /// Text violates the header grammar. Fatal for the whole parse when it
    /// concerns a header line; field-level occurrences are recovered in
    /// lenient mode (the field value is dropped).
    Syntax {
        message: String,
        /// Field name the error occurred in, when known.
        field: Option<String>,
    },
    /// Declared charset is unknown or inconsistent with the actual bytes.
    Charset { charset: String, message: String },
    /// API misuse, e.g. a Content-Type without a sub-type or multiple values
    /// assigned to a single-instance field. Never raised for wire input.
    Argument(String),
    /// Error from the underlying byte port.
    Io(io::Error),
}

impl ParseError {
    pub fn syntax(message: impl Into<String>) -> Self {
        ParseError::Syntax {
            message: message.into(),
            field: None,
        }
    }

    pub fn syntax_in(field: &str, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn charset(charset: &str, message: impl Into<String>) -> Self {
        ParseError::Charset {
            charset: charset.to_string(),
            message: message.into(),
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        ParseError::Argument(message.into())
    }

    /// True for errors the lenient policy may absorb by treating the field
    /// as absent. Argument and I/O errors are never absorbed.
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::Syntax { .. } | ParseError::Charset { .. }
        )
    }

    /// Attach a field name to a syntax error that does not carry one yet.
    pub fn in_field(self, name: &str) -> Self {
        match self {
            ParseError::Syntax {
                message,
                field: None,
            } => ParseError::Syntax {
                message,
                field: Some(name.to_string()),
            },
            other => other,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax {
                message,
                field: Some(name),
            } => write!(f, "syntax error in {}: {}", name, message),
            ParseError::Syntax {
                message,
                field: None,
            } => write!(f, "syntax error: {}", message),
            ParseError::Charset { charset, message } => {
                write!(f, "charset error ({}): {}", charset, message)
            }
            ParseError::Argument(m) => write!(f, "{}", m),
            ParseError::Io(e) => write!(f, "port error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_names_the_field() {
        let e = ParseError::syntax("unterminated quoted string").in_field("To");
        assert_eq!(
            e.to_string(),
            "syntax error in To: unterminated quoted string"
        );
        assert!(e.recoverable());
    }

    #[test]
    fn argument_is_not_recoverable() {
        assert!(!ParseError::argument("sub type missing").recoverable());
    }
}
