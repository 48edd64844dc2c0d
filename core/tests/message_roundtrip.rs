/*
 * message_roundtrip.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * End-to-end tests for lettera_core: parse real wire text into a Message,
 * mutate it, render it back, and parse the result again. Exercises the full
 * pipeline (scanner, field parsers, RFC 2047 codec, multipart assembly).
 *
 * Run with:
 *   cargo test -p lettera_core --test message_roundtrip
 */

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lettera_core::codec::unquoter;
use lettera_core::codec::{quoted_printable, HeaderEncoder};
use lettera_core::{Config, Message, Port, StringPort};

#[test]
fn comment_with_encoded_word_decodes() {
    let msg = Message::parse(
        "From: hoge@example.jp (=?iso-2022-jp?B?GyRCJUYlOSVIGyhC?=)\r\n\r\n",
    )
    .unwrap();
    let field = msg.get("from").unwrap();
    let addrs = field.addrs();
    assert_eq!(addrs[0].spec(), "hoge@example.jp");
    assert_eq!(addrs[0].comments().len(), 1);
    let decoded = unquoter::unquote(&addrs[0].comments()[0], true).unwrap();
    assert_eq!(decoded, "\u{30C6}\u{30B9}\u{30C8}");
}

#[test]
fn mailbox_with_phrase_parses_fully() {
    let msg = Message::parse("From: Minero Aoki <aamine@loveruby.net>\r\n\r\n").unwrap();
    let field = msg.get("from").unwrap();
    let addrs = field.addrs();
    assert_eq!(addrs[0].phrase(), Some("Minero Aoki"));
    assert_eq!(addrs[0].spec(), "aamine@loveruby.net");
    assert_eq!(addrs[0].locals(), ["aamine"]);
    assert_eq!(addrs[0].domains(), ["loveruby", "net"]);
}

#[test]
fn null_return_path_round_trips_exactly() {
    let raw = "Return-Path: <>\r\n\r\n";
    let mut msg = Message::parse(raw).unwrap();
    assert_eq!(msg.encoded().unwrap(), raw);
}

#[test]
fn single_part_multipart_body() {
    let raw = "Content-Type: multipart/mixed; boundary=\"B1\"\r\n\
               \r\n\
               --B1\r\n\
               Content-Type: text/plain\r\n\
               \r\n\
               hello\r\n\
               --B1--\r\n";
    let mut msg = Message::parse(raw).unwrap();
    assert_eq!(msg.preamble().unwrap(), "");
    assert_eq!(msg.epilogue().unwrap(), "");
    let parts = msg.parts_mut().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].body().unwrap(), "hello\r\n");
}

#[test]
fn long_japanese_subject_round_trips_through_the_wire() {
    let run: String = "\u{3042}\u{3044}\u{3046}\u{3048}\u{304A}".repeat(21);
    let subject = format!("a cde {}", run);

    let mut config = Config::new();
    config.header_charset = "iso-2022-jp".to_string();
    let mut msg = Message::new(config);
    msg.set_subject(&subject);
    msg.set_body("x").unwrap();

    let wire = msg.encoded().unwrap();
    assert!(wire.matches("=?iso-2022-jp?B?").count() > 1);
    assert!(wire.contains("?=\r\n\t=?iso-2022-jp?B?"));
    for line in wire.split("\r\n") {
        assert!(line.len() <= 76, "overlong line: {:?}", line);
    }

    let again = Message::parse(&wire).unwrap();
    assert_eq!(again.decoded_subject().unwrap().as_deref(), Some(subject.as_str()));
}

#[test]
fn header_encode_decode_identity_across_charsets() {
    for charset in ["utf-8", "iso-2022-jp", "iso-8859-1"] {
        for value in [
            "plain ascii only",
            "caf\u{E9} au lait",
            "mixed \u{3042}\u{3044}\u{3046} runs",
        ] {
            let encoder = HeaderEncoder::new(charset, 76).unwrap();
            let wire = encoder.encode_field("Subject", value);
            for line in wire.split("\r\n") {
                assert!(line.len() <= 76, "{} / {:?}: {:?}", charset, value, line);
            }
            let unfolded = wire.replace("\r\n\t", " ");
            let body = unfolded.splitn(2, ": ").nth(1).unwrap();
            assert_eq!(
                unquoter::unquote(body, true).unwrap(),
                value,
                "charset {}",
                charset
            );
        }
    }
}

#[test]
fn multipart_reencode_preserves_parts_and_content() {
    let raw = "From: sender@example.net\r\n\
               Content-Type: multipart/mixed; boundary=XYZ\r\n\
               \r\n\
               preamble text\r\n\
               --XYZ\r\n\
               Content-Type: text/plain; charset=us-ascii\r\n\
               \r\n\
               first part\r\n\
               --XYZ\r\n\
               Content-Type: application/octet-stream\r\n\
               Content-Transfer-Encoding: base64\r\n\
               \r\n\
               aGVsbG8=\r\n\
               --XYZ--\r\n\
               epilogue text\r\n";
    let mut original = Message::parse(raw).unwrap();
    let part_count = original.parts().unwrap().len();
    let wire = original.encoded().unwrap();

    let mut again = Message::parse(&wire).unwrap();
    assert_eq!(again.parts().unwrap().len(), part_count);
    assert_eq!(
        again.parts_mut().unwrap()[0].content_type().as_deref(),
        Some("text/plain")
    );
    assert_eq!(
        again.parts_mut().unwrap()[1].content_type().as_deref(),
        Some("application/octet-stream")
    );
    assert!(again.preamble().unwrap().contains("preamble text"));
    assert!(again.epilogue().unwrap().contains("epilogue text"));
    assert!(again.parts_mut().unwrap()[0]
        .body()
        .unwrap()
        .contains("first part"));
    assert_eq!(
        again.parts_mut().unwrap()[1].transfer_decoded_body().unwrap(),
        b"hello"
    );
}

#[test]
fn multipart_claim_without_boundary_is_flat() {
    let raw = "Content-Type: multipart/mixed\r\n\r\nnot actually split";
    let mut msg = Message::parse(raw).unwrap();
    assert_eq!(msg.parts().unwrap().len(), 0);
    assert_eq!(msg.body().unwrap(), "not actually split");
}

#[test]
fn quoted_printable_round_trip_arbitrary_bytes() {
    let mut data = Vec::new();
    for i in 0..1024u32 {
        data.push((i * 7 % 256) as u8);
    }
    data.extend_from_slice(b"soft\r\nbreaks\nand=equals ");
    let encoded = quoted_printable::encode(&data);
    assert_eq!(quoted_printable::decode(encoded.as_bytes()), data);
}

#[test]
fn write_back_replaces_port_content() {
    let port = StringPort::from_str("Subject: before\r\n\r\nold body\r\n");
    let mut msg = Message::from_port(Box::new(port), Arc::new(Config::new())).unwrap();
    msg.set_subject("after");
    msg.set_body("new body\r\n").unwrap();
    msg.write_back().unwrap();
    let written = msg.port().read_all().unwrap();
    let text = String::from_utf8(written).unwrap();
    assert!(text.starts_with("Subject: after\r\n"));
    assert!(text.ends_with("\r\n\r\nnew body\r\n"));
}

/// Port that cannot be read twice; the aggregate must cache the body during
/// construction.
struct OneShotPort {
    inner: StringPort,
    reads: Arc<AtomicUsize>,
}

impl Port for OneShotPort {
    fn reproducible(&self) -> bool {
        false
    }

    fn size(&self) -> io::Result<u64> {
        self.inner.size()
    }

    fn open_read(&self) -> io::Result<Box<dyn Read + '_>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.open_read()
    }

    fn open_write(&mut self) -> io::Result<Box<dyn Write + '_>> {
        self.inner.open_write()
    }
}

#[test]
fn non_reproducible_port_reads_once() {
    let reads = Arc::new(AtomicUsize::new(0));
    let port = OneShotPort {
        inner: StringPort::from_str("Subject: cached\r\n\r\nbody stays\r\n"),
        reads: reads.clone(),
    };
    let mut msg = Message::from_port(Box::new(port), Arc::new(Config::new())).unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(msg.body().unwrap(), "body stays\r\n");
    assert_eq!(msg.body().unwrap(), "body stays\r\n");
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[test]
fn single_mailbox_format_parse_identity() {
    for text in [
        "user@example.com",
        "first.last@example.com",
        "Phrase Here <user@example.com>",
        "\"Comma, Phrase\" <user@example.com>",
        "root@[192.168.1.1]",
    ] {
        let msg = Message::parse(&format!("To: {}\r\n\r\n", text)).unwrap();
        let addrs = msg.get("to").unwrap().addrs();
        let spec = addrs[0].spec();
        let phrase = addrs[0].phrase().map(str::to_string);
        let formatted = addrs[0].to_string();

        let msg2 = Message::parse(&format!("To: {}\r\n\r\n", formatted)).unwrap();
        let addrs2 = msg2.get("to").unwrap().addrs();
        assert_eq!(addrs2[0].spec(), spec, "for {:?}", text);
        assert_eq!(
            addrs2[0].phrase().map(str::to_string),
            phrase,
            "for {:?}",
            text
        );
    }
}
