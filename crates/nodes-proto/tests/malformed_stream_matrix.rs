use std::io::{self, Read};

use uast_nodes::{Node, Value};
use uast_nodes_proto::{
    read_graph, read_tree, read_tree_with, write_records, write_to, DecodeError, DecodeOptions,
    GraphHeader, WireRecord, MAGIC,
};

fn tree() -> Node {
    Node::object([
        ("@type", Node::from("uast:String")),
        ("Value", Node::from("a fairly long literal that needs a few more bytes")),
        ("Format", Node::from("")),
    ])
}

fn stream(node: &Node) -> Vec<u8> {
    let mut buf = Vec::new();
    write_to(&mut buf, node).expect("write");
    buf
}

fn hand_built(root: u64, records: &[WireRecord]) -> Vec<u8> {
    let header = GraphHeader {
        last_id: records.len() as u64,
        root,
        metadata: 0,
    };
    let mut buf = Vec::new();
    write_records(&mut buf, &header, records).expect("write");
    buf
}

fn array(id: u64, values: &[u64]) -> WireRecord {
    WireRecord {
        id,
        values: values.to_vec(),
        ..WireRecord::default()
    }
}

fn string(id: u64, v: &str) -> WireRecord {
    WireRecord::value(id, Value::from(v))
}

fn fails(name: &str, bytes: &[u8], check: impl Fn(&DecodeError) -> bool) -> DecodeError {
    match read_tree(bytes) {
        Err(e) => {
            assert!(check(&e), "{name}: unexpected error {e:?}");
            e
        }
        Ok(node) => panic!("{name}: decoded {node:?}"),
    }
}

fn empty_graph_prefix() -> Vec<u8> {
    stream(&Node::Null)
}

#[test]
fn stream_format_errors() {
    let good = stream(&tree());

    let mut bad_magic = good.clone();
    bad_magic[3] = b'x';

    let mut bad_version = good.clone();
    bad_version[4..8].copy_from_slice(&2u32.to_le_bytes());

    let mut garbled_header = MAGIC.to_vec();
    garbled_header.extend_from_slice(&1u32.to_le_bytes());
    garbled_header.extend_from_slice(&[0x01, 0x07]);

    let mut garbled_record = empty_graph_prefix();
    garbled_record.extend_from_slice(&[0x02, 0x07, 0x00]);

    let e = fails("bad magic", &bad_magic, |e| matches!(e, DecodeError::BadMagic));
    assert!(e.is_format_error());

    fails("empty input", &[], |e| matches!(e, DecodeError::TruncatedHeader));
    fails("short preamble", &good[..5], |e| {
        matches!(e, DecodeError::TruncatedHeader)
    });
    fails("bad magic", &bad_magic, |e| matches!(e, DecodeError::BadMagic));
    fails("bad version", &bad_version, |e| {
        matches!(e, DecodeError::UnsupportedVersion(2))
    });
    fails("preamble only", &good[..8], |e| {
        matches!(e, DecodeError::TruncatedHeader)
    });
    fails("header cut short", &good[..10], |e| {
        matches!(e, DecodeError::TruncatedHeader)
    });
    fails("garbled header", &garbled_header, |e| {
        matches!(e, DecodeError::MalformedHeader(_))
    });
    fails("record cut short", &good[..good.len() - 1], |e| {
        matches!(e, DecodeError::TruncatedRecord)
    });
    fails("garbled record", &garbled_record, |e| {
        matches!(e, DecodeError::MalformedRecord { index: 0, .. })
    });
}

#[test]
fn record_size_limit() {
    let buf = stream(&tree());
    let opts = DecodeOptions::default().with_max_record_size(16);
    match read_tree_with(buf.as_slice(), &opts) {
        Err(DecodeError::RecordTooLarge { size, max }) => {
            assert_eq!(max, 16);
            assert!(size > 16);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(
        read_tree_with(buf.as_slice(), &opts.with_max_record_size(1 << 10)).expect("read"),
        tree()
    );
}

#[test]
fn graph_consistency_errors() {
    let e = fails("repeated id", &hand_built(1, &[string(1, "a"), string(1, "b")]), |e| {
        matches!(e, DecodeError::DuplicateId(1))
    });
    assert!(!e.is_format_error());
    fails(
        "decreasing id",
        &hand_built(1, &[string(1, "a"), string(3, "b"), string(2, "c")]),
        |e| matches!(e, DecodeError::NonAscendingId { id: 2, prev: 3 }),
    );
    fails("dangling child", &hand_built(1, &[array(1, &[5])]), |e| {
        matches!(e, DecodeError::DanglingReference { id: 1, target: 5 })
    });
    fails("undefined root", &hand_built(9, &[string(1, "a")]), |e| {
        matches!(e, DecodeError::UndefinedRoot(9))
    });
    let e = fails(
        "cycle",
        &hand_built(1, &[array(1, &[2]), array(2, &[1])]),
        |e| matches!(e, DecodeError::NotATree(_)),
    );
    assert!(!e.is_format_error());
}

#[test]
fn detached_nodes_become_a_synthetic_root() {
    let buf = hand_built(0, &[string(1, "a"), string(2, "b")]);
    let graph = read_graph(buf.as_slice(), &DecodeOptions::default()).expect("read");
    assert_eq!(graph.detached(), &[1, 2]);
    assert_eq!(graph.root(), 3);
    assert_eq!(
        graph.as_tree().expect("tree"),
        Node::array([Node::from("a"), Node::from("b")])
    );

    let single = hand_built(0, &[array(1, &[2]), string(2, "b")]);
    assert_eq!(
        read_tree(single.as_slice()).expect("read"),
        Node::array([Node::from("b")])
    );
}

/// Hands out one byte per call and fails every other call with `Interrupted`.
struct Stutter<'a> {
    data: &'a [u8],
    hiccup: bool,
}

impl Read for Stutter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.hiccup = !self.hiccup;
        if self.hiccup {
            return Err(io::ErrorKind::Interrupted.into());
        }
        if buf.is_empty() || self.data.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[0];
        self.data = &self.data[1..];
        Ok(1)
    }
}

#[test]
fn partial_reads_are_retried() {
    let buf = stream(&tree());
    let r = Stutter {
        data: &buf,
        hiccup: false,
    };
    assert_eq!(read_tree(r).expect("read"), tree());
}

#[test]
fn io_errors_are_surfaced() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }
    assert!(matches!(read_tree(Broken), Err(DecodeError::Io(_))));
}
