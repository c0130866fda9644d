//! Stream writer: preamble, graph header, then length-prefixed records.

use std::io::Write;

use serde::Serialize;
use tracing::debug;
use uast_buffers::{varint_size, Writer};
use uast_nodes::Node;

use crate::constants::{MAGIC, PREAMBLE_LEN, VERSION};
use crate::delimited::DelimitedWriter;
use crate::encoder::encode;
use crate::error::EncodeResult;
use crate::options::EncodeOptions;
use crate::record::{GraphHeader, WireRecord};

/// Byte and record accounting for one written stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncodeStats {
    /// Everything written, preamble included.
    pub total_bytes: usize,
    pub value_bytes: usize,
    pub object_bytes: usize,
    pub array_bytes: usize,
    /// Length prefixes of the node records.
    pub delimiter_bytes: usize,
    pub records: usize,
    /// Objects that carry their own key list.
    pub key_sets: usize,
    /// Objects that borrow a key list through `keys_from`.
    pub keys_from: usize,
    pub dedup_hits: usize,
}

/// Writes `node` with default options.
pub fn write_to<W: Write>(w: W, node: &Node) -> EncodeResult<()> {
    write_to_with(w, node, &EncodeOptions::default()).map(|_| ())
}

pub fn write_to_with<W: Write>(
    w: W,
    node: &Node,
    options: &EncodeOptions,
) -> EncodeResult<EncodeStats> {
    let encoded = encode(node, options)?;
    let mut stats = write_records(w, &encoded.header, &encoded.records)?;
    stats.dedup_hits = encoded.dedup_hits;
    debug!(
        records = stats.records,
        bytes = stats.total_bytes,
        dedup_hits = stats.dedup_hits,
        keys_from = stats.keys_from,
        "uast graph written"
    );
    Ok(stats)
}

/// Writes an already encoded graph. `records` must be in ascending id order;
/// ids equal to the previous id + 1 are left implicit.
pub fn write_records<W: Write>(
    mut w: W,
    header: &GraphHeader,
    records: &[WireRecord],
) -> EncodeResult<EncodeStats> {
    let mut preamble = Writer::with_capacity(PREAMBLE_LEN);
    preamble.buf(&MAGIC);
    preamble.u32_le(VERSION);
    w.write_all(preamble.as_slice())?;

    let mut stats = EncodeStats::default();
    let mut out = DelimitedWriter::new(w);
    let size = out.write_msg(header)?;
    stats.total_bytes = PREAMBLE_LEN + varint_size(size as u64) + size;

    let mut prev = 0u64;
    for record in records {
        let explicit_id = prev.checked_add(1) != Some(record.id);
        prev = record.id;
        let size = out.write_with(|buf| record.encode_as(buf, explicit_id))?;

        if record.is_value() {
            stats.value_bytes += size;
        } else if record.is_object() {
            if record.keys_from != 0 {
                stats.keys_from += 1;
            } else {
                stats.key_sets += 1;
            }
            stats.object_bytes += size;
        } else {
            stats.array_bytes += size;
        }
        stats.delimiter_bytes += varint_size(size as u64);
        stats.total_bytes += varint_size(size as u64) + size;
        stats.records += 1;
    }
    out.into_inner().flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_and_header() {
        let mut buf = Vec::new();
        write_to(&mut buf, &Node::Null).unwrap();
        assert_eq!(buf, [0x00, b'b', b'g', b'r', 1, 0, 0, 0, 0]);
    }

    #[test]
    fn implicit_ids_are_elided() {
        let header = GraphHeader {
            last_id: 9,
            root: 9,
            metadata: 0,
        };
        let records = [
            WireRecord::value(1, "a".into()),
            WireRecord::value(2, "b".into()),
            WireRecord::value(5, "c".into()),
            WireRecord {
                id: 9,
                values: vec![1, 2, 5],
                ..WireRecord::default()
            },
        ];
        let mut buf = Vec::new();
        let stats = write_records(&mut buf, &header, &records).unwrap();
        assert_eq!(stats.total_bytes, buf.len());
        assert_eq!(stats.records, 4);
        assert_eq!(
            &buf[8..],
            [
                4, 0x08, 9, 0x10, 9, // header
                3, 0x3a, 1, b'a', // id 1 implicit
                3, 0x3a, 1, b'b', // id 2 implicit
                5, 0x08, 5, 0x3a, 1, b'c', // id 5 explicit
                7, 0x08, 9, 0x1a, 3, 1, 2, 5, // id 9 explicit
            ]
        );
    }

    #[test]
    fn stats_add_up() {
        let tree = Node::array([
            Node::object([("a", Node::from(1i64))]),
            Node::object([("a", Node::from(2i64))]),
            Node::object([("a", Node::from(1i64))]),
        ]);
        let mut buf = Vec::new();
        let stats = write_to_with(&mut buf, &tree, &EncodeOptions::default()).unwrap();
        assert_eq!(stats.total_bytes, buf.len());
        assert_eq!(stats.key_sets, 1);
        assert_eq!(stats.keys_from, 1);
        assert_eq!(stats.dedup_hits, 1);
        assert_eq!(stats.records, 6);
        assert_eq!(
            stats.value_bytes + stats.object_bytes + stats.array_bytes + stats.delimiter_bytes,
            buf.len() - 8 - 5
        );
    }
}
