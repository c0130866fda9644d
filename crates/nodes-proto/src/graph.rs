//! Stream reader and graph builder.
//!
//! Parses the preamble, the graph header and every record into an id-indexed
//! table, resolves `keys_from` / `values_offs`, checks that every reference
//! lands on a record, finds the detached roots and settles on a root id.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, ErrorKind, Read};

use tracing::{debug, trace};
use uast_nodes::{Node, Value};

use crate::constants::{MAGIC, PREAMBLE_LEN, VERSION};
use crate::delimited::{DelimitedReader, FrameError};
use crate::error::{DecodeError, DecodeResult};
use crate::options::DecodeOptions;
use crate::record::{GraphHeader, Message, WireRecord};
use crate::tree::materialize;

/// A fully read and validated node graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<u64, WireRecord>,
    pub(crate) detached: Vec<u64>,
    pub(crate) root: u64,
    pub(crate) meta: u64,
    pub(crate) last: u64,
}

impl Graph {
    /// Root id; 0 when the graph is empty.
    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn last_id(&self) -> u64 {
        self.last
    }

    pub fn metadata(&self) -> u64 {
        self.meta
    }

    /// Ids no other record refers to, ascending.
    pub fn detached(&self) -> &[u64] {
        &self.detached
    }

    pub fn get(&self, id: u64) -> Option<&WireRecord> {
        self.nodes.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &WireRecord> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Materializes the tree under [`Graph::root`].
    pub fn as_tree(&self) -> DecodeResult<Node> {
        materialize(self, self.root)
    }
}

/// Reads a stream and decodes it as a tree, with default options.
pub fn read_tree<R: Read>(r: R) -> DecodeResult<Node> {
    read_tree_with(r, &DecodeOptions::default())
}

pub fn read_tree_with<R: Read>(r: R, options: &DecodeOptions) -> DecodeResult<Node> {
    read_graph(r, options)?.as_tree()
}

pub fn read_graph<R: Read>(r: R, options: &DecodeOptions) -> DecodeResult<Graph> {
    let mut r = BufReader::new(r);
    read_preamble(&mut r)?;

    let mut frames = DelimitedReader::new(r, options.max_record_size);
    let header = match frames.read_frame() {
        Ok(Some(body)) => GraphHeader::decode(body).map_err(DecodeError::MalformedHeader)?,
        Ok(None) => return Err(DecodeError::TruncatedHeader),
        Err(e) => return Err(frame_error(e, true)),
    };

    let mut nodes: BTreeMap<u64, WireRecord> = BTreeMap::new();
    let mut prev = 0u64;
    let mut index = 0usize;
    loop {
        let body = match frames.read_frame() {
            Ok(Some(body)) => body,
            Ok(None) => break,
            Err(e) => return Err(frame_error(e, false)),
        };
        let mut record = WireRecord::decode(body)
            .map_err(|source| DecodeError::MalformedRecord { index, source })?;
        index += 1;

        if record.id == 0 {
            record.id = prev.checked_add(1).ok_or(DecodeError::IdOverflow(prev))?;
        } else if nodes.contains_key(&record.id) {
            return Err(DecodeError::DuplicateId(record.id));
        } else if record.id <= prev {
            return Err(DecodeError::NonAscendingId {
                id: record.id,
                prev,
            });
        }
        prev = record.id;
        resolve_record(&mut record, &nodes, options)?;
        nodes.insert(record.id, record);
    }

    let detached = check_references(&nodes)?;
    let mut graph = Graph {
        nodes,
        detached,
        root: header.root,
        meta: header.metadata,
        last: header.last_id,
    };
    select_root(&mut graph, prev)?;
    debug!(
        records = graph.nodes.len(),
        root = graph.root,
        detached = graph.detached.len(),
        "uast graph read"
    );
    Ok(graph)
}

fn read_preamble<R: Read>(r: &mut R) -> DecodeResult<()> {
    let mut b = [0u8; PREAMBLE_LEN];
    r.read_exact(&mut b).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DecodeError::TruncatedHeader,
        _ => DecodeError::Io(e),
    })?;
    if b[..4] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = u32::from_le_bytes([b[4], b[5], b[6], b[7]]);
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    Ok(())
}

fn frame_error(e: FrameError, in_header: bool) -> DecodeError {
    match e {
        FrameError::Io(e) => DecodeError::Io(e),
        FrameError::TooLarge { size, max } => DecodeError::RecordTooLarge { size, max },
        FrameError::UnexpectedEof | FrameError::BadPrefix if in_header => {
            DecodeError::TruncatedHeader
        }
        FrameError::UnexpectedEof | FrameError::BadPrefix => DecodeError::TruncatedRecord,
    }
}

/// Expands the compression shortcuts of a freshly read record.
fn resolve_record(
    record: &mut WireRecord,
    nodes: &BTreeMap<u64, WireRecord>,
    options: &DecodeOptions,
) -> DecodeResult<()> {
    let id = record.id;
    if record.value.is_some()
        && (!record.keys.is_empty()
            || !record.values.is_empty()
            || record.keys_from != 0
            || record.is_object)
    {
        return Err(DecodeError::AmbiguousRecord(id));
    }
    if record.keys_from != 0 {
        let from = nodes
            .get(&record.keys_from)
            .ok_or(DecodeError::UndefinedKeysFrom {
                id,
                from: record.keys_from,
            })?;
        record.keys = from.keys.clone();
    } else if options.keys_delta && record.keys.len() > 1 {
        let mut cur = record.keys[0];
        for k in record.keys.iter_mut().skip(1) {
            cur = cur.checked_add(*k).ok_or(DecodeError::IdOverflow(id))?;
            *k = cur;
        }
    }
    if record.values_offs != 0 {
        let offs = record.values_offs;
        for v in &mut record.values {
            *v = v.checked_add(offs).ok_or(DecodeError::IdOverflow(id))?;
        }
    }
    Ok(())
}

/// Validates every key/value reference and returns the ids nobody refers to.
fn check_references(nodes: &BTreeMap<u64, WireRecord>) -> DecodeResult<Vec<u64>> {
    let mut used = BTreeSet::new();
    for (&id, record) in nodes {
        if record.is_object() && record.keys.len() != record.values.len() {
            return Err(DecodeError::KeyValueMismatch {
                id,
                keys: record.keys.len(),
                values: record.values.len(),
            });
        }
        for &key in &record.keys {
            match nodes.get(&key) {
                Some(WireRecord {
                    value: Some(Value::String(_)),
                    ..
                }) => {}
                Some(_) => return Err(DecodeError::NonStringKey { id, key }),
                None if key == 0 => return Err(DecodeError::NonStringKey { id, key }),
                None => return Err(DecodeError::DanglingReference { id, target: key }),
            }
            used.insert(key);
        }
        for &target in &record.values {
            if target == 0 {
                continue;
            }
            if !nodes.contains_key(&target) {
                return Err(DecodeError::DanglingReference { id, target });
            }
            used.insert(target);
        }
    }
    Ok(nodes
        .keys()
        .filter(|id| !used.contains(*id))
        .copied()
        .collect())
}

/// Picks the root: the header's, the single detached root, or a synthesized
/// array over all detached roots.
fn select_root(graph: &mut Graph, max_id: u64) -> DecodeResult<()> {
    if graph.root != 0 {
        if !graph.nodes.contains_key(&graph.root) {
            return Err(DecodeError::UndefinedRoot(graph.root));
        }
        return Ok(());
    }
    match graph.detached.as_slice() {
        [] => {}
        [single] => graph.root = *single,
        roots => {
            let base = graph.last.max(max_id);
            let id = base.checked_add(1).ok_or(DecodeError::IdOverflow(base))?;
            trace!(root = id, forest = roots.len(), "wrapping detached roots");
            graph.nodes.insert(
                id,
                WireRecord {
                    id,
                    values: roots.to_vec(),
                    ..WireRecord::default()
                },
            );
            graph.last = id;
            graph.root = id;
        }
    }
    Ok(())
}
