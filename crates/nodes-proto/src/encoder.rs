//! Tree → wire records.
//!
//! Ids are handed out in pre-order: a container reserves its id before its
//! children are visited. Primitive values are interned, object key sets are
//! shared through `keys_from`, and a container whose key set and child ids
//! match an earlier one is dropped in favour of the earlier id. Because every
//! reuse points backwards and children resolve before their parent's content
//! key is known, the output is acyclic and depends only on the input tree.

use std::collections::HashMap;

use tracing::trace;
use uast_buffers::varint_size;
use uast_nodes::{Array, Node, Object, Value};

use crate::error::{EncodeError, EncodeResult};
use crate::options::EncodeOptions;
use crate::record::{GraphHeader, WireRecord};

/// Result of [`encode`]: records in ascending id order plus the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub header: GraphHeader,
    pub records: Vec<WireRecord>,
    /// Subtrees replaced by a reference to an identical earlier subtree.
    pub dedup_hits: usize,
}

/// Encodes `node` into wire records.
pub fn encode(node: &Node, options: &EncodeOptions) -> EncodeResult<Encoded> {
    let mut enc = TreeEncoder::new(*options);
    let root = enc.add_node(node)?;
    enc.finish(root)
}

/// Identity of a primitive value for interning. Floats compare by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ValueKey<'a> {
    String(&'a str),
    Int(i64),
    Uint(u64),
    Float(u64),
    Bool(bool),
}

impl<'a> ValueKey<'a> {
    fn of(v: &'a Value) -> Self {
        match v {
            Value::String(s) => ValueKey::String(s),
            Value::Int(i) => ValueKey::Int(*i),
            Value::Uint(u) => ValueKey::Uint(*u),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::Bool(b) => ValueKey::Bool(*b),
        }
    }

    fn to_value(self) -> Value {
        match self {
            ValueKey::String(s) => Value::String(s.to_owned()),
            ValueKey::Int(i) => Value::Int(i),
            ValueKey::Uint(u) => Value::Uint(u),
            ValueKey::Float(bits) => Value::Float(f64::from_bits(bits)),
            ValueKey::Bool(b) => Value::Bool(b),
        }
    }
}

/// Key half of a container's content identity. Arrays and objects never
/// share an identity, not even when both are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Shape {
    Array,
    Object(Vec<u64>),
}

/// A container whose children are still being encoded.
struct Frame<'a> {
    id: u64,
    shape: Shape,
    record: WireRecord,
    children: std::vec::IntoIter<&'a Node>,
    values: Vec<u64>,
}

enum Visit<'a> {
    Done(u64),
    Enter(Frame<'a>),
}

struct TreeEncoder<'a> {
    options: EncodeOptions,
    /// Slot `i` holds the record with id `i + 1`; `None` while reserved.
    slots: Vec<Option<WireRecord>>,
    values: HashMap<ValueKey<'a>, u64>,
    key_sets: HashMap<Vec<u64>, u64>,
    subtrees: HashMap<(Shape, Vec<u64>), u64>,
    dedup_hits: usize,
}

impl<'a> TreeEncoder<'a> {
    fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            slots: Vec::new(),
            values: HashMap::new(),
            key_sets: HashMap::new(),
            subtrees: HashMap::new(),
            dedup_hits: 0,
        }
    }

    /// Encodes a whole subtree with an explicit stack and returns its id
    /// (0 for `Null`).
    fn add_node(&mut self, root: &'a Node) -> EncodeResult<u64> {
        let mut stack = match self.visit(root) {
            Visit::Done(id) => return Ok(id),
            Visit::Enter(frame) => vec![frame],
        };
        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.children.next() {
                match self.visit(child) {
                    Visit::Done(id) => frame.values.push(id),
                    Visit::Enter(nested) => stack.push(nested),
                }
                continue;
            }
            let Some(frame) = stack.pop() else { break };
            let id = self.commit(frame)?;
            match stack.last_mut() {
                Some(parent) => parent.values.push(id),
                None => return Ok(id),
            }
        }
        Err(EncodeError::InvariantViolated(
            "encoder stack drained without producing a root".into(),
        ))
    }

    fn visit(&mut self, node: &'a Node) -> Visit<'a> {
        match node {
            Node::Null => Visit::Done(0),
            Node::Value(v) => Visit::Done(self.intern(ValueKey::of(v))),
            Node::Object(obj) => Visit::Enter(self.enter_object(obj)),
            Node::Array(arr) => Visit::Enter(self.enter_array(arr)),
        }
    }

    fn intern(&mut self, key: ValueKey<'a>) -> u64 {
        if let Some(&id) = self.values.get(&key) {
            return id;
        }
        let id = self.slots.len() as u64 + 1;
        self.slots.push(Some(WireRecord::value(id, key.to_value())));
        self.values.insert(key, id);
        id
    }

    fn reserve(&mut self) -> u64 {
        self.slots.push(None);
        self.slots.len() as u64
    }

    /// Gives back a reserved id. Only valid while nothing was allocated after it.
    fn release(&mut self, id: u64) -> EncodeResult<()> {
        if self.slots.len() as u64 != id || !matches!(self.slots.last(), Some(None)) {
            return Err(EncodeError::InvariantViolated(format!(
                "cannot release id {id}: {} ids allocated",
                self.slots.len()
            )));
        }
        self.slots.pop();
        Ok(())
    }

    fn enter_object(&mut self, obj: &'a Object) -> Frame<'a> {
        let id = self.reserve();
        let mut fields: Vec<(u64, &'a Node)> = obj
            .iter()
            .map(|(k, v)| (self.intern(ValueKey::String(k)), v))
            .collect();
        // fields go out in key-id order, not key text order
        fields.sort_by_key(|(kid, _)| *kid);
        let key_set: Vec<u64> = fields.iter().map(|(kid, _)| *kid).collect();

        let mut record = WireRecord {
            id,
            is_object: obj.is_empty(),
            ..WireRecord::default()
        };
        match self.key_sets.get(&key_set) {
            Some(&from) => record.keys_from = from,
            None => {
                self.key_sets.insert(key_set.clone(), id);
                record.keys = if self.options.keys_delta {
                    delta_encode(&key_set)
                } else {
                    key_set.clone()
                };
            }
        }

        let children: Vec<&'a Node> = fields.into_iter().map(|(_, v)| v).collect();
        Frame {
            id,
            shape: Shape::Object(key_set),
            record,
            values: Vec::with_capacity(children.len()),
            children: children.into_iter(),
        }
    }

    fn enter_array(&mut self, arr: &'a Array) -> Frame<'a> {
        let id = self.reserve();
        let children: Vec<&'a Node> = arr.iter().collect();
        Frame {
            id,
            shape: Shape::Array,
            record: WireRecord {
                id,
                ..WireRecord::default()
            },
            values: Vec::with_capacity(children.len()),
            children: children.into_iter(),
        }
    }

    /// Finishes a container whose children all have ids.
    fn commit(&mut self, frame: Frame<'a>) -> EncodeResult<u64> {
        let Frame {
            id,
            shape,
            mut record,
            values,
            ..
        } = frame;

        if self.options.dedup_nodes {
            let content = (shape, values.clone());
            if let Some(&earlier) = self.subtrees.get(&content) {
                self.release(id)?;
                self.dedup_hits += 1;
                trace!(id = earlier, "duplicate subtree");
                return Ok(earlier);
            }
            self.subtrees.insert(content, id);
        }

        let (values, offset) = if self.options.values_offsets {
            offset_values(values)
        } else {
            (values, 0)
        };
        record.values = values;
        record.values_offs = offset;

        let slot = self
            .slots
            .get_mut(id as usize - 1)
            .ok_or_else(|| EncodeError::InvariantViolated(format!("id {id} was never reserved")))?;
        if slot.is_some() {
            return Err(EncodeError::InvariantViolated(format!(
                "id {id} committed twice"
            )));
        }
        *slot = Some(record);
        Ok(id)
    }

    fn finish(self, root: u64) -> EncodeResult<Encoded> {
        let records = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    EncodeError::InvariantViolated(format!("id {} reserved but never committed", i + 1))
                })
            })
            .collect::<EncodeResult<Vec<_>>>()?;
        let header = GraphHeader {
            last_id: records.len() as u64,
            root,
            metadata: 0,
        };
        Ok(Encoded {
            header,
            records,
            dedup_hits: self.dedup_hits,
        })
    }
}

/// Rewrites `values` relative to their minimum when that makes the record
/// smaller. Returns the list and the offset to store (0 if unchanged).
///
/// The offset costs one tag byte plus its own varint.
pub(crate) fn offset_values(mut values: Vec<u64>) -> (Vec<u64>, u64) {
    let min = match values.iter().min() {
        Some(&min) if min != 0 => min,
        _ => return (values, 0),
    };
    let mut diff = varint_size(min) as i64 + 1;
    for &v in &values {
        diff += varint_size(v - min) as i64 - varint_size(v) as i64;
    }
    if diff >= 0 {
        return (values, 0);
    }
    for v in &mut values {
        *v -= min;
    }
    (values, min)
}

/// Sorted ids → first id followed by successive differences.
pub(crate) fn delta_encode(sorted: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(sorted.len());
    let mut prev = 0;
    for (i, &v) in sorted.iter().enumerate() {
        out.push(if i == 0 { v } else { v - prev });
        prev = v;
    }
    out
}
