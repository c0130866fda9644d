//! Graph → tree.
//!
//! Expansion starts at the root and copies shared ids into independent
//! subtrees. `seen[id]` tracks containers: `false` while the container is
//! being expanded, `true` once it and everything below it is resolved and may
//! be expanded again. Reaching an id that is still `false` means the id is its
//! own ancestor, and the graph is rejected.

use std::collections::HashMap;

use uast_nodes::{Array, Node, Object, Value};

use crate::error::{DecodeError, DecodeResult};
use crate::graph::Graph;
use crate::record::WireRecord;

/// Materializes the subtree rooted at `root`. Id 0 yields [`Node::Null`].
pub fn materialize(graph: &Graph, root: u64) -> DecodeResult<Node> {
    Materializer {
        graph,
        seen: HashMap::with_capacity(graph.len()),
    }
    .run(root)
}

struct Materializer<'g> {
    graph: &'g Graph,
    seen: HashMap<u64, bool>,
}

enum Body<'g> {
    Object { keys: Vec<&'g str>, fields: Object },
    Array(Array),
}

/// A container whose children are being expanded.
struct Frame<'g> {
    id: u64,
    record: &'g WireRecord,
    /// Already resolved when entered.
    leaf: bool,
    next: usize,
    body: Body<'g>,
}

impl<'g> Frame<'g> {
    fn next_child(&mut self) -> Option<u64> {
        let child = self.record.values.get(self.next).copied()?;
        self.next += 1;
        Some(child)
    }

    fn accept(&mut self, node: Node) {
        match &mut self.body {
            Body::Object { keys, fields } => {
                fields.insert(keys[self.next - 1].to_owned(), node);
            }
            Body::Array(items) => items.push(node),
        }
    }

    fn into_node(self) -> Node {
        match self.body {
            Body::Object { fields, .. } => Node::Object(fields),
            Body::Array(items) => Node::Array(items),
        }
    }
}

enum Step<'g> {
    Node(Node),
    Enter(Frame<'g>),
}

impl<'g> Materializer<'g> {
    fn run(mut self, root: u64) -> DecodeResult<Node> {
        let mut stack = match self.enter(root)? {
            Step::Node(node) => return Ok(node),
            Step::Enter(frame) => vec![frame],
        };
        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.next_child() {
                match self.enter(child)? {
                    Step::Node(node) => frame.accept(node),
                    Step::Enter(nested) => stack.push(nested),
                }
                continue;
            }
            let Some(frame) = stack.pop() else { break };
            let node = self.leave(frame);
            match stack.last_mut() {
                Some(parent) => parent.accept(node),
                None => return Ok(node),
            }
        }
        Ok(Node::Null)
    }

    fn enter(&mut self, id: u64) -> DecodeResult<Step<'g>> {
        if id == 0 {
            return Ok(Step::Node(Node::Null));
        }
        let graph = self.graph;
        let record = graph.get(id).ok_or(DecodeError::UndefinedNode(id))?;
        if let Some(v) = &record.value {
            return Ok(Step::Node(Node::Value(v.clone())));
        }
        if self.seen.get(&id) == Some(&false) {
            return Err(DecodeError::NotATree(id));
        }
        let leaf = self.is_resolved(record);
        self.seen.insert(id, leaf);

        let body = if record.is_object() {
            if record.keys.len() != record.values.len() {
                return Err(DecodeError::KeyValueMismatch {
                    id,
                    keys: record.keys.len(),
                    values: record.values.len(),
                });
            }
            let keys = record
                .keys
                .iter()
                .map(|&key| match graph.get(key).and_then(|k| k.value.as_ref()) {
                    Some(Value::String(s)) => Ok(s.as_str()),
                    _ => Err(DecodeError::NonStringKey { id, key }),
                })
                .collect::<DecodeResult<Vec<_>>>()?;
            Body::Object {
                keys,
                fields: Object::new(),
            }
        } else {
            Body::Array(Vec::with_capacity(record.values.len()))
        };
        Ok(Step::Enter(Frame {
            id,
            record,
            leaf,
            next: 0,
            body,
        }))
    }

    fn leave(&mut self, frame: Frame<'g>) -> Node {
        if !frame.leaf && self.is_resolved(frame.record) {
            self.seen.insert(frame.id, true);
        }
        frame.into_node()
    }

    /// Whether every child is a value, null, or an already resolved container.
    fn is_resolved(&self, record: &WireRecord) -> bool {
        record
            .keys
            .iter()
            .chain(record.values.iter())
            .all(|&child| {
                if child == 0 {
                    return true;
                }
                match self.seen.get(&child) {
                    Some(&resolved) => resolved,
                    None => self.graph.get(child).is_some_and(WireRecord::is_value),
                }
            })
    }
}
