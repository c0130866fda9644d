//! [`Node`] - a generic tree.

use std::collections::BTreeMap;

use crate::{Kind, Value};

/// Object fields, ordered by key.
pub type Object = BTreeMap<String, Node>;

/// Ordered list of child nodes.
pub type Array = Vec<Node>;

/// A node of a generic tree.
///
/// Equality is deep and structural.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// An absent node.
    #[default]
    Null,
    Object(Object),
    Array(Array),
    Value(Value),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Node::Null => Kind::Nil,
            Node::Object(_) => Kind::Object,
            Node::Array(_) => Kind::Array,
            Node::Value(v) => v.kind(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Builds an object from `(key, node)` pairs. Later duplicates win.
    pub fn object<K, I>(fields: I) -> Node
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array<I: IntoIterator<Item = Node>>(items: I) -> Node {
        Node::Array(items.into_iter().collect())
    }

    /// Number of nodes in the tree, `Null` children included.
    pub fn count(&self) -> usize {
        let mut n = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            n += 1;
            match node {
                Node::Object(o) => stack.extend(o.values()),
                Node::Array(a) => stack.extend(a.iter()),
                _ => {}
            }
        }
        n
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::Value(v)
    }
}

impl From<Object> for Node {
    fn from(v: Object) -> Self {
        Node::Object(v)
    }
}

impl From<Array> for Node {
    fn from(v: Array) -> Self {
        Node::Array(v)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::Value(v.into())
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::Value(v.into())
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Node::Value(v.into())
    }
}

impl From<u64> for Node {
    fn from(v: u64) -> Self {
        Node::Value(v.into())
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Value(v.into())
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Value(v.into())
    }
}

impl From<serde_json::Value> for Node {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Value(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Value(Value::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Node::Value(Value::Uint(u))
                } else {
                    Node::Value(Value::Float(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => Node::Value(Value::String(s)),
            serde_json::Value::Array(arr) => {
                Node::Array(arr.into_iter().map(Node::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Node::Object(obj.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(v: Node) -> Self {
        match v {
            Node::Null => serde_json::Value::Null,
            Node::Value(v) => serde_json::Value::from(v),
            Node::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Node::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
