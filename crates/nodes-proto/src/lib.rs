//! Compact binary codec for generic node trees.
//!
//! A tree is flattened into id-addressed records: primitive values are
//! interned, objects share identical key lists, identical subtrees are stored
//! once, and value-id lists may be stored relative to their minimum. Reading
//! rebuilds an owned tree and rejects any graph that is not a tree.
//!
//! Stream layout (little-endian):
//!
//! ```text
//! [4 bytes magic "\0bgr"] [u32 version]
//! [varint len][GraphHeader]
//! [varint len][Node record]*   -- until EOF
//! ```
//!
//! Both directions walk the tree with an explicit stack, so input depth is
//! bounded by memory rather than by the call stack.
//!
//! ```
//! use uast_nodes::Node;
//!
//! let tree = Node::array([Node::object([("k", Node::from("A"))])]);
//! let mut buf = Vec::new();
//! uast_nodes_proto::write_to(&mut buf, &tree).unwrap();
//! let back = uast_nodes_proto::read_tree(buf.as_slice()).unwrap();
//! assert_eq!(back, tree);
//! ```

mod constants;
mod delimited;
mod encoder;
mod error;
mod graph;
mod options;
mod raw;
mod record;
mod tree;
mod writer;

pub use constants::{DEFAULT_MAX_RECORD_SIZE, MAGIC, PREAMBLE_LEN, VERSION};
pub use encoder::{encode, Encoded};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult, ProtoError};
pub use graph::{read_graph, read_tree, read_tree_with, Graph};
pub use options::{DecodeOptions, EncodeOptions};
pub use raw::{read_raw, read_raw_with, RawGraph, RawNode};
pub use record::{GraphHeader, Message, WireRecord};
pub use tree::materialize;
pub use writer::{write_records, write_to, write_to_with, EncodeStats};
