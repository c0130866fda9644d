//! uast-nodes - the generic tree model consumed by the UAST codecs.
//!
//! A tree is made of [`Object`]s (fields ordered by key), [`Array`]s and
//! primitive [`Value`]s. [`Node::Null`] stands for an absent child.

mod kind;
mod node;
mod value;

pub use kind::Kind;
pub use node::{Array, Node, Object};
pub use value::Value;
