//! Wire records and their protobuf-compatible message encoding.
//!
//! Zero-valued scalar fields and empty lists are omitted; the value oneof is
//! always written when present, so `Int(0)` stays distinguishable from an
//! absent value.

use uast_buffers::{varint_size, Reader, Writer};
use uast_nodes::{Kind, Value};

use crate::constants::{header_field, node_field, wire};
use crate::error::ProtoError;

/// A message with a protobuf body.
pub trait Message: Sized {
    fn encode(&self, w: &mut Writer);
    fn decode(bytes: &[u8]) -> Result<Self, ProtoError>;
}

/// First message of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphHeader {
    /// Highest id allocated by the writer.
    pub last_id: u64,
    /// Root id, or 0 to let the reader infer it.
    pub root: u64,
    /// Reserved.
    pub metadata: u64,
}

/// One retained node of the graph.
///
/// A record is a value (`value` set), an object (`keys`, `keys_from` or
/// `is_object` set) or an array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireRecord {
    /// Node id; 0 on the wire means "previous id + 1".
    pub id: u64,
    pub keys: Vec<u64>,
    pub values: Vec<u64>,
    /// Reuse the key list of this earlier record.
    pub keys_from: u64,
    /// Added to every entry of `values` on read.
    pub values_offs: u64,
    /// Marks an object without keys.
    pub is_object: bool,
    pub value: Option<Value>,
}

impl WireRecord {
    pub fn value(id: u64, value: Value) -> Self {
        Self {
            id,
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn is_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_object(&self) -> bool {
        self.value.is_none() && (!self.keys.is_empty() || self.keys_from != 0 || self.is_object)
    }

    pub fn kind(&self) -> Kind {
        match &self.value {
            Some(v) => v.kind(),
            None if self.is_object() => Kind::Object,
            None => Kind::Array,
        }
    }

    /// Encodes the record, leaving out the id when `explicit_id` is false.
    pub fn encode_as(&self, w: &mut Writer, explicit_id: bool) {
        if explicit_id {
            put_uint(w, node_field::ID, self.id);
        }
        put_packed(w, node_field::KEYS, &self.keys);
        put_packed(w, node_field::VALUES, &self.values);
        put_uint(w, node_field::KEYS_FROM, self.keys_from);
        put_uint(w, node_field::VALUES_OFFS, self.values_offs);
        put_uint(w, node_field::IS_OBJECT, self.is_object as u64);
        match &self.value {
            None => {}
            Some(Value::String(s)) => {
                put_tag(w, node_field::STRING, wire::LEN);
                w.vu64(s.len() as u64);
                w.utf8(s);
            }
            Some(Value::Int(v)) => {
                put_tag(w, node_field::INT, wire::VARINT);
                w.vu64(*v as u64);
            }
            Some(Value::Uint(v)) => {
                put_tag(w, node_field::UINT, wire::VARINT);
                w.vu64(*v);
            }
            Some(Value::Bool(v)) => {
                put_tag(w, node_field::BOOL, wire::VARINT);
                w.u8(*v as u8);
            }
            Some(Value::Float(v)) => {
                put_tag(w, node_field::FLOAT, wire::FIXED64);
                w.f64_le(*v);
            }
        }
    }
}

impl Message for WireRecord {
    fn encode(&self, w: &mut Writer) {
        self.encode_as(w, true);
    }

    fn decode(bytes: &[u8]) -> Result<Self, ProtoError> {
        let mut r = Reader::new(bytes);
        let mut rec = WireRecord::default();
        while !r.is_empty() {
            let (field, wire_type) = read_tag(&mut r)?;
            match field {
                node_field::ID => rec.id = read_uint(&mut r, field, wire_type)?,
                node_field::KEYS => read_repeated(&mut r, field, wire_type, &mut rec.keys)?,
                node_field::VALUES => read_repeated(&mut r, field, wire_type, &mut rec.values)?,
                node_field::KEYS_FROM => rec.keys_from = read_uint(&mut r, field, wire_type)?,
                node_field::VALUES_OFFS => rec.values_offs = read_uint(&mut r, field, wire_type)?,
                node_field::IS_OBJECT => rec.is_object = read_uint(&mut r, field, wire_type)? != 0,
                node_field::STRING => {
                    expect_wire(field, wire_type, wire::LEN)?;
                    let len = read_len(&mut r)?;
                    rec.value = Some(Value::String(r.utf8(len)?.to_owned()));
                }
                node_field::INT => {
                    rec.value = Some(Value::Int(read_uint(&mut r, field, wire_type)? as i64))
                }
                node_field::UINT => {
                    rec.value = Some(Value::Uint(read_uint(&mut r, field, wire_type)?))
                }
                node_field::BOOL => {
                    rec.value = Some(Value::Bool(read_uint(&mut r, field, wire_type)? != 0))
                }
                node_field::FLOAT => {
                    expect_wire(field, wire_type, wire::FIXED64)?;
                    rec.value = Some(Value::Float(r.f64_le()?));
                }
                _ => skip_field(&mut r, wire_type)?,
            }
        }
        Ok(rec)
    }
}

impl Message for GraphHeader {
    fn encode(&self, w: &mut Writer) {
        put_uint(w, header_field::LAST_ID, self.last_id);
        put_uint(w, header_field::ROOT, self.root);
        put_uint(w, header_field::METADATA, self.metadata);
    }

    fn decode(bytes: &[u8]) -> Result<Self, ProtoError> {
        let mut r = Reader::new(bytes);
        let mut gh = GraphHeader::default();
        while !r.is_empty() {
            let (field, wire_type) = read_tag(&mut r)?;
            match field {
                header_field::LAST_ID => gh.last_id = read_uint(&mut r, field, wire_type)?,
                header_field::ROOT => gh.root = read_uint(&mut r, field, wire_type)?,
                header_field::METADATA => gh.metadata = read_uint(&mut r, field, wire_type)?,
                _ => skip_field(&mut r, wire_type)?,
            }
        }
        Ok(gh)
    }
}

// ---------------------------------------------------------------- writing

#[inline]
fn put_tag(w: &mut Writer, field: u64, wire_type: u8) {
    w.vu64((field << 3) | wire_type as u64);
}

fn put_uint(w: &mut Writer, field: u64, v: u64) {
    if v != 0 {
        put_tag(w, field, wire::VARINT);
        w.vu64(v);
    }
}

fn put_packed(w: &mut Writer, field: u64, vals: &[u64]) {
    if vals.is_empty() {
        return;
    }
    put_tag(w, field, wire::LEN);
    let len: usize = vals.iter().map(|&v| varint_size(v)).sum();
    w.vu64(len as u64);
    for &v in vals {
        w.vu64(v);
    }
}

// ---------------------------------------------------------------- reading

fn read_tag(r: &mut Reader<'_>) -> Result<(u64, u8), ProtoError> {
    let key = r.vu64()?;
    let field = key >> 3;
    if field == 0 {
        return Err(ProtoError::ZeroField);
    }
    Ok((field, (key & 0x7) as u8))
}

fn expect_wire(field: u64, got: u8, want: u8) -> Result<(), ProtoError> {
    if got != want {
        return Err(ProtoError::WireType { field, wire: got });
    }
    Ok(())
}

fn read_len(r: &mut Reader<'_>) -> Result<usize, ProtoError> {
    usize::try_from(r.vu64()?).map_err(|_| ProtoError::LengthOverflow)
}

fn read_uint(r: &mut Reader<'_>, field: u64, wire_type: u8) -> Result<u64, ProtoError> {
    expect_wire(field, wire_type, wire::VARINT)?;
    Ok(r.vu64()?)
}

/// Accepts both the packed and the one-element-per-tag encodings.
fn read_repeated(
    r: &mut Reader<'_>,
    field: u64,
    wire_type: u8,
    out: &mut Vec<u64>,
) -> Result<(), ProtoError> {
    match wire_type {
        wire::VARINT => out.push(r.vu64()?),
        wire::LEN => {
            let len = read_len(r)?;
            let mut packed = Reader::new(r.buf(len)?);
            while !packed.is_empty() {
                out.push(packed.vu64()?);
            }
        }
        _ => return Err(ProtoError::WireType { field, wire: wire_type }),
    }
    Ok(())
}

fn skip_field(r: &mut Reader<'_>, wire_type: u8) -> Result<(), ProtoError> {
    match wire_type {
        wire::VARINT => {
            r.vu64()?;
        }
        wire::FIXED64 => r.skip(8)?,
        wire::LEN => {
            let len = read_len(r)?;
            r.skip(len)?;
        }
        wire::FIXED32 => r.skip(4)?,
        other => return Err(ProtoError::UnknownWireType(other)),
    }
    Ok(())
}
