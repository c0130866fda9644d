use serde::{Serialize, Serializer};

/// Node kind as a bit flag.
///
/// The numeric values are part of the inspection output format and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Kind {
    Nil = 1,
    Object = 1 << 1,
    Array = 1 << 2,
    String = 1 << 3,
    Int = 1 << 4,
    Uint = 1 << 5,
    Float = 1 << 6,
    Bool = 1 << 7,
}

impl Kind {
    /// Mask of all primitive value kinds.
    pub const VALUES: u32 = Kind::String as u32
        | Kind::Int as u32
        | Kind::Uint as u32
        | Kind::Float as u32
        | Kind::Bool as u32;

    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn is_value(self) -> bool {
        self.bits() & Self::VALUES != 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "Nil",
            Kind::Object => "Object",
            Kind::Array => "Array",
            Kind::String => "String",
            Kind::Int => "Int",
            Kind::Uint => "Uint",
            Kind::Float => "Float",
            Kind::Bool => "Bool",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}
