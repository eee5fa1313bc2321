use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Tag identifying the top-level variant of a value or type.
///
/// Every canonical encoding begins with one of these as a single byte. The
/// numeric values are part of the wire format and must never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Kind {
    Bool = 0,
    Number = 1,
    String = 2,
    Blob = 3,
    /// The abstract "any value" type. Never the kind of a value instance.
    Value = 4,
    List = 5,
    Map = 6,
    Ref = 7,
    Set = 8,
    Struct = 9,
    /// Back-reference to an enclosing struct type. Types only.
    Cycle = 10,
    Type = 11,
    /// Type alternatives. Types only.
    Union = 12,
}

impl Kind {
    /// The tag byte written on the wire.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte.
    pub fn from_tag(tag: u8) -> Result<Self, TypesError> {
        Ok(match tag {
            0 => Self::Bool,
            1 => Self::Number,
            2 => Self::String,
            3 => Self::Blob,
            4 => Self::Value,
            5 => Self::List,
            6 => Self::Map,
            7 => Self::Ref,
            8 => Self::Set,
            9 => Self::Struct,
            10 => Self::Cycle,
            11 => Self::Type,
            12 => Self::Union,
            other => return Err(TypesError::UnknownKind(other)),
        })
    }

    /// Primitive kinds carry no child types.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Number | Self::String | Self::Blob | Self::Value | Self::Type
        )
    }

    /// Kinds that may appear as the tag of a concrete value instance.
    pub fn is_value_kind(self) -> bool {
        !matches!(self, Self::Value | Self::Cycle | Self::Union)
    }

    /// Container kinds are followed by a sequence height on the wire.
    pub fn is_sequence(self) -> bool {
        matches!(self, Self::Blob | Self::List | Self::Map | Self::Set)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Number => "Number",
            Self::String => "String",
            Self::Blob => "Blob",
            Self::Value => "Value",
            Self::List => "List",
            Self::Map => "Map",
            Self::Ref => "Ref",
            Self::Set => "Set",
            Self::Struct => "Struct",
            Self::Cycle => "Cycle",
            Self::Type => "Type",
            Self::Union => "Union",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
