//! Bit-flag type codes and the coercions they describe.

use crate::value::Value;

pub const INT: u32 = 1;
pub const INTEGER: u32 = 1;
pub const FLOAT: u32 = 2;
pub const BOOL: u32 = 4;
pub const BOOLEAN: u32 = 4;
pub const STRING: u32 = 8;
pub const LIST: u32 = 16;
pub const ARRAY: u32 = 16;
pub const REPEATABLE: u32 = 32;

/// Historical value kept for configuration compatibility.
///
/// It overlaps `FLOAT | BOOLEAN` and is never read as a coercion type;
/// required-ness is declared with `OptSpec::required`.
pub const REQUIRED: u32 = 6;

const KNOWN_BITS: u32 = INTEGER | FLOAT | BOOLEAN | STRING | LIST | REPEATABLE;

#[derive(Debug, thiserror::Error)]
pub enum CoercionError {
    #[error("'{0}' is not a valid integer")]
    NotInteger(String),
    #[error("'{0}' is not a valid number")]
    NotFloat(String),
    #[error("'{0}' is not a valid boolean (expected true/false, yes/no or 1/0)")]
    NotBoolean(String),
    #[error("a value is required")]
    MissingValue,
    #[error("list element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CoercionError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Integer,
    Float,
    Boolean,
    String,
}

/// A validated type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFlags {
    code: u32,
    primitive: Primitive,
}

impl TypeFlags {
    /// Check a raw code; a code with unknown bits or no type bit at all is a
    /// configuration defect.
    pub fn from_code(code: u32) -> Result<Self, String> {
        if code & !KNOWN_BITS != 0 {
            return Err(format!("unknown type flag bits in {code}"));
        }
        if code == 0 {
            return Err("type code 0 selects no type".to_string());
        }
        let primitive = if code & INTEGER != 0 {
            Primitive::Integer
        } else if code & FLOAT != 0 {
            Primitive::Float
        } else if code & BOOLEAN != 0 {
            Primitive::Boolean
        } else {
            Primitive::String
        };
        Ok(Self { code, primitive })
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn is_list(&self) -> bool {
        self.code & LIST != 0
    }

    pub fn is_repeatable(&self) -> bool {
        self.code & REPEATABLE != 0
    }

    /// Coerce one occurrence. `None` means the flag was present without a
    /// value, which only a plain boolean accepts.
    pub fn coerce(&self, raw: Option<&str>) -> Result<Value, CoercionError> {
        let Some(raw) = raw else {
            return match self.primitive {
                Primitive::Boolean if !self.is_list() => Ok(Value::Bool(true)),
                _ => Err(CoercionError::MissingValue),
            };
        };
        if !self.is_list() {
            return coerce_primitive(self.primitive, raw);
        }
        raw.split(',')
            .enumerate()
            .map(|(index, item)| {
                coerce_primitive(self.primitive, item).map_err(|e| CoercionError::Element {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

fn coerce_primitive(primitive: Primitive, raw: &str) -> Result<Value, CoercionError> {
    match primitive {
        Primitive::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CoercionError::NotInteger(raw.to_string())),
        Primitive::Float => match raw.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(CoercionError::NotFloat(raw.to_string())),
        },
        Primitive::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| CoercionError::NotBoolean(raw.to_string())),
        Primitive::String => Ok(Value::Str(raw.to_string())),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
