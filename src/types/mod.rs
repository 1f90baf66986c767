//! Type algebra for port and schema types
//!
//! A [`CwlType`] is one of:
//! - `Primitive` (`int`, `File`, ... with an optional `?` marker)
//! - `Named` reference to a SchemaDefRequirement type (`#Sample`)
//! - `Array`, `Enum`, `Record` schema types
//! - `Union` of alternatives
//!
//! Optionality is structural: a `?` marker on primitives and named types,
//! a leading `null` alternative on unions. Schema types become optional by
//! wrapping them in `[null, schema]`.

mod codec;
mod hint;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::binding::{InputBinding, OutputBinding};
use crate::error::{CwlError, Result};

pub(crate) use codec::kind_of as kind_of_value;
pub use codec::{input_type, input_types, output_type};
pub use hint::{HintKind, TypeFactory, TypeHint};

/// Which side of a process a type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Primitive kinds of the CWL v1.0 type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    File,
    Directory,
    Any,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 10] = [
        PrimitiveKind::Null,
        PrimitiveKind::Boolean,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::String,
        PrimitiveKind::File,
        PrimitiveKind::Directory,
        PrimitiveKind::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "string",
            PrimitiveKind::File => "File",
            PrimitiveKind::Directory => "Directory",
            PrimitiveKind::Any => "Any",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Float | PrimitiveKind::Double
        )
    }
}

impl FromStr for PrimitiveKind {
    type Err = CwlError;

    fn from_str(s: &str) -> Result<Self> {
        PrimitiveKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CwlError::mismatch("primitive type name", s))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction-flavoured binding carried by schema types.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaBinding {
    Input(Option<InputBinding>),
    Output(Option<OutputBinding>),
}

impl SchemaBinding {
    pub fn empty(direction: Direction) -> Self {
        match direction {
            Direction::Input => SchemaBinding::Input(None),
            Direction::Output => SchemaBinding::Output(None),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            SchemaBinding::Input(_) => Direction::Input,
            SchemaBinding::Output(_) => Direction::Output,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<CwlType>,
    pub label: Option<String>,
    pub binding: SchemaBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub symbols: Vec<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub binding: SchemaBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub field_type: CwlType,
    pub doc: Option<String>,
    pub label: Option<String>,
    pub binding: SchemaBinding,
}

impl RecordField {
    pub fn new(name: impl Into<String>, field_type: CwlType, direction: Direction) -> Self {
        Self {
            name: name.into(),
            field_type,
            doc: None,
            label: None,
            binding: SchemaBinding::empty(direction),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub fields: Vec<RecordField>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub binding: SchemaBinding,
}

/// A port or schema type.
#[derive(Debug, Clone, PartialEq)]
pub enum CwlType {
    Primitive { kind: PrimitiveKind, optional: bool },
    Named { name: String, optional: bool },
    Array(ArraySchema),
    Enum(EnumSchema),
    Record(RecordSchema),
    Union(Vec<CwlType>),
}

impl CwlType {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        CwlType::Primitive {
            kind,
            optional: false,
        }
    }

    pub fn null() -> Self {
        CwlType::primitive(PrimitiveKind::Null)
    }

    pub fn named(name: impl Into<String>) -> Self {
        CwlType::Named {
            name: name.into(),
            optional: false,
        }
    }

    pub fn array(items: CwlType, direction: Direction) -> Self {
        CwlType::Array(ArraySchema {
            items: Box::new(items),
            label: None,
            binding: SchemaBinding::empty(direction),
        })
    }

    /// Enum type; symbols must be unique.
    pub fn enumeration(symbols: Vec<String>, direction: Direction) -> Result<Self> {
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(CwlError::duplicate("enum symbol", symbol.clone()));
            }
        }
        Ok(CwlType::Enum(EnumSchema {
            symbols,
            name: None,
            label: None,
            binding: SchemaBinding::empty(direction),
        }))
    }

    /// Record type; field names must be unique.
    pub fn record(fields: Vec<RecordField>, direction: Direction) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CwlError::duplicate("record field", field.name.clone()));
            }
        }
        Ok(CwlType::Record(RecordSchema {
            fields,
            name: None,
            label: None,
            binding: SchemaBinding::empty(direction),
        }))
    }

    /// Union of alternatives, dropping duplicates but keeping order.
    pub fn union(alternatives: impl IntoIterator<Item = CwlType>) -> Self {
        let mut unique: Vec<CwlType> = Vec::new();
        for alt in alternatives {
            if !unique.contains(&alt) {
                unique.push(alt);
            }
        }
        CwlType::Union(unique)
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            CwlType::Primitive {
                kind: PrimitiveKind::Null,
                ..
            }
        )
    }

    /// Apply the optionality encoding.
    ///
    /// Unions insert or remove only the `null` alternative and collapse to
    /// the remaining alternative when exactly one is left.
    pub fn set_required(&self, required: bool) -> Result<CwlType> {
        match self {
            CwlType::Primitive { kind, .. } => Ok(CwlType::Primitive {
                kind: *kind,
                optional: !required,
            }),
            CwlType::Named { name, .. } => Ok(CwlType::Named {
                name: name.clone(),
                optional: !required,
            }),
            CwlType::Array(_) | CwlType::Enum(_) | CwlType::Record(_) => {
                if required {
                    Ok(self.clone())
                } else {
                    Ok(CwlType::Union(vec![CwlType::null(), self.clone()]))
                }
            }
            CwlType::Union(alternatives) => {
                let mut rest: Vec<CwlType> = alternatives.iter().filter(|t| !t.is_null()).cloned().collect();
                if rest.is_empty() {
                    return Err(CwlError::UnsupportedType {
                        details: format!("union {self} has no non-null alternative"),
                    });
                }
                if required {
                    if rest.len() == 1 {
                        Ok(rest.remove(0))
                    } else {
                        Ok(CwlType::Union(rest))
                    }
                } else {
                    let mut alts = Vec::with_capacity(rest.len() + 1);
                    alts.push(CwlType::null());
                    alts.extend(rest);
                    Ok(CwlType::Union(alts))
                }
            }
        }
    }

    /// True unless the type carries the `?` marker or a `null` alternative.
    pub fn is_required(&self) -> bool {
        match self {
            CwlType::Primitive { optional, .. } | CwlType::Named { optional, .. } => !optional,
            CwlType::Union(alternatives) => !alternatives.iter().any(CwlType::is_null),
            _ => true,
        }
    }

    /// The primitive kind of `T`, `T?` or `[null, T]`.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            CwlType::Primitive { kind, .. } => Some(*kind),
            CwlType::Union(alternatives) => match alternatives.as_slice() {
                [first, CwlType::Primitive { kind, .. }] if first.is_null() => Some(*kind),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_kind().is_some()
    }

    /// int/long/float/double, including their optional forms.
    pub fn is_numeric(&self) -> bool {
        self.primitive_kind().is_some_and(|kind| kind.is_numeric())
    }

    /// Whether the type is an array of `File`, optional or not.
    pub fn is_file_array(&self) -> bool {
        match self {
            CwlType::Array(array) => matches!(
                array.items.as_ref(),
                CwlType::Primitive {
                    kind: PrimitiveKind::File,
                    ..
                }
            ),
            CwlType::Union(alternatives) => {
                let rest: Vec<&CwlType> = alternatives.iter().filter(|t| !t.is_null()).collect();
                matches!(rest.as_slice(), [only] if only.is_file_array())
            }
            _ => false,
        }
    }

    /// Whether `value` is a valid instance of this type.
    pub fn admits(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.is_required() || self.is_null();
        }
        match self {
            CwlType::Primitive { kind, .. } => match kind {
                PrimitiveKind::Null => false,
                PrimitiveKind::Boolean => value.is_boolean(),
                PrimitiveKind::Int | PrimitiveKind::Long => value.is_i64() || value.is_u64(),
                PrimitiveKind::Float | PrimitiveKind::Double => value.is_number(),
                PrimitiveKind::String => value.is_string(),
                PrimitiveKind::File => has_class(value, "File"),
                PrimitiveKind::Directory => has_class(value, "Directory"),
                PrimitiveKind::Any => true,
            },
            CwlType::Named { .. } => true,
            CwlType::Array(array) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| array.items.admits(item))),
            CwlType::Enum(schema) => value
                .as_str()
                .is_some_and(|s| schema.symbols.iter().any(|symbol| symbol == s)),
            CwlType::Record(schema) => value.as_object().is_some_and(|object| {
                schema.fields.iter().all(|field| match object.get(&field.name) {
                    Some(v) => field.field_type.admits(v),
                    None => !field.field_type.is_required(),
                })
            }),
            CwlType::Union(alternatives) => alternatives.iter().any(|alt| alt.admits(value)),
        }
    }
}

fn has_class(value: &Value, class: &str) -> bool {
    value.get("class").and_then(Value::as_str) == Some(class)
}

impl fmt::Display for CwlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CwlType::Primitive { kind, optional } => {
                write!(f, "{}{}", kind, if *optional { "?" } else { "" })
            }
            CwlType::Named { name, optional } => {
                write!(f, "{}{}", name, if *optional { "?" } else { "" })
            }
            CwlType::Array(array) => write!(f, "{}[]", array.items),
            CwlType::Enum(schema) => write!(f, "enum({})", schema.symbols.join("|")),
            CwlType::Record(schema) => {
                let names: Vec<&str> = schema.fields.iter().map(|field| field.name.as_str()).collect();
                write!(f, "record({})", names.join(", "))
            }
            CwlType::Union(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}
