//! Type hints: user-facing type requests lowered into [`CwlType`]
//!
//! ```
//! use cwlforge::types::{Direction, TypeFactory, TypeHint};
//!
//! let hint = TypeHint::int().required().default(5);
//! let t = TypeFactory::create(&hint, Direction::Input).unwrap();
//! assert_eq!(t.to_string(), "int");
//! ```

use serde_json::Value;

use super::{CwlType, Direction, PrimitiveKind, RecordField};
use crate::binding::SecondaryFiles;
use crate::error::Result;

/// Shape of a hinted type.
#[derive(Debug, Clone, PartialEq)]
pub enum HintKind {
    Int,
    Long,
    Float,
    Double,
    String,
    Bool,
    File,
    Dir,
    Any,
    Enum(Vec<String>),
    Array(Box<TypeHint>),
    Record(Vec<(String, TypeHint)>),
    Union(Vec<TypeHint>),
}

/// A type request plus port metadata. Never appears in a document.
///
/// Hints are optional unless [`TypeHint::required`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeHint {
    pub kind: HintKind,
    pub required: bool,
    pub default: Option<Value>,
    pub glob: Option<String>,
    pub label: Option<String>,
    pub doc: Option<String>,
    pub secondary_files: Option<SecondaryFiles>,
}

impl TypeHint {
    pub fn new(kind: HintKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            glob: None,
            label: None,
            doc: None,
            secondary_files: None,
        }
    }

    pub fn int() -> Self {
        Self::new(HintKind::Int)
    }

    pub fn long() -> Self {
        Self::new(HintKind::Long)
    }

    pub fn float() -> Self {
        Self::new(HintKind::Float)
    }

    pub fn double() -> Self {
        Self::new(HintKind::Double)
    }

    pub fn string() -> Self {
        Self::new(HintKind::String)
    }

    pub fn bool() -> Self {
        Self::new(HintKind::Bool)
    }

    pub fn file() -> Self {
        Self::new(HintKind::File)
    }

    pub fn dir() -> Self {
        Self::new(HintKind::Dir)
    }

    pub fn any() -> Self {
        Self::new(HintKind::Any)
    }

    pub fn enumeration<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(HintKind::Enum(symbols.into_iter().map(Into::into).collect()))
    }

    pub fn array(items: TypeHint) -> Self {
        Self::new(HintKind::Array(Box::new(items)))
    }

    pub fn record<S: Into<String>>(fields: impl IntoIterator<Item = (S, TypeHint)>) -> Self {
        Self::new(HintKind::Record(
            fields.into_iter().map(|(name, hint)| (name.into(), hint)).collect(),
        ))
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeHint>) -> Self {
        Self::new(HintKind::Union(alternatives.into_iter().collect()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn glob(mut self, pattern: impl Into<String>) -> Self {
        self.glob = Some(pattern.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn secondary_files(mut self, files: impl Into<SecondaryFiles>) -> Self {
        self.secondary_files = Some(files.into());
        self
    }

    /// Default value, treating an explicit `null` as no default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }
}

/// Lowers [`TypeHint`] trees into concrete types.
pub struct TypeFactory;

impl TypeFactory {
    /// Lower `hint` with direction-flavoured schemas, then apply its
    /// required flag to the top level.
    pub fn create(hint: &TypeHint, direction: Direction) -> Result<CwlType> {
        Self::lower(hint, direction)?.set_required(hint.required)
    }

    fn lower(hint: &TypeHint, direction: Direction) -> Result<CwlType> {
        let t = match &hint.kind {
            HintKind::Int => CwlType::primitive(PrimitiveKind::Int),
            HintKind::Long => CwlType::primitive(PrimitiveKind::Long),
            HintKind::Float => CwlType::primitive(PrimitiveKind::Float),
            HintKind::Double => CwlType::primitive(PrimitiveKind::Double),
            HintKind::String => CwlType::primitive(PrimitiveKind::String),
            HintKind::Bool => CwlType::primitive(PrimitiveKind::Boolean),
            HintKind::File => CwlType::primitive(PrimitiveKind::File),
            HintKind::Dir => CwlType::primitive(PrimitiveKind::Directory),
            HintKind::Any => CwlType::primitive(PrimitiveKind::Any),
            HintKind::Enum(symbols) => CwlType::enumeration(symbols.clone(), direction)?,
            HintKind::Array(items) => CwlType::array(Self::lower(items, direction)?, direction),
            HintKind::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, field)| {
                        Ok(RecordField::new(name.clone(), Self::lower(field, direction)?, direction))
                    })
                    .collect::<Result<Vec<_>>>()?;
                CwlType::record(fields, direction)?
            }
            HintKind::Union(alternatives) => CwlType::union(
                alternatives
                    .iter()
                    .map(|alt| Self::lower(alt, direction))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(t)
    }
}
