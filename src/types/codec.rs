//! Structural mapping between [`CwlType`] and document values
//!
//! Serialization needs no context: the binding flavour stored on schema
//! types picks `inputBinding` or `outputBinding`. Deserialization needs the
//! direction of the owning port, supplied through the `input_type` /
//! `output_type` serde adapters.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{
    ArraySchema, CwlType, Direction, EnumSchema, PrimitiveKind, RecordField, RecordSchema,
    SchemaBinding,
};
use crate::error::{CwlError, Result};

impl Serialize for CwlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CwlType::Primitive { .. } | CwlType::Named { .. } => {
                serializer.serialize_str(&self.to_string())
            }
            CwlType::Union(alternatives) => alternatives.serialize(serializer),
            CwlType::Array(array) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", array.items.as_ref())?;
                if let Some(label) = &array.label {
                    map.serialize_entry("label", label)?;
                }
                serialize_binding(&mut map, &array.binding)?;
                map.end()
            }
            CwlType::Enum(schema) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                map.serialize_entry("symbols", &schema.symbols)?;
                if let Some(name) = &schema.name {
                    map.serialize_entry("name", name)?;
                }
                if let Some(label) = &schema.label {
                    map.serialize_entry("label", label)?;
                }
                serialize_binding(&mut map, &schema.binding)?;
                map.end()
            }
            CwlType::Record(schema) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                map.serialize_entry("fields", &schema.fields)?;
                if let Some(name) = &schema.name {
                    map.serialize_entry("name", name)?;
                }
                if let Some(label) = &schema.label {
                    map.serialize_entry("label", label)?;
                }
                serialize_binding(&mut map, &schema.binding)?;
                map.end()
            }
        }
    }
}

impl Serialize for RecordField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RecordField", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.field_type)?;
        match &self.doc {
            Some(doc) => state.serialize_field("doc", doc)?,
            None => state.skip_field("doc")?,
        }
        match &self.label {
            Some(label) => state.serialize_field("label", label)?,
            None => state.skip_field("label")?,
        }
        match &self.binding {
            SchemaBinding::Input(Some(binding)) => state.serialize_field("inputBinding", binding)?,
            SchemaBinding::Output(Some(binding)) => state.serialize_field("outputBinding", binding)?,
            _ => state.skip_field("inputBinding")?,
        }
        state.end()
    }
}

fn serialize_binding<M: SerializeMap>(map: &mut M, binding: &SchemaBinding) -> std::result::Result<(), M::Error> {
    match binding {
        SchemaBinding::Input(Some(binding)) => map.serialize_entry("inputBinding", binding),
        SchemaBinding::Output(Some(binding)) => map.serialize_entry("outputBinding", binding),
        _ => Ok(()),
    }
}

impl CwlType {
    /// Parse a type expression as written in a document.
    pub fn from_value(value: &Value, direction: Direction) -> Result<CwlType> {
        match value {
            Value::String(token) => parse_token(token, direction),
            Value::Array(alternatives) => {
                let alts = alternatives
                    .iter()
                    .map(|alt| CwlType::from_value(alt, direction))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CwlType::union(alts))
            }
            Value::Object(object) => parse_schema(object, direction),
            other => Err(CwlError::mismatch("type expression", kind_of(other))),
        }
    }

    /// Serialize to a document value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `int`, `int?`, `File[]`, `File[]?`, `#Named`
fn parse_token(token: &str, direction: Direction) -> Result<CwlType> {
    let (base, optional) = match token.strip_suffix('?') {
        Some(base) => (base, true),
        None => (token, false),
    };
    let parsed = if let Some(items) = base.strip_suffix("[]") {
        CwlType::array(parse_token(items, direction)?, direction)
    } else if let Ok(kind) = base.parse::<PrimitiveKind>() {
        CwlType::primitive(kind)
    } else if base.contains('#') || base.contains(':') || base == "stdout" || base == "stderr" {
        CwlType::named(base)
    } else {
        return Err(CwlError::mismatch("CWL type name", token));
    };
    parsed.set_required(!optional)
}

fn parse_schema(object: &Map<String, Value>, direction: Direction) -> Result<CwlType> {
    let label = optional_string(object, "label")?;
    let name = optional_string(object, "name")?;
    let binding = parse_binding(object, direction)?;
    match object.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = object
                .get("items")
                .ok_or_else(|| CwlError::mismatch("array with 'items'", "array without items"))?;
            Ok(CwlType::Array(ArraySchema {
                items: Box::new(CwlType::from_value(items, direction)?),
                label,
                binding,
            }))
        }
        Some("enum") => {
            let symbols: Vec<String> = match object.get("symbols") {
                Some(symbols) => serde_json::from_value(symbols.clone())
                    .map_err(|_| CwlError::mismatch("list of enum symbols", kind_of(symbols)))?,
                None => return Err(CwlError::mismatch("enum with 'symbols'", "enum without symbols")),
            };
            match CwlType::enumeration(symbols, direction)? {
                CwlType::Enum(schema) => Ok(CwlType::Enum(EnumSchema {
                    name,
                    label,
                    binding,
                    ..schema
                })),
                other => Ok(other),
            }
        }
        Some("record") => {
            let fields = match object.get("fields") {
                Some(Value::Array(list)) => list
                    .iter()
                    .map(|field| parse_field(None, field, direction))
                    .collect::<Result<Vec<_>>>()?,
                Some(Value::Object(map)) => map
                    .iter()
                    .map(|(key, field)| parse_field(Some(key), field, direction))
                    .collect::<Result<Vec<_>>>()?,
                Some(other) => return Err(CwlError::mismatch("record fields", kind_of(other))),
                None => Vec::new(),
            };
            match CwlType::record(fields, direction)? {
                CwlType::Record(schema) => Ok(CwlType::Record(RecordSchema {
                    name,
                    label,
                    binding,
                    ..schema
                })),
                other => Ok(other),
            }
        }
        Some(other) => Err(CwlError::mismatch("array, enum or record schema", other)),
        None => Err(CwlError::mismatch("schema with 'type'", "mapping without type")),
    }
}

/// Record field in list form (`{name, type}`) or map form (`name: type`).
fn parse_field(key: Option<&String>, value: &Value, direction: Direction) -> Result<RecordField> {
    let (name, type_value, object) = match (key, value) {
        (Some(key), Value::Object(object)) if object.contains_key("type") => {
            (key.clone(), &object["type"], Some(object))
        }
        (Some(key), other) => (key.clone(), other, None),
        (None, Value::Object(object)) => {
            let name = optional_string(object, "name")?
                .ok_or_else(|| CwlError::mismatch("record field with 'name'", "unnamed field"))?;
            let type_value = object
                .get("type")
                .ok_or_else(|| CwlError::mismatch("record field with 'type'", name.clone()))?;
            (name, type_value, Some(object))
        }
        (None, other) => return Err(CwlError::mismatch("record field mapping", kind_of(other))),
    };
    let mut field = RecordField::new(name, CwlType::from_value(type_value, direction)?, direction);
    if let Some(object) = object {
        field.doc = optional_string(object, "doc")?;
        field.label = optional_string(object, "label")?;
        field.binding = parse_binding(object, direction)?;
    }
    Ok(field)
}

fn parse_binding(object: &Map<String, Value>, direction: Direction) -> Result<SchemaBinding> {
    Ok(match direction {
        Direction::Input => SchemaBinding::Input(
            object
                .get("inputBinding")
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?,
        ),
        Direction::Output => SchemaBinding::Output(
            object
                .get("outputBinding")
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?,
        ),
    })
}

fn optional_string(object: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CwlError::mismatch(format!("string for '{key}'"), kind_of(other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "boolean".into(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "list".into(),
        Value::Object(_) => "mapping".into(),
    }
}

macro_rules! directed_type_adapter {
    ($module:ident, $direction:expr) => {
        /// Serde adapter for a single type owned by a port of this direction.
        pub mod $module {
            use serde::{Deserialize, Deserializer, Serialize, Serializer};
            use serde_json::Value;

            use crate::types::{CwlType, Direction};

            pub fn serialize<S: Serializer>(t: &CwlType, serializer: S) -> Result<S::Ok, S::Error> {
                t.serialize(serializer)
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CwlType, D::Error> {
                let value = Value::deserialize(deserializer)?;
                let direction: Direction = $direction;
                CwlType::from_value(&value, direction).map_err(serde::de::Error::custom)
            }
        }
    };
}

directed_type_adapter!(input_type, Direction::Input);
directed_type_adapter!(output_type, Direction::Output);

/// Serde adapter for SchemaDefRequirement type lists.
pub mod input_types {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use crate::types::{CwlType, Direction};

    pub fn serialize<S: Serializer>(types: &[CwlType], serializer: S) -> Result<S::Ok, S::Error> {
        types.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CwlType>, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        values
            .iter()
            .map(|v| CwlType::from_value(v, Direction::Input))
            .collect::<crate::error::Result<Vec<_>>>()
            .map_err(serde::de::Error::custom)
    }
}
