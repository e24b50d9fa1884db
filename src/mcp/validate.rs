//! Argument validation
//!
//! Checks a loosely-typed argument payload against an operation's schema and
//! produces a narrowed [`Arguments`] value. Handlers only ever see arguments
//! that went through here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::InvocationError;
use crate::mcp::schema::{FieldKind, FieldSpec, InputSchema};

/// A validated argument value coerced to its declared kind
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

/// Validated arguments handed to an operation handler
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: HashMap<String, ArgValue>,
    resolved_paths: HashMap<String, PathBuf>,
}

impl Arguments {
    /// Look up a raw validated value
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Number argument; fails if it was not declared or not supplied
    pub fn number(&self, name: &str) -> Result<f64, InvocationError> {
        self.optional_number(name)?
            .ok_or_else(|| missing(name))
    }

    pub fn optional_number(&self, name: &str) -> Result<Option<f64>, InvocationError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::Number(n)) => Ok(Some(*n)),
            Some(_) => Err(mismatch(name, FieldKind::Number)),
        }
    }

    /// String argument; fails if it was not declared or not supplied
    pub fn string(&self, name: &str) -> Result<&str, InvocationError> {
        self.optional_string(name)?
            .ok_or_else(|| missing(name))
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<&str>, InvocationError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(mismatch(name, FieldKind::String)),
        }
    }

    /// Boolean argument; fails if it was not declared or not supplied
    pub fn boolean(&self, name: &str) -> Result<bool, InvocationError> {
        self.optional_boolean(name)?
            .ok_or_else(|| missing(name))
    }

    pub fn optional_boolean(&self, name: &str) -> Result<Option<bool>, InvocationError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Err(mismatch(name, FieldKind::Boolean)),
        }
    }

    /// Absolute path the access guard approved for a guarded field
    pub fn guarded_path(&self, name: &str) -> Result<&Path, InvocationError> {
        self.resolved_paths
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| InvocationError::AccessDenied {
                path: self.optional_string(name).ok().flatten().unwrap_or_default().to_string(),
            })
    }

    pub(crate) fn set_resolved_path(&mut self, name: &str, path: PathBuf) {
        self.resolved_paths.insert(name.to_string(), path);
    }

    /// Number of validated values present
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn missing(name: &str) -> InvocationError {
    InvocationError::MissingArgument {
        field: name.to_string(),
    }
}

fn mismatch(name: &str, expected: FieldKind) -> InvocationError {
    InvocationError::InvalidArgument {
        field: name.to_string(),
        expected,
    }
}

/// Validate `raw` against `schema`.
///
/// Absent or `null` payloads count as an empty mapping. Undeclared keys are
/// ignored. A `null` value is treated as absent.
pub fn validate(schema: &InputSchema, raw: &Value) -> Result<Arguments, InvocationError> {
    let empty = Map::new();
    let object = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => return Err(InvocationError::MalformedArguments),
    };

    let mut args = Arguments::default();
    for field in schema.fields() {
        match object.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(missing(&field.name));
                }
            }
            Some(value) => {
                let coerced = coerce(field, value)?;
                args.values.insert(field.name.clone(), coerced);
            }
        }
    }

    Ok(args)
}

fn coerce(field: &FieldSpec, value: &Value) -> Result<ArgValue, InvocationError> {
    match (field.kind, value) {
        (FieldKind::Number, Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() => Ok(ArgValue::Number(f)),
            _ => Err(mismatch(&field.name, field.kind)),
        },
        (FieldKind::String, Value::String(s)) => Ok(ArgValue::String(s.clone())),
        (FieldKind::Boolean, Value::Bool(b)) => Ok(ArgValue::Boolean(*b)),
        _ => Err(mismatch(&field.name, field.kind)),
    }
}
