//! Operation input schemas
//!
//! A schema is an ordered list of primitive fields. It is both the document
//! advertised through `tools/list` and the source the argument validator
//! consults, so the two can never disagree.

use std::fmt;

use schemars::schema::{InstanceType, Metadata, ObjectValidation, Schema, SchemaObject};
use serde_json::{json, Value};

/// Primitive kind accepted for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Boolean,
}

impl FieldKind {
    /// JSON-Schema `type` keyword for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
        }
    }

    fn instance_type(&self) -> InstanceType {
        match self {
            FieldKind::Number => InstanceType::Number,
            FieldKind::String => InstanceType::String,
            FieldKind::Boolean => InstanceType::Boolean,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Argument name as sent by callers
    pub name: String,

    /// Accepted primitive kind
    pub kind: FieldKind,

    /// Whether the argument must be present
    pub required: bool,

    /// Human-readable description
    pub description: String,

    /// Whether the value is a filesystem path checked by the access guard
    pub guarded_path: bool,
}

/// Ordered set of fields describing an operation's arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field
    pub fn required(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.push(name, kind, true, description, false);
        self
    }

    /// Declare an optional field
    pub fn optional(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.push(name, kind, false, description, false);
        self
    }

    /// Declare a required string field holding a path that must pass the access guard
    pub fn guarded_path(mut self, name: &str, description: &str) -> Self {
        self.push(name, FieldKind::String, true, description, true);
        self
    }

    fn push(&mut self, name: &str, kind: FieldKind, required: bool, description: &str, guarded_path: bool) {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required,
            description: description.to_string(),
            guarded_path,
        });
    }

    /// All declared fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Names of required fields in declaration order
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Fields the access guard must check before the handler runs
    pub fn guarded_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.guarded_path)
    }

    /// Render as a JSON-Schema object document
    pub fn to_json_schema(&self) -> Value {
        let mut object = ObjectValidation::default();
        for field in &self.fields {
            let property = SchemaObject {
                instance_type: Some(field.kind.instance_type().into()),
                metadata: Some(Box::new(Metadata {
                    description: Some(field.description.clone()),
                    ..Default::default()
                })),
                ..Default::default()
            };
            object
                .properties
                .insert(field.name.clone(), Schema::Object(property));
            if field.required {
                object.required.insert(field.name.clone());
            }
        }

        let root = SchemaObject {
            instance_type: Some(InstanceType::Object.into()),
            object: Some(Box::new(object)),
            ..Default::default()
        };

        serde_json::to_value(root).unwrap_or_else(|_| json!({"type": "object"}))
    }
}
