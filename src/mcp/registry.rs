//! Operation registry
//!
//! Holds the catalog of operations a server exposes. The catalog is built once
//! at startup and only read afterwards; listing preserves registration order.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{InvocationError, RegistryError};
use crate::mcp::schema::InputSchema;
use crate::mcp::types::Tool;
use crate::mcp::validate::Arguments;

/// Boxed future returned by an operation handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, InvocationError>> + Send>>;

type HandlerFn = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

/// A named operation with its schema and bound handler
#[derive(Clone)]
pub struct OperationDefinition {
    name: String,
    description: String,
    input_schema: InputSchema,
    handler: HandlerFn,
}

impl OperationDefinition {
    /// Bind `handler` to a name, description and schema
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, InvocationError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Externally visible shape; the handler is never exposed
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema.to_json_schema(),
        }
    }

    pub(crate) fn call(&self, args: Arguments) -> HandlerFuture {
        (self.handler)(args)
    }
}

impl fmt::Debug for OperationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Ordered catalog of operations
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: Vec<OperationDefinition>,
    by_name: HashMap<String, usize>,
}

impl OperationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions in order
    pub fn with_operations<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = OperationDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Add a definition; names must be unique
    pub fn register(&mut self, definition: OperationDefinition) -> Result<(), RegistryError> {
        if self.by_name.contains_key(definition.name()) {
            return Err(RegistryError::DuplicateOperation {
                name: definition.name().to_string(),
            });
        }
        self.by_name
            .insert(definition.name().to_string(), self.operations.len());
        self.operations.push(definition);
        Ok(())
    }

    /// Catalog in registration order, reduced to the advertised shape
    pub fn list(&self) -> Vec<Tool> {
        self.operations.iter().map(OperationDefinition::to_tool).collect()
    }

    /// Find a definition by name
    pub fn lookup(&self, name: &str) -> Result<&OperationDefinition, InvocationError> {
        self.by_name
            .get(name)
            .map(|&index| &self.operations[index])
            .ok_or_else(|| InvocationError::UnknownOperation {
                name: name.to_string(),
            })
    }

    /// Operation names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
