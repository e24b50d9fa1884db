//! Invocation dispatcher
//!
//! Routes a call by operation name, validates its arguments, applies the
//! access guard to guarded path fields and runs the handler. Every failure on
//! the way is converted into an [`InvocationResult::Failure`]; nothing escapes
//! as a panic or an unstructured error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::InvocationError;
use crate::mcp::guard::AllowedRootSet;
use crate::mcp::registry::{OperationDefinition, OperationRegistry};
use crate::mcp::types::Tool;
use crate::mcp::validate::{validate, Arguments};

/// Outcome of a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    Success { text: String },
    Failure { message: String },
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }

    /// Success text or failure message
    pub fn message(&self) -> &str {
        match self {
            InvocationResult::Success { text } => text,
            InvocationResult::Failure { message } => message,
        }
    }
}

impl From<Result<String, InvocationError>> for InvocationResult {
    fn from(outcome: Result<String, InvocationError>) -> Self {
        match outcome {
            Ok(text) => InvocationResult::Success { text },
            Err(err) => InvocationResult::Failure {
                message: err.to_string(),
            },
        }
    }
}

/// Stateless router over a read-only registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    allowed_roots: Option<Arc<AllowedRootSet>>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with no sandbox roots and no timeout
    pub fn new(registry: OperationRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            allowed_roots: None,
            timeout: None,
        }
    }

    /// Roots consulted for operations that declare guarded path fields
    pub fn with_allowed_roots(mut self, roots: AllowedRootSet) -> Self {
        self.allowed_roots = Some(Arc::new(roots));
        self
    }

    /// Upper bound on a single handler's run time; `None` disables it
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Catalog in registration order
    pub fn list_operations(&self) -> Vec<Tool> {
        self.registry.list()
    }

    /// Invoke `name` with a raw argument payload
    pub async fn invoke(&self, name: &str, raw_arguments: &Value) -> InvocationResult {
        let started = Instant::now();
        let outcome = self.try_invoke(name, raw_arguments).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => info!(operation = %name, outcome = "success", duration_ms, "operation invoked"),
            Err(err) => warn!(
                operation = %name,
                outcome = "failure",
                error_kind = err.kind(),
                error = %err,
                duration_ms,
                "operation invoked"
            ),
        }

        outcome.into()
    }

    async fn try_invoke(&self, name: &str, raw_arguments: &Value) -> Result<String, InvocationError> {
        let definition = self.registry.lookup(name)?;
        let mut args = validate(definition.input_schema(), raw_arguments)?;
        self.apply_guard(definition, &mut args)?;
        debug!(operation = %name, "arguments accepted");
        self.execute(definition.clone(), args).await
    }

    fn apply_guard(
        &self,
        definition: &OperationDefinition,
        args: &mut Arguments,
    ) -> Result<(), InvocationError> {
        for field in definition.input_schema().guarded_fields() {
            let target = args.string(&field.name)?.to_string();
            // No roots configured means nothing is reachable.
            let roots = self
                .allowed_roots
                .as_ref()
                .ok_or_else(|| InvocationError::AccessDenied {
                    path: target.clone(),
                })?;
            let resolved = roots.check(&target)?;
            args.set_resolved_path(&field.name, resolved);
        }
        Ok(())
    }

    async fn execute(
        &self,
        definition: OperationDefinition,
        args: Arguments,
    ) -> Result<String, InvocationError> {
        // Both the handler call and its future run inside the task, so a
        // panic in either surfaces as a join error.
        let mut task = tokio::spawn(async move { definition.call(args).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return Err(InvocationError::Timeout {
                        millis: limit.as_millis() as u64,
                    });
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|join_err| {
            tracing::error!(error = %join_err, "operation handler aborted");
            Err(InvocationError::Panicked)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::mcp::guard::GuardMode;
    use crate::mcp::schema::{FieldKind, InputSchema};

    fn counted_add(calls: Arc<AtomicUsize>) -> OperationDefinition {
        OperationDefinition::new(
            "add",
            "Add two numbers",
            InputSchema::new()
                .required("a", FieldKind::Number, "First number")
                .required("b", FieldKind::Number, "Second number"),
            move |args: Arguments| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let a = args.number("a")?;
                    let b = args.number("b")?;
                    Ok(format!("{a} + {b} = {}", a + b))
                }
            },
        )
    }

    fn guarded_echo() -> OperationDefinition {
        OperationDefinition::new(
            "where",
            "Report the resolved path",
            InputSchema::new().guarded_path("path", "Target path"),
            |args: Arguments| async move {
                Ok(args.guarded_path("path")?.display().to_string())
            },
        )
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let dispatcher = Dispatcher::new(OperationRegistry::new());
        let result = dispatcher.invoke("unknown_tool", &json!({})).await;

        assert_eq!(
            result,
            InvocationResult::Failure {
                message: "Unknown tool: unknown_tool".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_argument_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = OperationRegistry::with_operations([counted_add(calls.clone())]).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = dispatcher.invoke("add", &json!({"a": 2})).await;

        assert_eq!(result.message(), "Missing required argument: b");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_argument_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = OperationRegistry::with_operations([counted_add(calls.clone())]).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = dispatcher.invoke("add", &json!({"a": "two", "b": 3})).await;

        assert!(!result.is_success());
        assert_eq!(result.message(), "Invalid argument 'a': expected number");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_runs_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = OperationRegistry::with_operations([counted_add(calls.clone())]).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = dispatcher.invoke("add", &json!({"a": 2, "b": 3})).await;

        assert_eq!(
            result,
            InvocationResult::Success {
                text: "2 + 3 = 5".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_guard_denies_before_handler() {
        let registry = OperationRegistry::with_operations([guarded_echo()]).unwrap();
        let dispatcher = Dispatcher::new(registry)
            .with_allowed_roots(AllowedRootSet::new("/srv/data", ["/srv/data"], GuardMode::Lexical));

        let denied = dispatcher.invoke("where", &json!({"path": "../etc"})).await;
        assert_eq!(denied.message(), "Access denied: path not allowed");

        let allowed = dispatcher.invoke("where", &json!({"path": "notes/./a.txt"})).await;
        assert_eq!(allowed.message(), "/srv/data/notes/a.txt");
    }

    #[tokio::test]
    async fn test_guarded_operation_without_roots_is_denied() {
        let registry = OperationRegistry::with_operations([guarded_echo()]).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = dispatcher.invoke("where", &json!({"path": "."})).await;
        assert_eq!(result.message(), "Access denied: path not allowed");
    }

    #[tokio::test]
    async fn test_domain_error_becomes_failure() {
        let registry = OperationRegistry::with_operations([OperationDefinition::new(
            "fail",
            "Always fails",
            InputSchema::new(),
            |_args: Arguments| async move { Err(InvocationError::domain("nope")) },
        )])
        .unwrap();
        let result = Dispatcher::new(registry).invoke("fail", &Value::Null).await;

        assert_eq!(
            result,
            InvocationResult::Failure {
                message: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let registry = OperationRegistry::with_operations([OperationDefinition::new(
            "boom",
            "Panics",
            InputSchema::new(),
            |_args: Arguments| async move {
                if true {
                    panic!("handler bug");
                }
                Ok(String::new())
            },
        )])
        .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = dispatcher.invoke("boom", &json!({})).await;
        assert_eq!(result.message(), "Operation failed unexpectedly");

        // The dispatcher keeps serving after a failed invocation.
        let again = dispatcher.invoke("missing", &json!({})).await;
        assert_eq!(again.message(), "Unknown tool: missing");
    }

    #[tokio::test]
    async fn test_handler_panicking_before_returning_future_is_contained() {
        let registry = OperationRegistry::with_operations([OperationDefinition::new(
            "eager_boom",
            "Panics while building its future",
            InputSchema::new(),
            |_args: Arguments| -> std::future::Ready<Result<String, InvocationError>> {
                panic!("handler bug before await");
            },
        )])
        .unwrap();
        let dispatcher = Dispatcher::new(registry);

        // Run the invocation in its own task so an escaping panic fails the join.
        let joined = tokio::spawn(async move { dispatcher.invoke("eager_boom", &json!({})).await }).await;

        let result = joined.expect("invoke must not panic");
        assert_eq!(
            result,
            InvocationResult::Failure {
                message: "Operation failed unexpectedly".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let registry = OperationRegistry::with_operations([OperationDefinition::new(
            "slow",
            "Sleeps",
            InputSchema::new(),
            |_args: Arguments| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("done".to_string())
            },
        )])
        .unwrap();
        let dispatcher =
            Dispatcher::new(registry).with_timeout(Some(Duration::from_millis(20)));

        let result = dispatcher.invoke("slow", &json!({})).await;
        assert_eq!(result.message(), "Operation timed out after 20 ms");
    }

    #[test]
    fn test_invoke_from_blocking_context() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = OperationRegistry::with_operations([counted_add(calls)]).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let result = tokio_test::block_on(dispatcher.invoke("add", &json!({"a": 1.5, "b": 1})));
        assert_eq!(result.message(), "1.5 + 1 = 2.5");
    }
}
