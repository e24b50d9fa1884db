//! Sandboxed file operations
//!
//! Every operation takes a guarded `path`. Handlers only ever see the
//! resolved path handed over by the dispatcher; messages echo the path as the
//! caller wrote it.

use std::path::Path;

use crate::error::{InvocationError, RegistryError};
use crate::mcp::registry::{OperationDefinition, OperationRegistry};
use crate::mcp::schema::InputSchema;
use crate::mcp::validate::Arguments;

pub const SERVER_NAME: &str = "file-manager-server";
pub const SERVER_VERSION: &str = "1.0.0";

const PATH_FIELD: &str = "path";

/// Build the file manager catalog
pub fn registry() -> Result<OperationRegistry, RegistryError> {
    OperationRegistry::with_operations([
        OperationDefinition::new(
            "list_directory",
            "List contents of a directory",
            InputSchema::new().guarded_path(PATH_FIELD, "Directory path to list"),
            |args: Arguments| async move {
                list_directory(args.string(PATH_FIELD)?, args.guarded_path(PATH_FIELD)?).await
            },
        ),
        OperationDefinition::new(
            "read_file",
            "Read contents of a file",
            InputSchema::new().guarded_path(PATH_FIELD, "File path to read"),
            |args: Arguments| async move {
                read_file(args.string(PATH_FIELD)?, args.guarded_path(PATH_FIELD)?).await
            },
        ),
        OperationDefinition::new(
            "create_directory",
            "Create a new directory",
            InputSchema::new().guarded_path(PATH_FIELD, "Directory path to create"),
            |args: Arguments| async move {
                create_directory(args.string(PATH_FIELD)?, args.guarded_path(PATH_FIELD)?).await
            },
        ),
    ])
}

async fn list_directory(requested: &str, resolved: &Path) -> Result<String, InvocationError> {
    let mut reader = tokio::fs::read_dir(resolved)
        .await
        .map_err(|e| InvocationError::io(format!("Failed to list directory '{requested}'"), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| InvocationError::io(format!("Failed to list directory '{requested}'"), e))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let lines: Vec<String> = entries
        .iter()
        .map(|(name, is_dir)| format!("{} {}", if *is_dir { "📁" } else { "📄" }, name))
        .collect();

    Ok(format!(
        "Directory listing for {requested}:\n{}",
        lines.join("\n")
    ))
}

async fn read_file(requested: &str, resolved: &Path) -> Result<String, InvocationError> {
    let bytes = tokio::fs::read(resolved)
        .await
        .map_err(|e| InvocationError::io(format!("Failed to read file '{requested}'"), e))?;

    Ok(format!(
        "Contents of {requested}:\n\n{}",
        String::from_utf8_lossy(&bytes)
    ))
}

async fn create_directory(requested: &str, resolved: &Path) -> Result<String, InvocationError> {
    tokio::fs::create_dir_all(resolved).await.map_err(|e| {
        InvocationError::io(format!("Failed to create directory '{requested}'"), e)
    })?;

    tracing::info!(path = %resolved.display(), "directory created");
    Ok(format!("Successfully created directory: {requested}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::dispatch::Dispatcher;
    use crate::mcp::guard::{AllowedRootSet, GuardMode};
    use serde_json::json;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let roots = AllowedRootSet::new(dir.path(), [dir.path()], GuardMode::Lexical);
        let dispatcher = Dispatcher::new(registry().unwrap()).with_allowed_roots(roots);
        (dir, dispatcher)
    }

    #[tokio::test]
    async fn test_list_directory_sorted() {
        let (dir, dispatcher) = sandbox();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::write(dir.path().join("alpha.txt"), "a").unwrap();
        std::fs::write(dir.path().join("beta.md"), "b").unwrap();

        let result = dispatcher
            .invoke("list_directory", &json!({"path": "."}))
            .await;

        assert_eq!(
            result.message(),
            "Directory listing for .:\n📄 alpha.txt\n📄 beta.md\n📁 zeta"
        );
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let (_dir, dispatcher) = sandbox();
        let result = dispatcher
            .invoke("list_directory", &json!({"path": ""}))
            .await;

        assert_eq!(result.message(), "Directory listing for :\n");
    }

    #[tokio::test]
    async fn test_read_file() {
        let (dir, dispatcher) = sandbox();
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/todo.txt"), "buy milk\n").unwrap();

        let result = dispatcher
            .invoke("read_file", &json!({"path": "notes/todo.txt"}))
            .await;

        assert_eq!(result.message(), "Contents of notes/todo.txt:\n\nbuy milk\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_failure() {
        let (_dir, dispatcher) = sandbox();
        let result = dispatcher
            .invoke("read_file", &json!({"path": "nope.txt"}))
            .await;

        assert!(!result.is_success());
        assert!(result.message().starts_with("Failed to read file 'nope.txt': "));
    }

    #[tokio::test]
    async fn test_create_directory_is_recursive() {
        let (dir, dispatcher) = sandbox();
        let result = dispatcher
            .invoke("create_directory", &json!({"path": "a/b/c"}))
            .await;

        assert_eq!(result.message(), "Successfully created directory: a/b/c");
        assert!(dir.path().join("a/b/c").is_dir());

        // Creating it again is not an error.
        let again = dispatcher
            .invoke("create_directory", &json!({"path": "a/b/c"}))
            .await;
        assert!(again.is_success());
    }

    #[tokio::test]
    async fn test_escape_is_denied_without_side_effects() {
        let (dir, dispatcher) = sandbox();
        let outside = dir.path().parent().unwrap().join("escaped-by-test");

        let result = dispatcher
            .invoke("create_directory", &json!({"path": "../escaped-by-test"}))
            .await;

        assert_eq!(result.message(), "Access denied: path not allowed");
        assert!(!outside.exists());
    }

    #[tokio::test]
    async fn test_absolute_path_outside_root_is_denied() {
        let (_dir, dispatcher) = sandbox();
        let result = dispatcher
            .invoke("read_file", &json!({"path": "/etc/passwd"}))
            .await;

        assert_eq!(result.message(), "Access denied: path not allowed");
    }

    #[tokio::test]
    async fn test_missing_path_argument() {
        let (_dir, dispatcher) = sandbox();
        let result = dispatcher.invoke("read_file", &json!({})).await;

        assert_eq!(result.message(), "Missing required argument: path");
    }
}
