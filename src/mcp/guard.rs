//! Path sandboxing for guarded operations
//!
//! An [`AllowedRootSet`] is fixed at startup. Targets are resolved against the
//! startup base directory, `.`/`..` are collapsed, and the result must sit
//! under one of the roots on a path-component boundary.

use std::path::{Component, Path, PathBuf};

use crate::error::InvocationError;

/// How targets are resolved before the containment check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardMode {
    /// Purely lexical resolution; symbolic links are not followed
    #[default]
    Lexical,

    /// Canonicalize the longest existing ancestor so links cannot escape a root
    ResolveSymlinks,
}

/// Absolute path prefixes an instance is allowed to touch
#[derive(Debug, Clone)]
pub struct AllowedRootSet {
    base: PathBuf,
    roots: Vec<PathBuf>,
    mode: GuardMode,
}

impl AllowedRootSet {
    /// Build a root set. Relative roots are resolved against `base`.
    pub fn new<I, P>(base: impl Into<PathBuf>, roots: I, mode: GuardMode) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let base = normalize_lexically(&base.into());
        let roots = roots
            .into_iter()
            .map(|root| {
                let root = normalize_lexically(&base.join(root.as_ref()));
                match mode {
                    GuardMode::Lexical => root,
                    GuardMode::ResolveSymlinks => canonicalize_existing(&root),
                }
            })
            .collect();

        Self { base, roots, mode }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Absolute, normalized form of `target` as used for the containment check
    pub fn resolve(&self, target: impl AsRef<Path>) -> PathBuf {
        let joined = self.base.join(target.as_ref());
        let normalized = normalize_lexically(&joined);
        match self.mode {
            GuardMode::Lexical => normalized,
            GuardMode::ResolveSymlinks => canonicalize_existing(&normalized),
        }
    }

    /// Whether `target` resolves to a location under one of the roots
    pub fn is_allowed(&self, target: impl AsRef<Path>) -> bool {
        let resolved = self.resolve(target);
        self.contains(&resolved)
    }

    /// Resolve `target` and return the path to operate on, or deny access
    pub fn check(&self, target: &str) -> Result<PathBuf, InvocationError> {
        let resolved = self.resolve(target);
        if self.contains(&resolved) {
            Ok(resolved)
        } else {
            tracing::warn!(path = %target, resolved = %resolved.display(), "access denied");
            Err(InvocationError::AccessDenied {
                path: target.to_string(),
            })
        }
    }

    fn contains(&self, resolved: &Path) -> bool {
        self.roots.iter().any(|root| resolved.starts_with(root))
    }
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Canonicalize the longest existing ancestor and re-append the remainder.
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut remainder = Vec::new();

    loop {
        if let Ok(real) = std::fs::canonicalize(&existing) {
            let mut out = real;
            for part in remainder.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                remainder.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}
