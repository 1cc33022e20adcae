//! Global paths and their validation.
//!
//! A path looks like `^TASK.001.STATUS`: a caret, a namespace, then one or
//! more dot-separated segments. Paths are plain strings at the store
//! boundary; the builders here keep callers from typing them by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level namespaces ("global root nodes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// ^NAV: navigation state, owned by the presentation collaborator
    Nav,
    /// ^SYS: shift start, counters, kernel status
    Sys,
    /// ^TASK: active work
    Task,
    /// ^ARCHIVE: sealed audit records
    Archive,
    /// ^BRIGADE: staff roster
    Brigade,
}

impl Namespace {
    /// Every namespace, for iteration.
    pub const ALL: [Namespace; 5] = [
        Namespace::Nav,
        Namespace::Sys,
        Namespace::Task,
        Namespace::Archive,
        Namespace::Brigade,
    ];

    /// The canonical root of this namespace, including the caret.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Nav => "^NAV",
            Namespace::Sys => "^SYS",
            Namespace::Task => "^TASK",
            Namespace::Archive => "^ARCHIVE",
            Namespace::Brigade => "^BRIGADE",
        }
    }

    /// The namespace a path lives in, if it is one of the known roots.
    pub fn of(path: &str) -> Option<Namespace> {
        let root = path.split('.').next()?;
        Namespace::ALL.into_iter().find(|ns| ns.as_str() == root)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Minimal validator: non-empty, starts with `^`, no whitespace.
pub fn validate(path: &str) -> bool {
    !path.is_empty() && path.starts_with('^') && !path.chars().any(char::is_whitespace)
}


/// A global key built from a namespace and segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalPath(String);

impl GlobalPath {
    fn join(ns: Namespace, parts: &[&str]) -> Self {
        let mut raw = ns.as_str().to_string();
        for part in parts {
            raw.push('.');
            raw.push_str(part);
        }
        GlobalPath(raw)
    }

    /// `^NAV.<key>`
    pub fn nav(key: &str) -> Self {
        Self::join(Namespace::Nav, &[key])
    }

    /// `^SYS.<key>`
    pub fn sys(key: &str) -> Self {
        Self::join(Namespace::Sys, &[key])
    }

    /// `^TASK.<id>.<field>`
    pub fn task(id: &str, field: &str) -> Self {
        Self::join(Namespace::Task, &[id, field])
    }

    /// `^ARCHIVE.<id>.<field>`
    pub fn archive(id: &str, field: &str) -> Self {
        Self::join(Namespace::Archive, &[id, field])
    }

    /// `^BRIGADE.<id>.<field>`
    pub fn brigade(id: &str, field: &str) -> Self {
        Self::join(Namespace::Brigade, &[id, field])
    }

    /// The path text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the path passes `validate`.
    pub fn is_valid(&self) -> bool {
        validate(&self.0)
    }
}

impl AsRef<str> for GlobalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


/// Subtree prefix of an active task, e.g. `^TASK.001`.
pub fn task_prefix(id: &str) -> String {
    format!("{}.{}", Namespace::Task, id)
}


/// Subtree prefix of an archive record, e.g. `^ARCHIVE.001`.
pub fn archive_prefix(id: &str) -> String {
    format!("{}.{}", Namespace::Archive, id)
}


/// The id segment of a `^NS.<id>.…` key, if the key is in `ns`.
pub fn id_segment(key: &str, ns: Namespace) -> Option<&str> {
    let rest = key.strip_prefix(ns.as_str())?.strip_prefix('.')?;
    let id = rest.split('.').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}


/// True if `key` is `prefix` itself or lies beneath it on a segment boundary.
///
/// `^TASK.1` matches `^TASK.1` and `^TASK.1.STATUS` but not `^TASK.10.STATUS`.
/// A prefix that already ends in `.` matches by plain string prefix.
pub fn in_subtree(key: &str, prefix: &str) -> bool {
    if prefix.ends_with('.') {
        return key.starts_with(prefix);
    }
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
