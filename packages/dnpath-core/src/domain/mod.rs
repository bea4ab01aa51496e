//! Domain layer for DN path materialization
//!
//! # Domain Models
//!
//! - `PathSegment`: One `OU=`/`CN=` token of a distinguished name
//! - `ParsedPath`: Root suffix plus hierarchy segments (leaf-to-root)
//! - `BuildPlan`: Segments in creation order (root-to-leaf)
//! - `ActionRecord`: Outcome of visiting one segment
//! - `ContainerEntry`: A container as stored by a directory backend
//!
//! # Port Traits
//!
//! - `DirectoryClient`: Existence queries and container creation
//! - `ServerLocator`: Endpoint reachability and discovery
//!
//! # Examples
//!
//! ```rust,ignore
//! use dnpath_core::{parse, plan, DirectoryClient};
//!
//! async fn example(client: impl DirectoryClient) -> Result<()> {
//!     let parsed = parse("OU=a,OU=b,DC=x,DC=y")?;
//!     let plan = plan(&parsed);
//!
//!     // Parents first: OU=b, then OU=a
//!     for segment in plan.iter() {
//!         println!("{}", segment.raw);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Domain Models
// ═══════════════════════════════════════════════════════════════════════════

/// Object class implied by a segment's type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// `OU=`: organizational unit, created when missing
    Container,
    /// `CN=`: common-name object, never created
    NonContainer,
}

impl SegmentKind {
    /// Kind for a type code, `None` when the code is not a hierarchy code
    pub fn from_type_code(code: &str) -> Option<Self> {
        match code {
            "OU" => Some(SegmentKind::Container),
            "CN" => Some(SegmentKind::NonContainer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Container => "container",
            SegmentKind::NonContainer => "non_container",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One hierarchy node of a distinguished name
///
/// # Examples
///
/// ```rust
/// use dnpath_core::domain::{PathSegment, SegmentKind};
///
/// let segment = PathSegment::new(SegmentKind::Container, "Sales", "OU=Sales");
/// assert_eq!(segment.name, "Sales");
/// assert!(segment.is_container());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Derived from the type prefix of `raw`
    pub kind: SegmentKind,
    /// Value with the type prefix stripped
    pub name: String,
    /// Original token, type prefix intact
    pub raw: String,
}

impl PathSegment {
    pub fn new(kind: SegmentKind, name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            raw: raw.into(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind == SegmentKind::Container
    }

    /// DN of this segment placed directly under `parent`
    pub fn dn_under(&self, parent: &str) -> String {
        format!("{},{}", self.raw, parent)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Result of parsing a distinguished name
///
/// `segments` keep the input order, most-specific first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPath {
    /// Base/domain suffix, comma-joined
    pub root: String,
    /// Hierarchy segments, leaf-to-root
    pub segments: Vec<PathSegment>,
}

impl ParsedPath {
    /// Reassemble the full distinguished name
    pub fn to_dn(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.raw.as_str())
            .chain(std::iter::once(self.root.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_root_only(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::str::FromStr for ParsedPath {
    type Err = crate::FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

/// Segments in creation order (root-to-leaf)
///
/// `plan[0]` sits directly under the root; `plan[i]` sits under
/// `plan[i - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    root: String,
    steps: Vec<PathSegment>,
}

impl BuildPlan {
    pub fn new(root: impl Into<String>, steps: Vec<PathSegment>) -> Self {
        Self {
            root: root.into(),
            steps,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn steps(&self) -> &[PathSegment] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathSegment> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Parent DN of step `index`, assuming every earlier step was placed
    pub fn parent_of(&self, index: usize) -> Option<String> {
        if index >= self.steps.len() {
            return None;
        }
        let mut parent = self.root.clone();
        for step in &self.steps[..index] {
            parent = step.dn_under(&parent);
        }
        Some(parent)
    }

    /// Full DN of step `index`
    pub fn dn_of(&self, index: usize) -> Option<String> {
        self.parent_of(index)
            .map(|parent| self.steps[index].dn_under(&parent))
    }
}

impl<'a> IntoIterator for &'a BuildPlan {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Outcome classification for one visited segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Segment already present, nothing created
    Exists,
    /// Container created (or would be, in dry-run)
    Created,
    /// Missing non-container segment; creation unsupported
    UnsupportedSkip,
    /// Not visited because an ancestor was skipped
    ParentMissing,
    /// Query or creation failed; the run aborted here
    Failed,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Exists => "exists",
            ActionKind::Created => "created",
            ActionKind::UnsupportedSkip => "unsupported_skip",
            ActionKind::ParentMissing => "parent_missing",
            ActionKind::Failed => "failed",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the action log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub segment: PathSegment,
    pub kind: ActionKind,
    /// Candidate DN the action refers to
    pub dn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Produced without side effects (dry-run)
    #[serde(default)]
    pub simulated: bool,
}

impl ActionRecord {
    pub fn new(segment: PathSegment, kind: ActionKind, dn: impl Into<String>) -> Self {
        Self {
            segment,
            kind,
            dn: dn.into(),
            detail: None,
            simulated: false,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }
}

/// Container as stored by a directory backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub dn: String,
    pub name: String,
    pub parent: String,
    /// Containers created by this tool are never protected
    pub protected_from_deletion: bool,
    pub created_at: DateTime<Utc>,
}

impl ContainerEntry {
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        let name = name.into();
        let parent = parent.into();
        Self {
            dn: format!("OU={},{}", name, parent),
            name,
            parent,
            protected_from_deletion: false,
            created_at: Utc::now(),
        }
    }
}

/// Case-insensitive lookup key for a DN
///
/// Directory services compare attribute types and values without regard to
/// case; whitespace after separators is insignificant.
pub fn dn_key(dn: &str) -> String {
    crate::parser::split_tokens(dn)
        .into_iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Traits
// ═══════════════════════════════════════════════════════════════════════════

/// Directory-service client
///
/// Implementations own transport, timeouts and retries. Callers issue one
/// call at a time and await it before deciding on the next.
///
/// # Implementations
///
/// - `InMemoryDirectory`: process-local tree with fault injection
/// - `SqliteDirectory`: directory file backed by SQLite
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Does an entry with this DN exist?
    ///
    /// # Errors
    ///
    /// `Unreachable`, `PermissionDenied` or `Timeout` when the query itself
    /// could not be answered.
    async fn exists(&self, dn: &str) -> Result<bool>;

    /// Create `OU=<name>` directly under `parent`
    ///
    /// The container is created unprotected from accidental deletion.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `parent` already holds an entry named `name`
    /// - `NoSuchParent` if `parent` is not present
    /// - `PermissionDenied` / `Timeout` / `Unreachable` from the transport
    async fn create_container(&self, name: &str, parent: &str) -> Result<()>;
}

/// Reachability check and discovery of directory endpoints
#[async_trait]
pub trait ServerLocator: Send + Sync {
    /// Is `endpoint` usable right now?
    async fn ping(&self, endpoint: &str) -> bool;

    /// Find an endpoint serving `domain_hint` (e.g. `corp.example`)
    ///
    /// # Errors
    ///
    /// `Unreachable` if no endpoint can be found.
    async fn resolve_server(&self, domain_hint: &str) -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
