//! dnpath-core - Distinguished-name model and directory ports
//!
//! Parses a DN such as `OU=a,OU=b,DC=x,DC=y` into its root and hierarchy
//! segments, orders the segments parents-first, and defines the
//! `DirectoryClient` / `ServerLocator` seams the materializer runs against.
//!
//! ## Usage
//!
//! ```rust
//! use dnpath_core::{parse, plan};
//!
//! let parsed = parse("OU=a,OU=b,DC=x,DC=y").unwrap();
//! let plan = plan(&parsed);
//!
//! let order: Vec<_> = plan.iter().map(|s| s.raw.as_str()).collect();
//! assert_eq!(order, vec!["OU=b", "OU=a"]);
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod parser;
pub mod planner;

pub use error::{DirectoryError, ErrorKind, FormatError, Result};

pub use domain::{
    dn_key, ActionKind, ActionRecord, BuildPlan, ContainerEntry, DirectoryClient, ParsedPath,
    PathSegment, SegmentKind, ServerLocator,
};
pub use infrastructure::{DirectoryCall, InMemoryDirectory};
#[cfg(feature = "sqlite")]
pub use infrastructure::{SqliteDirectory, SqliteLocator};
pub use parser::{domain_hint, parse};
pub use planner::plan;
