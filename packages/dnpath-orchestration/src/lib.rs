/*
 * dnpath Orchestration - DN path materialization
 *
 * Ensures every ancestor container of a distinguished name exists,
 * creating the missing ones parents-first against an injected directory
 * client.
 *
 * Architecture:
 * - Endpoint resolution (configured server, then discovery)
 * - Materializer (sequential exists/create walk, fail-fast)
 * - Settings (YAML + DNPATH_* environment)
 * - Reporting (text / JSON)
 */

// Public modules
pub mod config;
pub mod endpoint;
pub mod error;
pub mod materializer;
pub mod report;

// Re-exports
pub use config::{ConfigError, ConfigResult, Settings, SettingsOverrides};
pub use endpoint::resolve_endpoint;
pub use error::{ErrorCategory, MaterializeError, Result};
pub use materializer::{MaterializeOptions, MaterializeOutcome, Materializer};
