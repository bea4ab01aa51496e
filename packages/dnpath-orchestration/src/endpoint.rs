//! Directory endpoint resolution
//!
//! Runs once, before any traversal: a configured endpoint is used when it
//! answers a ping, otherwise the locator is asked for a server serving the
//! domain named by the root's `DC` components.

use dnpath_core::{domain_hint, DirectoryError, ErrorKind, ServerLocator};
use tracing::{info, warn};

/// Pick the endpoint a run will talk to
///
/// # Errors
///
/// Always `ErrorKind::Unreachable` when no endpoint can be found.
pub async fn resolve_endpoint(
    requested: Option<&str>,
    root: &str,
    locator: &dyn ServerLocator,
) -> Result<String, DirectoryError> {
    if let Some(endpoint) = requested {
        if locator.ping(endpoint).await {
            info!("Using configured server {}", endpoint);
            return Ok(endpoint.to_string());
        }
        warn!(
            "Configured server {} is unreachable, falling back to discovery",
            endpoint
        );
    }

    let hint = domain_hint(root).ok_or_else(|| {
        DirectoryError::unreachable(format!(
            "No server configured and root '{}' names no domain to discover one for",
            root
        ))
    })?;

    match locator.resolve_server(&hint).await {
        Ok(server) => {
            info!("Resolved server {} for domain {}", server, hint);
            Ok(server)
        }
        Err(e) if e.kind == ErrorKind::Unreachable => Err(e),
        Err(e) => Err(DirectoryError::unreachable(format!(
            "Could not resolve a server for domain '{}'",
            hint
        ))
        .with_source(e)),
    }
}
