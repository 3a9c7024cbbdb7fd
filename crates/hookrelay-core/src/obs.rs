//! Structured observability hooks for dispatch decisions.
//!
//! This module provides:
//! - A dispatch-scoped tracing span via [`dispatch_span`]
//! - Emission functions for each decision: published, unhandled, suppressed, bus failure
//!
//! Events are emitted at `info!` level except bus failures (`warn!`).
//! Filter with `HOOKRELAY_LOG` or `RUST_LOG`; see [`crate::telemetry`].

use tracing::{info, warn};

/// Span tagged with the rendered event name, entered for one dispatch.
pub fn dispatch_span(event_name: &str) -> tracing::Span {
    tracing::info_span!("hookrelay.dispatch", event_name = %event_name)
}

/// Emit event: canonical event handed to the bus.
///
/// ```ignore
/// emit_event_published("github.package.published", "3f1a…");
/// // logs: event=relay.published event_name=github.package.published digest=3f1a…
/// ```
pub fn emit_event_published(event_name: &str, digest: &str) {
    info!(event = "relay.published", event_name = %event_name, digest = %digest);
}

/// Emit event: payload recognized but not reducible (shape mismatch or unknown key).
pub fn emit_event_unhandled(event_name: &str, reason: &str, emitted: bool) {
    info!(
        event = "relay.unhandled",
        event_name = %event_name,
        reason = %reason,
        emitted = emitted,
    );
}

/// Emit event: package event withheld by the provenance gate.
pub fn emit_event_suppressed(event_name: &str, reason: &str) {
    info!(event = "relay.suppressed", event_name = %event_name, reason = %reason);
}

/// Emit event: the bus refused an event (warning level).
pub fn emit_bus_error(event_name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "relay.bus_error", event_name = %event_name, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_span_create() {
        let span = dispatch_span("github.commit.pushed");
        let _entered = span.enter();
        emit_event_published("github.commit.pushed", "abc");
    }
}
