//! Dispatcher: the composition root of the relay.
//!
//! For each raw payload, in this fixed order:
//! 1. classify → `(actionName, eventKey)`
//! 2. reduce → canonical payload, or the reason there is none
//! 3. for package payloads, check provenance with the package gate
//!
//! [`Dispatcher::route`] does all of that synchronously and without side
//! effects. [`Dispatcher::dispatch`] logs the decision and publishes to the
//! [`EventBus`]. Nothing about a payload's shape ever becomes an error; only
//! bus and serialization failures do.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, Instrument};

use crate::bus::EventBus;
use crate::classify::{Classification, Classifier};
use crate::config::RelayConfig;
use crate::domain::{CanonicalEvent, CanonicalPayload, DispatchError};
use crate::flatten::strip_fields_by_key_markers;
use crate::metrics::METRICS;
use crate::obs::{
    dispatch_span, emit_bus_error, emit_event_published, emit_event_suppressed,
    emit_event_unhandled,
};
use crate::package_gate::evaluate_package;
use crate::reduce::try_reduce;

/// What should happen to a routed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Publish,
    /// No canonical payload; `reason` explains why.
    Unhandled { reason: String },
    /// Package provenance check failed.
    Suppressed { reason: String },
}

/// A classified, reduced and checked payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub event: CanonicalEvent,
    /// `"<provider>.<eventKey>.<actionName>"`.
    pub name: String,
    pub decision: Decision,
}

/// What [`Dispatcher::dispatch`] did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `digest` is the SHA-256 of the published canonical event.
    Published { name: String, digest: String },
    /// `emitted` is true when a `null`-payload event was still published.
    Unhandled { name: String, emitted: bool },
    Suppressed { name: String },
}

impl DispatchOutcome {
    pub fn name(&self) -> &str {
        match self {
            DispatchOutcome::Published { name, .. }
            | DispatchOutcome::Unhandled { name, .. }
            | DispatchOutcome::Suppressed { name } => name,
        }
    }
}

pub struct Dispatcher<B: EventBus> {
    bus: Arc<B>,
    config: RelayConfig,
    classifier: Classifier,
}

impl<B: EventBus> Dispatcher<B> {
    pub fn new(bus: Arc<B>, config: RelayConfig) -> Self {
        let classifier = Classifier::new(config.key_strategy);
        Self {
            bus,
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<B> {
        &self.bus
    }

    /// Classify, reduce and check `raw` without publishing anything.
    pub fn route(&self, raw: &Value) -> Route {
        let Classification {
            action_name,
            event_key,
        } = self.classifier.classify(raw);

        let (payload, decision) = match try_reduce(event_key.as_deref().unwrap_or_default(), raw)
        {
            Ok(payload) => {
                let decision = match payload.as_package().map(evaluate_package) {
                    Some(verdict) if !verdict.passed => Decision::Suppressed {
                        reason: verdict.reason().unwrap_or_default(),
                    },
                    _ => Decision::Publish,
                };
                (Some(payload), decision)
            }
            Err(err) => (
                None,
                Decision::Unhandled {
                    reason: err.to_string(),
                },
            ),
        };

        let event = CanonicalEvent::new(action_name, event_key, payload);
        let name = event.event_name(&self.config.provider);
        Route {
            event,
            name,
            decision,
        }
    }

    /// The JSON handed to the bus for `payload`, with configured markers stripped.
    pub fn outgoing(&self, payload: &CanonicalPayload) -> Result<Value, DispatchError> {
        let value = payload.to_value()?;
        Ok(strip_fields_by_key_markers(
            &value,
            &self.config.strip_markers,
            &self.config.delimiter,
        ))
    }

    /// Route `raw` and act on the decision.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Bus`: the bus rejected a publish.
    /// - `DispatchError::Serialization`: a canonical payload or its digest input
    ///   failed to serialize; nothing is published.
    pub async fn dispatch(&self, raw: &Value) -> Result<DispatchOutcome, DispatchError> {
        METRICS.inc_received();
        let route = self.route(raw);
        let span = dispatch_span(&route.name);
        self.act(route).instrument(span).await
    }

    async fn act(&self, route: Route) -> Result<DispatchOutcome, DispatchError> {
        let Route {
            event,
            name,
            decision,
        } = route;

        match decision {
            Decision::Publish => {
                let Some(payload) = event.payload.as_ref() else {
                    return Ok(DispatchOutcome::Unhandled {
                        name,
                        emitted: false,
                    });
                };
                let body = self.outgoing(payload)?;
                let digest = event.digest()?;
                self.publish(&name, body).await?;
                emit_event_published(&name, &digest);
                METRICS.inc_published();
                Ok(DispatchOutcome::Published { name, digest })
            }
            Decision::Unhandled { reason } => {
                let emitted = self.config.emit_unhandled;
                emit_event_unhandled(&name, &reason, emitted);
                METRICS.inc_unhandled();
                if emitted {
                    self.publish(&name, Value::Null).await?;
                }
                Ok(DispatchOutcome::Unhandled { name, emitted })
            }
            Decision::Suppressed { reason } => {
                emit_event_suppressed(&name, &reason);
                METRICS.inc_suppressed();
                Ok(DispatchOutcome::Suppressed { name })
            }
        }
    }

    async fn publish(&self, name: &str, body: Value) -> Result<(), DispatchError> {
        debug!(event_name = %name, "publishing");
        if let Err(err) = self.bus.publish(name, body).await {
            emit_bus_error(name, &err);
            METRICS.inc_bus_failures();
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryEventBus;
    use serde_json::json;

    fn dispatcher(config: RelayConfig) -> Dispatcher<MemoryEventBus> {
        Dispatcher::new(Arc::new(MemoryEventBus::new()), config)
    }

    #[test]
    fn route_unknown_shape_is_unhandled() {
        let route = dispatcher(RelayConfig::default()).route(&json!({"foo": 1, "bar": 2}));
        assert_eq!(route.name, "github.foo.foo");
        assert!(route.event.is_unhandled());
        assert!(matches!(route.decision, Decision::Unhandled { .. }));
    }

    #[test]
    fn route_malformed_input_is_unhandled() {
        let route = dispatcher(RelayConfig::default()).route(&json!("not an object"));
        assert_eq!(route.name, "github.unknown.unknown");
        assert_eq!(
            route.decision,
            Decision::Unhandled {
                reason: "payload is not an object".into()
            }
        );
    }

    #[test]
    fn route_uses_configured_provider() {
        let d = dispatcher(RelayConfig::default().with_provider("gitea"));
        let route = d.route(&json!({"action": "created", "repository": {"full_name": "a/b"}}));
        assert_eq!(route.name, "gitea.repository.created");
        assert_eq!(route.decision, Decision::Publish);
    }

    #[test]
    fn outgoing_strips_configured_markers() {
        let d = dispatcher(RelayConfig::default().with_strip_marker("_url"));
        let route = d.route(&json!({
            "action": "opened",
            "pull_request": {"title": "t", "url": "u", "html_url": "h"}
        }));
        let body = d
            .outgoing(route.event.payload.as_ref().expect("payload"))
            .expect("outgoing");
        assert_eq!(body["title"], "t");
        assert_eq!(body["url"], "u");
        assert!(body.get("html_url").is_none());
    }

    #[tokio::test]
    async fn unhandled_is_published_when_configured() {
        let d = dispatcher(RelayConfig::default().with_emit_unhandled(true));
        let outcome = d.dispatch(&json!({"zen": "hi"})).await.expect("dispatch");
        assert_eq!(
            outcome,
            DispatchOutcome::Unhandled {
                name: "github.zen.zen".into(),
                emitted: true
            }
        );
        let events = d.bus().events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, Value::Null);
    }

    #[tokio::test]
    async fn published_outcome_carries_event_digest() {
        let d = dispatcher(RelayConfig::default());
        let raw = json!({"action": "created", "sender": {"login": "octocat"}});
        let expected = d.route(&raw).event.digest().expect("digest");

        let outcome = d.dispatch(&raw).await.expect("dispatch");
        let DispatchOutcome::Published { name, digest } = outcome else {
            panic!("expected publish");
        };
        assert_eq!(name, "github.sender.created");
        assert_eq!(digest, expected);
        assert_eq!(digest.len(), 64);
    }

    #[tokio::test]
    async fn bus_failure_is_returned() {
        let d = dispatcher(RelayConfig::default());
        d.bus().close();
        let err = d
            .dispatch(&json!({"sender": {"login": "octocat"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Bus(_)));
    }
}
