//! Build-then-dispatch pipeline and the model registration table.
//!
//! `SignalEmitter` is the surface the integration layer calls once per
//! lifecycle notification. `emit` is awaited by the producer, so the
//! triggering operation observes the delivery outcome; `emit_detached`
//! is the explicit opt-in for callers that must not block on the sink.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::task::JoinHandle;
use tracing::warn;

use ormcast_core::{EnvelopeBuilder, NotificationKind, SenderDescriptor, SignalArgs};

use crate::client::{ClientConfig, DispatchClient, DispatchOutcome};
use crate::config::EmitterConfig;
use crate::error::{DeliveryError, EmitError};

/// Lifecycle points a model is registered for when none are named,
/// matching the historical default of save and delete only.
pub const DEFAULT_SIGNALS: [NotificationKind; 2] =
    [NotificationKind::PostSave, NotificationKind::PostDelete];

/// Table of registered models and the lifecycle points they emit for.
///
/// Integration layers register each model once; `emit_registered`
/// consults the table so unregistered senders and kinds are skipped
/// without building anything.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    entries: HashMap<(String, String), HashSet<NotificationKind>>,
}

impl SignalRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model for the default lifecycle points.
    pub fn register(&mut self, descriptor: &SenderDescriptor) {
        self.register_for(descriptor, DEFAULT_SIGNALS);
    }

    /// Registers a model for specific lifecycle points.
    pub fn register_for(
        &mut self,
        descriptor: &SenderDescriptor,
        kinds: impl IntoIterator<Item = NotificationKind>,
    ) {
        self.entries
            .entry((descriptor.app_label.clone(), descriptor.model_name.clone()))
            .or_default()
            .extend(kinds);
    }

    /// Returns true when the sender is registered for the kind.
    pub fn is_registered(&self, sender: &SenderDescriptor, kind: NotificationKind) -> bool {
        self.entries
            .get(&(sender.app_label.clone(), sender.model_name.clone()))
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no model is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Converts lifecycle notifications into envelopes and delivers them.
pub struct SignalEmitter {
    config: EmitterConfig,
    builder: EnvelopeBuilder,
    client: DispatchClient,
    registry: SignalRegistry,
}

impl SignalEmitter {
    /// Creates an emitter from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot
    /// be built.
    pub fn new(config: EmitterConfig) -> Result<Self, DeliveryError> {
        let client = DispatchClient::new(config.to_client_config())?;
        let builder = EnvelopeBuilder::new(config.source.clone());
        Ok(Self { config, builder, client, registry: SignalRegistry::new() })
    }

    /// Creates an emitter with an explicit client configuration.
    pub fn with_client_config(
        config: EmitterConfig,
        client_config: ClientConfig,
    ) -> Result<Self, DeliveryError> {
        let client = DispatchClient::new(client_config)?;
        let builder = EnvelopeBuilder::new(config.source.clone());
        Ok(Self { config, builder, client, registry: SignalRegistry::new() })
    }

    /// Replaces the envelope builder, typically to inject a test clock
    /// or ID source.
    #[must_use]
    pub fn with_builder(mut self, builder: EnvelopeBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Mutable access to the registration table.
    pub fn registry_mut(&mut self) -> &mut SignalRegistry {
        &mut self.registry
    }

    /// The registration table.
    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Builds and dispatches one notification, awaiting delivery.
    ///
    /// The producer blocks until the sink responds or the timeout
    /// elapses; both build and delivery failures surface unchanged.
    pub async fn emit(
        &self,
        sender: &SenderDescriptor,
        kind: NotificationKind,
        args: SignalArgs,
    ) -> Result<DispatchOutcome, EmitError> {
        let envelope = self.builder.build(sender, kind, args)?;
        let outcome = self.client.dispatch(&envelope, self.config.sink.as_deref()).await?;
        Ok(outcome)
    }

    /// Like `emit`, but consults the registration table first.
    ///
    /// Unregistered senders and kinds are skipped without building an
    /// envelope or touching the network.
    pub async fn emit_registered(
        &self,
        sender: &SenderDescriptor,
        kind: NotificationKind,
        args: SignalArgs,
    ) -> Result<DispatchOutcome, EmitError> {
        if !self.registry.is_registered(sender, kind) {
            tracing::debug!(sender = %sender, kind = %kind, "sender not registered, skipping");
            return Ok(DispatchOutcome::Skipped);
        }
        self.emit(sender, kind, args).await
    }

    /// Dispatches without blocking the producer.
    ///
    /// Explicit opt-in: the notification handler returns immediately
    /// and delivery completes on the runtime. Failures are logged; the
    /// returned handle lets callers observe the outcome if they want
    /// to.
    pub fn emit_detached(
        self: Arc<Self>,
        sender: SenderDescriptor,
        kind: NotificationKind,
        args: SignalArgs,
    ) -> JoinHandle<Result<DispatchOutcome, EmitError>> {
        tokio::spawn(async move {
            let result = self.emit(&sender, kind, args).await;
            if let Err(e) = &result {
                warn!(sender = %sender, kind = %kind, "detached emit failed: {e}");
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> SenderDescriptor {
        SenderDescriptor::new("app", "widget", "app_widget")
    }

    #[test]
    fn registry_defaults_to_save_and_delete() {
        let mut registry = SignalRegistry::new();
        assert!(registry.is_empty());

        registry.register(&widget());
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered(&widget(), NotificationKind::PostSave));
        assert!(registry.is_registered(&widget(), NotificationKind::PostDelete));
        assert!(!registry.is_registered(&widget(), NotificationKind::PreSave));
    }

    #[test]
    fn registry_accumulates_explicit_kinds() {
        let mut registry = SignalRegistry::new();
        registry.register_for(&widget(), [NotificationKind::PreSave]);
        registry.register_for(&widget(), [NotificationKind::M2mChange]);

        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered(&widget(), NotificationKind::PreSave));
        assert!(registry.is_registered(&widget(), NotificationKind::M2mChange));
        assert!(!registry.is_registered(&widget(), NotificationKind::PostSave));
    }

    #[test]
    fn unknown_models_are_not_registered() {
        let mut registry = SignalRegistry::new();
        registry.register(&widget());

        let other = SenderDescriptor::new("app", "gadget", "app_gadget");
        assert!(!registry.is_registered(&other, NotificationKind::PostSave));
    }
}
