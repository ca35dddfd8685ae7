//! Canonical event envelopes and the builder that assembles them.
//!
//! `EnvelopeBuilder::build` is the pure core of the pipeline: one
//! lifecycle notification in, one immutable envelope out. Deterministic
//! except for the injected clock and ID source.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::{EventId, SenderDescriptor};
use crate::signal::{NotificationKind, SignalArgs};
use crate::snapshot::{display_value, InstanceSnapshot};
use crate::time::{Clock, IdSource, RandomIds, RealClock};
use crate::{CONTENT_TYPE_JSON, DEFAULT_SOURCE};

/// Payload carried in the envelope body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Pass-through notification arguments, after extracting the
    /// recognized ones.
    pub signal_kwargs: serde_json::Map<String, Value>,

    /// Database table of the resolved model.
    pub db_table: String,

    /// Instance snapshot; absent when no instance participated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InstanceSnapshot>,
}

/// The canonical unit produced and transmitted.
///
/// Constructed once per notification, immediately serialized and
/// dispatched, never persisted or mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Fresh unique identifier, never reused.
    pub id: EventId,

    /// Configured source identifier.
    pub source: String,

    /// `DCE:<app>.<model>` with a `/<pk>` suffix when an instance
    /// participated.
    pub subject: String,

    /// Canonical dotted event-type string.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Build time, UTC.
    pub time: DateTime<Utc>,

    /// Always `application/json`.
    pub content_type: String,

    /// Out-of-band metadata: `djangoapp`, `djangomodel`, and
    /// `originid` duplicating `id`.
    pub extensions: BTreeMap<String, String>,

    /// The payload.
    pub data: EventData,
}

/// Builds canonical envelopes from lifecycle notifications.
///
/// Owns the configured source string plus the clock and ID source. The
/// defaults (`RealClock`, `RandomIds`) serve production; tests swap in
/// deterministic implementations.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    source: String,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl EnvelopeBuilder {
    /// Creates a builder emitting envelopes with the given source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            clock: Arc::new(RealClock::new()),
            ids: Arc::new(RandomIds::new()),
        }
    }

    /// Replaces the clock, typically with a `TestClock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the ID source, typically with `SequentialIds`.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Builds the envelope for one lifecycle notification.
    ///
    /// When the notification concerns a many-to-many change, the
    /// participating instance's own model may differ from the declared
    /// sender; in that case the instance's descriptor wins for
    /// app/model/table resolution, a `model` argument is rewritten to
    /// its model-name string, and `pk_set` becomes an ordered
    /// `updated_pks` list.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDescriptor` when the sender (or the
    /// substituted instance descriptor) is missing required metadata.
    pub fn build(
        &self,
        sender: &SenderDescriptor,
        kind: NotificationKind,
        args: SignalArgs,
    ) -> Result<EventEnvelope> {
        sender.validate()?;

        let SignalArgs { instance, model, pk_set, mut kwargs } = args;

        // The signal slot is represented by `kind`; it never passes
        // through into signal_kwargs.
        kwargs.remove("signal");

        if let Some(participant) = model {
            kwargs.insert("model".to_string(), Value::String(participant.model_name.clone()));
        }
        if let Some(pks) = pk_set {
            kwargs.insert("updated_pks".to_string(), Value::Array(pks));
        }

        let (subject, snapshot, resolved) = match instance {
            Some(instance) => {
                let resolved = if instance.descriptor.same_model(sender) {
                    sender.clone()
                } else {
                    // m2m change: resolve against the instance's model.
                    let own = (*instance.descriptor).clone();
                    own.validate()?;
                    own
                };
                let pk = instance
                    .pk
                    .as_ref()
                    .map_or_else(|| "None".to_string(), display_value);
                let subject =
                    format!("DCE:{}.{}/{}", resolved.app_label, resolved.model_name, pk);
                (subject, Some(InstanceSnapshot::of(&instance)), resolved)
            },
            None => {
                let subject = format!("DCE:{}.{}", sender.app_label, sender.model_name);
                (subject, None, sender.clone())
            },
        };

        let id = self.ids.next_id();
        let mut extensions = BTreeMap::new();
        extensions.insert("djangoapp".to_string(), resolved.app_label.clone());
        extensions.insert("djangomodel".to_string(), resolved.model_name.clone());
        extensions.insert("originid".to_string(), id.to_string());

        Ok(EventEnvelope {
            id,
            source: self.source.clone(),
            subject,
            event_type: kind.event_type().to_string(),
            time: self.clock.now_utc(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            extensions,
            data: EventData {
                signal_kwargs: kwargs,
                db_table: resolved.db_table,
                data: snapshot,
            },
        })
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}
