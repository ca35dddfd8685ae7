//! Domain model and envelope construction for ORM lifecycle events.
//!
//! Provides the strongly-typed notification taxonomy, sender/field
//! descriptors, instance snapshots, and the pure envelope builder that
//! turns a lifecycle notification into a canonical event envelope. No
//! I/O happens in this crate; delivery lives in `ormcast-delivery`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod model;
pub mod signal;
pub mod snapshot;
pub mod time;

pub use envelope::{EnvelopeBuilder, EventData, EventEnvelope};
pub use error::{CoreError, Result};
pub use model::{EventId, FieldDescriptor, FieldKind, ModelInstance, SenderDescriptor};
pub use signal::{NotificationKind, SignalArgs};
pub use snapshot::InstanceSnapshot;
pub use time::{Clock, IdSource, RandomIds, RealClock, SequentialIds, TestClock};

/// Default event source identifier when none is configured.
pub const DEFAULT_SOURCE: &str = "django-orm";

/// Content type carried by every envelope payload.
pub const CONTENT_TYPE_JSON: &str = "application/json";
