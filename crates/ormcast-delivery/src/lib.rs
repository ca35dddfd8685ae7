//! Wire encoding and HTTP dispatch for ORM lifecycle events.
//!
//! This crate takes the envelopes `ormcast-core` builds and delivers
//! them to a configured sink: binary-mode encoding (event metadata as
//! `ce-*` headers, JSON payload as body), one POST per envelope, and a
//! strict error contract — any transport failure or non-2xx response
//! surfaces to the caller, a missing sink is a deliberate no-op.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌─────────────────┐   ┌────────────────┐
//! │ SignalEmitter │──▶│ EnvelopeBuilder │──▶│ DispatchClient │──▶ sink
//! └───────────────┘   └─────────────────┘   └────────────────┘
//!        │                (ormcast-core)        wire::encode
//!        ▼
//! ┌────────────────┐
//! │ SignalRegistry │  which models emit for which lifecycle points
//! └────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ormcast_core::{NotificationKind, SenderDescriptor, SignalArgs};
//! use ormcast_delivery::{EmitterConfig, SignalEmitter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EmitterConfig::load()?;
//! let mut emitter = SignalEmitter::new(config)?;
//!
//! let widget = SenderDescriptor::new("app", "widget", "app_widget");
//! emitter.registry_mut().register(&widget);
//!
//! emitter.emit_registered(&widget, NotificationKind::PostSave, SignalArgs::new()).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod emitter;
pub mod error;
pub mod wire;

pub use client::{ClientConfig, DispatchClient, DispatchOutcome, DispatchReceipt};
pub use config::EmitterConfig;
pub use emitter::{SignalEmitter, SignalRegistry, DEFAULT_SIGNALS};
pub use error::{DeliveryError, EmitError, Result};

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
