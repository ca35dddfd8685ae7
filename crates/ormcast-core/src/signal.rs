//! Lifecycle notification taxonomy and call arguments.
//!
//! `NotificationKind` is the closed set of ORM lifecycle points, each
//! mapped to a fixed dotted event-type string. `SignalArgs` is the
//! typed kwargs bag the integration layer assembles per call: the
//! recognized slots (`instance`, `model`, `pk_set`) are extracted
//! explicitly, everything else passes through verbatim into
//! `signal_kwargs`.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::model::{ModelInstance, SenderDescriptor};

/// One of the ORM's lifecycle notification points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Before instance construction.
    PreInit,
    /// After instance construction.
    PostInit,
    /// Before a save.
    PreSave,
    /// After a save.
    PostSave,
    /// A many-to-many relation changed.
    M2mChange,
    /// Before a delete.
    PreDelete,
    /// After a delete.
    PostDelete,
    /// Before a schema migration is applied.
    PreMigrate,
    /// After a schema migration is applied.
    PostMigrate,
}

impl NotificationKind {
    /// Every lifecycle point, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::PreInit,
        Self::PostInit,
        Self::PreSave,
        Self::PostSave,
        Self::M2mChange,
        Self::PreDelete,
        Self::PostDelete,
        Self::PreMigrate,
        Self::PostMigrate,
    ];

    /// Canonical dotted event-type string. Total and fixed.
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::PreInit => "django.orm.pre.init",
            Self::PostInit => "django.orm.post.init",
            Self::PreSave => "django.orm.pre.save",
            Self::PostSave => "django.orm.post.save",
            Self::M2mChange => "django.orm.m2m.change",
            Self::PreDelete => "django.orm.pre.delete",
            Self::PostDelete => "django.orm.post.delete",
            Self::PreMigrate => "django.orm.pre.migrate",
            Self::PostMigrate => "django.orm.post.migrate",
        }
    }

    /// Resolves an event-type string back to its lifecycle point.
    ///
    /// Accepts the canonical dotted form and the legacy
    /// underscore-separated aliases still found in stored events. Only
    /// the dotted form is ever emitted.
    pub fn from_event_type(name: &str) -> Result<Self> {
        match name {
            "django.orm.pre.init" | "django.orm.pre_init" => Ok(Self::PreInit),
            "django.orm.post.init" | "django.orm.post_init" => Ok(Self::PostInit),
            "django.orm.pre.save" | "django.orm.pre_save" => Ok(Self::PreSave),
            "django.orm.post.save" | "django.orm.post_save" => Ok(Self::PostSave),
            "django.orm.m2m.change" | "django.orm.m2m_change" => Ok(Self::M2mChange),
            "django.orm.pre.delete" | "django.orm.pre_delete" => Ok(Self::PreDelete),
            "django.orm.post.delete" | "django.orm.post_delete" => Ok(Self::PostDelete),
            "django.orm.pre.migrate" | "django.orm.pre_migrate" => Ok(Self::PreMigrate),
            "django.orm.post.migrate" | "django.orm.post_migrate" => Ok(Self::PostMigrate),
            other => Err(CoreError::unknown_signal(other)),
        }
    }

    /// Whether calls for this lifecycle point carry an `instance`.
    ///
    /// Init and migration notifications do not; everything else does.
    pub const fn expects_instance(self) -> bool {
        !matches!(
            self,
            Self::PreInit | Self::PostInit | Self::PreMigrate | Self::PostMigrate
        )
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl FromStr for NotificationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_event_type(s)
    }
}

/// Arguments accompanying one lifecycle notification.
///
/// Built by the integration layer per call. Recognized slots are typed;
/// the remaining kwargs (`created`, `using`, `raw`, ...) stay a JSON
/// mapping and end up verbatim in the envelope's `signal_kwargs`.
#[derive(Debug, Clone, Default)]
pub struct SignalArgs {
    pub(crate) instance: Option<ModelInstance>,
    pub(crate) model: Option<Arc<SenderDescriptor>>,
    pub(crate) pk_set: Option<Vec<Value>>,
    pub(crate) kwargs: Map<String, Value>,
}

impl SignalArgs {
    /// Creates an empty argument bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the participating instance.
    #[must_use]
    pub fn with_instance(mut self, instance: ModelInstance) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Attaches the other model of a many-to-many change.
    #[must_use]
    pub fn with_model(mut self, model: Arc<SenderDescriptor>) -> Self {
        self.model = Some(model);
        self
    }

    /// Attaches the ordered primary keys of a many-to-many change.
    #[must_use]
    pub fn with_pk_set(mut self, pk_set: Vec<Value>) -> Self {
        self.pk_set = Some(pk_set);
        self
    }

    /// Adds a pass-through kwarg.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Returns the attached instance, if any.
    pub fn instance(&self) -> Option<&ModelInstance> {
        self.instance.as_ref()
    }
}
