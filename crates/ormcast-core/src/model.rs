//! Sender descriptors, instance records, and strongly-typed identifiers.
//!
//! The integration layer resolves model metadata once, at registration
//! time, into `SenderDescriptor` values; the core never inspects a live
//! framework object. Likewise `ModelInstance` is an explicit value
//! record standing in for an ORM object, carrying its field values and
//! related instances as plain data.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::snapshot::display_value;

/// Strongly-typed event identifier.
///
/// Wraps a UUID to prevent mixing with other ID types. Freshly assigned
/// per envelope and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Creates a new random event ID.
    ///
    /// Uses UUID v4 for globally unique identifiers without coordination.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Kind of a model field, deciding how the snapshot walker treats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Plain column; snapshotted as the string form of its value.
    Scalar,
    /// Reverse to-many relation; snapshotted as nested instance records
    /// under its exposed accessor name.
    ToManyRel,
    /// Declared many-to-many field; snapshotted as the list of currently
    /// associated instances under the field's own name.
    ManyToMany,
}

/// Describes one field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as declared on the model.
    pub name: String,
    /// How the field participates in snapshots.
    pub kind: FieldKind,
    /// Declared related name for reverse relations, if any.
    pub related_name: Option<String>,
}

impl FieldDescriptor {
    /// Creates a scalar field descriptor.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FieldKind::Scalar, related_name: None }
    }

    /// Creates a reverse to-many relation descriptor.
    pub fn to_many(name: impl Into<String>, related_name: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::ToManyRel,
            related_name: related_name.map(str::to_string),
        }
    }

    /// Creates a many-to-many field descriptor.
    pub fn many_to_many(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FieldKind::ManyToMany, related_name: None }
    }

    /// Returns true for any relation kind.
    pub fn is_relation(&self) -> bool {
        self.kind != FieldKind::Scalar
    }

    /// Name under which the field appears in a snapshot.
    ///
    /// Reverse relations expose their declared related name, falling
    /// back to `<field>_set` when unset. All other fields use their own
    /// name.
    pub fn exposed_name(&self) -> String {
        match self.kind {
            FieldKind::ToManyRel => self
                .related_name
                .clone()
                .unwrap_or_else(|| format!("{}_set", self.name)),
            _ => self.name.clone(),
        }
    }
}

/// Identifies the model a notification originates from.
///
/// Immutable once built; supplied per call by the integration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderDescriptor {
    /// Application label the model belongs to.
    pub app_label: String,
    /// Lower-cased model name.
    pub model_name: String,
    /// Database table backing the model.
    pub db_table: String,
    /// Ordered field descriptors, walked in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl SenderDescriptor {
    /// Creates a descriptor with no fields.
    pub fn new(
        app_label: impl Into<String>,
        model_name: impl Into<String>,
        db_table: impl Into<String>,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            model_name: model_name.into(),
            db_table: db_table.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field descriptor, preserving declaration order.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Checks the descriptor carries the metadata every envelope needs.
    pub fn validate(&self) -> Result<()> {
        if self.app_label.is_empty() {
            return Err(CoreError::invalid_descriptor("empty app label"));
        }
        if self.model_name.is_empty() {
            return Err(CoreError::invalid_descriptor("empty model name"));
        }
        if self.db_table.is_empty() {
            return Err(CoreError::invalid_descriptor(format!(
                "model {}.{} has no db table",
                self.app_label, self.model_name
            )));
        }
        Ok(())
    }

    /// Returns true when both descriptors name the same model.
    pub fn same_model(&self, other: &SenderDescriptor) -> bool {
        self.app_label == other.app_label && self.model_name == other.model_name
    }
}

impl fmt::Display for SenderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

/// Explicit value record for an ORM object instance.
///
/// Carries the instance's descriptor, primary key, scalar field values,
/// and related instances per relation field. The snapshot walker
/// consumes these instead of reflecting over live framework objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    /// Descriptor of the instance's own model.
    pub descriptor: Arc<SenderDescriptor>,
    /// Primary key value, absent for unsaved instances.
    pub pk: Option<Value>,
    values: Vec<(String, Value)>,
    relations: Vec<(String, Vec<ModelInstance>)>,
}

impl ModelInstance {
    /// Creates an instance record for the given model.
    pub fn new(descriptor: Arc<SenderDescriptor>) -> Self {
        Self { descriptor, pk: None, values: Vec::new(), relations: Vec::new() }
    }

    /// Sets the primary key value.
    #[must_use]
    pub fn with_pk(mut self, pk: impl Into<Value>) -> Self {
        self.pk = Some(pk.into());
        self
    }

    /// Sets a scalar field value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Sets the related instances for a relation field, keyed by the
    /// field's declared name.
    #[must_use]
    pub fn with_related(mut self, name: impl Into<String>, related: Vec<ModelInstance>) -> Self {
        self.relations.push((name.into(), related));
        self
    }

    /// Returns the current value of a scalar field, if set.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the related instances of a relation field.
    pub fn related(&self, name: &str) -> &[ModelInstance] {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map_or(&[], |(_, related)| related.as_slice())
    }

    /// Stable identity used by the snapshot cycle guard.
    ///
    /// Unsaved instances have no identity and cannot be revisited.
    pub fn identity(&self) -> Option<String> {
        self.pk
            .as_ref()
            .map(|pk| format!("{}/{}", self.descriptor, display_value(pk)))
    }
}
