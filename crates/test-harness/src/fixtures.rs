//! Model fixtures shared by integration tests.
//!
//! The fake source model mirrors the reference scenario: a two-field
//! model in app `app`, instance pk 1.

use std::sync::Arc;

use ormcast_core::{FieldDescriptor, ModelInstance, SenderDescriptor};

/// Descriptor for the reference `FakeSourceModel`.
pub fn fake_source_descriptor() -> Arc<SenderDescriptor> {
    Arc::new(
        SenderDescriptor::new("app", "fakesourcemodel", "app_fakesourcemodel")
            .with_field(FieldDescriptor::scalar("name"))
            .with_field(FieldDescriptor::scalar("enabled")),
    )
}

/// The reference instance: pk 1, name "fake_source", enabled.
pub fn fake_source_instance() -> ModelInstance {
    ModelInstance::new(fake_source_descriptor())
        .with_pk(1)
        .with_value("name", "fake_source")
        .with_value("enabled", true)
}
