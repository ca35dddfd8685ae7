//! Instance snapshots: string-form field values with nested relations.
//!
//! A snapshot walks an instance's fields in declaration order: scalar
//! fields become the string form of their value, to-many relations
//! become sequences of nested snapshots keyed under the relation's
//! exposed name, and many-to-many fields become the list of currently
//! associated instances keyed under the field's own name. The walk
//! tracks visited instance identities and truncates on revisit, so a
//! cyclic relation graph terminates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{FieldKind, ModelInstance};

/// Recursive mapping of field name to string value or nested snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceSnapshot(pub Map<String, Value>);

impl InstanceSnapshot {
    /// Snapshots an instance, starting a fresh visited set.
    pub fn of(instance: &ModelInstance) -> Self {
        let mut visited = HashSet::new();
        Self::walk(instance, &mut visited).unwrap_or_default()
    }

    /// Returns the snapshot value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Converts the snapshot into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Recursive walk; returns `None` for an already-visited instance.
    fn walk(instance: &ModelInstance, visited: &mut HashSet<String>) -> Option<Self> {
        if let Some(identity) = instance.identity() {
            if !visited.insert(identity) {
                return None;
            }
        }

        let mut fields = Map::new();
        for field in &instance.descriptor.fields {
            let key = field.exposed_name();
            if fields.contains_key(&key) {
                continue;
            }
            match field.kind {
                FieldKind::Scalar => {
                    let rendered = instance
                        .value(&field.name)
                        .map_or_else(|| "None".to_string(), display_value);
                    fields.insert(key, Value::String(rendered));
                },
                FieldKind::ToManyRel | FieldKind::ManyToMany => {
                    let nested: Vec<Value> = instance
                        .related(&field.name)
                        .iter()
                        .filter_map(|related| Self::walk(related, visited))
                        .map(InstanceSnapshot::into_value)
                        .collect();
                    fields.insert(key, Value::Array(nested));
                },
            }
        }
        Some(Self(fields))
    }
}

/// Renders a field value the way the upstream ORM stringifies it:
/// booleans capitalize, null renders as `None`, strings stay bare.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        composite => composite.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::model::{FieldDescriptor, SenderDescriptor};

    fn widget_descriptor() -> Arc<SenderDescriptor> {
        Arc::new(
            SenderDescriptor::new("app", "widget", "app_widget")
                .with_field(FieldDescriptor::scalar("name"))
                .with_field(FieldDescriptor::scalar("enabled")),
        )
    }

    #[test]
    fn scalar_values_render_as_python_strings() {
        assert_eq!(display_value(&json!(null)), "None");
        assert_eq!(display_value(&json!(true)), "True");
        assert_eq!(display_value(&json!(false)), "False");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!("plain")), "plain");
    }

    #[test]
    fn missing_scalar_renders_as_none() {
        let instance = ModelInstance::new(widget_descriptor()).with_value("name", "w");
        let snapshot = InstanceSnapshot::of(&instance);

        assert_eq!(snapshot.get("name"), Some(&json!("w")));
        assert_eq!(snapshot.get("enabled"), Some(&json!("None")));
    }

    #[test]
    fn cyclic_relation_graph_truncates_on_revisit() {
        let node = Arc::new(
            SenderDescriptor::new("graph", "node", "graph_node")
                .with_field(FieldDescriptor::scalar("label"))
                .with_field(FieldDescriptor::to_many("child", None)),
        );

        // a -> b -> a: the inner `a` is a revisit and must be dropped.
        let inner_a = ModelInstance::new(node.clone()).with_pk(1).with_value("label", "a");
        let b = ModelInstance::new(node.clone())
            .with_pk(2)
            .with_value("label", "b")
            .with_related("child", vec![inner_a]);
        let a = ModelInstance::new(node)
            .with_pk(1)
            .with_value("label", "a")
            .with_related("child", vec![b]);

        let snapshot = InstanceSnapshot::of(&a);
        let children = snapshot.get("child_set").unwrap().as_array().unwrap();
        assert_eq!(children.len(), 1);

        let b_snapshot = children[0].as_object().unwrap();
        assert_eq!(b_snapshot["label"], json!("b"));
        assert_eq!(b_snapshot["child_set"], json!([]));
    }

    #[test]
    fn duplicate_field_keys_are_emitted_once() {
        // A relation whose exposed name collides with a later field is
        // walked once; the second occurrence is skipped.
        let descriptor = Arc::new(
            SenderDescriptor::new("app", "widget", "app_widget")
                .with_field(FieldDescriptor::many_to_many("tags"))
                .with_field(FieldDescriptor::many_to_many("tags")),
        );
        let instance = ModelInstance::new(descriptor).with_pk(1).with_related("tags", vec![]);

        let snapshot = InstanceSnapshot::of(&instance);
        assert_eq!(snapshot.0.len(), 1);
        assert_eq!(snapshot.get("tags"), Some(&json!([])));
    }
}
