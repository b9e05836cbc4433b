//! Field-local change detection between prior state and a declared plan

use crate::error::{CloudError, Result};
use crate::schema::{AttrType, ResourceSchema, as_object};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Attributes an Update must transmit, keyed by attribute name.
///
/// A `null` entry means the attribute is being cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Map<String, Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changes.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.changes.insert(name.into(), value);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// New value of a changed attribute.
    ///
    /// `None` when the attribute did not change; `Some(None)` when it is
    /// being cleared.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Option<T>>> {
        match self.changes.get(name) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(value) => Ok(Some(Some(serde_json::from_value(value.clone())?))),
        }
    }
}

/// Compute the change set that turns `prior` into `plan`.
///
/// Both records must be fully resolved. Computed attributes are ignored; an
/// attribute the plan leaves unset is ignored unless it has a default, in
/// which case the default is what gets compared. Any difference on an
/// immutable attribute fails with [`CloudError::ReplacementRequired`].
pub fn diff(schema: &ResourceSchema, prior: &Value, plan: &Value) -> Result<ChangeSet> {
    let prior = as_object(prior)?;
    let plan = as_object(plan)?;
    let mut changes = ChangeSet::new();

    for attribute in schema.settable() {
        let desired = match (plan.get(attribute.name), &attribute.default) {
            (Some(value), _) => value,
            (None, Some(default)) => default,
            (None, None) => continue,
        };
        let current = prior.get(attribute.name).unwrap_or(&Value::Null);

        if values_equal(&attribute.attr_type, current, desired) {
            continue;
        }

        if attribute.is_immutable() {
            return Err(CloudError::ReplacementRequired {
                attribute: attribute.name.to_string(),
            });
        }

        tracing::debug!(
            resource = schema.type_name,
            attribute = attribute.name,
            "attribute changed"
        );
        changes.insert(attribute.name, desired.clone());
    }

    Ok(changes)
}

/// Value equality, ignoring order for sets
fn values_equal(attr_type: &AttrType, a: &Value, b: &Value) -> bool {
    match (attr_type, a, b) {
        (AttrType::Set(_), Value::Array(left), Value::Array(right)) => {
            same_elements(left, right)
        }
        (AttrType::Int, Value::Number(left), Value::Number(right)) => {
            match (left.as_i64(), right.as_i64()) {
                (Some(l), Some(r)) => l == r,
                _ => match (left.as_u64(), right.as_u64()) {
                    (Some(l), Some(r)) => l == r,
                    _ => left.as_f64() == right.as_f64(),
                },
            }
        }
        (AttrType::Float, Value::Number(left), Value::Number(right)) => {
            left.as_f64() == right.as_f64()
        }
        _ => a == b,
    }
}

/// Multiset equality: every element matched exactly once
fn same_elements(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = right.iter().collect();
    for item in left {
        match remaining.iter().position(|candidate| *candidate == item) {
            Some(pos) => {
                remaining.swap_remove(pos);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SegmentKind;
    use crate::schema::AttributeSchema;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("test_db", vec![SegmentKind::Int])
            .attribute(AttributeSchema::computed("id", AttrType::Int))
            .attribute(AttributeSchema::computed("status", AttrType::String))
            .attribute(AttributeSchema::required("label", AttrType::String))
            .attribute(AttributeSchema::required("region", AttrType::String).immutable())
            .attribute(AttributeSchema::optional("description", AttrType::String))
            .attribute(AttributeSchema::optional("ttl_sec", AttrType::Int).with_default(json!(0)))
            .attribute(AttributeSchema::optional("tags", AttrType::set_of(AttrType::String)))
    }

    fn prior() -> Value {
        json!({
            "id": 42,
            "status": "active",
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
            "tags": ["a", "b"],
        })
    }

    #[test]
    fn test_identical_plan_yields_empty_change_set() {
        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
            "tags": ["b", "a"],
        });
        let changes = diff(&schema(), &prior(), &plan).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_changed_fields_only() {
        let plan = json!({
            "label": "db2",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
        });
        let changes = diff(&schema(), &prior(), &plan).unwrap();
        assert_eq!(changes.names().collect::<Vec<_>>(), vec!["label"]);
        assert_eq!(
            changes.get::<String>("label").unwrap(),
            Some(Some("db2".to_string()))
        );
        assert_eq!(changes.get::<String>("description").unwrap(), None);
    }

    #[test]
    fn test_unset_with_default_substitutes_default() {
        let plan = json!({"label": "db1", "region": "us-east", "description": "primary"});
        let changes = diff(&schema(), &prior(), &plan).unwrap();
        assert_eq!(changes.get::<i64>("ttl_sec").unwrap(), Some(Some(0)));
    }

    #[test]
    fn test_explicit_null_clears() {
        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": null,
            "ttl_sec": 300,
        });
        let changes = diff(&schema(), &prior(), &plan).unwrap();
        assert_eq!(changes.get::<String>("description").unwrap(), Some(None));
    }

    #[test]
    fn test_immutable_change_requires_replacement() {
        let plan = json!({"label": "db2", "region": "eu-west", "ttl_sec": 300});
        let err = diff(&schema(), &prior(), &plan).unwrap_err();
        assert!(matches!(
            err,
            CloudError::ReplacementRequired { ref attribute } if attribute == "region"
        ));
    }

    #[test]
    fn test_computed_fields_ignored() {
        let mut plan = prior();
        plan["status"] = json!("offline");
        assert!(diff(&schema(), &prior(), &plan).unwrap().is_empty());
    }

    #[test]
    fn test_set_length_mismatch() {
        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
            "tags": ["a", "a"],
        });
        let changes = diff(&schema(), &prior(), &plan).unwrap();
        assert!(changes.contains("tags"));
    }

    #[test]
    fn test_set_duplicates_are_counted() {
        let mut prior = prior();
        prior["tags"] = json!(["a", "a", "b"]);
        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
            "tags": ["a", "b", "b"],
        });
        let changes = diff(&schema(), &prior, &plan).unwrap();
        assert!(changes.contains("tags"));

        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 300,
            "tags": ["b", "a", "a"],
        });
        assert!(diff(&schema(), &prior, &plan).unwrap().is_empty());
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let mut prior = prior();
        prior["ttl_sec"] = json!(9_007_199_254_740_993_i64);
        let plan = json!({
            "label": "db1",
            "region": "us-east",
            "description": "primary",
            "ttl_sec": 9_007_199_254_740_992_i64,
            "tags": ["a", "b"],
        });
        let changes = diff(&schema(), &prior, &plan).unwrap();
        assert_eq!(
            changes.get::<i64>("ttl_sec").unwrap(),
            Some(Some(9_007_199_254_740_992))
        );
    }
}
