//! Lifecycle tests driving the reconciler against an in-memory remote

use async_trait::async_trait;
use cloudform_core::{
    ActionType, AttrType, AttributeSchema, ChangeSet, CloudError, Diagnostics, Field, Identity,
    Instance, Reconciler, RemoteAdapter, RemoteError, ResourceRegistry, ResourceSchema,
    ResourceStatus, Result, SegmentKind,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
struct RemoteDb {
    id: i64,
    label: String,
    region: String,
    status: String,
    tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DbModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    status: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    region: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    tags: Field<Vec<String>>,
}

#[derive(Default)]
struct Calls {
    create: AtomicUsize,
    read: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

struct FakeDbs {
    schema: ResourceSchema,
    remote: Mutex<HashMap<i64, RemoteDb>>,
    next_id: Mutex<i64>,
    calls: Calls,
    fail_next: Mutex<Option<RemoteError>>,
    protected: Mutex<HashSet<i64>>,
}

impl FakeDbs {
    fn new() -> Self {
        Self {
            schema: ResourceSchema::new("test_db", vec![SegmentKind::Int])
                .attribute(AttributeSchema::computed("id", AttrType::Int))
                .attribute(AttributeSchema::computed("status", AttrType::String))
                .attribute(AttributeSchema::required("label", AttrType::String))
                .attribute(AttributeSchema::required("region", AttrType::String).immutable())
                .attribute(AttributeSchema::optional(
                    "tags",
                    AttrType::set_of(AttrType::String),
                )),
            remote: Mutex::new(HashMap::new()),
            next_id: Mutex::new(42),
            calls: Calls::default(),
            fail_next: Mutex::new(None),
            protected: Mutex::new(HashSet::new()),
        }
    }

    fn fail_next(&self, err: RemoteError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn take_failure(&self) -> Result<()> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn remote(&self, id: i64) -> Option<RemoteDb> {
        self.remote.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl RemoteAdapter for FakeDbs {
    type Model = DbModel;
    type Snapshot = RemoteDb;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &DbModel) -> Result<Identity> {
        let id = model
            .id
            .value()
            .copied()
            .ok_or_else(|| CloudError::InvalidState("missing id".to_string()))?;
        Identity::single(id)
    }

    fn flatten(&self, snapshot: &RemoteDb, model: &mut DbModel) {
        model.id = snapshot.id.into();
        model.status = snapshot.status.clone().into();
        model.label = snapshot.label.clone().into();
        model.region = snapshot.region.clone().into();
        model.tags = snapshot.tags.clone().into();
    }

    async fn create(&self, plan: &DbModel) -> Result<RemoteDb> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let id = {
            let mut next = self.next_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id
        };
        let db = RemoteDb {
            id,
            label: plan.label.value_or_default(),
            region: plan.region.value_or_default(),
            status: "active".to_string(),
            tags: plan.tags.value_or_default(),
        };
        self.remote.lock().unwrap().insert(id, db.clone());
        Ok(db)
    }

    async fn read(&self, identity: &Identity) -> Result<RemoteDb> {
        self.calls.read.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let id = identity.int(0)?;
        self.remote(id)
            .ok_or_else(|| RemoteError::not_found(format!("db {id}")).into())
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &DbModel,
        changes: &ChangeSet,
    ) -> Result<RemoteDb> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let id = identity.int(0)?;
        let mut remote = self.remote.lock().unwrap();
        let db = remote
            .get_mut(&id)
            .ok_or_else(|| CloudError::from(RemoteError::not_found(format!("db {id}"))))?;
        if let Some(label) = changes.get::<String>("label")? {
            db.label = label.unwrap_or_default();
        }
        if let Some(tags) = changes.get::<Vec<String>>("tags")? {
            db.tags = tags.unwrap_or_default();
        }
        Ok(db.clone())
    }

    async fn delete(&self, identity: &Identity, _prior: &DbModel) -> Result<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let id = identity.int(0)?;
        match self.remote.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RemoteError::not_found(format!("db {id}")).into()),
        }
    }

    async fn check_delete(&self, identity: &Identity, _prior: &DbModel) -> Result<()> {
        let id = identity.int(0)?;
        if self.protected.lock().unwrap().contains(&id) {
            return Err(RemoteError::conflict("the last public address cannot be removed").into());
        }
        Ok(())
    }
}

fn plan(value: serde_json::Value) -> DbModel {
    serde_json::from_value(value).unwrap()
}

async fn created(reconciler: &Reconciler<FakeDbs>) -> Instance<DbModel> {
    let mut instance = Instance::absent();
    let mut diags = Diagnostics::new();
    reconciler
        .create(
            &mut instance,
            &plan(json!({"label": "db1", "region": "us-east"})),
            &mut diags,
        )
        .await;
    assert!(diags.is_empty(), "{:?}", diags);
    instance
}

#[tokio::test]
async fn test_create_records_computed_attributes() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let instance = created(&reconciler).await;

    assert_eq!(instance.status(), ResourceStatus::Present);
    assert_eq!(instance.identity().unwrap().to_string(), "42");
    let state = instance.state().unwrap();
    assert_eq!(state.id, Field::Value(42));
    assert_eq!(state.status.as_deref(), Some("active"));
    assert_eq!(state.label.as_deref(), Some("db1"));
}

#[tokio::test]
async fn test_create_failure_leaves_instance_absent() {
    let reconciler = Reconciler::new(FakeDbs::new());
    reconciler
        .adapter()
        .fail_next(RemoteError::classify(Some(500), "boom"));

    let mut instance = Instance::absent();
    let mut diags = Diagnostics::new();
    reconciler
        .create(
            &mut instance,
            &plan(json!({"label": "db1", "region": "us-east"})),
            &mut diags,
        )
        .await;

    assert!(diags.has_error());
    assert_eq!(instance.status(), ResourceStatus::Absent);
    assert!(instance.state().is_none());
}

#[tokio::test]
async fn test_create_rejects_invalid_plan_without_remote_call() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = Instance::absent();
    let mut diags = Diagnostics::new();
    reconciler
        .create(&mut instance, &plan(json!({"label": "db1"})), &mut diags)
        .await;

    let error = diags.errors().next().unwrap();
    assert_eq!(error.attribute.as_deref(), Some("region"));
    assert_eq!(reconciler.adapter().calls.create.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_update_with_no_changes_makes_no_call() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    let before = instance.state().cloned();

    let mut diags = Diagnostics::new();
    reconciler
        .update(
            &mut instance,
            &plan(json!({"label": "db1", "region": "us-east"})),
            &mut diags,
        )
        .await;

    assert!(diags.is_empty());
    assert_eq!(reconciler.adapter().calls.update.load(Ordering::SeqCst), 0);
    assert_eq!(instance.state().cloned(), before);
}

#[tokio::test]
async fn test_update_sends_only_changed_attributes() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;

    let mut diags = Diagnostics::new();
    reconciler
        .update(
            &mut instance,
            &plan(json!({"label": "db2", "region": "us-east"})),
            &mut diags,
        )
        .await;

    assert!(diags.is_empty());
    assert_eq!(reconciler.adapter().calls.update.load(Ordering::SeqCst), 1);
    assert_eq!(instance.state().unwrap().label.as_deref(), Some("db2"));
    assert_eq!(reconciler.adapter().remote(42).unwrap().label, "db2");
}

#[tokio::test]
async fn test_update_failure_keeps_last_read_state() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    let before = instance.state().cloned();
    reconciler
        .adapter()
        .fail_next(RemoteError::classify(Some(500), "internal error"));

    let mut diags = Diagnostics::new();
    reconciler
        .update(
            &mut instance,
            &plan(json!({"label": "db2", "region": "us-east"})),
            &mut diags,
        )
        .await;

    assert_eq!(diags.errors().count(), 1);
    assert_eq!(reconciler.adapter().calls.update.load(Ordering::SeqCst), 1);
    assert_eq!(instance.status(), ResourceStatus::Present);
    assert_eq!(instance.state().cloned(), before);
    assert_eq!(reconciler.adapter().remote(42).unwrap().label, "db1");
}

#[tokio::test]
async fn test_update_of_immutable_attribute_requires_replacement() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    let before = instance.state().cloned();

    let mut diags = Diagnostics::new();
    reconciler
        .update(
            &mut instance,
            &plan(json!({"label": "db1", "region": "eu-west"})),
            &mut diags,
        )
        .await;

    assert!(diags.has_error());
    assert!(diags.errors().next().unwrap().detail.contains("region"));
    assert_eq!(reconciler.adapter().calls.update.load(Ordering::SeqCst), 0);
    assert_eq!(instance.state().cloned(), before);
}

#[tokio::test]
async fn test_plan_reports_replace_for_immutable_change() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let instance = created(&reconciler).await;

    let action = reconciler
        .plan(
            "main",
            &instance,
            Some(&plan(json!({"label": "db1", "region": "eu-west"}))),
        )
        .unwrap();
    assert_eq!(action.action_type, ActionType::Replace);
    assert_eq!(action.replace_reason.as_deref(), Some("region"));

    let action = reconciler
        .plan(
            "main",
            &instance,
            Some(&plan(json!({"label": "db1", "region": "us-east"}))),
        )
        .unwrap();
    assert_eq!(action.action_type, ActionType::NoOp);
}

#[tokio::test]
async fn test_apply_replace_deletes_then_creates() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;

    let mut diags = Diagnostics::new();
    let desired = plan(json!({"label": "db1", "region": "eu-west"}));
    reconciler
        .apply(ActionType::Replace, &mut instance, Some(&desired), &mut diags)
        .await;

    assert!(diags.is_empty());
    assert!(reconciler.adapter().remote(42).is_none());
    assert_eq!(instance.identity().unwrap().to_string(), "43");
    assert_eq!(instance.state().unwrap().region.as_deref(), Some("eu-west"));
}

#[tokio::test]
async fn test_read_absorbs_drift() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler
        .adapter()
        .remote
        .lock()
        .unwrap()
        .get_mut(&42)
        .unwrap()
        .label = "renamed".to_string();

    let mut diags = Diagnostics::new();
    reconciler.read(&mut instance, &mut diags).await;

    assert!(diags.is_empty());
    assert_eq!(instance.state().unwrap().label.as_deref(), Some("renamed"));
}

#[tokio::test]
async fn test_read_keeps_declared_immutable_value() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler
        .adapter()
        .remote
        .lock()
        .unwrap()
        .get_mut(&42)
        .unwrap()
        .region = "us-east-1a".to_string();

    let mut diags = Diagnostics::new();
    reconciler.read(&mut instance, &mut diags).await;

    assert_eq!(instance.state().unwrap().region.as_deref(), Some("us-east"));
}

#[tokio::test]
async fn test_read_after_external_delete_discards_state() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler.adapter().remote.lock().unwrap().clear();

    let mut diags = Diagnostics::new();
    reconciler.read(&mut instance, &mut diags).await;

    assert!(diags.is_empty());
    assert_eq!(instance.status(), ResourceStatus::Absent);
    assert!(instance.state().is_none());
}

#[tokio::test]
async fn test_read_transient_failure_keeps_state() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    let before = instance.state().cloned();
    reconciler
        .adapter()
        .fail_next(RemoteError::classify(Some(503), "unavailable"));

    let mut diags = Diagnostics::new();
    reconciler.read(&mut instance, &mut diags).await;

    assert!(diags.has_error());
    assert!(instance.is_present());
    assert_eq!(instance.state().cloned(), before);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    let state = instance.state().cloned().unwrap();
    let mut again = reconciler.load("42", state).unwrap();

    let mut diags = Diagnostics::new();
    reconciler.delete(&mut instance, &mut diags).await;
    assert!(diags.is_empty());
    assert_eq!(instance.status(), ResourceStatus::Absent);
    assert!(reconciler.adapter().remote(42).is_none());

    let mut diags = Diagnostics::new();
    reconciler.delete(&mut again, &mut diags).await;
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(again.status(), ResourceStatus::Absent);
    assert_eq!(reconciler.adapter().calls.delete.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_delete_conflict_is_a_warning() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler
        .adapter()
        .fail_next(RemoteError::classify(Some(409), "in use"));

    let mut diags = Diagnostics::new();
    reconciler.delete(&mut instance, &mut diags).await;

    assert!(!diags.has_error());
    assert_eq!(diags.warnings().count(), 1);
    assert_eq!(diags.len(), 1);
    assert_eq!(instance.status(), ResourceStatus::Present);
}

#[tokio::test]
async fn test_delete_guard_prevents_remote_delete() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler.adapter().protected.lock().unwrap().insert(42);

    let mut diags = Diagnostics::new();
    reconciler.delete(&mut instance, &mut diags).await;

    assert_eq!(diags.warnings().count(), 1);
    assert!(
        diags
            .warnings()
            .next()
            .unwrap()
            .detail
            .contains("last public address")
    );
    assert_eq!(reconciler.adapter().calls.delete.load(Ordering::SeqCst), 0);
    assert!(instance.is_present());
    assert!(reconciler.adapter().remote(42).is_some());
}

#[tokio::test]
async fn test_delete_failure_restores_status() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let mut instance = created(&reconciler).await;
    reconciler
        .adapter()
        .fail_next(RemoteError::classify(Some(500), "boom"));

    let mut diags = Diagnostics::new();
    reconciler.delete(&mut instance, &mut diags).await;

    assert!(diags.has_error());
    assert_eq!(instance.status(), ResourceStatus::Present);
    assert!(instance.state().is_some());
}

#[tokio::test]
async fn test_load_rejects_malformed_identity() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let err = reconciler.load("abc", DbModel::default()).unwrap_err();
    assert!(matches!(err, CloudError::Structural { .. }));
}

#[tokio::test]
async fn test_lookup_reads_unmanaged_object() {
    let reconciler = Reconciler::new(FakeDbs::new());
    let instance = created(&reconciler).await;

    let (identity, model) = reconciler.lookup("42").await.unwrap();
    assert_eq!(identity.to_string(), "42");
    assert_eq!(model.label.as_deref(), Some("db1"));
    assert_eq!(Some(&model), instance.state());

    let err = reconciler.lookup("7").await.unwrap_err();
    assert!(matches!(err, CloudError::Remote(RemoteError::NotFound { .. })));
    let err = reconciler.lookup("db1").await.unwrap_err();
    assert!(matches!(err, CloudError::Structural { .. }));
}

#[tokio::test]
async fn test_import_adopts_remote_object() {
    let reconciler = Reconciler::new(FakeDbs::new());
    created(&reconciler).await;

    let mut diags = Diagnostics::new();
    let instance = reconciler.import("42", &mut diags).await;
    assert!(diags.is_empty());
    assert_eq!(instance.state().unwrap().label.as_deref(), Some("db1"));

    let instance = reconciler.import("7", &mut diags).await;
    assert!(diags.has_error());
    assert!(!instance.is_present());
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SubnetModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    vpc_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    label: Field<String>,
}

struct FakeSubnets {
    schema: ResourceSchema,
    remote: Mutex<HashMap<(i64, i64), String>>,
}

impl FakeSubnets {
    fn new() -> Self {
        Self {
            schema: ResourceSchema::new("test_subnet", vec![SegmentKind::Int, SegmentKind::Int])
                .attribute(AttributeSchema::required("vpc_id", AttrType::Int).immutable())
                .attribute(AttributeSchema::computed("id", AttrType::Int))
                .attribute(AttributeSchema::required("label", AttrType::String)),
            remote: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RemoteAdapter for FakeSubnets {
    type Model = SubnetModel;
    type Snapshot = (i64, i64, String);

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &SubnetModel) -> Result<Identity> {
        match (model.vpc_id.value(), model.id.value()) {
            (Some(vpc_id), Some(id)) => Identity::new(vec![(*vpc_id).into(), (*id).into()]),
            _ => Err(CloudError::InvalidState("missing subnet id".to_string())),
        }
    }

    fn flatten(&self, snapshot: &(i64, i64, String), model: &mut SubnetModel) {
        model.vpc_id = snapshot.0.into();
        model.id = snapshot.1.into();
        model.label = snapshot.2.clone().into();
    }

    async fn create(&self, plan: &SubnetModel) -> Result<(i64, i64, String)> {
        let vpc_id = plan.vpc_id.value_or_default();
        let label = plan.label.value_or_default();
        self.remote.lock().unwrap().insert((vpc_id, 7), label.clone());
        Ok((vpc_id, 7, label))
    }

    async fn read(&self, identity: &Identity) -> Result<(i64, i64, String)> {
        let key = (identity.int(0)?, identity.int(1)?);
        match self.remote.lock().unwrap().get(&key) {
            Some(label) => Ok((key.0, key.1, label.clone())),
            None => Err(RemoteError::not_found("subnet").into()),
        }
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &SubnetModel,
        _changes: &ChangeSet,
    ) -> Result<(i64, i64, String)> {
        self.read(identity).await
    }

    async fn delete(&self, identity: &Identity, _prior: &SubnetModel) -> Result<()> {
        let key = (identity.int(0)?, identity.int(1)?);
        self.remote.lock().unwrap().remove(&key);
        Ok(())
    }
}

#[tokio::test]
async fn test_composite_identity() {
    let reconciler = Reconciler::new(FakeSubnets::new());
    let mut instance = Instance::absent();
    let mut diags = Diagnostics::new();
    let desired: SubnetModel =
        serde_json::from_value(json!({"vpc_id": 3, "label": "private"})).unwrap();

    reconciler.create(&mut instance, &desired, &mut diags).await;
    assert!(diags.is_empty());
    assert_eq!(instance.identity().unwrap().to_string(), "3:7");

    let loaded = reconciler
        .load("3:7", instance.state().cloned().unwrap())
        .unwrap();
    assert_eq!(loaded.identity().unwrap().int(1).unwrap(), 7);

    let err = reconciler.load("3", SubnetModel::default()).unwrap_err();
    assert!(err.to_string().contains("segment count mismatch"));
}

#[tokio::test]
async fn test_registry_round_trips_records() {
    let mut registry = ResourceRegistry::new();
    registry.register(FakeDbs::new());
    let kind = registry.get("test_db").unwrap();
    assert!(registry.get("test_unknown").is_err());

    let desired = kind
        .prepare(json!({"label": "db1", "region": "us-east"}))
        .unwrap();
    let action = kind.plan("main", None, Some(&desired)).unwrap();
    assert_eq!(action.action_type, ActionType::Create);

    let mut diags = Diagnostics::new();
    let record = kind
        .apply(action.action_type, None, Some(&desired), &mut diags)
        .await
        .unwrap();
    assert_eq!(record.identity, "42");
    assert_eq!(record.attributes["status"], json!("active"));

    let action = kind.plan("main", Some(&record), Some(&desired)).unwrap();
    assert_eq!(action.action_type, ActionType::NoOp);

    let gone = kind
        .apply(ActionType::Delete, Some(&record), None, &mut diags)
        .await;
    assert!(gone.is_none());
    assert!(diags.is_empty());
}
