//! Resource lifecycle reconciler
//!
//! Drives Create/Read/Update/Delete for one resource kind against its
//! [`RemoteAdapter`] and turns remote failures into diagnostics:
//!
//! | Condition                          | Outcome                              |
//! |------------------------------------|--------------------------------------|
//! | Read after external deletion       | instance becomes absent, no diagnostic |
//! | Update with an empty change set    | no remote call                       |
//! | Delete of an already-absent remote | success                              |
//! | Delete blocked by a remote conflict| warning, instance stays present      |
//! | Immutable attribute changed        | fatal `ReplacementRequired`          |
//! | Identity decode failure            | fatal `Structural`                   |
//!
//! The model held by an [`Instance`] is only replaced after a remote call
//! has fully succeeded, so a failed or cancelled call leaves it untouched.

use crate::action::{Action, ActionType};
use crate::adapter::RemoteAdapter;
use crate::diagnostics::Diagnostics;
use crate::diff::{ChangeSet, diff};
use crate::error::{CloudError, RemoteError, Result};
use crate::identity::Identity;
use crate::schema::ResourceSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle position of a resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Absent,
    PendingCreate,
    Present,
    PendingDelete,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Absent => write!(f, "absent"),
            ResourceStatus::PendingCreate => write!(f, "pending-create"),
            ResourceStatus::Present => write!(f, "present"),
            ResourceStatus::PendingDelete => write!(f, "pending-delete"),
        }
    }
}

/// One resource instance as known locally
#[derive(Debug, Clone)]
pub struct Instance<M> {
    status: ResourceStatus,
    identity: Option<Identity>,
    state: Option<M>,
}

impl<M> Default for Instance<M> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<M> Instance<M> {
    pub fn absent() -> Self {
        Self {
            status: ResourceStatus::Absent,
            identity: None,
            state: None,
        }
    }

    pub fn present(identity: Identity, state: M) -> Self {
        Self {
            status: ResourceStatus::Present,
            identity: Some(identity),
            state: Some(state),
        }
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_present(&self) -> bool {
        self.status == ResourceStatus::Present
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn state(&self) -> Option<&M> {
        self.state.as_ref()
    }

    pub fn into_parts(self) -> Option<(Identity, M)> {
        match (self.identity, self.state) {
            (Some(identity), Some(state)) if self.status == ResourceStatus::Present => {
                Some((identity, state))
            }
            _ => None,
        }
    }

    fn discard(&mut self) {
        self.status = ResourceStatus::Absent;
        self.identity = None;
        self.state = None;
    }
}

/// Holds an instance in a pending status while a remote call is in flight.
///
/// Dropping it without [`finish`](Pending::finish) (an error path, or a
/// cancelled future) puts the original status back.
struct Pending<'a> {
    slot: &'a mut ResourceStatus,
    from: ResourceStatus,
    done: bool,
}

impl<'a> Pending<'a> {
    fn begin(slot: &'a mut ResourceStatus, pending: ResourceStatus) -> Self {
        let from = *slot;
        *slot = pending;
        Self {
            slot,
            from,
            done: false,
        }
    }

    fn finish(mut self, to: ResourceStatus) {
        *self.slot = to;
        self.done = true;
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.done {
            *self.slot = self.from;
        }
    }
}

/// Lifecycle controller for a single resource kind
pub struct Reconciler<A> {
    adapter: A,
}

impl<A: RemoteAdapter> Reconciler<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn schema(&self) -> &ResourceSchema {
        self.adapter.schema()
    }

    fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    /// Normalize, default and validate a declared plan
    pub fn prepare(&self, mut plan: Value) -> Result<A::Model> {
        let schema = self.schema();
        schema.normalize(&mut plan)?;
        schema.apply_defaults(&mut plan)?;
        schema.validate(&plan)?;
        Ok(serde_json::from_value(plan)?)
    }

    /// Rebuild an instance from a persisted record
    pub fn load(&self, raw_identity: &str, state: A::Model) -> Result<Instance<A::Model>> {
        let identity = Identity::parse(raw_identity, &self.schema().identity)?;
        Ok(Instance::present(identity, state))
    }

    /// Decide what has to happen to bring `instance` to `desired`
    pub fn plan(
        &self,
        name: &str,
        instance: &Instance<A::Model>,
        desired: Option<&A::Model>,
    ) -> Result<Action> {
        let action = match (instance.state.as_ref(), desired) {
            (None, None) => Action::new(self.type_name(), name, ActionType::NoOp),
            (None, Some(_)) => Action::new(self.type_name(), name, ActionType::Create),
            (Some(_), None) => Action::new(self.type_name(), name, ActionType::Delete),
            (Some(prior), Some(plan)) => match self.change_set(prior, plan) {
                Ok(changes) if changes.is_empty() => {
                    Action::new(self.type_name(), name, ActionType::NoOp)
                }
                Ok(changes) => Action::new(self.type_name(), name, ActionType::Update)
                    .with_changed(changes.names().map(str::to_string).collect()),
                Err(CloudError::ReplacementRequired { attribute }) => {
                    Action::new(self.type_name(), name, ActionType::Replace)
                        .with_replace_reason(attribute)
                }
                Err(err) => return Err(err),
            },
        };
        Ok(action)
    }

    fn change_set(&self, prior: &A::Model, plan: &A::Model) -> Result<ChangeSet> {
        let prior = serde_json::to_value(prior)?;
        let plan = serde_json::to_value(plan)?;
        diff(self.schema(), &prior, &plan)
    }

    /// Keep immutable attributes of `prior` in a freshly flattened model
    fn settle(&self, prior: &A::Model, updated: A::Model) -> Result<A::Model> {
        let prior = serde_json::to_value(prior)?;
        let mut updated = serde_json::to_value(updated)?;
        self.schema().preserve_immutable(&prior, &mut updated)?;
        Ok(serde_json::from_value(updated)?)
    }

    /// absent → present
    pub async fn create(
        &self,
        instance: &mut Instance<A::Model>,
        plan: &A::Model,
        diags: &mut Diagnostics,
    ) {
        let summary = format!("Error creating {}", self.type_name());
        if instance.status != ResourceStatus::Absent {
            diags.add_error(summary, "the resource already exists");
            return;
        }

        let plan = match self.prepare_model(plan) {
            Ok(plan) => plan,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return;
            }
        };

        tracing::info!(resource = self.type_name(), "creating");
        let pending = Pending::begin(&mut instance.status, ResourceStatus::PendingCreate);

        let snapshot = match self.adapter.create(&plan).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return;
            }
        };

        let mut model = plan;
        self.adapter.flatten(&snapshot, &mut model);
        let identity = match self.adapter.identity(&model) {
            Ok(identity) => identity,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return;
            }
        };

        tracing::debug!(resource = self.type_name(), id = %identity, "created");
        instance.identity = Some(identity);
        instance.state = Some(model);
        pending.finish(ResourceStatus::Present);
    }

    fn prepare_model(&self, plan: &A::Model) -> Result<A::Model> {
        self.prepare(serde_json::to_value(plan)?)
    }

    /// present → present | absent
    pub async fn read(&self, instance: &mut Instance<A::Model>, diags: &mut Diagnostics) {
        let (Some(identity), Some(prior)) = (instance.identity.as_ref(), instance.state.as_ref())
        else {
            return;
        };
        let summary = format!("Error reading {}", self.type_name());

        tracing::debug!(resource = self.type_name(), id = %identity, "reading");
        match self.adapter.read(identity).await {
            Ok(snapshot) => {
                let mut model = prior.clone();
                self.adapter.flatten(&snapshot, &mut model);
                match self.settle(prior, model) {
                    Ok(model) => instance.state = Some(model),
                    Err(err) => diags.add_cloud_error(summary, &err),
                }
            }
            Err(CloudError::Remote(RemoteError::NotFound { .. })) => {
                tracing::info!(
                    resource = self.type_name(),
                    id = %identity,
                    "removed outside of cloudform, dropping from state"
                );
                instance.discard();
            }
            Err(err) => diags.add_cloud_error(format!("{} {}", summary, identity), &err),
        }
    }

    /// present → present, sending only changed attributes
    pub async fn update(
        &self,
        instance: &mut Instance<A::Model>,
        plan: &A::Model,
        diags: &mut Diagnostics,
    ) {
        let summary = format!("Error updating {}", self.type_name());
        let (Some(identity), Some(prior)) = (instance.identity.as_ref(), instance.state.as_ref())
        else {
            diags.add_error(summary, "the resource does not exist");
            return;
        };

        let prepared = self
            .prepare_model(plan)
            .and_then(|plan| Ok((self.change_set(prior, &plan)?, plan)));
        let (changes, plan) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return;
            }
        };

        if changes.is_empty() {
            tracing::debug!(resource = self.type_name(), id = %identity, "no changes");
            return;
        }

        tracing::info!(
            resource = self.type_name(),
            id = %identity,
            changed = ?changes.names().collect::<Vec<_>>(),
            "updating"
        );
        let snapshot = match self.adapter.update(identity, prior, &changes).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                diags.add_cloud_error(format!("{} {}", summary, identity), &err);
                return;
            }
        };

        let mut model = plan;
        self.adapter.flatten(&snapshot, &mut model);
        match self.settle(prior, model) {
            Ok(model) => instance.state = Some(model),
            Err(err) => diags.add_cloud_error(summary, &err),
        }
    }

    /// present → absent
    pub async fn delete(&self, instance: &mut Instance<A::Model>, diags: &mut Diagnostics) {
        let (Some(identity), Some(prior)) = (instance.identity.as_ref(), instance.state.as_ref())
        else {
            return;
        };
        let type_name = self.type_name();
        let pending = Pending::begin(&mut instance.status, ResourceStatus::PendingDelete);

        let result = match self.adapter.check_delete(identity, prior).await {
            Ok(()) => {
                tracing::info!(resource = type_name, id = %identity, "deleting");
                self.adapter.delete(identity, prior).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {}
            Err(CloudError::Remote(RemoteError::NotFound { .. })) => {
                tracing::debug!(resource = type_name, id = %identity, "already deleted");
            }
            Err(CloudError::Remote(RemoteError::Conflict { message, .. })) => {
                diags.add_warning(format!("Cannot delete {} {}", type_name, identity), message);
                return;
            }
            Err(err) => {
                diags.add_cloud_error(format!("Error deleting {} {}", type_name, identity), &err);
                return;
            }
        }

        pending.finish(ResourceStatus::Absent);
        instance.identity = None;
        instance.state = None;
    }

    /// Read a remote object by its identity string without managing it
    pub async fn lookup(&self, raw_identity: &str) -> Result<(Identity, A::Model)> {
        let identity = Identity::parse(raw_identity, &self.schema().identity)?;
        tracing::debug!(resource = self.type_name(), id = %identity, "looking up");
        let snapshot = self.adapter.read(&identity).await?;
        let mut model = A::Model::default();
        self.adapter.flatten(&snapshot, &mut model);
        Ok((identity, model))
    }

    /// Adopt an existing remote object by its identity string
    pub async fn import(&self, raw_identity: &str, diags: &mut Diagnostics) -> Instance<A::Model> {
        let summary = format!("Error importing {}", self.type_name());
        match self.lookup(raw_identity).await {
            Ok((identity, model)) => Instance::present(identity, model),
            Err(CloudError::Remote(RemoteError::NotFound { .. })) => {
                diags.add_error(
                    summary,
                    format!("no remote object exists with identity {}", raw_identity),
                );
                Instance::absent()
            }
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                Instance::absent()
            }
        }
    }

    /// Execute a planned action. `Replace` runs as delete followed by create.
    pub async fn apply(
        &self,
        action: ActionType,
        instance: &mut Instance<A::Model>,
        desired: Option<&A::Model>,
        diags: &mut Diagnostics,
    ) {
        match (action, desired) {
            (ActionType::NoOp, _) => {}
            (ActionType::Create, Some(plan)) => self.create(instance, plan, diags).await,
            (ActionType::Update, Some(plan)) => self.update(instance, plan, diags).await,
            (ActionType::Delete, _) => self.delete(instance, diags).await,
            (ActionType::Replace, Some(plan)) => {
                self.delete(instance, diags).await;
                if instance.status == ResourceStatus::Absent {
                    self.create(instance, plan, diags).await;
                }
            }
            (action, None) => diags.add_error(
                format!("Error applying {}", self.type_name()),
                format!("{} requires a declared plan", action),
            ),
        }
    }
}
