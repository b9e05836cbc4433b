//! Type-erased access to reconcilers of different resource kinds
//!
//! The CLI works on a heterogeneous list of resources. Each kind registers
//! its typed [`Reconciler`] here; records cross this boundary as JSON.

use crate::action::{Action, ActionType};
use crate::adapter::RemoteAdapter;
use crate::diagnostics::Diagnostics;
use crate::error::{CloudError, Result};
use crate::reconciler::{Instance, Reconciler};
use crate::schema::ResourceSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Whole, fully resolved record of one present resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Encoded identity
    pub identity: String,
    pub attributes: Value,
}

/// Reconciler for one resource kind, with JSON records in and out
#[async_trait]
pub trait DynResource: Send + Sync {
    fn schema(&self) -> &ResourceSchema;

    /// Normalize, default and validate a declared configuration
    fn prepare(&self, config: Value) -> Result<Value>;

    fn plan(&self, name: &str, record: Option<&Record>, desired: Option<&Value>) -> Result<Action>;

    /// Refresh a record. `None` means the remote object is gone.
    async fn read(&self, record: &Record, diags: &mut Diagnostics) -> Option<Record>;

    /// Execute `action`; returns the record afterwards (`None` when absent)
    async fn apply(
        &self,
        action: ActionType,
        record: Option<&Record>,
        desired: Option<&Value>,
        diags: &mut Diagnostics,
    ) -> Option<Record>;

    async fn import(&self, raw_identity: &str, diags: &mut Diagnostics) -> Option<Record>;

    /// Read an unmanaged remote object
    async fn lookup(&self, raw_identity: &str) -> Result<Record>;
}

impl<A: RemoteAdapter> Reconciler<A> {
    fn instance_from(&self, record: Option<&Record>) -> Result<Instance<A::Model>> {
        match record {
            Some(record) => {
                let state = serde_json::from_value(record.attributes.clone())?;
                self.load(&record.identity, state)
            }
            None => Ok(Instance::absent()),
        }
    }

    fn record_from(&self, instance: Instance<A::Model>, diags: &mut Diagnostics) -> Option<Record> {
        let (identity, state) = instance.into_parts()?;
        match serde_json::to_value(state) {
            Ok(attributes) => Some(Record {
                identity: identity.to_string(),
                attributes,
            }),
            Err(err) => {
                diags.add_cloud_error(
                    format!("Error recording {}", self.schema().type_name),
                    &CloudError::from(err),
                );
                None
            }
        }
    }
}

#[async_trait]
impl<A: RemoteAdapter> DynResource for Reconciler<A> {
    fn schema(&self) -> &ResourceSchema {
        Reconciler::schema(self)
    }

    fn prepare(&self, config: Value) -> Result<Value> {
        let model = Reconciler::prepare(self, config)?;
        Ok(serde_json::to_value(model)?)
    }

    fn plan(&self, name: &str, record: Option<&Record>, desired: Option<&Value>) -> Result<Action> {
        let instance = self.instance_from(record)?;
        let desired = desired
            .map(|value| Reconciler::prepare(self, value.clone()))
            .transpose()?;
        Reconciler::plan(self, name, &instance, desired.as_ref())
    }

    async fn read(&self, record: &Record, diags: &mut Diagnostics) -> Option<Record> {
        let mut instance = match self.instance_from(Some(record)) {
            Ok(instance) => instance,
            Err(err) => {
                diags.add_cloud_error(format!("Error reading {}", self.schema().type_name), &err);
                return Some(record.clone());
            }
        };
        let errors_before = diags.errors().count();
        Reconciler::read(self, &mut instance, diags).await;
        if diags.errors().count() > errors_before {
            return Some(record.clone());
        }
        self.record_from(instance, diags)
    }

    async fn apply(
        &self,
        action: ActionType,
        record: Option<&Record>,
        desired: Option<&Value>,
        diags: &mut Diagnostics,
    ) -> Option<Record> {
        let summary = format!("Error applying {}", self.schema().type_name);
        let mut instance = match self.instance_from(record) {
            Ok(instance) => instance,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return record.cloned();
            }
        };
        let desired = match desired.map(|v| serde_json::from_value::<A::Model>(v.clone())) {
            Some(Ok(model)) => Some(model),
            Some(Err(err)) => {
                diags.add_cloud_error(summary, &CloudError::from(err));
                return record.cloned();
            }
            None => None,
        };

        Reconciler::apply(self, action, &mut instance, desired.as_ref(), diags).await;
        self.record_from(instance, diags)
    }

    async fn import(&self, raw_identity: &str, diags: &mut Diagnostics) -> Option<Record> {
        let instance = Reconciler::import(self, raw_identity, diags).await;
        self.record_from(instance, diags)
    }

    async fn lookup(&self, raw_identity: &str) -> Result<Record> {
        let (identity, model) = Reconciler::lookup(self, raw_identity).await?;
        Ok(Record {
            identity: identity.to_string(),
            attributes: serde_json::to_value(model)?,
        })
    }
}

/// Resource kinds known to a provider, keyed by type name
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    kinds: BTreeMap<&'static str, Arc<dyn DynResource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A>(&mut self, adapter: A) -> &mut Self
    where
        A: RemoteAdapter + 'static,
    {
        let reconciler = Reconciler::new(adapter);
        let type_name = reconciler.schema().type_name;
        self.kinds.insert(type_name, Arc::new(reconciler));
        self
    }

    pub fn get(&self, type_name: &str) -> Result<Arc<dyn DynResource>> {
        self.kinds
            .get(type_name)
            .cloned()
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}
