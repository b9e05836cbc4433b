//! Runs reconcilers over a manifest and a state file
//!
//! The engine owns no persistence. Callers load a [`StateFile`], hand it
//! to one of the operations below and save it afterwards.

use crate::state::{ResourceRecord, StateFile};
use cloudform_core::resource::{resource_key, split_key};
use cloudform_core::{Action, ActionType, Diagnostics, Plan, Record, ResourceRegistry, ResourceSet};
use futures_util::future::join_all;
use serde_json::Value;

pub struct Engine {
    registry: ResourceRegistry,
}

/// Outcome of one resource operation, merged into state afterwards
struct Outcome {
    key: String,
    resource_type: String,
    record: Option<Record>,
    diags: Diagnostics,
    /// The operation failed and `record` is the unrefreshed prior copy
    stale: bool,
}

impl Engine {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry }
    }

    /// Read every record in state; records whose remote copy is gone are dropped
    ///
    /// Records that fail to read are kept as they were and marked stale, so
    /// [`plan`](Engine::plan) leaves them alone.
    pub async fn refresh(&self, state: &mut StateFile) -> Diagnostics {
        let reads = state.resources.iter().map(|(key, stored)| async move {
            let mut diags = Diagnostics::new();
            let record = stored.record();
            let refreshed = match self.registry.get(&stored.resource_type) {
                Ok(resource) => resource.read(&record, &mut diags).await,
                Err(err) => {
                    diags.add_cloud_error(format!("Error reading {}", key), &err);
                    Some(record)
                }
            };
            if refreshed.is_none() {
                tracing::info!(resource = %key, "no longer exists remotely");
            }
            Outcome {
                key: key.clone(),
                resource_type: stored.resource_type.clone(),
                record: refreshed,
                stale: diags.has_error(),
                diags,
            }
        });
        let outcomes = join_all(reads).await;
        merge(state, outcomes)
    }

    /// Compare declared resources with state
    ///
    /// Declared resources missing from state are created, state records
    /// missing from `resources` are deleted. Stale records get no action.
    pub fn plan(
        &self,
        resources: &ResourceSet,
        state: &StateFile,
        diags: &mut Diagnostics,
    ) -> Plan {
        let mut actions = Vec::new();

        for config in resources.iter() {
            let key = config.key();
            if state.is_stale(&key) {
                tracing::warn!(resource = %key, "not refreshed, skipping");
                continue;
            }
            let record = state.get_resource(&key).map(ResourceRecord::record);
            let action = self.registry.get(&config.resource_type).and_then(|resource| {
                resource.plan(&config.name, record.as_ref(), Some(&config.config))
            });
            match action {
                Ok(action) => actions.push(action),
                Err(err) => diags.add_cloud_error(format!("Error planning {}", key), &err),
            }
        }

        for (key, stored) in &state.resources {
            if resources.get_by_key(key).is_some() {
                continue;
            }
            if state.is_stale(key) {
                tracing::warn!(resource = %key, "not refreshed, skipping");
                continue;
            }
            let Some((_, name)) = split_key(key) else {
                diags.add_error(
                    format!("Error planning {}", key),
                    "state key is not of the form <type>.<name>",
                );
                continue;
            };
            let action = self
                .registry
                .get(&stored.resource_type)
                .and_then(|resource| resource.plan(name, Some(&stored.record()), None));
            match action {
                Ok(action) => actions.push(action),
                Err(err) => diags.add_cloud_error(format!("Error planning {}", key), &err),
            }
        }

        Plan::new(actions)
    }

    /// Delete actions for every record in state
    pub fn destroy_plan(&self, state: &StateFile) -> Plan {
        let actions = state
            .resources
            .iter()
            .filter_map(|(key, stored)| {
                let (_, name) = split_key(key)?;
                Some(Action::new(&stored.resource_type, name, ActionType::Delete))
            })
            .collect();
        Plan::new(actions)
    }

    /// Execute every action of `plan` concurrently and record the outcomes
    ///
    /// Each resource gets its own diagnostics; they are merged in plan
    /// order. Partial successes (e.g. the delete half of a failed replace)
    /// are recorded too.
    pub async fn apply(
        &self,
        plan: &Plan,
        resources: &ResourceSet,
        state: &mut StateFile,
    ) -> Diagnostics {
        let runs: Vec<_> = plan
            .actions
            .iter()
            .filter(|action| action.action_type != ActionType::NoOp)
            .filter(|action| !state.is_stale(&action.key()))
            .map(|action| {
                let record = state.get_resource(&action.key()).map(ResourceRecord::record);
                let desired = resources.get_by_key(&action.key()).map(|c| c.config.clone());
                self.apply_one(action, record, desired)
            })
            .collect();
        let outcomes = join_all(runs).await;
        merge(state, outcomes)
    }

    async fn apply_one(
        &self,
        action: &Action,
        record: Option<Record>,
        desired: Option<Value>,
    ) -> Outcome {
        let mut diags = Diagnostics::new();
        let key = action.key();
        let summary = format!("Error applying {}", key);
        tracing::info!(resource = %key, action = %action.action_type, "applying");

        let record = match self.registry.get(&action.resource_type) {
            Ok(resource) => match desired.map(|config| resource.prepare(config)).transpose() {
                Ok(desired) => {
                    resource
                        .apply(action.action_type, record.as_ref(), desired.as_ref(), &mut diags)
                        .await
                }
                Err(err) => {
                    diags.add_cloud_error(summary, &err);
                    record
                }
            },
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                record
            }
        };

        Outcome {
            key,
            resource_type: action.resource_type.clone(),
            record,
            stale: false,
            diags,
        }
    }

    /// Adopt an existing remote object as `<resource_type>.<name>`
    pub async fn import(
        &self,
        resource_type: &str,
        name: &str,
        raw_identity: &str,
        state: &mut StateFile,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let key = resource_key(resource_type, name);
        let summary = format!("Error importing {}", key);

        if state.get_resource(&key).is_some() {
            diags.add_error(summary, "the resource is already managed");
            return diags;
        }

        let resource = match self.registry.get(resource_type) {
            Ok(resource) => resource,
            Err(err) => {
                diags.add_cloud_error(summary, &err);
                return diags;
            }
        };

        if let Some(record) = resource.import(raw_identity, &mut diags).await {
            tracing::info!(resource = %key, id = %record.identity, "imported");
            state.settle(&key, resource_type, Some(record));
        }
        diags
    }

    /// Read a remote object without recording it in state
    pub async fn lookup(
        &self,
        resource_type: &str,
        raw_identity: &str,
        diags: &mut Diagnostics,
    ) -> Option<Record> {
        let result = match self.registry.get(resource_type) {
            Ok(resource) => resource.lookup(raw_identity).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(record) => Some(record),
            Err(err) => {
                diags.add_cloud_error(
                    format!("Error looking up {} {}", resource_type, raw_identity),
                    &err,
                );
                None
            }
        }
    }
}

fn merge(state: &mut StateFile, outcomes: Vec<Outcome>) -> Diagnostics {
    let mut diags = Diagnostics::new();
    for outcome in outcomes {
        if outcome.stale {
            state.mark_stale(&outcome.key);
        }
        state.settle(&outcome.key, &outcome.resource_type, outcome.record);
        diags.append(outcome.diags);
    }
    diags
}
