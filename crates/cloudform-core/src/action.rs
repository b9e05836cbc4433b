//! Planned actions for declared resources

use serde::{Deserialize, Serialize};

/// Represents a planned action for one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Resource type (e.g., "linode_domain", "linode_vpc")
    pub resource_type: String,

    /// Name of the resource in the manifest/state
    pub name: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Attributes that differ between state and plan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,

    /// Immutable attribute forcing replacement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_reason: Option<String>,
}

impl Action {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        action_type: ActionType,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            action_type,
            changed: Vec::new(),
            replace_reason: None,
        }
    }

    pub fn with_changed(mut self, changed: Vec<String>) -> Self {
        self.changed = changed;
        self
    }

    pub fn with_replace_reason(mut self, attribute: impl Into<String>) -> Self {
        self.replace_reason = Some(attribute.into());
        self
    }

    /// Key under which the resource is tracked in state
    pub fn key(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Human readable description of the action
    pub fn describe(&self) -> String {
        match self.action_type {
            ActionType::Create => format!("{} will be created", self.key()),
            ActionType::Update => format!(
                "{} will be updated in place ({})",
                self.key(),
                self.changed.join(", ")
            ),
            ActionType::Replace => format!(
                "{} must be replaced ({} cannot change in place)",
                self.key(),
                self.replace_reason.as_deref().unwrap_or("immutable attribute")
            ),
            ActionType::Delete => format!("{} will be destroyed", self.key()),
            ActionType::NoOp => format!("{} is up to date", self.key()),
        }
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Delete then create, because an immutable attribute changed
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions to perform
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the plan has any changes
    pub fn has_changes(&self) -> bool {
        self.actions
            .iter()
            .any(|a| a.action_type != ActionType::NoOp)
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}
