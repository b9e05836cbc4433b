//! Cloudform reconciliation core
//!
//! This crate holds the provider-independent half of Cloudform: identity
//! encoding, resource schemas, change detection, diagnostics and the
//! lifecycle reconciler that drives a [`RemoteAdapter`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Cloudform CLI                   │
//! │        (plan / apply / refresh / destroy)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │ JSON records
//! ┌─────────────────▼───────────────────────────────┐
//! │                 cloudform-core                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  ResourceRegistry → dyn DynResource       │   │
//! │  │  Reconciler<A: RemoteAdapter>             │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────┐ ┌────────┐ ┌──────┐ ┌─────────┐  │
//! │  │ Identity │ │ Schema │ │ Diff │ │ Diags   │  │
//! │  └──────────┘ └────────┘ └──────┘ └─────────┘  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │    linode     │
//!           │   adapters    │
//!           └───────────────┘
//! ```

pub mod action;
pub mod adapter;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod field;
pub mod identity;
pub mod reconciler;
pub mod registry;
pub mod resource;
pub mod schema;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary};
pub use adapter::RemoteAdapter;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use diff::{ChangeSet, diff};
pub use error::{CloudError, RemoteError, Result};
pub use field::Field;
pub use identity::{Identity, Segment, SegmentKind};
pub use reconciler::{Instance, Reconciler, ResourceStatus};
pub use registry::{DynResource, Record, ResourceRegistry};
pub use resource::{ResourceConfig, ResourceSet};
pub use schema::{AttrType, AttributeSchema, Mutability, ResourceSchema};
