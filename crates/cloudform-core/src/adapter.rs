//! Remote adapter trait definition

use crate::diff::ChangeSet;
use crate::error::Result;
use crate::identity::Identity;
use crate::schema::ResourceSchema;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Typed CRUD operations against a remote API for one resource kind
///
/// Every resource kind (domains, VPCs, IP addresses, ...) implements this
/// trait; the [`Reconciler`](crate::Reconciler) drives it. Remote failures
/// are returned as [`CloudError::Remote`](crate::CloudError::Remote) holding
/// an already classified [`RemoteError`](crate::RemoteError).
///
/// Implementations share their underlying HTTP client and must be safe to
/// call from several reconcilers at once.
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// Declared plan and prior state share one shape
    type Model: Clone + Default + Serialize + DeserializeOwned + Send + Sync;

    /// Authoritative remote representation
    type Snapshot: Send + Sync;

    /// Schema of the resource kind
    fn schema(&self) -> &ResourceSchema;

    /// Build the durable identity of a fully populated model
    fn identity(&self, model: &Self::Model) -> Result<Identity>;

    /// Copy a remote snapshot into the model, overwriting computed attributes
    fn flatten(&self, snapshot: &Self::Snapshot, model: &mut Self::Model);

    async fn create(&self, plan: &Self::Model) -> Result<Self::Snapshot>;

    async fn read(&self, identity: &Identity) -> Result<Self::Snapshot>;

    /// Apply only the attributes in `changes`
    async fn update(
        &self,
        identity: &Identity,
        prior: &Self::Model,
        changes: &ChangeSet,
    ) -> Result<Self::Snapshot>;

    /// Remove the resource. `prior` lets kinds with several delete
    /// operations pick one from flags recorded in state.
    async fn delete(&self, identity: &Identity, prior: &Self::Model) -> Result<()>;

    /// Check remote invariants before deleting.
    ///
    /// Returning a `Conflict` makes the reconciler keep the resource and
    /// report a warning instead of calling [`delete`](Self::delete).
    async fn check_delete(&self, _identity: &Identity, _prior: &Self::Model) -> Result<()> {
        Ok(())
    }
}
