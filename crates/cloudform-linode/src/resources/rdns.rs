//! `linode_rdns`
//!
//! Reverse DNS is a property of an existing address, so create and update
//! both set it and delete resets it to the Linode default.

use super::{known, non_empty};
use crate::client::LinodeClient;
use crate::resources::networking_ip::InstanceIp;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_rdns";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RdnsModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub address: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub rdns: Field<String>,
}

impl RdnsModel {
    pub fn parse_ip(&mut self, ip: &InstanceIp) {
        self.address = ip.address.clone().into();
        self.rdns = Field::from_option(non_empty(ip.rdns.clone()));
    }
}

/// `rdns: null` restores the default reverse DNS
#[derive(Debug, Serialize)]
struct UpdateRdnsRequest<'a> {
    rdns: Option<&'a str>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Str])
        .describe("Reverse DNS for an existing IP address")
        .attribute(
            AttributeSchema::required("address", AttrType::String)
                .immutable()
                .identity_segment()
                .describe("The public IP address"),
        )
        .attribute(
            AttributeSchema::optional("rdns", AttrType::String)
                .describe("The name of the RDNS address"),
        )
}

pub struct RdnsAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl RdnsAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }

    async fn set_rdns(&self, address: &str, rdns: Option<&str>) -> Result<InstanceIp> {
        tracing::debug!(address, rdns, "setting reverse dns");
        self.client
            .put(
                &format!("/networking/ips/{}", address),
                &UpdateRdnsRequest { rdns },
            )
            .await
    }
}

#[async_trait]
impl RemoteAdapter for RdnsAdapter {
    type Model = RdnsModel;
    type Snapshot = InstanceIp;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &RdnsModel) -> Result<Identity> {
        Identity::single(known(&model.address, "address")?)
    }

    fn flatten(&self, snapshot: &InstanceIp, model: &mut RdnsModel) {
        model.parse_ip(snapshot);
    }

    async fn create(&self, plan: &RdnsModel) -> Result<InstanceIp> {
        let address = known(&plan.address, "address")?;
        self.set_rdns(&address, plan.rdns.as_deref()).await
    }

    async fn read(&self, identity: &Identity) -> Result<InstanceIp> {
        self.client
            .get(&format!("/networking/ips/{}", identity.str(0)?))
            .await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &RdnsModel,
        changes: &ChangeSet,
    ) -> Result<InstanceIp> {
        let rdns: Option<String> = changes.get("rdns")?.flatten();
        self.set_rdns(identity.str(0)?, rdns.as_deref()).await
    }

    async fn delete(&self, identity: &Identity, _prior: &RdnsModel) -> Result<()> {
        self.set_rdns(identity.str(0)?, None).await?;
        Ok(())
    }
}
