//! `linode_networking_ip`
//!
//! An IP address is either ephemeral (assigned to an instance) or reserved
//! (assigned or not). Each case has its own delete operation, chosen from
//! the flags recorded in state.

use super::{known, non_empty};
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, RemoteError,
    ResourceSchema, Result, SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_networking_ip";

const LAST_PUBLIC_IP: &str =
    "Linode must have at least one public IP address. The last IP cannot be deleted.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceIp {
    pub address: String,
    pub gateway: Option<String>,
    pub subnet_mask: String,
    pub prefix: i64,
    #[serde(rename = "type")]
    pub ip_type: String,
    pub public: bool,
    pub rdns: Option<String>,
    pub linode_id: Option<i64>,
    pub region: String,
    pub reserved: bool,
}

/// Response of `GET /linode/instances/{id}/ips`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceIpAddresses {
    pub ipv4: InstanceIpv4Addresses,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceIpv4Addresses {
    pub public: Vec<InstanceIp>,
    pub private: Vec<InstanceIp>,
    pub shared: Vec<InstanceIp>,
    pub reserved: Vec<InstanceIp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkingIpModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub address: Field<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_unset")]
    pub ip_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub public: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub linode_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub region: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub reserved: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub gateway: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub subnet_mask: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub prefix: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub rdns: Field<String>,
}

impl NetworkingIpModel {
    pub fn flatten_ip_address(&mut self, ip: &InstanceIp) {
        self.address = ip.address.clone().into();
        self.ip_type = ip.ip_type.clone().into();
        self.public = ip.public.into();
        self.linode_id = Field::from_option(ip.linode_id);
        self.region = ip.region.clone().into();
        self.reserved = ip.reserved.into();
        self.gateway = Field::from_option(non_empty(ip.gateway.clone()));
        self.subnet_mask = ip.subnet_mask.clone().into();
        self.prefix = ip.prefix.into();
        self.rdns = Field::from_option(non_empty(ip.rdns.clone()));
    }

    fn is_reserved(&self) -> bool {
        self.reserved.value().copied().unwrap_or(false)
    }

    fn assigned_linode(&self) -> Option<i64> {
        self.linode_id.value().copied().filter(|id| *id != 0)
    }
}

/// Remote operation used to remove an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Ephemeral address: remove it from its instance
    Ephemeral { linode_id: i64 },
    /// Reserved address still assigned to an instance
    ReservedAssigned { linode_id: i64 },
    /// Reserved address not assigned to anything
    ReservedUnassigned,
}

impl DeleteMode {
    pub fn for_state(prior: &NetworkingIpModel) -> Result<Self> {
        match (prior.is_reserved(), prior.assigned_linode()) {
            (false, _) => Ok(DeleteMode::Ephemeral {
                linode_id: known(&prior.linode_id, "linode_id")?,
            }),
            (true, Some(linode_id)) => Ok(DeleteMode::ReservedAssigned { linode_id }),
            (true, None) => Ok(DeleteMode::ReservedUnassigned),
        }
    }
}

#[derive(Debug, Serialize)]
struct AllocateIpRequest<'a> {
    #[serde(rename = "type")]
    ip_type: Option<&'a str>,
    public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    linode_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateIpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved: Option<Option<bool>>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Str])
        .describe("An IPv4 address allocated to an instance or reserved in a region")
        .attribute(
            AttributeSchema::computed("address", AttrType::String)
                .describe("The allocated IP address"),
        )
        .attribute(
            AttributeSchema::required("type", AttrType::String)
                .immutable()
                .describe("The type of IP address (ipv4)"),
        )
        .attribute(
            AttributeSchema::required("public", AttrType::Bool)
                .immutable()
                .describe("Whether the IP address is public"),
        )
        .attribute(
            AttributeSchema::optional("linode_id", AttrType::Int)
                .immutable()
                .describe("The ID of the Linode to allocate the address to"),
        )
        .attribute(
            AttributeSchema::optional("region", AttrType::String)
                .immutable()
                .describe("The region for a reserved address"),
        )
        .attribute(
            AttributeSchema::optional("reserved", AttrType::Bool)
                .describe("Whether the address is reserved"),
        )
        .attribute(AttributeSchema::computed("gateway", AttrType::String))
        .attribute(AttributeSchema::computed("subnet_mask", AttrType::String))
        .attribute(AttributeSchema::computed("prefix", AttrType::Int))
        .attribute(AttributeSchema::computed("rdns", AttrType::String))
}

pub struct NetworkingIpAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl NetworkingIpAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }
}

#[async_trait]
impl RemoteAdapter for NetworkingIpAdapter {
    type Model = NetworkingIpModel;
    type Snapshot = InstanceIp;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &NetworkingIpModel) -> Result<Identity> {
        Identity::single(known(&model.address, "address")?)
    }

    fn flatten(&self, snapshot: &InstanceIp, model: &mut NetworkingIpModel) {
        model.flatten_ip_address(snapshot);
    }

    async fn create(&self, plan: &NetworkingIpModel) -> Result<InstanceIp> {
        let request = AllocateIpRequest {
            ip_type: plan.ip_type.as_deref(),
            public: plan.public.value().copied().unwrap_or(false),
            linode_id: plan.linode_id.cloned_option(),
            reserved: plan.reserved.cloned_option(),
            region: plan.region.as_deref(),
        };
        self.client.post("/networking/ips", &request).await
    }

    async fn read(&self, identity: &Identity) -> Result<InstanceIp> {
        self.client
            .get(&format!("/networking/ips/{}", identity.str(0)?))
            .await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &NetworkingIpModel,
        changes: &ChangeSet,
    ) -> Result<InstanceIp> {
        let request = UpdateIpRequest {
            reserved: changes.get("reserved")?,
        };
        self.client
            .put(&format!("/networking/ips/{}", identity.str(0)?), &request)
            .await
    }

    /// Refuse to remove the last public IPv4 of an instance
    async fn check_delete(&self, identity: &Identity, prior: &NetworkingIpModel) -> Result<()> {
        let DeleteMode::Ephemeral { linode_id } = DeleteMode::for_state(prior)? else {
            return Ok(());
        };

        let ips: InstanceIpAddresses = self
            .client
            .get(&format!("/linode/instances/{}/ips", linode_id))
            .await?;
        if ips.ipv4.public.len() == 1 {
            tracing::warn!(
                address = %identity,
                linode_id,
                "refusing to delete the last public address"
            );
            return Err(RemoteError::conflict(LAST_PUBLIC_IP).into());
        }
        Ok(())
    }

    async fn delete(&self, identity: &Identity, prior: &NetworkingIpModel) -> Result<()> {
        let address = identity.str(0)?;
        match DeleteMode::for_state(prior)? {
            DeleteMode::Ephemeral { linode_id } => {
                self.client
                    .delete(&format!("/linode/instances/{}/ips/{}", linode_id, address))
                    .await
            }
            DeleteMode::ReservedAssigned { linode_id } => {
                tracing::debug!(
                    address,
                    linode_id,
                    "deleting assigned reserved address"
                );
                self.client
                    .delete(&format!("/networking/reserved/ips/{}", address))
                    .await
            }
            DeleteMode::ReservedUnassigned => {
                self.client
                    .delete(&format!("/networking/reserved/ips/{}", address))
                    .await
            }
        }
    }
}
