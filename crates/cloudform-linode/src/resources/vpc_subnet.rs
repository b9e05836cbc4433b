//! `linode_vpc_subnet`
//!
//! Subnets live under their VPC, so the identity is `<vpc_id>:<subnet_id>`.

use super::{known, rfc3339};
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_vpc_subnet";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VpcSubnet {
    pub id: i64,
    pub label: String,
    pub ipv4: String,
    pub linodes: Vec<SubnetLinode>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubnetLinode {
    pub id: i64,
}

/// Subnet response paired with the VPC it was fetched from
#[derive(Debug, Clone)]
pub struct SubnetSnapshot {
    pub vpc_id: i64,
    pub subnet: VpcSubnet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpcSubnetModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub vpc_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ipv4: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub linodes: Field<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated: Field<String>,
}

impl VpcSubnetModel {
    fn parse_computed_attributes(&mut self, subnet: &VpcSubnet) {
        self.id = subnet.id.into();
        self.linodes = subnet
            .linodes
            .iter()
            .map(|l| l.id)
            .collect::<Vec<_>>()
            .into();

        if subnet.created.is_some() {
            self.created = rfc3339(subnet.created.as_deref());
        }
        if subnet.updated.is_some() {
            self.updated = rfc3339(subnet.updated.as_deref());
        }
    }

    pub fn parse_vpc_subnet(&mut self, vpc_id: i64, subnet: &VpcSubnet) {
        self.vpc_id = vpc_id.into();
        self.label = subnet.label.clone().into();
        self.ipv4 = subnet.ipv4.clone().into();
        self.parse_computed_attributes(subnet);
    }
}

#[derive(Debug, Serialize)]
struct CreateSubnetRequest<'a> {
    label: Option<&'a str>,
    ipv4: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateSubnetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Option<String>>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Int, SegmentKind::Int])
        .describe("A subnet of a VPC")
        .attribute(AttributeSchema::computed("id", AttrType::Int))
        .attribute(
            AttributeSchema::required("vpc_id", AttrType::Int)
                .immutable()
                .describe("The id of the parent VPC"),
        )
        .attribute(AttributeSchema::required("label", AttrType::String))
        .attribute(
            AttributeSchema::required("ipv4", AttrType::String)
                .immutable()
                .describe("The IPv4 range of this subnet in CIDR format"),
        )
        .attribute(AttributeSchema::computed(
            "linodes",
            AttrType::list_of(AttrType::Int),
        ))
        .attribute(AttributeSchema::computed("created", AttrType::String))
        .attribute(AttributeSchema::computed("updated", AttrType::String))
}

pub struct VpcSubnetAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl VpcSubnetAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }

    fn path(identity: &Identity) -> Result<String> {
        Ok(format!(
            "/vpcs/{}/subnets/{}",
            identity.int(0)?,
            identity.int(1)?
        ))
    }
}

#[async_trait]
impl RemoteAdapter for VpcSubnetAdapter {
    type Model = VpcSubnetModel;
    type Snapshot = SubnetSnapshot;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &VpcSubnetModel) -> Result<Identity> {
        Identity::new(vec![
            known(&model.vpc_id, "vpc_id")?.into(),
            known(&model.id, "id")?.into(),
        ])
    }

    fn flatten(&self, snapshot: &SubnetSnapshot, model: &mut VpcSubnetModel) {
        model.parse_vpc_subnet(snapshot.vpc_id, &snapshot.subnet);
    }

    async fn create(&self, plan: &VpcSubnetModel) -> Result<SubnetSnapshot> {
        let vpc_id = known(&plan.vpc_id, "vpc_id")?;
        let request = CreateSubnetRequest {
            label: plan.label.as_deref(),
            ipv4: plan.ipv4.as_deref(),
        };
        let subnet = self
            .client
            .post(&format!("/vpcs/{}/subnets", vpc_id), &request)
            .await?;
        Ok(SubnetSnapshot { vpc_id, subnet })
    }

    async fn read(&self, identity: &Identity) -> Result<SubnetSnapshot> {
        let subnet = self.client.get(&Self::path(identity)?).await?;
        Ok(SubnetSnapshot {
            vpc_id: identity.int(0)?,
            subnet,
        })
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &VpcSubnetModel,
        changes: &ChangeSet,
    ) -> Result<SubnetSnapshot> {
        let request = UpdateSubnetRequest {
            label: changes.get("label")?,
        };
        let subnet = self.client.put(&Self::path(identity)?, &request).await?;
        Ok(SubnetSnapshot {
            vpc_id: identity.int(0)?,
            subnet,
        })
    }

    async fn delete(&self, identity: &Identity, _prior: &VpcSubnetModel) -> Result<()> {
        self.client.delete(&Self::path(identity)?).await
    }
}
