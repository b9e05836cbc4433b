//! `linode_vpc`

use super::{known, rfc3339};
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_vpc";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Vpc {
    pub id: i64,
    pub label: String,
    pub description: String,
    pub region: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpcModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub region: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated: Field<String>,
}

impl VpcModel {
    pub fn parse_vpc(&mut self, vpc: &Vpc) {
        self.id = vpc.id.into();
        self.label = vpc.label.clone().into();
        self.description = vpc.description.clone().into();
        self.region = vpc.region.clone().into();

        if vpc.created.is_some() {
            self.created = rfc3339(vpc.created.as_deref());
        }
        if vpc.updated.is_some() {
            self.updated = rfc3339(vpc.updated.as_deref());
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateVpcRequest<'a> {
    label: Option<&'a str>,
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateVpcRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<String>>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Int])
        .describe("A virtual private cloud in one region")
        .attribute(AttributeSchema::computed("id", AttrType::Int))
        .attribute(AttributeSchema::required("label", AttrType::String))
        .attribute(AttributeSchema::optional("description", AttrType::String))
        .attribute(
            AttributeSchema::required("region", AttrType::String)
                .immutable()
                .describe("The region of the VPC"),
        )
        .attribute(AttributeSchema::computed("created", AttrType::String))
        .attribute(AttributeSchema::computed("updated", AttrType::String))
}

pub struct VpcAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl VpcAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }
}

#[async_trait]
impl RemoteAdapter for VpcAdapter {
    type Model = VpcModel;
    type Snapshot = Vpc;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &VpcModel) -> Result<Identity> {
        Identity::single(known(&model.id, "id")?)
    }

    fn flatten(&self, snapshot: &Vpc, model: &mut VpcModel) {
        model.parse_vpc(snapshot);
    }

    async fn create(&self, plan: &VpcModel) -> Result<Vpc> {
        let request = CreateVpcRequest {
            label: plan.label.as_deref(),
            region: plan.region.as_deref(),
            description: plan.description.as_deref(),
        };
        self.client.post("/vpcs", &request).await
    }

    async fn read(&self, identity: &Identity) -> Result<Vpc> {
        self.client.get(&format!("/vpcs/{}", identity.int(0)?)).await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &VpcModel,
        changes: &ChangeSet,
    ) -> Result<Vpc> {
        let request = UpdateVpcRequest {
            label: changes.get("label")?,
            description: changes.get("description")?,
        };
        self.client
            .put(&format!("/vpcs/{}", identity.int(0)?), &request)
            .await
    }

    async fn delete(&self, identity: &Identity, _prior: &VpcModel) -> Result<()> {
        self.client
            .delete(&format!("/vpcs/{}", identity.int(0)?))
            .await
    }
}
