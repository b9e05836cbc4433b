//! `linode_domain`

use super::known;
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_domain";

/// Domain as returned by `GET /domains/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub id: i64,
    pub domain: String,
    #[serde(rename = "type")]
    pub domain_type: String,
    pub group: String,
    pub status: String,
    pub description: String,
    pub soa_email: String,
    pub ttl_sec: Option<i64>,
    pub retry_sec: Option<i64>,
    pub expire_sec: Option<i64>,
    pub refresh_sec: Option<i64>,
    pub master_ips: Vec<String>,
    pub axfr_ips: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain: Field<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_unset")]
    pub domain_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub group: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub status: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub soa_email: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ttl_sec: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retry_sec: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub expire_sec: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub refresh_sec: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub master_ips: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub axfr_ips: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tags: Field<Vec<String>>,
}

impl DomainModel {
    pub fn parse_domain(&mut self, domain: &Domain) {
        self.id = domain.id.into();
        self.domain = domain.domain.clone().into();
        self.domain_type = domain.domain_type.clone().into();
        self.group = domain.group.clone().into();
        self.status = domain.status.clone().into();
        self.description = domain.description.clone().into();
        self.soa_email = domain.soa_email.clone().into();

        self.ttl_sec = Field::with_default(domain.ttl_sec);
        self.retry_sec = Field::with_default(domain.retry_sec);
        self.expire_sec = Field::with_default(domain.expire_sec);
        self.refresh_sec = Field::with_default(domain.refresh_sec);

        self.master_ips = domain.master_ips.clone().into();
        self.axfr_ips = domain.axfr_ips.clone().into();
        self.tags = domain.tags.clone().into();
    }
}

#[derive(Debug, Serialize)]
struct CreateDomainRequest<'a> {
    domain: Option<&'a str>,
    #[serde(rename = "type")]
    domain_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    soa_email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_sec: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_sec: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_sec: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_sec: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    master_ips: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    axfr_ips: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
}

/// Only changed attributes are serialized; `Some(None)` clears a value
#[derive(Debug, Default, Serialize)]
struct UpdateDomainRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    soa_email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_sec: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_sec: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_sec: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_sec: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    master_ips: Option<Option<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    axfr_ips: Option<Option<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Option<Vec<String>>>,
}

impl UpdateDomainRequest {
    fn from_changes(changes: &ChangeSet) -> Result<Self> {
        Ok(Self {
            soa_email: changes.get("soa_email")?,
            group: changes.get("group")?,
            status: changes.get("status")?,
            description: changes.get("description")?,
            ttl_sec: changes.get("ttl_sec")?,
            retry_sec: changes.get("retry_sec")?,
            expire_sec: changes.get("expire_sec")?,
            refresh_sec: changes.get("refresh_sec")?,
            master_ips: changes.get("master_ips")?,
            axfr_ips: changes.get("axfr_ips")?,
            tags: changes.get("tags")?,
        })
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Int])
        .describe("A DNS zone managed by Linode")
        .attribute(AttributeSchema::computed("id", AttrType::Int))
        .attribute(
            AttributeSchema::required("domain", AttrType::String)
                .immutable()
                .describe("The domain this Domain represents"),
        )
        .attribute(
            AttributeSchema::required("type", AttrType::String)
                .immutable()
                .describe("master or slave"),
        )
        .attribute(AttributeSchema::optional("soa_email", AttrType::String))
        .attribute(AttributeSchema::optional("group", AttrType::String))
        .attribute(AttributeSchema::optional("status", AttrType::String))
        .attribute(AttributeSchema::optional("description", AttrType::String))
        .attribute(AttributeSchema::optional("ttl_sec", AttrType::Int))
        .attribute(AttributeSchema::optional("retry_sec", AttrType::Int))
        .attribute(AttributeSchema::optional("expire_sec", AttrType::Int))
        .attribute(AttributeSchema::optional("refresh_sec", AttrType::Int))
        .attribute(AttributeSchema::optional(
            "master_ips",
            AttrType::set_of(AttrType::String),
        ))
        .attribute(AttributeSchema::optional(
            "axfr_ips",
            AttrType::set_of(AttrType::String),
        ))
        .attribute(AttributeSchema::optional(
            "tags",
            AttrType::set_of(AttrType::String),
        ))
}

pub struct DomainAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl DomainAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }
}

#[async_trait]
impl RemoteAdapter for DomainAdapter {
    type Model = DomainModel;
    type Snapshot = Domain;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &DomainModel) -> Result<Identity> {
        Identity::single(known(&model.id, "id")?)
    }

    fn flatten(&self, snapshot: &Domain, model: &mut DomainModel) {
        model.parse_domain(snapshot);
    }

    async fn create(&self, plan: &DomainModel) -> Result<Domain> {
        let request = CreateDomainRequest {
            domain: plan.domain.as_deref(),
            domain_type: plan.domain_type.as_deref(),
            soa_email: plan.soa_email.as_deref(),
            group: plan.group.as_deref(),
            status: plan.status.as_deref(),
            description: plan.description.as_deref(),
            ttl_sec: plan.ttl_sec.cloned_option(),
            retry_sec: plan.retry_sec.cloned_option(),
            expire_sec: plan.expire_sec.cloned_option(),
            refresh_sec: plan.refresh_sec.cloned_option(),
            master_ips: plan.master_ips.value().map(Vec::as_slice),
            axfr_ips: plan.axfr_ips.value().map(Vec::as_slice),
            tags: plan.tags.value().map(Vec::as_slice),
        };
        self.client.post("/domains", &request).await
    }

    async fn read(&self, identity: &Identity) -> Result<Domain> {
        self.client
            .get(&format!("/domains/{}", identity.int(0)?))
            .await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &DomainModel,
        changes: &ChangeSet,
    ) -> Result<Domain> {
        let request = UpdateDomainRequest::from_changes(changes)?;
        self.client
            .put(&format!("/domains/{}", identity.int(0)?), &request)
            .await
    }

    async fn delete(&self, identity: &Identity, _prior: &DomainModel) -> Result<()> {
        self.client
            .delete(&format!("/domains/{}", identity.int(0)?))
            .await
    }
}
