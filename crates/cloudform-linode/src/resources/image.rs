//! `linode_image`

use super::{known, rfc3339};
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "linode_image";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub created: Option<String>,
    pub created_by: Option<String>,
    pub capabilities: Vec<String>,
    pub deprecated: bool,
    pub is_public: bool,
    pub size: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub image_type: String,
    pub vendor: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub disk_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_by: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub capabilities: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub deprecated: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub is_public: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub size: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub status: Field<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_unset")]
    pub image_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub vendor: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub expiry: Field<String>,
}

impl ImageModel {
    /// `disk_id` is not part of the API response and is left alone
    pub fn parse_image(&mut self, image: &Image) {
        self.id = image.id.clone().into();
        self.label = image.label.clone().into();
        self.description = Field::from_option(image.description.clone());
        self.created = rfc3339(image.created.as_deref());
        self.created_by = Field::from_option(image.created_by.clone());
        self.capabilities = image.capabilities.clone().into();
        self.deprecated = image.deprecated.into();
        self.is_public = image.is_public.into();
        self.size = image.size.into();
        self.status = image.status.clone().into();
        self.image_type = image.image_type.clone().into();
        self.vendor = Field::from_option(image.vendor.clone());
        self.expiry = Field::from_option(image.expiry.clone());
    }
}

#[derive(Debug, Serialize)]
struct CreateImageRequest<'a> {
    disk_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Default, Serialize)]
struct UpdateImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<Option<String>>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Str])
        .describe("A private disk image captured from a Linode disk")
        .attribute(AttributeSchema::computed("id", AttrType::String))
        .attribute(
            AttributeSchema::required("disk_id", AttrType::Int)
                .immutable()
                .describe("The ID of the Linode Disk that this Image will be created from"),
        )
        .attribute(
            AttributeSchema::optional("label", AttrType::String)
                .describe("A short description of the Image"),
        )
        .attribute(
            AttributeSchema::optional("description", AttrType::String)
                .describe("A detailed description of this Image"),
        )
        .attribute(AttributeSchema::computed("created", AttrType::String))
        .attribute(AttributeSchema::computed("created_by", AttrType::String))
        .attribute(AttributeSchema::computed(
            "capabilities",
            AttrType::list_of(AttrType::String),
        ))
        .attribute(AttributeSchema::computed("deprecated", AttrType::Bool))
        .attribute(AttributeSchema::computed("is_public", AttrType::Bool))
        .attribute(
            AttributeSchema::computed("size", AttrType::Int)
                .describe("The minimum size this Image needs to deploy, in MB"),
        )
        .attribute(AttributeSchema::computed("status", AttrType::String))
        .attribute(AttributeSchema::computed("type", AttrType::String))
        .attribute(AttributeSchema::computed("vendor", AttrType::String))
        .attribute(AttributeSchema::computed("expiry", AttrType::String))
}

pub struct ImageAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl ImageAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }
}

#[async_trait]
impl RemoteAdapter for ImageAdapter {
    type Model = ImageModel;
    type Snapshot = Image;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &ImageModel) -> Result<Identity> {
        Identity::single(known(&model.id, "id")?)
    }

    fn flatten(&self, snapshot: &Image, model: &mut ImageModel) {
        model.parse_image(snapshot);
    }

    async fn create(&self, plan: &ImageModel) -> Result<Image> {
        let request = CreateImageRequest {
            disk_id: known(&plan.disk_id, "disk_id")?,
            label: plan.label.as_deref(),
            description: plan.description.as_deref(),
        };
        self.client.post("/images", &request).await
    }

    async fn read(&self, identity: &Identity) -> Result<Image> {
        self.client
            .get(&format!("/images/{}", identity.str(0)?))
            .await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &ImageModel,
        changes: &ChangeSet,
    ) -> Result<Image> {
        let request = UpdateImageRequest {
            label: changes.get("label")?,
            description: changes.get("description")?,
        };
        self.client
            .put(&format!("/images/{}", identity.str(0)?), &request)
            .await
    }

    async fn delete(&self, identity: &Identity, _prior: &ImageModel) -> Result<()> {
        self.client
            .delete(&format!("/images/{}", identity.str(0)?))
            .await
    }
}
