//! `linode_user`

use super::known;
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const TYPE_NAME: &str = "linode_user";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub email: String,
    pub restricted: bool,
    pub user_type: Option<String>,
    pub ssh_keys: Vec<String>,
    pub tfa_enabled: bool,
    pub password_created: Option<String>,
    pub verified_phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub username: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub email: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub restricted: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub user_type: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub ssh_keys: Field<Vec<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub tfa_enabled: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub password_created: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub verified_phone_number: Field<String>,
}

impl UserModel {
    pub fn parse_user(&mut self, user: &User) {
        self.username = user.username.clone().into();
        self.email = user.email.clone().into();
        self.restricted = user.restricted.into();
        self.user_type = Field::from_option(user.user_type.clone());
        self.ssh_keys = user.ssh_keys.clone().into();
        self.tfa_enabled = user.tfa_enabled.into();
        self.password_created = Field::from_option(user.password_created.clone());
        self.verified_phone_number = Field::from_option(user.verified_phone_number.clone());
    }
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    username: Option<&'a str>,
    email: Option<&'a str>,
    restricted: bool,
}

#[derive(Debug, Serialize)]
struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    restricted: Option<Option<bool>>,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Str])
        .describe("A user of the Linode account")
        .attribute(
            AttributeSchema::required("username", AttrType::String)
                .immutable()
                .identity_segment()
                .describe("This User's username"),
        )
        .attribute(
            AttributeSchema::required("email", AttrType::String)
                .immutable()
                .describe("The email address for this User"),
        )
        .attribute(
            AttributeSchema::optional("restricted", AttrType::Bool)
                .with_default(json!(false))
                .describe("If true, this User must be granted access to account entities"),
        )
        .attribute(AttributeSchema::computed("user_type", AttrType::String))
        .attribute(AttributeSchema::computed(
            "ssh_keys",
            AttrType::list_of(AttrType::String),
        ))
        .attribute(AttributeSchema::computed("tfa_enabled", AttrType::Bool))
        .attribute(AttributeSchema::computed("password_created", AttrType::String))
        .attribute(AttributeSchema::computed(
            "verified_phone_number",
            AttrType::String,
        ))
}

pub struct UserAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl UserAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }
}

#[async_trait]
impl RemoteAdapter for UserAdapter {
    type Model = UserModel;
    type Snapshot = User;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &UserModel) -> Result<Identity> {
        Identity::single(known(&model.username, "username")?)
    }

    fn flatten(&self, snapshot: &User, model: &mut UserModel) {
        model.parse_user(snapshot);
    }

    async fn create(&self, plan: &UserModel) -> Result<User> {
        let request = CreateUserRequest {
            username: plan.username.as_deref(),
            email: plan.email.as_deref(),
            restricted: plan.restricted.value().copied().unwrap_or(false),
        };
        self.client.post("/account/users", &request).await
    }

    async fn read(&self, identity: &Identity) -> Result<User> {
        self.client
            .get(&format!("/account/users/{}", identity.str(0)?))
            .await
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &UserModel,
        changes: &ChangeSet,
    ) -> Result<User> {
        let request = UpdateUserRequest {
            restricted: changes.get("restricted")?,
        };
        self.client
            .put(&format!("/account/users/{}", identity.str(0)?), &request)
            .await
    }

    async fn delete(&self, identity: &Identity, _prior: &UserModel) -> Result<()> {
        self.client
            .delete(&format!("/account/users/{}", identity.str(0)?))
            .await
    }
}
