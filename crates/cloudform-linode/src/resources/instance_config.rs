//! `linode_instance_config`
//!
//! Boot configurations belong to an instance: identity `<linode_id>:<id>`.

use super::{known, non_empty};
use crate::client::LinodeClient;
use async_trait::async_trait;
use cloudform_core::{
    AttrType, AttributeSchema, ChangeSet, Field, Identity, RemoteAdapter, ResourceSchema, Result,
    SegmentKind,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

pub const TYPE_NAME: &str = "linode_instance_config";

pub const DEFAULT_KERNEL: &str = "linode/latest-64bit";
pub const DEFAULT_RUN_LEVEL: &str = "default";
pub const DEFAULT_VIRT_MODE: &str = "paravirt";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub id: i64,
    pub label: String,
    pub comments: String,
    pub kernel: String,
    pub memory_limit: i64,
    pub root_device: String,
    pub run_level: String,
    pub virt_mode: String,
    pub helpers: ConfigHelpers,
    pub devices: BTreeMap<String, Option<DeviceSlot>>,
    pub interfaces: Vec<ApiInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigHelpers {
    pub updatedb_disabled: bool,
    pub distro: bool,
    pub modules_dep: bool,
    pub network: bool,
    pub devtmpfs_automount: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiInterface {
    pub purpose: String,
    pub label: Option<String>,
    pub ipam_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInterface {
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam_address: Option<String>,
}

/// Config response paired with the instance it belongs to
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub linode_id: i64,
    pub config: InstanceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfigModel {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub linode_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub label: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub comments: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kernel: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub memory_limit: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub root_device: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub run_level: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub virt_mode: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub helpers: Field<ConfigHelpers>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub devices: Field<BTreeMap<String, DeviceSlot>>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub interfaces: Field<Vec<ConfigInterface>>,
}

impl InstanceConfigModel {
    pub fn parse_config(&mut self, linode_id: i64, config: &InstanceConfig) {
        self.id = config.id.into();
        self.linode_id = linode_id.into();
        self.label = config.label.clone().into();
        self.comments = config.comments.clone().into();
        self.kernel = config.kernel.clone().into();
        self.memory_limit = config.memory_limit.into();
        self.root_device = config.root_device.clone().into();
        self.run_level = config.run_level.clone().into();
        self.virt_mode = config.virt_mode.clone().into();
        self.helpers = config.helpers.clone().into();

        // Empty slots come back as null
        self.devices = config
            .devices
            .iter()
            .filter_map(|(slot, device)| {
                device
                    .as_ref()
                    .filter(|d| d.disk_id.is_some() || d.volume_id.is_some())
                    .map(|d| (slot.clone(), d.clone()))
            })
            .collect::<BTreeMap<_, _>>()
            .into();

        self.interfaces = config
            .interfaces
            .iter()
            .map(|i| ConfigInterface {
                purpose: i.purpose.clone(),
                label: non_empty(i.label.clone()),
                ipam_address: non_empty(i.ipam_address.clone()),
            })
            .collect::<Vec<_>>()
            .into();
    }
}

#[derive(Debug, Serialize)]
struct CreateConfigRequest<'a> {
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_device: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    virt_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    helpers: Option<&'a ConfigHelpers>,
    devices: &'a BTreeMap<String, DeviceSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interfaces: Option<&'a [ConfigInterface]>,
}

#[derive(Debug, Serialize)]
struct UpdateConfigRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_limit: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_device: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_level: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    virt_mode: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    helpers: Option<Option<ConfigHelpers>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    devices: Option<Option<BTreeMap<String, DeviceSlot>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interfaces: Option<Option<Vec<ConfigInterface>>>,
}

impl UpdateConfigRequest {
    fn from_changes(changes: &ChangeSet) -> Result<Self> {
        Ok(Self {
            label: changes.get("label")?,
            comments: changes.get("comments")?,
            kernel: changes.get("kernel")?,
            memory_limit: changes.get("memory_limit")?,
            root_device: changes.get("root_device")?,
            run_level: changes.get("run_level")?,
            virt_mode: changes.get("virt_mode")?,
            helpers: changes.get("helpers")?,
            devices: changes.get("devices")?,
            interfaces: changes.get("interfaces")?,
        })
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME, vec![SegmentKind::Int, SegmentKind::Int])
        .describe("A boot configuration profile of a Linode instance")
        .attribute(AttributeSchema::computed("id", AttrType::Int))
        .attribute(
            AttributeSchema::required("linode_id", AttrType::Int)
                .immutable()
                .describe("The ID of the Linode to create this configuration profile under"),
        )
        .attribute(AttributeSchema::required("label", AttrType::String))
        .attribute(AttributeSchema::optional("comments", AttrType::String))
        .attribute(
            AttributeSchema::optional("kernel", AttrType::String)
                .with_default(json!(DEFAULT_KERNEL)),
        )
        .attribute(AttributeSchema::optional("memory_limit", AttrType::Int).with_default(json!(0)))
        .attribute(AttributeSchema::optional("root_device", AttrType::String))
        .attribute(
            AttributeSchema::optional("run_level", AttrType::String)
                .with_default(json!(DEFAULT_RUN_LEVEL)),
        )
        .attribute(
            AttributeSchema::optional("virt_mode", AttrType::String)
                .with_default(json!(DEFAULT_VIRT_MODE)),
        )
        .attribute(
            AttributeSchema::optional("helpers", AttrType::Object)
                .describe("Helpers enabled when booting to this configuration"),
        )
        .attribute(
            AttributeSchema::optional("devices", AttrType::Object)
                .describe("Device slots (sda..sdh) mapped to a disk_id or volume_id"),
        )
        .attribute(
            AttributeSchema::optional("interfaces", AttrType::list_of(AttrType::Object))
                .describe("Network interfaces, in order"),
        )
}

pub struct InstanceConfigAdapter {
    client: LinodeClient,
    schema: ResourceSchema,
}

impl InstanceConfigAdapter {
    pub fn new(client: LinodeClient) -> Self {
        Self {
            client,
            schema: schema(),
        }
    }

    fn path(identity: &Identity) -> Result<String> {
        Ok(format!(
            "/linode/instances/{}/configs/{}",
            identity.int(0)?,
            identity.int(1)?
        ))
    }
}

#[async_trait]
impl RemoteAdapter for InstanceConfigAdapter {
    type Model = InstanceConfigModel;
    type Snapshot = ConfigSnapshot;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn identity(&self, model: &InstanceConfigModel) -> Result<Identity> {
        Identity::new(vec![
            known(&model.linode_id, "linode_id")?.into(),
            known(&model.id, "id")?.into(),
        ])
    }

    fn flatten(&self, snapshot: &ConfigSnapshot, model: &mut InstanceConfigModel) {
        model.parse_config(snapshot.linode_id, &snapshot.config);
    }

    async fn create(&self, plan: &InstanceConfigModel) -> Result<ConfigSnapshot> {
        let linode_id = known(&plan.linode_id, "linode_id")?;
        let no_devices = BTreeMap::new();
        let request = CreateConfigRequest {
            label: plan.label.as_deref(),
            comments: plan.comments.as_deref(),
            kernel: plan.kernel.as_deref(),
            memory_limit: plan.memory_limit.cloned_option(),
            root_device: plan.root_device.as_deref(),
            run_level: plan.run_level.as_deref(),
            virt_mode: plan.virt_mode.as_deref(),
            helpers: plan.helpers.value(),
            devices: plan.devices.value().unwrap_or(&no_devices),
            interfaces: plan.interfaces.value().map(Vec::as_slice),
        };
        let config = self
            .client
            .post(&format!("/linode/instances/{}/configs", linode_id), &request)
            .await?;
        Ok(ConfigSnapshot { linode_id, config })
    }

    async fn read(&self, identity: &Identity) -> Result<ConfigSnapshot> {
        let config = self.client.get(&Self::path(identity)?).await?;
        Ok(ConfigSnapshot {
            linode_id: identity.int(0)?,
            config,
        })
    }

    async fn update(
        &self,
        identity: &Identity,
        _prior: &InstanceConfigModel,
        changes: &ChangeSet,
    ) -> Result<ConfigSnapshot> {
        let request = UpdateConfigRequest::from_changes(changes)?;
        let config = self.client.put(&Self::path(identity)?, &request).await?;
        Ok(ConfigSnapshot {
            linode_id: identity.int(0)?,
            config,
        })
    }

    async fn delete(&self, identity: &Identity, _prior: &InstanceConfigModel) -> Result<()> {
        self.client.delete(&Self::path(identity)?).await
    }
}
