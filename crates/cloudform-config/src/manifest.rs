//! Manifest parsing
//!
//! Inside a `resource` block each child node is one attribute:
//!
//! - `label "web"` is a scalar
//! - `tags "a" "b"` is a list
//! - `helpers { network true }` or `sda disk_id=12` is an object
//! - a child repeated under the same name becomes a list of its values
//!
//! Values are kept as plain JSON here; the resource schema normalizes them.

use crate::error::{ConfigError, Result};
use cloudform_core::{ResourceConfig, ResourceSet};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde_json::{Map, Value};
use std::path::Path;

/// Provider name supported by the manifest
pub const PROVIDER_NAME: &str = "linode";

/// Parsed manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub provider: ProviderBlock,
    pub resources: ResourceSet,
}

/// Overrides from a `provider "linode" { ... }` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderBlock {
    pub token: Option<String>,
    pub url: Option<String>,
    pub api_version: Option<String>,
}

pub fn parse_manifest_file(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let doc: KdlDocument = content.parse()?;
    let mut manifest = Manifest::default();
    let mut seen_provider = false;

    for node in doc.nodes() {
        match node.name().value() {
            "provider" => {
                if seen_provider {
                    return Err(ConfigError::InvalidManifest(
                        "provider is declared more than once".to_string(),
                    ));
                }
                manifest.provider = parse_provider(node)?;
                seen_provider = true;
            }
            "resource" => {
                let resource = parse_resource(node)?;
                let key = resource.key();
                if manifest.resources.add(resource).is_some() {
                    return Err(ConfigError::DuplicateResource(key));
                }
            }
            other => {
                return Err(ConfigError::InvalidManifest(format!(
                    "unknown top-level node: {}",
                    other
                )));
            }
        }
    }

    tracing::debug!(resources = manifest.resources.len(), "manifest parsed");
    Ok(manifest)
}

fn parse_provider(node: &KdlNode) -> Result<ProviderBlock> {
    let name = node
        .entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| ConfigError::InvalidManifest("provider requires a name".to_string()))?;
    if name != PROVIDER_NAME {
        return Err(ConfigError::InvalidManifest(format!(
            "unsupported provider: {}",
            name
        )));
    }

    let mut provider = ProviderBlock::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let value = child
                .entries()
                .first()
                .and_then(|e| e.value().as_string())
                .map(|s| s.to_string());
            match child.name().value() {
                "token" => provider.token = value,
                "url" => provider.url = value,
                "api_version" | "api-version" => provider.api_version = value,
                other => {
                    return Err(ConfigError::InvalidManifest(format!(
                        "unknown provider setting: {}",
                        other
                    )));
                }
            }
        }
    }

    Ok(provider)
}

fn parse_resource(node: &KdlNode) -> Result<ResourceConfig> {
    let args: Vec<&str> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .collect();
    let [resource_type, name] = args.as_slice() else {
        return Err(ConfigError::InvalidManifest(
            "resource requires a type and a name, e.g. resource \"linode_vpc\" \"main\""
                .to_string(),
        ));
    };
    if name.is_empty() || name.contains('.') {
        return Err(ConfigError::InvalidManifest(format!(
            "invalid resource name: {:?}",
            name
        )));
    }

    let config = match node.children() {
        Some(children) => block_to_json(children, &format!("{}.{}", resource_type, name))?,
        None => Value::Object(Map::new()),
    };

    Ok(ResourceConfig::new(*resource_type, *name, config))
}

/// Convert a block of attribute nodes into an object
fn block_to_json(block: &KdlDocument, path: &str) -> Result<Value> {
    let mut object = Map::new();
    for child in block.nodes() {
        let key = child.name().value();
        let value = node_to_json(child, &format!("{}.{}", path, key))?;
        match object.remove(key) {
            None => {
                object.insert(key.to_string(), value);
            }
            Some(Value::Array(mut items)) if is_repeatable(&value) => {
                items.push(value);
                object.insert(key.to_string(), Value::Array(items));
            }
            Some(previous) if is_repeatable(&previous) && is_repeatable(&value) => {
                object.insert(key.to_string(), Value::Array(vec![previous, value]));
            }
            Some(_) => {
                return Err(ConfigError::InvalidManifest(format!(
                    "{} is set more than once",
                    path_join(path, key)
                )));
            }
        }
    }
    Ok(Value::Object(object))
}

/// Only block values can be repeated to build a list of objects
fn is_repeatable(value: &Value) -> bool {
    value.is_object()
}

fn path_join(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn node_to_json(node: &KdlNode, path: &str) -> Result<Value> {
    let (props, args): (Vec<&KdlEntry>, Vec<&KdlEntry>) =
        node.entries().iter().partition(|e| e.name().is_some());

    if props.is_empty() && node.children().is_none() {
        let mut values = args
            .iter()
            .map(|e| value_to_json(e.value(), path))
            .collect::<Result<Vec<_>>>()?;
        return Ok(match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::Array(values),
        });
    }

    if !args.is_empty() {
        return Err(ConfigError::InvalidManifest(format!(
            "{} mixes positional values with a block",
            path
        )));
    }

    let mut object = match node.children() {
        Some(children) => block_to_json(children, path)?,
        None => Value::Object(Map::new()),
    };
    if let Value::Object(map) = &mut object {
        for prop in props {
            let Some(name) = prop.name() else { continue };
            let key = name.value();
            let value = value_to_json(prop.value(), &path_join(path, key))?;
            if map.insert(key.to_string(), value).is_some() {
                return Err(ConfigError::InvalidManifest(format!(
                    "{} is set more than once",
                    path_join(path, key)
                )));
            }
        }
    }
    Ok(object)
}

fn value_to_json(value: &KdlValue, path: &str) -> Result<Value> {
    Ok(match value {
        KdlValue::String(s) => Value::String(s.clone()),
        KdlValue::Integer(i) => {
            let i = i64::try_from(*i).map_err(|_| {
                ConfigError::InvalidManifest(format!("{}: integer {} is out of range", path, i))
            })?;
            Value::from(i)
        }
        KdlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| {
                ConfigError::InvalidManifest(format!("{}: {} is not a finite number", path, f))
            })?,
        KdlValue::Bool(b) => Value::Bool(*b),
        KdlValue::Null => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_resource_values() {
        let manifest = parse_manifest(
            r#"
            resource "linode_domain" "main" {
                domain "example.org"
                type "master"
                soa_email "admin@example.org"
                ttl_sec 300
                tags "prod" "dns"
                description #null
            }
            "#,
        )
        .unwrap();

        let domain = manifest.resources.get("linode_domain", "main").unwrap();
        assert_eq!(
            domain.config,
            json!({
                "domain": "example.org",
                "type": "master",
                "soa_email": "admin@example.org",
                "ttl_sec": 300,
                "tags": ["prod", "dns"],
                "description": null
            })
        );
    }

    #[test]
    fn test_parse_nested_blocks() {
        let manifest = parse_manifest(
            r#"
            resource "linode_instance_config" "boot" {
                linode_id 123
                label "boot"
                helpers {
                    network #true
                    updatedb_disabled #false
                }
                devices {
                    sda disk_id=11
                    sdb volume_id=22
                }
                interfaces {
                    purpose "public"
                }
                interfaces {
                    purpose "vlan"
                    label "backend"
                }
            }
            "#,
        )
        .unwrap();

        let config = &manifest
            .resources
            .get("linode_instance_config", "boot")
            .unwrap()
            .config;
        assert_eq!(
            config["helpers"],
            json!({"network": true, "updatedb_disabled": false})
        );
        assert_eq!(
            config["devices"],
            json!({"sda": {"disk_id": 11}, "sdb": {"volume_id": 22}})
        );
        assert_eq!(
            config["interfaces"],
            json!([{"purpose": "public"}, {"purpose": "vlan", "label": "backend"}])
        );
    }

    #[test]
    fn test_parse_provider_block() {
        let manifest = parse_manifest(
            r#"
            provider "linode" {
                url "https://api.example.test"
                api_version "v4beta"
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            manifest.provider,
            ProviderBlock {
                token: None,
                url: Some("https://api.example.test".to_string()),
                api_version: Some("v4beta".to_string()),
            }
        );
        assert!(manifest.resources.is_empty());
    }

    #[test]
    fn test_unsupported_provider() {
        let err = parse_manifest(r#"provider "aws" {}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest(_)));
    }

    #[test]
    fn test_duplicate_resource() {
        let err = parse_manifest(
            r#"
            resource "linode_vpc" "net" { label "a"; region "us-east" }
            resource "linode_vpc" "net" { label "b"; region "us-east" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateResource(key) if key == "linode_vpc.net"));
    }

    #[test]
    fn test_repeated_scalar_is_rejected() {
        let err = parse_manifest(
            r#"resource "linode_vpc" "net" { label "a"; label "b" }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("linode_vpc.net.label"));
    }

    #[test]
    fn test_resource_requires_type_and_name() {
        let err = parse_manifest(r#"resource "linode_vpc" { label "a" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest(_)));

        let err = parse_manifest(r#"resource "linode_vpc" "a.b" {}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidManifest(_)));
    }

    #[test]
    fn test_unknown_top_level_node() {
        let err = parse_manifest(r#"server "web" {}"#).unwrap_err();
        assert!(err.to_string().contains("server"));
    }

    #[test]
    fn test_invalid_kdl() {
        let err = parse_manifest(r#"resource "linode_vpc" "net" {"#).unwrap_err();
        assert!(matches!(err, ConfigError::KdlParse(_)));
    }
}
