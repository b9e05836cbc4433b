//! Linode provider for Cloudform
//!
//! This crate implements [`RemoteAdapter`](cloudform_core::RemoteAdapter)
//! for Linode resource kinds on top of a small REST client.
//!
//! # Supported resources
//!
//! | Type | Identity |
//! |------|----------|
//! | `linode_domain` | domain id |
//! | `linode_image` | image id |
//! | `linode_vpc` | vpc id |
//! | `linode_vpc_subnet` | `vpc_id:subnet_id` |
//! | `linode_networking_ip` | address |
//! | `linode_rdns` | address |
//! | `linode_instance_config` | `linode_id:config_id` |
//! | `linode_user` | username |
//!
//! # Requirements
//!
//! `LINODE_TOKEN` must be set (see [`ClientConfig::from_env`]).
//!
//! # Example
//!
//! ```ignore
//! use cloudform_linode::{ClientConfig, LinodeClient};
//!
//! let client = LinodeClient::new(ClientConfig::from_env()?)?;
//! let registry = cloudform_linode::registry(client);
//!
//! let domains = registry.get("linode_domain")?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod resources;

pub use client::LinodeClient;
pub use config::{ClientConfig, RetryConfig};
pub use error::{LinodeError, Result};

use cloudform_core::ResourceRegistry;
use resources::{
    domain::DomainAdapter, image::ImageAdapter, instance_config::InstanceConfigAdapter,
    networking_ip::NetworkingIpAdapter, rdns::RdnsAdapter, user::UserAdapter, vpc::VpcAdapter,
    vpc_subnet::VpcSubnetAdapter,
};

/// Registry holding every Linode resource kind, all sharing `client`
pub fn registry(client: LinodeClient) -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();
    registry
        .register(DomainAdapter::new(client.clone()))
        .register(ImageAdapter::new(client.clone()))
        .register(VpcAdapter::new(client.clone()))
        .register(VpcSubnetAdapter::new(client.clone()))
        .register(NetworkingIpAdapter::new(client.clone()))
        .register(RdnsAdapter::new(client.clone()))
        .register(InstanceConfigAdapter::new(client.clone()))
        .register(UserAdapter::new(client));
    registry
}
