use cloudform_config::ProviderBlock;
use cloudform_core::ResourceRegistry;
use cloudform_linode::{ClientConfig, LinodeClient};

/// Client settings: the manifest's provider block over the environment
pub fn client_config(provider: &ProviderBlock) -> anyhow::Result<ClientConfig> {
    let mut config = match &provider.token {
        Some(token) => ClientConfig::new(token.clone()),
        None => ClientConfig::from_env()?,
    };
    if let Some(url) = &provider.url {
        config = config.with_url(url.clone());
    }
    if let Some(api_version) = &provider.api_version {
        config = config.with_api_version(api_version.clone());
    }
    config.validate()?;
    Ok(config)
}

pub fn build_registry(provider: &ProviderBlock) -> anyhow::Result<ResourceRegistry> {
    let config = client_config(provider)?;
    tracing::debug!(base_url = %config.base_url(), "using linode api");
    let client = LinodeClient::new(config)?;
    Ok(cloudform_linode::registry(client))
}
