//! Manifest discovery and parsing for Cloudform
//!
//! A manifest is a KDL document declaring the resources to manage:
//!
//! ```kdl
//! provider "linode" {
//!     api_version "v4beta"
//! }
//!
//! resource "linode_domain" "main" {
//!     domain "example.org"
//!     type "master"
//!     soa_email "admin@example.org"
//!     tags "prod" "dns"
//! }
//! ```

pub mod error;
pub mod manifest;

pub use error::*;
pub use manifest::{Manifest, ProviderBlock, parse_manifest, parse_manifest_file};

use std::path::{Path, PathBuf};

/// Environment variable pointing directly at a manifest
pub const CONFIG_ENV: &str = "CLOUDFORM_CONFIG";

/// File names looked up in a directory, in priority order
const CANDIDATES: [&str; 2] = ["cloudform.local.kdl", "cloudform.kdl"];

/// Get the Cloudform config directory, creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("cloudform");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the project manifest
///
/// Search order:
/// 1. `CLOUDFORM_CONFIG` (direct path)
/// 2. Current directory: `cloudform.local.kdl`, `cloudform.kdl`
/// 3. `./.cloudform/` with the same names
/// 4. `~/.config/cloudform/cloudform.kdl` (global)
pub fn find_manifest() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file", CONFIG_ENV);
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let project_dir = current_dir.join(".cloudform");
    if project_dir.is_dir()
        && let Some(path) = find_in(&project_dir)
    {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cloudform").join("cloudform.kdl");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Load the manifest at `path`, or the discovered one when `path` is `None`
pub fn load_manifest(path: Option<&Path>) -> Result<(PathBuf, Manifest)> {
    let path = match path {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => return Err(ConfigError::ManifestMissing(path.to_path_buf())),
        None => find_manifest()?,
    };
    tracing::debug!(path = %path.display(), "loading manifest");
    let manifest = parse_manifest_file(&path)?;
    Ok((path, manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Run `f` inside `dir` with no env override and an empty global config
    fn in_dir<R>(dir: &Path, f: impl FnOnce() -> R) -> R {
        let original_dir = std::env::current_dir().unwrap();
        let empty_home = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = temp_env::with_vars(
            [
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", empty_home.path().to_str()),
            ],
            f,
        );
        std::env::set_current_dir(original_dir).unwrap();
        result
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("cloudform.kdl"), "// test").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with("cloudform.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_manifest_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("cloudform.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join("cloudform.local.kdl"), "// local").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with("cloudform.local.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".cloudform");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("cloudform.kdl"), "// in project dir").unwrap();

        let found = in_dir(temp_dir.path(), find_manifest).unwrap();
        assert!(found.ends_with(".cloudform/cloudform.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_manifest_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.kdl");
        fs::write(&config_path, "// custom").unwrap();

        let found = temp_env::with_var(CONFIG_ENV, config_path.to_str(), find_manifest).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    #[serial]
    fn test_find_manifest_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        let result = in_dir(temp_dir.path(), find_manifest);
        assert!(matches!(result, Err(ConfigError::ManifestNotFound)));
    }

    #[test]
    fn test_load_manifest_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("infra.kdl");
        fs::write(&path, r#"resource "linode_vpc" "net" { label "net"; region "us-east" }"#)
            .unwrap();

        let (loaded, manifest) = load_manifest(Some(&path)).unwrap();
        assert_eq!(loaded, path);
        assert_eq!(manifest.resources.len(), 1);

        let missing = temp_dir.path().join("missing.kdl");
        assert!(matches!(
            load_manifest(Some(&missing)),
            Err(ConfigError::ManifestMissing(_))
        ));
    }
}
