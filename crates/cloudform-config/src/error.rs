use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "No manifest found. Looked for:\n\
        - the path in CLOUDFORM_CONFIG\n\
        - ./cloudform.local.kdl, ./cloudform.kdl\n\
        - the same names under ./.cloudform/\n\
        - ~/.config/cloudform/cloudform.kdl"
    )]
    ManifestNotFound,

    #[error("Manifest {0} does not exist")]
    ManifestMissing(PathBuf),

    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Resource {0} is declared more than once")]
    DuplicateResource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
