use std::path::PathBuf;

/// Failures at the edges of the mutator. Mutation itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
