use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation failed: {0}")]
    Validation(String),
    #[error("failed to write config file: {0}")]
    Io(#[from] std::io::Error),
}
