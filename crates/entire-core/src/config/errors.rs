use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file: {message}")]
    ConfigParseError { message: String },

    #[error("Invalid agent '{agent}'. Supported agents: {supported_agents}")]
    InvalidAgent {
        agent: String,
        supported_agents: String,
    },

    #[error("Invalid strategy '{strategy}'. Supported: manual-commit")]
    InvalidStrategy { strategy: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidAgent { .. } => "INVALID_AGENT",
            ConfigError::InvalidStrategy { .. } => "INVALID_STRATEGY",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, ConfigError::IoError { .. })
    }
}
