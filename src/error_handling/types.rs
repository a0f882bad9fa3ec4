use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    DirectoryDoesNotExist(String),
    InvalidAddress(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
            ConfigError::InvalidAddress(e) => write!(f, "Address error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum LogError {
    /// The destination file could not be created. Callers treat this as fatal.
    Create { path: PathBuf, source: std::io::Error },
    /// The sink worker task died before acknowledging `Close`.
    Worker(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Create { path, source } => {
                write!(f, "Unable to create log file, {}, {}", path.display(), source)
            }
            LogError::Worker(e) => write!(f, "Log worker failed: {}", e),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::Create { source, .. } => Some(source),
            LogError::Worker(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum ConnectionError {
    Dial {
        target: String,
        source: std::io::Error,
    },
    Address(std::io::Error),
    Log(LogError),
}

impl ConnectionError {
    /// Only log failures take the whole process down; everything else is
    /// scoped to the connection attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectionError::Log(_))
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Dial { target, source } => {
                write!(f, "Unable to connect to {}, {}", target, source)
            }
            ConnectionError::Address(e) => write!(f, "Socket address unavailable: {}", e),
            ConnectionError::Log(e) => write!(f, "Log error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<LogError> for ConnectionError {
    fn from(err: LogError) -> Self {
        ConnectionError::Log(err)
    }
}

#[derive(Debug)]
pub enum NetworkError {
    BindError(std::io::Error),
    ConfigError(ConfigError),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::BindError(e) => write!(f, "Unable to start listener {}", e),
            NetworkError::ConfigError(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<ConfigError> for NetworkError {
    fn from(err: ConfigError) -> Self {
        NetworkError::ConfigError(err)
    }
}
