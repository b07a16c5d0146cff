//! Error types for the deferred helper.
//!
//! Only configuration problems are reported as errors. Missing parameter
//! files and disabled passes are handled where they occur and logged.

use crate::params_io::ParamsIoError;

/// Invalid setup detected before any GPU work is issued.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Framebuffer dimensions must both be non-zero.
    InvalidDimensions { width: u32, height: u32 },
    /// Near and far clip planes would produce a non-finite depth scalar.
    DegenerateClipPlanes { near: f32, far: f32 },
    /// The processor was used before `init`.
    NotInitialized,
    /// `init` called on a processor that already owns targets.
    AlreadyInitialized,
    /// Camera projection kind the helper cannot convert.
    UnsupportedProjection,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDimensions { width, height } => {
                write!(f, "Invalid framebuffer size: {}x{}", width, height)
            }
            ConfigError::DegenerateClipPlanes { near, far } => {
                write!(f, "Degenerate clip planes: near={} far={}", near, far)
            }
            ConfigError::NotInitialized => write!(f, "Processor used before init"),
            ConfigError::AlreadyInitialized => write!(f, "Processor initialized twice"),
            ConfigError::UnsupportedProjection => write!(f, "Unsupported camera projection"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by [`crate::DeferredHelper`].
#[derive(Debug)]
pub enum HelperError {
    /// Rejected configuration
    Config(ConfigError),
    /// Parameter file could not be written
    Io(ParamsIoError),
}

impl std::fmt::Display for HelperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelperError::Config(e) => write!(f, "Configuration error: {}", e),
            HelperError::Io(e) => write!(f, "Parameter I/O error: {}", e),
        }
    }
}

impl std::error::Error for HelperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HelperError::Config(e) => Some(e),
            HelperError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for HelperError {
    fn from(e: ConfigError) -> Self {
        HelperError::Config(e)
    }
}

impl From<ParamsIoError> for HelperError {
    fn from(e: ParamsIoError) -> Self {
        HelperError::Io(e)
    }
}
