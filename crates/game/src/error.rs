//! Error types for configuration and simulation setup.

use thiserror::Error;

/// A tuning value that would make a subsystem misbehave.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("rounds per minute must be positive, got {0}")]
    NonPositiveRpm(f32),

    #[error("magazine size must be at least 1")]
    EmptyMagazine,

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    #[error("pellet count must be at least 1 in shotgun mode")]
    NoPellets,
}

/// The simulation was assembled without something it cannot run without.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Reject non-finite and negative values.
pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

/// Reject non-finite, zero and negative values.
pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}
