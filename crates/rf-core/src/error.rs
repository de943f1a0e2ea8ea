//! Error types for ReelForge cabinet effects

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfError {
    /// Setup precondition violated (empty flare set, empty clip library, bad timing)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RfError {
    /// Shorthand for [`RfError::Configuration`]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Result type alias
pub type RfResult<T> = Result<T, RfError>;

/// Fail with a configuration error unless `value` is finite and `> 0`
pub fn ensure_positive(name: &str, value: f64) -> RfResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RfError::config(format!(
            "{name} must be a positive number of seconds, got {value}"
        )))
    }
}

/// Fail with a configuration error unless `value` is finite and `>= 0`
pub fn ensure_non_negative(name: &str, value: f64) -> RfResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RfError::config(format!("{name} must not be negative, got {value}")))
    }
}
