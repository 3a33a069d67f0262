//! Error store configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default store capacity.
const fn default_max_errors() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorsConfig {
    /// Maximum number of records the error store holds before evicting the oldest.
    #[serde(default = "default_max_errors")]
    pub max_errors: usize,
}

impl ErrorsConfig {
    /// Check that the capacity is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_errors` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_errors == 0 {
            return Err(ConfigError::InvalidValue {
                field: "errors.max_errors".into(),
                reason: "must be a positive integer".into(),
            });
        }
        Ok(())
    }
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            max_errors: default_max_errors(),
        }
    }
}
