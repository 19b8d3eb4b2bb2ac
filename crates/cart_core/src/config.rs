//! Cart behavior configuration.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - Unknown fields are rejected rather than ignored.

use crate::session::CART_ID_KEY;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What `update` does when the target item exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Resolve the item and change nothing.
    #[default]
    Legacy,
    /// Overwrite quantity (and unit price when given) and save.
    Apply,
}

/// Per-cart settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartConfig {
    /// Session key that stores the active cart id.
    pub session_key: String,
    pub update_mode: UpdateMode,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            session_key: CART_ID_KEY.to_string(),
            update_mode: UpdateMode::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    EmptySessionKey,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid cart config: {err}"),
            Self::EmptySessionKey => f.write_str("invalid cart config: session_key cannot be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::EmptySessionKey => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CartConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: CartConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::EmptySessionKey);
        }
        Ok(())
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }
}
