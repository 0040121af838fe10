//! Resolved settings consumed by the convergence engine.
//!
//! How the values are obtained (command line, environment) is the binary's
//! concern; the library only sees the result.

use crate::descriptor::{ShadowNaming, DEFAULT_SHADOW_SUFFIX};
use crate::error::{Result, ShadowError};

/// Settings for one convergence run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowConfig {
    /// Schema (database) whose tables are shadowed.
    pub schema: String,
    /// Table name suffix that marks a shadow table.
    pub shadow_suffix: String,
    /// Log statements without submitting them.
    pub dry_run: bool,
}

impl ShadowConfig {
    /// Creates settings for a schema with the default suffix.
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            shadow_suffix: DEFAULT_SHADOW_SUFFIX.to_string(),
            dry_run: false,
        }
    }

    /// Sets the shadow table suffix.
    #[must_use]
    pub fn shadow_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.shadow_suffix = suffix.into();
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Checks the settings before any schema access.
    pub fn validate(&self) -> Result<()> {
        if self.schema.trim().is_empty() {
            return Err(ShadowError::Configuration(
                "a database schema is required".to_string(),
            ));
        }
        self.naming().map(|_| ())
    }

    /// Builds the shadow naming rules for the configured suffix.
    pub fn naming(&self) -> Result<ShadowNaming> {
        ShadowNaming::new(self.shadow_suffix.clone())
    }
}
