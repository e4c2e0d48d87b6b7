//! Configuration for the social manager.
//!
//! Controls the detail level users are registered with and the default
//! groups created for every newly added local user.

use serde::{Deserialize, Serialize};

use super::error::{Result, SocialError};
use super::types::{DetailLevel, PresenceFilter, RelationshipFilter};

/// A group created automatically when a local user is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultGroup {
    /// Filter group.
    Filters {
        /// Presence criteria.
        presence: PresenceFilter,
        /// Relationship criteria.
        relationship: RelationshipFilter,
    },
    /// List group over fixed ids.
    List {
        /// Ids to track. Must not be empty.
        target_ids: Vec<String>,
    },
}

/// Settings for a [`SocialManager`](super::SocialManager).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    /// Detail level passed when registering users.
    pub detail_level: DetailLevel,

    /// Groups created for each user after registration, in order.
    pub default_groups: Vec<DefaultGroup>,
}

impl SocialConfig {
    /// Creates the default configuration: no extra detail, no default groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the detail level.
    #[must_use]
    pub const fn with_detail_level(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = detail_level;
        self
    }

    /// Adds a default group.
    #[must_use]
    pub fn with_default_group(mut self, group: DefaultGroup) -> Self {
        self.default_groups.push(group);
        self
    }

    /// Checks that every default list group names at least one id.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::InvalidConfig`] on the first empty list group.
    pub fn validate(&self) -> Result<()> {
        for (index, group) in self.default_groups.iter().enumerate() {
            if let DefaultGroup::List { target_ids } = group {
                if target_ids.is_empty() {
                    return Err(SocialError::InvalidConfig(format!(
                        "default group {index} is a list group with no target ids"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
