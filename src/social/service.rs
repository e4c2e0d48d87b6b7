//! Contract of the external social-graph aggregation service.
//!
//! The service computes social-graph state and diffs; this crate only calls
//! into it. Implementations are injected into
//! [`SocialManager`](super::SocialManager), which serializes every
//! registry-affecting call behind its guard.

use std::fmt;

use super::error::Result;
use super::types::{DetailLevel, LocalUser, PresenceFilter, RelationshipFilter, SocialEvent};

/// Opaque handle the service returns for a created group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(u64);

impl GroupHandle {
    /// Wraps a raw service handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw service handle.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Operations the aggregation service exposes to the title.
///
/// Registration and destruction never report failure; group creation may be
/// rejected, and [`poll`](Self::poll) returns a possibly empty batch.
pub trait AggregationService: Send + Sync {
    /// Starts tracking the social graph of `user`.
    fn register_user(&self, user: &LocalUser, detail_level: DetailLevel);

    /// Stops tracking `user`.
    fn unregister_user(&self, user: &LocalUser);

    /// Creates a group tracking an explicit set of ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the request.
    fn create_group_from_list(&self, user: &LocalUser, target_ids: &[String])
        -> Result<GroupHandle>;

    /// Creates a group selected by presence and relationship.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the request.
    fn create_group_from_filters(
        &self,
        user: &LocalUser,
        presence: PresenceFilter,
        relationship: RelationshipFilter,
    ) -> Result<GroupHandle>;

    /// Destroys a previously created group.
    fn destroy_group(&self, handle: GroupHandle);

    /// Drains the change events produced since the previous poll.
    fn poll(&self) -> Vec<SocialEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_display_is_zero_padded_hex() {
        assert_eq!(GroupHandle::new(255).to_string(), "00000000000000ff");
    }

    #[test]
    fn handle_raw_roundtrip() {
        assert_eq!(GroupHandle::new(42).raw(), 42);
    }
}
