//! Social Sync
//!
//! Title-side coordination layer between a game's frame loop and an external
//! social-graph aggregation service. Tracks registered local users, keeps the
//! registry of social user groups consistent with calls into the service, and
//! relays the service's change events once per tick.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod social;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use social::{
    AggregationService, DefaultGroup, DetailLevel, GroupHandle, GroupId, GroupSelector,
    LocalUser, LocalUserId, PollStats, PresenceFilter, RelationshipFilter, Result, SocialConfig,
    SocialError, SocialEvent, SocialEventSink, SocialEventType, SocialGroup, SocialGroupType,
    SocialManager, TracingEventSink,
};
