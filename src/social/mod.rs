//! Social group coordination.
//!
//! This module keeps a client-side registry of social user groups consistent
//! with the calls made into an external aggregation service. The service
//! computes social-graph state; this module only tracks which local users are
//! registered, which groups they own, and pumps change events once per tick.
//!
//! # Architecture
//!
//! ```text
//! SocialManager (facade, one Mutex guard)
//!     ├── SocialState
//!     │     ├── LocalUserSet  (registered users)
//!     │     ├── GroupRegistry (arena of SocialGroup)
//!     │     └── PollStats
//!     ├── AggregationService (injected)
//!     └── SocialEventSink    (injected, defaults to tracing)
//! ```
//!
//! # Locking Model
//!
//! Every operation that reads or mutates the registry acquires the same guard.
//! The only work done outside it is the service call that creates a group and
//! the creation of configured default groups after a user is added.
//!
//! # Types
//!
//! - [`LocalUser`]: A platform user registered for tracking
//! - [`SocialGroup`]: A group owned by a local user
//! - [`GroupSelector`]: Explicit id list or presence/relationship filter pair
//! - [`SocialEvent`]: A change notification produced by the service

mod config;
mod error;
mod manager;
mod registry;
mod service;
mod sink;
mod stats;
pub mod types;

pub use config::{DefaultGroup, SocialConfig};
pub use error::{Result, SocialError};
pub use manager::SocialManager;
pub use registry::{GroupId, GroupRegistry, LocalUserSet};
pub use service::{AggregationService, GroupHandle};
pub use sink::{SocialEventSink, TracingEventSink};
pub use stats::PollStats;
pub use types::{
    DetailLevel, GroupSelector, LocalUser, LocalUserId, PresenceFilter, RelationshipFilter,
    SocialEvent, SocialEventType, SocialGroup, SocialGroupType,
};
