//! Core types for social group coordination.
//!
//! This module defines local users, the selection criteria for social user
//! groups, the groups themselves, and the change events relayed from the
//! aggregation service.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::GroupHandle;

/// Stable identifier of a local user.
///
/// Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalUserId(String);

impl LocalUserId {
    /// Creates an identifier from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocalUserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LocalUserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A platform user on this device.
///
/// The platform identity system owns the user; this is only the part the
/// registry needs: the stable id and a display name for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    /// Stable platform identifier.
    pub id: LocalUserId,
    /// Display name (gamertag), used only in log output.
    pub display_name: String,
}

impl LocalUser {
    /// Creates a new local user.
    #[must_use]
    pub fn new(id: impl Into<LocalUserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Presence criteria for a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceFilter {
    /// Unspecified.
    #[default]
    Unknown,
    /// Online and playing this title.
    TitleOnline,
    /// Offline, but has played this title.
    TitleOffline,
    /// Online in any title.
    AllOnline,
    /// Offline.
    AllOffline,
    /// Has played this title, online or not.
    AllTitle,
    /// Everyone.
    All,
}

impl PresenceFilter {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::TitleOnline => "title_online",
            Self::TitleOffline => "title_offline",
            Self::AllOnline => "all_online",
            Self::AllOffline => "all_offline",
            Self::AllTitle => "all_title",
            Self::All => "all",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "title_online" => Some(Self::TitleOnline),
            "title_offline" => Some(Self::TitleOffline),
            "all_online" => Some(Self::AllOnline),
            "all_offline" => Some(Self::AllOffline),
            "all_title" => Some(Self::AllTitle),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Relationship criteria for a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipFilter {
    /// Unspecified.
    #[default]
    Unknown,
    /// Friends of the local user.
    Friends,
    /// Friends marked as favorite.
    Favorite,
}

impl RelationshipFilter {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Friends => "friends",
            Self::Favorite => "favorite",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "friends" => Some(Self::Friends),
            "favorite" => Some(Self::Favorite),
            _ => None,
        }
    }
}

/// How much per-user data the aggregation service tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Profile and presence only.
    #[default]
    NoExtraDetail,
    /// Also track title history.
    TitleHistory,
    /// Also track preferred colors.
    PreferredColor,
}

impl DetailLevel {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoExtraDetail => "no_extra_detail",
            Self::TitleHistory => "title_history",
            Self::PreferredColor => "preferred_color",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no_extra_detail" => Some(Self::NoExtraDetail),
            "title_history" => Some(Self::TitleHistory),
            "preferred_color" => Some(Self::PreferredColor),
            _ => None,
        }
    }
}

/// How a social group selects its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupSelector {
    /// Explicit membership.
    List {
        /// Opaque ids of the tracked users.
        target_ids: BTreeSet<String>,
    },
    /// Criteria-based membership.
    Filter {
        /// Presence criteria.
        presence: PresenceFilter,
        /// Relationship criteria.
        relationship: RelationshipFilter,
    },
}

impl GroupSelector {
    /// Creates a list selector from any collection of ids.
    #[must_use]
    pub fn list(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::List {
            target_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a filter selector.
    #[must_use]
    pub const fn filter(presence: PresenceFilter, relationship: RelationshipFilter) -> Self {
        Self::Filter {
            presence,
            relationship,
        }
    }

    /// Returns the group type this selector produces.
    #[must_use]
    pub const fn group_type(&self) -> SocialGroupType {
        match self {
            Self::List { .. } => SocialGroupType::UserList,
            Self::Filter { .. } => SocialGroupType::Filter,
        }
    }
}

/// Kind of social group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialGroupType {
    /// Created from an explicit id list.
    UserList,
    /// Created from a presence/relationship filter pair.
    Filter,
}

/// A social user group owned by a local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialGroup {
    /// Owning local user.
    pub owner: LocalUserId,
    /// Membership selection criteria.
    pub selector: GroupSelector,
    /// Service handle, needed to destroy the group.
    pub handle: GroupHandle,
    /// When the group was added to the registry.
    pub created_at: DateTime<Utc>,
}

impl SocialGroup {
    /// Creates a group record stamped with the current time.
    #[must_use]
    pub fn new(owner: LocalUserId, selector: GroupSelector, handle: GroupHandle) -> Self {
        Self {
            owner,
            selector,
            handle,
            created_at: Utc::now(),
        }
    }

    /// Returns the group type.
    #[must_use]
    pub const fn group_type(&self) -> SocialGroupType {
        self.selector.group_type()
    }

    /// Returns whether `user` owns this group.
    #[must_use]
    pub fn is_owned_by(&self, user: &LocalUserId) -> bool {
        self.owner == *user
    }

    /// Presence filter, for filter groups.
    #[must_use]
    pub const fn presence_filter(&self) -> Option<PresenceFilter> {
        match self.selector {
            GroupSelector::Filter { presence, .. } => Some(presence),
            GroupSelector::List { .. } => None,
        }
    }

    /// Relationship filter, for filter groups.
    #[must_use]
    pub const fn relationship_filter(&self) -> Option<RelationshipFilter> {
        match self.selector {
            GroupSelector::Filter { relationship, .. } => Some(relationship),
            GroupSelector::List { .. } => None,
        }
    }

    /// Tracked ids, for list groups.
    #[must_use]
    pub const fn target_ids(&self) -> Option<&BTreeSet<String>> {
        match &self.selector {
            GroupSelector::List { target_ids } => Some(target_ids),
            GroupSelector::Filter { .. } => None,
        }
    }

    /// Returns whether this is a filter group owned by `user` with exactly
    /// the given filter pair.
    #[must_use]
    pub fn matches_filters(
        &self,
        user: &LocalUserId,
        presence: PresenceFilter,
        relationship: RelationshipFilter,
    ) -> bool {
        self.is_owned_by(user)
            && self.presence_filter() == Some(presence)
            && self.relationship_filter() == Some(relationship)
    }
}

/// Kind of change reported by the aggregation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialEventType {
    /// Unrecognized event.
    #[default]
    Unknown,
    /// Users were added to the social graph.
    UsersAddedToSocialGraph,
    /// Users were removed from the social graph.
    UsersRemovedFromSocialGraph,
    /// Presence of tracked users changed.
    PresenceChanged,
    /// Profiles of tracked users changed.
    ProfilesChanged,
    /// Relationships of tracked users changed.
    SocialRelationshipsChanged,
    /// A local user finished registering.
    LocalUserAdded,
    /// A local user finished unregistering.
    LocalUserRemoved,
    /// A social user group finished loading.
    SocialUserGroupLoaded,
    /// A social user group changed membership.
    SocialUserGroupUpdated,
}

impl SocialEventType {
    /// Converts to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::UsersAddedToSocialGraph => "users_added_to_social_graph",
            Self::UsersRemovedFromSocialGraph => "users_removed_from_social_graph",
            Self::PresenceChanged => "presence_changed",
            Self::ProfilesChanged => "profiles_changed",
            Self::SocialRelationshipsChanged => "social_relationships_changed",
            Self::LocalUserAdded => "local_user_added",
            Self::LocalUserRemoved => "local_user_removed",
            Self::SocialUserGroupLoaded => "social_user_group_loaded",
            Self::SocialUserGroupUpdated => "social_user_group_updated",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "users_added_to_social_graph" => Some(Self::UsersAddedToSocialGraph),
            "users_removed_from_social_graph" => Some(Self::UsersRemovedFromSocialGraph),
            "presence_changed" => Some(Self::PresenceChanged),
            "profiles_changed" => Some(Self::ProfilesChanged),
            "social_relationships_changed" => Some(Self::SocialRelationshipsChanged),
            "local_user_added" => Some(Self::LocalUserAdded),
            "local_user_removed" => Some(Self::LocalUserRemoved),
            "social_user_group_loaded" => Some(Self::SocialUserGroupLoaded),
            "social_user_group_updated" => Some(Self::SocialUserGroupUpdated),
            _ => None,
        }
    }
}

/// A change notification produced by one poll of the aggregation service.
///
/// The registry does not interpret these; they are relayed to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialEvent {
    /// Kind of change.
    pub event_type: SocialEventType,
    /// Local user the event is about.
    pub user: LocalUserId,
    /// Ids of the graph members affected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_ids: Vec<String>,
    /// Error reported by the service for this event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SocialEvent {
    /// Creates an event with no affected ids.
    #[must_use]
    pub const fn new(event_type: SocialEventType, user: LocalUserId) -> Self {
        Self {
            event_type,
            user,
            affected_ids: Vec::new(),
            error: None,
        }
    }

    /// Sets the affected ids.
    #[must_use]
    pub fn with_affected(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.affected_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
