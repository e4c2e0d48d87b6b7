//! High-level social manager API.
//!
//! This module provides the [`SocialManager`], the only entry point other
//! subsystems call. It combines the injected [`AggregationService`] with the
//! local registry ([`LocalUserSet`] and [`GroupRegistry`]) and keeps the two
//! consistent.
//!
//! # Locking
//!
//! One `Mutex` guards the user set, the group registry and the poll
//! statistics together. Every read and every mutation takes it; owner removal
//! and removal of the owner's groups happen within one acquisition. Group
//! creation calls the service without the guard and commits the result under
//! it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use super::config::{DefaultGroup, SocialConfig};
use super::error::{Result, SocialError};
use super::registry::{GroupId, GroupRegistry, LocalUserSet};
use super::service::{AggregationService, GroupHandle};
use super::sink::{SocialEventSink, TracingEventSink};
use super::stats::PollStats;
use super::types::{
    GroupSelector, LocalUser, LocalUserId, PresenceFilter, RelationshipFilter, SocialEvent,
    SocialGroup, SocialGroupType,
};

/// Everything protected by the manager's guard.
#[derive(Debug, Default)]
struct SocialState {
    users: LocalUserSet,
    groups: GroupRegistry,
    stats: PollStats,
}

impl SocialState {
    /// Every group's owner must be registered whenever the guard is released.
    fn debug_check_owners(&self) {
        debug_assert!(
            self.groups
                .iter()
                .all(|(_, group)| self.users.contains(&group.owner)),
            "social group outlived its owner's registration"
        );
    }

    /// Destroys and removes every group matching `predicate`.
    fn destroy_where<F>(&mut self, service: &dyn AggregationService, predicate: F) -> usize
    where
        F: Fn(&SocialGroup) -> bool,
    {
        let matched: Vec<(GroupId, GroupHandle)> = self
            .groups
            .iter()
            .filter(|(_, group)| predicate(group))
            .map(|(id, group)| (id, group.handle))
            .collect();

        for (id, handle) in &matched {
            service.destroy_group(*handle);
            self.groups.remove(*id);
        }
        matched.len()
    }
}

/// Coordinates local users and social groups with the aggregation service.
///
/// All methods take `&self`; share the manager between threads with `Arc`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use social_sync::testing::MockAggregationService;
/// use social_sync::{LocalUser, PresenceFilter, RelationshipFilter, SocialConfig, SocialManager};
///
/// let service = Arc::new(MockAggregationService::new());
/// let manager = SocialManager::new(service, SocialConfig::default()).unwrap();
///
/// let user = LocalUser::new("2533274790395904", "Player One");
/// manager.add_local_user(&user).unwrap();
/// manager
///     .create_group_from_filters(&user, PresenceFilter::AllOnline, RelationshipFilter::Friends)
///     .unwrap();
///
/// assert_eq!(manager.snapshot_groups().unwrap().len(), 1);
/// manager.poll().unwrap();
/// ```
pub struct SocialManager {
    service: Arc<dyn AggregationService>,
    sink: Arc<dyn SocialEventSink>,
    config: SocialConfig,
    state: Mutex<SocialState>,
}

impl fmt::Debug for SocialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialManager")
            .field("service", &"<dyn AggregationService>")
            .field("sink", &"<dyn SocialEventSink>")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SocialManager {
    /// Creates a manager that logs polled events through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(service: Arc<dyn AggregationService>, config: SocialConfig) -> Result<Self> {
        Self::with_sink(service, config, Arc::new(TracingEventSink))
    }

    /// Creates a manager that relays polled events to `sink`.
    ///
    /// # Arguments
    ///
    /// * `service` - The aggregation service that owns the social graph
    /// * `config` - Detail level and default groups, validated here
    /// * `sink` - Receives every batch returned by [`poll`](Self::poll)
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_sink(
        service: Arc<dyn AggregationService>,
        config: SocialConfig,
        sink: Arc<dyn SocialEventSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service,
            sink,
            config,
            state: Mutex::new(SocialState::default()),
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &SocialConfig {
        &self.config
    }

    fn state(&self) -> Result<MutexGuard<'_, SocialState>> {
        Ok(self.state.lock()?)
    }

    // ==================== Local Users ====================

    /// Adds every user in `users`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn initialize<'a>(&self, users: impl IntoIterator<Item = &'a LocalUser>) -> Result<()> {
        for user in users {
            self.add_local_user(user)?;
        }
        Ok(())
    }

    /// Registers `user` with the aggregation service, then creates the
    /// configured default groups for it.
    ///
    /// Default groups are created after the guard is released; other
    /// operations may interleave with that step.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn add_local_user(&self, user: &LocalUser) -> Result<()> {
        {
            let mut state = self.state()?;
            info!(user = %user.id, name = %user.display_name, "adding user to social manager");
            self.service.register_user(user, self.config.detail_level);
            state.users.insert(user.clone());
            debug!(users = state.users.len(), "local user registered");
        }

        self.create_default_groups(user)
    }

    fn create_default_groups(&self, user: &LocalUser) -> Result<()> {
        for group in &self.config.default_groups {
            match group {
                DefaultGroup::Filters {
                    presence,
                    relationship,
                } => self.create_group_from_filters(user, *presence, *relationship)?,
                DefaultGroup::List { target_ids } => {
                    self.create_group_from_list(user, target_ids)?;
                }
            }
        }
        Ok(())
    }

    /// Removes every group owned by `user`, then unregisters it.
    ///
    /// Both happen within one guard acquisition. Removing a user that is not
    /// registered leaves the registry untouched; the unregister call is still
    /// forwarded to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn remove_local_user(&self, user: &LocalUser) -> Result<()> {
        let mut state = self.state()?;
        info!(user = %user.id, name = %user.display_name, "removing user from social manager");

        let removed = state.groups.remove_where(|group| group.is_owned_by(&user.id));
        if !removed.is_empty() {
            debug!(user = %user.id, groups = removed.len(), "dropped groups of departing user");
        }
        state.users.remove(&user.id);
        self.service.unregister_user(user);
        if state.users.is_empty() {
            debug!("no local users remain registered");
        }

        state.debug_check_owners();
        Ok(())
    }

    /// Returns the registered users in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn local_users(&self) -> Result<Vec<LocalUser>> {
        Ok(self.state()?.users.iter().cloned().collect())
    }

    /// Returns whether `id` is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn is_registered(&self, id: &LocalUserId) -> Result<bool> {
        Ok(self.state()?.users.contains(id))
    }

    /// Returns the stored record for `id`, if registered.
    ///
    /// Re-adding a user refreshes this record, so the display name is the
    /// most recent one passed to [`add_local_user`](Self::add_local_user).
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn local_user(&self, id: &LocalUserId) -> Result<Option<LocalUser>> {
        Ok(self.state()?.users.get(id).cloned())
    }

    // ==================== Group Creation ====================

    /// Creates a list group for `user`, absorbing service rejections.
    ///
    /// An empty `target_ids` is a no-op. A rejected request leaves the
    /// registry unchanged and is only logged.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry guard is poisoned.
    pub fn create_group_from_list(&self, user: &LocalUser, target_ids: &[String]) -> Result<()> {
        absorb_creation_failure(&user.id, self.try_create_group_from_list(user, target_ids))
    }

    /// Creates a list group for `user`, reporting why it failed.
    ///
    /// Returns `Ok(None)` for an empty `target_ids` without calling the
    /// service, and `Ok(Some(id))` once the group is in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::UserNotRegistered`] if `user` is not registered
    /// (before or after the service call), the service's error if it rejects
    /// the request, or [`SocialError::Lock`] if the guard is poisoned.
    pub fn try_create_group_from_list(
        &self,
        user: &LocalUser,
        target_ids: &[String],
    ) -> Result<Option<GroupId>> {
        if target_ids.is_empty() {
            return Ok(None);
        }

        self.ensure_registered(&user.id)?;
        let handle = self.service.create_group_from_list(user, target_ids)?;
        self.commit_group(user, GroupSelector::list(target_ids.iter().cloned()), handle)
            .map(Some)
    }

    /// Creates a filter group for `user`, absorbing service rejections.
    ///
    /// Identical filter groups are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry guard is poisoned.
    pub fn create_group_from_filters(
        &self,
        user: &LocalUser,
        presence: PresenceFilter,
        relationship: RelationshipFilter,
    ) -> Result<()> {
        absorb_creation_failure(
            &user.id,
            self.try_create_group_from_filters(user, presence, relationship)
                .map(Some),
        )
    }

    /// Creates a filter group for `user`, reporting why it failed.
    ///
    /// # Arguments
    ///
    /// * `user` - The owning local user, which must be registered
    /// * `presence` - Presence criteria for membership
    /// * `relationship` - Relationship criteria for membership
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::UserNotRegistered`] if `user` is not registered
    /// (before or after the service call), the service's error if it rejects
    /// the request, or [`SocialError::Lock`] if the guard is poisoned.
    pub fn try_create_group_from_filters(
        &self,
        user: &LocalUser,
        presence: PresenceFilter,
        relationship: RelationshipFilter,
    ) -> Result<GroupId> {
        self.ensure_registered(&user.id)?;
        let handle = self
            .service
            .create_group_from_filters(user, presence, relationship)?;
        self.commit_group(user, GroupSelector::filter(presence, relationship), handle)
    }

    fn ensure_registered(&self, id: &LocalUserId) -> Result<()> {
        if self.state()?.users.contains(id) {
            Ok(())
        } else {
            Err(SocialError::UserNotRegistered(id.to_string()))
        }
    }

    /// Appends a freshly created group, unless its owner was removed while
    /// the service call was in flight.
    fn commit_group(
        &self,
        user: &LocalUser,
        selector: GroupSelector,
        handle: GroupHandle,
    ) -> Result<GroupId> {
        let mut state = self.state()?;

        if !state.users.contains(&user.id) {
            self.service.destroy_group(handle);
            return Err(SocialError::UserNotRegistered(user.id.to_string()));
        }

        let group_type = selector.group_type();
        let id = state
            .groups
            .insert(SocialGroup::new(user.id.clone(), selector, handle));
        debug!(user = %user.id, handle = %handle, ?group_type, "created social group");

        state.debug_check_owners();
        Ok(id)
    }

    // ==================== Group Destruction ====================

    /// Destroys every list group owned by `user`.
    ///
    /// Filter groups of `user` and groups of other users are untouched.
    /// Returns the number of groups destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn destroy_list_groups(&self, user: &LocalUser) -> Result<usize> {
        let mut state = self.state()?;
        let destroyed = state.destroy_where(self.service.as_ref(), |group| {
            group.is_owned_by(&user.id) && group.group_type() == SocialGroupType::UserList
        });
        debug!(user = %user.id, destroyed, "destroyed list groups");
        Ok(destroyed)
    }

    /// Destroys every group owned by `user` with exactly this filter pair.
    ///
    /// Returns the number of groups destroyed; zero if nothing matched.
    ///
    /// # Arguments
    ///
    /// * `user` - Owner of the groups to destroy
    /// * `presence` - Presence filter the group must have been created with
    /// * `relationship` - Relationship filter the group must have been created with
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn destroy_filter_groups(
        &self,
        user: &LocalUser,
        presence: PresenceFilter,
        relationship: RelationshipFilter,
    ) -> Result<usize> {
        let mut state = self.state()?;
        let destroyed = state.destroy_where(self.service.as_ref(), |group| {
            group.matches_filters(&user.id, presence, relationship)
        });
        debug!(
            user = %user.id,
            presence = presence.as_str(),
            relationship = relationship.as_str(),
            destroyed,
            "destroyed filter groups"
        );
        Ok(destroyed)
    }

    // ==================== Tick ====================

    /// Pulls this tick's events from the service and relays them to the sink.
    ///
    /// Call once per tick. Never changes the user set or the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn poll(&self) -> Result<Vec<SocialEvent>> {
        let mut state = self.state()?;

        let started = Instant::now();
        let events = self.service.poll();
        state.stats.record(events.len(), started.elapsed());

        trace!(events = events.len(), "polled aggregation service");
        self.sink.on_events(&events);
        Ok(events)
    }

    /// Returns a copy of the poll counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn poll_stats(&self) -> Result<PollStats> {
        Ok(self.state()?.stats)
    }

    // ==================== Snapshots ====================

    /// Returns a copy of the active groups in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn snapshot_groups(&self) -> Result<Vec<SocialGroup>> {
        Ok(self.state()?.groups.snapshot())
    }

    /// Number of active groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn group_count(&self) -> Result<usize> {
        Ok(self.state()?.groups.len())
    }

    /// Returns whether `id` owns any active group.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry guard is poisoned.
    pub fn has_groups(&self, id: &LocalUserId) -> Result<bool> {
        Ok(self.state()?.groups.has_groups_for(id))
    }
}

/// Swallows creation failures, keeping only guard poisoning.
fn absorb_creation_failure(user: &LocalUserId, result: Result<Option<GroupId>>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err @ SocialError::Lock(_)) => Err(err),
        Err(err) => {
            warn!(user = %user, error = %err, "social group creation failed");
            Ok(())
        }
    }
}
