//! Test doubles for the aggregation service and event sink.
//!
//! Only compiled for tests or with the `test-utils` feature. Every call is
//! recorded so tests can assert on what reached the service.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::social::{
    AggregationService, DetailLevel, GroupHandle, LocalUser, LocalUserId, PresenceFilter,
    RelationshipFilter, Result, SocialError, SocialEvent, SocialEventSink,
};

#[derive(Debug, Default)]
struct MockState {
    registered: Vec<(LocalUserId, DetailLevel)>,
    unregistered: Vec<LocalUserId>,
    create_calls: usize,
    destroyed: Vec<GroupHandle>,
    pending_events: VecDeque<Vec<SocialEvent>>,
    fail_creations: bool,
    next_handle: u64,
    last_handle: Option<GroupHandle>,
}

/// In-memory aggregation service that records every call.
///
/// Each queued batch from [`push_events`](Self::push_events) is returned by
/// one [`poll`](AggregationService::poll); with nothing queued, polls return
/// an empty batch.
#[derive(Debug, Default)]
pub struct MockAggregationService {
    state: Mutex<MockState>,
}

impl MockAggregationService {
    /// Creates a service that accepts every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes subsequent group creations fail.
    pub fn set_fail_creations(&self, fail: bool) {
        self.state().fail_creations = fail;
    }

    /// Queues one batch for a future poll.
    pub fn push_events(&self, events: Vec<SocialEvent>) {
        self.state().pending_events.push_back(events);
    }

    /// Users registered so far, with their detail level.
    #[must_use]
    pub fn register_calls(&self) -> Vec<(LocalUserId, DetailLevel)> {
        self.state().registered.clone()
    }

    /// Users unregistered so far.
    #[must_use]
    pub fn unregister_calls(&self) -> Vec<LocalUserId> {
        self.state().unregistered.clone()
    }

    /// Number of create requests received, successful or not.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    /// Handles destroyed so far, in call order.
    #[must_use]
    pub fn destroyed(&self) -> Vec<GroupHandle> {
        self.state().destroyed.clone()
    }

    /// Handle issued by the most recent successful creation.
    #[must_use]
    pub fn last_handle(&self) -> Option<GroupHandle> {
        self.state().last_handle
    }

    fn create(&self) -> Result<GroupHandle> {
        let mut state = self.state();
        state.create_calls += 1;
        if state.fail_creations {
            return Err(SocialError::CreationFailed(
                "mock service rejected the request".to_string(),
            ));
        }
        state.next_handle += 1;
        let handle = GroupHandle::new(state.next_handle);
        state.last_handle = Some(handle);
        Ok(handle)
    }
}

impl AggregationService for MockAggregationService {
    fn register_user(&self, user: &LocalUser, detail_level: DetailLevel) {
        self.state().registered.push((user.id.clone(), detail_level));
    }

    fn unregister_user(&self, user: &LocalUser) {
        self.state().unregistered.push(user.id.clone());
    }

    fn create_group_from_list(
        &self,
        _user: &LocalUser,
        _target_ids: &[String],
    ) -> Result<GroupHandle> {
        self.create()
    }

    fn create_group_from_filters(
        &self,
        _user: &LocalUser,
        _presence: PresenceFilter,
        _relationship: RelationshipFilter,
    ) -> Result<GroupHandle> {
        self.create()
    }

    fn destroy_group(&self, handle: GroupHandle) {
        self.state().destroyed.push(handle);
    }

    fn poll(&self) -> Vec<SocialEvent> {
        self.state().pending_events.pop_front().unwrap_or_default()
    }
}

/// Event sink that keeps every batch it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<SocialEvent>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far, one per poll.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<SocialEvent>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SocialEventSink for RecordingSink {
    fn on_events(&self, events: &[SocialEvent]) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(events.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::SocialEventType;

    #[test]
    fn mock_issues_distinct_handles() {
        let service = MockAggregationService::new();
        let user = LocalUser::new("a", "Alice");
        let first = service.create_group_from_list(&user, &["x".to_string()]).unwrap();
        let second = service
            .create_group_from_filters(&user, PresenceFilter::All, RelationshipFilter::Friends)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(service.last_handle(), Some(second));
        assert_eq!(service.create_calls(), 2);
    }

    #[test]
    fn mock_failure_still_counts_call() {
        let service = MockAggregationService::new();
        service.set_fail_creations(true);
        let user = LocalUser::new("a", "Alice");

        assert!(service.create_group_from_list(&user, &["x".to_string()]).is_err());
        assert_eq!(service.create_calls(), 1);
        assert_eq!(service.last_handle(), None);
    }

    #[test]
    fn mock_poll_drains_batches_in_order() {
        let service = MockAggregationService::new();
        service.push_events(vec![SocialEvent::new(
            SocialEventType::ProfilesChanged,
            "a".into(),
        )]);

        assert_eq!(service.poll().len(), 1);
        assert!(service.poll().is_empty());
    }
}
