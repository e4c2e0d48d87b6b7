//! Integration tests for the social manager.
//!
//! These tests verify the behavior of the public facade including:
//! - User registration and removal
//! - Group lifecycle against the aggregation service
//! - Tick polling and event relay
//! - Snapshot consistency under concurrent mutation

use std::sync::Arc;
use std::thread;

use social_sync::testing::{MockAggregationService, RecordingSink};
use social_sync::{
    DefaultGroup, DetailLevel, LocalUser, LocalUserId, PresenceFilter, RelationshipFilter,
    SocialConfig, SocialEvent, SocialEventType, SocialGroupType, SocialManager,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn create_manager() -> (Arc<MockAggregationService>, Arc<SocialManager>) {
    init_tracing();
    let service = Arc::new(MockAggregationService::new());
    let manager = SocialManager::new(service.clone(), SocialConfig::default())
        .expect("should create manager");
    (service, Arc::new(manager))
}

// ============================================================================
// End-to-end Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn removing_user_clears_all_their_groups() {
        let (service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");

        manager.add_local_user(&alice).unwrap();
        manager
            .create_group_from_list(&alice, &ids(&["X", "Y"]))
            .unwrap();
        manager
            .create_group_from_filters(
                &alice,
                PresenceFilter::AllOnline,
                RelationshipFilter::Friends,
            )
            .unwrap();
        assert_eq!(manager.group_count().unwrap(), 2);

        manager.remove_local_user(&alice).unwrap();

        assert!(manager.snapshot_groups().unwrap().is_empty());
        assert_eq!(service.unregister_calls(), vec![LocalUserId::from("A")]);
        assert!(!manager.is_registered(&alice.id).unwrap());
    }

    #[test]
    fn groups_record_owner_and_selector() {
        let (_service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");
        manager.add_local_user(&alice).unwrap();

        manager
            .create_group_from_list(&alice, &ids(&["Y", "X", "Y"]))
            .unwrap();

        let groups = manager.snapshot_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owner, alice.id);
        assert_eq!(groups[0].group_type(), SocialGroupType::UserList);
        let targets: Vec<&str> = groups[0]
            .target_ids()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(targets, vec!["X", "Y"]);
    }

    #[test]
    fn readding_user_keeps_single_registration() {
        let (service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");

        manager.add_local_user(&alice).unwrap();
        manager.add_local_user(&alice).unwrap();

        assert_eq!(manager.local_users().unwrap().len(), 1);
        assert_eq!(service.register_calls().len(), 2);
    }

    #[test]
    fn owner_comparison_is_case_sensitive() {
        let (_service, manager) = create_manager();
        let upper = LocalUser::new("Alice", "Alice");
        let lower = LocalUser::new("alice", "alice");
        manager.initialize([&upper, &lower]).unwrap();

        manager.create_group_from_list(&upper, &ids(&["X"])).unwrap();
        manager.create_group_from_list(&lower, &ids(&["X"])).unwrap();
        manager.remove_local_user(&lower).unwrap();

        let groups = manager.snapshot_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owner, upper.id);
    }

    #[test]
    fn default_groups_follow_configuration() {
        init_tracing();
        let service = Arc::new(MockAggregationService::new());
        let config = SocialConfig::from_json(
            r#"{
                "detail_level": "preferred_color",
                "default_groups": [
                    {"kind": "filters", "presence": "title_online", "relationship": "friends"}
                ]
            }"#,
        )
        .unwrap();
        let manager = SocialManager::new(service.clone(), config).unwrap();
        let alice = LocalUser::new("A", "Alice");
        let bob = LocalUser::new("B", "Bob");

        manager.initialize([&alice, &bob]).unwrap();

        assert_eq!(manager.group_count().unwrap(), 2);
        assert!(service
            .register_calls()
            .iter()
            .all(|(_, level)| *level == DetailLevel::PreferredColor));

        manager
            .destroy_filter_groups(&alice, PresenceFilter::TitleOnline, RelationshipFilter::Friends)
            .unwrap();
        let groups = manager.snapshot_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owner, bob.id);
    }

    #[test]
    fn failing_default_group_does_not_block_registration() {
        init_tracing();
        let service = Arc::new(MockAggregationService::new());
        service.set_fail_creations(true);
        let config = SocialConfig::new().with_default_group(DefaultGroup::List {
            target_ids: ids(&["X"]),
        });
        let manager = SocialManager::new(service, config).unwrap();
        let alice = LocalUser::new("A", "Alice");

        manager.add_local_user(&alice).unwrap();

        assert!(manager.is_registered(&alice.id).unwrap());
        assert_eq!(manager.group_count().unwrap(), 0);
    }
}

// ============================================================================
// Destruction Tests
// ============================================================================

mod destruction_tests {
    use super::*;

    #[test]
    fn destroy_list_groups_spares_other_owners_and_filters() {
        let (service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");
        let bob = LocalUser::new("B", "Bob");
        manager.initialize([&alice, &bob]).unwrap();

        manager.create_group_from_list(&alice, &ids(&["1"])).unwrap();
        manager.create_group_from_list(&alice, &ids(&["2"])).unwrap();
        manager
            .create_group_from_filters(&alice, PresenceFilter::All, RelationshipFilter::Favorite)
            .unwrap();
        manager.create_group_from_list(&bob, &ids(&["3"])).unwrap();

        assert_eq!(manager.destroy_list_groups(&alice).unwrap(), 2);

        let groups = manager.snapshot_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(service.destroyed().len(), 2);
        assert!(groups
            .iter()
            .any(|g| g.owner == alice.id && g.group_type() == SocialGroupType::Filter));
        assert!(groups
            .iter()
            .any(|g| g.owner == bob.id && g.group_type() == SocialGroupType::UserList));
    }

    #[test]
    fn destroy_on_empty_registry_is_noop() {
        let (service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");

        assert_eq!(manager.destroy_list_groups(&alice).unwrap(), 0);
        assert_eq!(
            manager
                .destroy_filter_groups(&alice, PresenceFilter::All, RelationshipFilter::Friends)
                .unwrap(),
            0
        );
        assert!(service.destroyed().is_empty());
    }
}

// ============================================================================
// Poll Tests
// ============================================================================

mod poll_tests {
    use super::*;

    #[test]
    fn poll_returns_batches_in_order() {
        init_tracing();
        let service = Arc::new(MockAggregationService::new());
        let sink = Arc::new(RecordingSink::new());
        let manager =
            SocialManager::with_sink(service.clone(), SocialConfig::default(), sink.clone())
                .unwrap();

        let first = vec![
            SocialEvent::new(SocialEventType::LocalUserAdded, "A".into()),
            SocialEvent::new(SocialEventType::SocialUserGroupLoaded, "A".into()),
        ];
        let second = vec![SocialEvent::new(SocialEventType::PresenceChanged, "A".into())
            .with_affected(["X"])];
        service.push_events(first.clone());
        service.push_events(second.clone());

        assert_eq!(manager.poll().unwrap(), first);
        assert_eq!(manager.poll().unwrap(), second);
        assert!(manager.poll().unwrap().is_empty());

        assert_eq!(sink.batches(), vec![first, second, Vec::new()]);
        let stats = manager.poll_stats().unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.ticks_with_updates, 2);
        assert_eq!(stats.ticks_without_updates, 1);
        assert_eq!(stats.events_relayed, 3);
    }

    #[test]
    fn poll_without_users_is_empty() {
        let (_service, manager) = create_manager();
        assert!(manager.poll().unwrap().is_empty());
        assert!(manager.local_users().unwrap().is_empty());
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    const GROUPS_PER_USER: usize = 5;

    #[test]
    fn snapshot_never_sees_partial_user_removal() {
        let (_service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");
        let bob = LocalUser::new("B", "Bob");
        manager.add_local_user(&bob).unwrap();
        manager.create_group_from_list(&bob, &ids(&["X"])).unwrap();

        for _ in 0..20 {
            manager.add_local_user(&alice).unwrap();
            for i in 0..GROUPS_PER_USER {
                manager
                    .create_group_from_list(&alice, &[i.to_string()])
                    .unwrap();
            }

            thread::scope(|scope| {
                scope.spawn(|| manager.remove_local_user(&alice).unwrap());
                scope.spawn(|| {
                    for _ in 0..200 {
                        let snapshot = manager.snapshot_groups().unwrap();
                        let owned = snapshot.iter().filter(|g| g.owner == alice.id).count();
                        assert!(owned == 0 || owned == GROUPS_PER_USER, "saw {owned} groups");
                        assert!(snapshot.iter().any(|g| g.owner == bob.id));
                    }
                });
            });

            assert_eq!(manager.group_count().unwrap(), 1);
        }
    }

    #[test]
    fn snapshot_never_sees_partial_list_destruction() {
        let (_service, manager) = create_manager();
        let alice = LocalUser::new("A", "Alice");
        manager.add_local_user(&alice).unwrap();
        manager
            .create_group_from_filters(&alice, PresenceFilter::All, RelationshipFilter::Friends)
            .unwrap();

        for _ in 0..20 {
            for i in 0..GROUPS_PER_USER {
                manager
                    .create_group_from_list(&alice, &[i.to_string()])
                    .unwrap();
            }

            thread::scope(|scope| {
                scope.spawn(|| manager.destroy_list_groups(&alice).unwrap());
                scope.spawn(|| {
                    for _ in 0..200 {
                        let lists = manager
                            .snapshot_groups()
                            .unwrap()
                            .iter()
                            .filter(|g| g.group_type() == SocialGroupType::UserList)
                            .count();
                        assert!(lists == 0 || lists == GROUPS_PER_USER, "saw {lists} lists");
                    }
                });
            });
        }

        assert_eq!(manager.group_count().unwrap(), 1);
    }

    #[test]
    fn concurrent_users_and_polls_leave_consistent_registry() {
        let (service, manager) = create_manager();

        thread::scope(|scope| {
            for n in 0..8 {
                let manager = Arc::clone(&manager);
                scope.spawn(move || {
                    let user = LocalUser::new(format!("user-{n}"), format!("Player {n}"));
                    for _ in 0..25 {
                        manager.add_local_user(&user).unwrap();
                        manager.create_group_from_list(&user, &ids(&["X"])).unwrap();
                        manager
                            .create_group_from_filters(
                                &user,
                                PresenceFilter::AllOnline,
                                RelationshipFilter::Friends,
                            )
                            .unwrap();
                        manager.remove_local_user(&user).unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..200 {
                    manager.poll().unwrap();
                }
            });
        });

        assert_eq!(manager.group_count().unwrap(), 0);
        assert!(manager.local_users().unwrap().is_empty());
        assert_eq!(service.unregister_calls().len(), 8 * 25);
        assert_eq!(manager.poll_stats().unwrap().ticks, 200);
    }
}
