//! Registry of local users and their social groups.
//!
//! Neither type here is synchronized; [`SocialManager`](super::SocialManager)
//! owns both behind a single guard so that owner removal and group removal
//! are observed together.

use super::types::{LocalUser, LocalUserId, SocialGroup};

/// Stable reference to a group stored in a [`GroupRegistry`].
///
/// Ids are generational: once a group is removed its id never resolves
/// again, even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    group: Option<SocialGroup>,
}

/// Arena of active social groups, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    slots: Vec<Slot>,
    free: Vec<usize>,
    order: Vec<GroupId>,
}

impl GroupRegistry {
    /// Number of active groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether no groups are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Appends a group and returns its id.
    pub fn insert(&mut self, group: SocialGroup) -> GroupId {
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.group = Some(group);
            GroupId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                group: Some(group),
            });
            GroupId {
                index,
                generation: 0,
            }
        };
        self.order.push(id);
        id
    }

    /// Looks up a group by id.
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&SocialGroup> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.group.as_ref())
    }

    /// Removes a group, freeing its slot.
    pub fn remove(&mut self, id: GroupId) -> Option<SocialGroup> {
        let group = self.free_slot(id)?;
        self.order.retain(|existing| *existing != id);
        Some(group)
    }

    /// Removes every group matching `predicate`, returning them in
    /// insertion order.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<SocialGroup>
    where
        F: FnMut(&SocialGroup) -> bool,
    {
        let matched: Vec<GroupId> = self
            .iter()
            .filter(|(_, group)| predicate(group))
            .map(|(id, _)| id)
            .collect();

        let removed: Vec<SocialGroup> = matched
            .iter()
            .filter_map(|id| self.free_slot(*id))
            .collect();
        self.order.retain(|id| !matched.contains(id));
        removed
    }

    /// Iterates active groups in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &SocialGroup)> {
        self.order
            .iter()
            .filter_map(|id| self.get(*id).map(|group| (*id, group)))
    }

    /// Returns whether any active group is owned by `user`.
    #[must_use]
    pub fn has_groups_for(&self, user: &LocalUserId) -> bool {
        self.iter().any(|(_, group)| group.is_owned_by(user))
    }

    /// Copies the active groups into independent storage.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SocialGroup> {
        self.iter().map(|(_, group)| group.clone()).collect()
    }

    /// Empties a slot and bumps its generation. A slot whose generation is
    /// exhausted is retired rather than returned to the free list.
    fn free_slot(&mut self, id: GroupId) -> Option<SocialGroup> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let group = slot.group.take()?;
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(id.index);
        }
        Some(group)
    }
}

/// Local users currently registered with the aggregation service.
#[derive(Debug, Clone, Default)]
pub struct LocalUserSet {
    users: Vec<LocalUser>,
}

impl LocalUserSet {
    /// Registers a user. Returns `false` if the id was already present, in
    /// which case the stored record is refreshed.
    pub fn insert(&mut self, user: LocalUser) -> bool {
        if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user;
            return false;
        }
        self.users.push(user);
        true
    }

    /// Unregisters a user by id.
    pub fn remove(&mut self, id: &LocalUserId) -> Option<LocalUser> {
        let position = self.users.iter().position(|u| u.id == *id)?;
        Some(self.users.remove(position))
    }

    /// Returns whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &LocalUserId) -> bool {
        self.users.iter().any(|u| u.id == *id)
    }

    /// Looks up a registered user.
    #[must_use]
    pub fn get(&self, id: &LocalUserId) -> Option<&LocalUser> {
        self.users.iter().find(|u| u.id == *id)
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns whether no users are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterates users in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LocalUser> {
        self.users.iter()
    }
}
