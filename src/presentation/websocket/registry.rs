//! Session Registry
//!
//! Maps user identities to their set of live connections and derives
//! presence transitions from the mutations. The registry is the sole owner
//! of the user-to-connections mapping; a connection that goes away must be
//! reconciled here via [`SessionRegistry::forget`].
//!
//! All operations are infallible: unknown connections and users read as
//! "no-op" or "zero" so presence bookkeeping can never knock the
//! surrounding connection handling off course.

use std::collections::HashSet;

use dashmap::DashMap;
use uuid::Uuid;

/// A derived presence transition, recomputed at each effective mutation.
/// Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChange {
    pub user_id: Uuid,
    pub online: bool,
    pub connections: usize,
}

/// User identity -> live connection set, with a reverse index for cleanup.
///
/// Sharded maps keep mutations exclusive per key without a global lock;
/// traffic for unrelated users never contends.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Invariant: an entry exists iff its connection set is non-empty.
    /// Deleting the entry (not merely emptying it) is the offline signal.
    users: DashMap<Uuid, HashSet<Uuid>>,
    /// Reverse index: connection -> the one identity it represents.
    identities: DashMap<Uuid, Uuid>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a connection with a user identity.
    ///
    /// Idempotent: re-identifying an already-bound (connection, user) pair
    /// changes nothing and emits nothing. A connection represents exactly
    /// one identity, so binding to a different user detaches the previous
    /// association first.
    ///
    /// Returns one [`PresenceChange`] per connection set that actually
    /// changed: at most the previous identity's update and the new one's.
    pub fn identify(&self, connection_id: Uuid, user_id: Uuid) -> Vec<PresenceChange> {
        let mut changes = Vec::new();

        let previous = self.identities.insert(connection_id, user_id);
        if let Some(previous_user) = previous {
            if previous_user == user_id {
                // Same binding; make sure the forward map agrees, but a
                // redundant identify emits no transition
                let mut entry = self.users.entry(user_id).or_default();
                let added = entry.insert(connection_id);
                let connections = entry.len();
                drop(entry);
                if added {
                    changes.push(PresenceChange {
                        user_id,
                        online: true,
                        connections,
                    });
                }
                return changes;
            }

            if let Some(change) = self.detach(previous_user, connection_id) {
                changes.push(change);
            }
        }

        let mut entry = self.users.entry(user_id).or_default();
        entry.insert(connection_id);
        let connections = entry.len();
        drop(entry);

        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            connections,
            "Connection identified"
        );

        changes.push(PresenceChange {
            user_id,
            online: true,
            connections,
        });
        changes
    }

    /// Remove a connection from whichever identity holds it (at most one).
    ///
    /// Callable for never-identified connections; that is a no-op, not an
    /// error. Emptying a user's connection set deletes the entry and yields
    /// the offline transition exactly once.
    pub fn forget(&self, connection_id: Uuid) -> Option<PresenceChange> {
        let (_, user_id) = self.identities.remove(&connection_id)?;
        let change = self.detach(user_id, connection_id);

        if let Some(change) = &change {
            tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                connections = change.connections,
                "Connection forgotten"
            );
        }

        change
    }

    /// Check whether a user has at least one live connection.
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.users
            .get(&user_id)
            .map(|connections| !connections.is_empty())
            .unwrap_or(false)
    }

    /// Number of live connections currently identified as this user.
    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.users
            .get(&user_id)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    /// Remove a connection from a user's set, deleting the entry when it
    /// empties. Returns the resulting transition, or None if the connection
    /// was not in the set.
    fn detach(&self, user_id: Uuid, connection_id: Uuid) -> Option<PresenceChange> {
        let (removed, remaining) = {
            let mut entry = self.users.get_mut(&user_id)?;
            let removed = entry.remove(&connection_id);
            (removed, entry.len())
        };

        if !removed {
            return None;
        }

        if remaining == 0 {
            self.users.remove_if(&user_id, |_, connections| connections.is_empty());
        }

        Some(PresenceChange {
            user_id,
            online: remaining > 0,
            connections: remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn online_iff_connection_count_positive() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        assert!(!registry.is_online(user));
        assert_eq!(registry.connection_count(user), 0);

        registry.identify(conn, user);
        assert!(registry.is_online(user));
        assert_eq!(registry.connection_count(user), 1);

        registry.forget(conn);
        assert!(!registry.is_online(user));
        assert_eq!(registry.connection_count(user), 0);
    }

    #[test]
    fn identify_is_idempotent() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        let first = registry.identify(conn, user);
        assert_eq!(
            first,
            vec![PresenceChange {
                user_id: user,
                online: true,
                connections: 1
            }]
        );

        // Second identify with the same binding: same state, no emission
        let second = registry.identify(conn, user);
        assert!(second.is_empty());
        assert_eq!(registry.connection_count(user), 1);
    }

    #[test]
    fn last_forget_emits_offline_exactly_once() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.identify(conn, user);

        let offline = registry.forget(conn);
        assert_eq!(
            offline,
            Some(PresenceChange {
                user_id: user,
                online: false,
                connections: 0
            })
        );

        // The entry is gone; a second forget is a silent no-op
        assert_eq!(registry.forget(conn), None);
    }

    #[test]
    fn second_connection_keeps_user_online() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let tab_a = Uuid::new_v4();
        let tab_b = Uuid::new_v4();

        registry.identify(tab_a, user);
        let changes = registry.identify(tab_b, user);
        assert_eq!(
            changes,
            vec![PresenceChange {
                user_id: user,
                online: true,
                connections: 2
            }]
        );

        // Closing one tab drops the count but not the presence
        let change = registry.forget(tab_b);
        assert_eq!(
            change,
            Some(PresenceChange {
                user_id: user,
                online: true,
                connections: 1
            })
        );
        assert!(registry.is_online(user));
    }

    #[test]
    fn rebinding_a_connection_detaches_the_previous_identity() {
        let registry = SessionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.identify(conn, alice);
        let changes = registry.identify(conn, bob);

        // Alice went offline, Bob came online, in that order
        assert_eq!(
            changes,
            vec![
                PresenceChange {
                    user_id: alice,
                    online: false,
                    connections: 0
                },
                PresenceChange {
                    user_id: bob,
                    online: true,
                    connections: 1
                },
            ]
        );
        assert!(!registry.is_online(alice));
        assert!(registry.is_online(bob));
    }

    #[test]
    fn forget_unknown_connection_is_a_noop() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.forget(Uuid::new_v4()), None);
    }

    #[test]
    fn empty_user_entries_are_deleted_not_kept() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.identify(conn, user);
        registry.forget(conn);

        // The map entry itself must be gone, not merely empty
        assert!(!registry.users.contains_key(&user));
        assert!(!registry.identities.contains_key(&conn));
    }
}
