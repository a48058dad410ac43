//! Local transaction records of the offline log.

use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of mutation a log entry replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Create an entity.
    Insert,
    /// Replace the entity stored under its key.
    UpdateById,
    /// Delete by key.
    DeleteById,
    /// Delete the given entity.
    DeleteByEntity,
    /// Delete every entity.
    DeleteAll,
}

impl ActionKind {
    /// Returns the action as text, as it is mirrored in `action_name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Insert => "Insert",
            ActionKind::UpdateById => "UpdateById",
            ActionKind::DeleteById => "DeleteById",
            ActionKind::DeleteByEntity => "DeleteByEntity",
            ActionKind::DeleteAll => "DeleteAll",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation made while offline, pending replay.
///
/// `entity` is `None` only for [`ActionKind::DeleteAll`] (and for a
/// `DeleteById` whose target was not in the local table). `id` is set
/// only for [`ActionKind::DeleteById`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalTransaction<T> {
    /// Target key of a `DeleteById`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Entity payload. A missing field reads back as `None`.
    pub entity: Option<T>,
    /// What to replay.
    pub action: ActionKind,
    /// `action` mirrored as text.
    pub action_name: String,
    /// Set once the entry's key has been remapped to a server key.
    #[serde(default)]
    pub reconciled: bool,
}

impl<T: Entity> LocalTransaction<T> {
    fn new(action: ActionKind, entity: Option<T>, id: Option<i64>) -> Self {
        Self {
            id,
            entity,
            action,
            action_name: action.to_string(),
            reconciled: false,
        }
    }

    /// Records an insert of `entity` as stored locally.
    pub fn insert(entity: T) -> Self {
        Self::new(ActionKind::Insert, Some(entity), None)
    }

    /// Records an update of `entity`.
    pub fn update_by_id(entity: T) -> Self {
        Self::new(ActionKind::UpdateById, Some(entity), None)
    }

    /// Records a delete of `id`; `snapshot` is the row as it was locally, if known.
    pub fn delete_by_id(id: i64, snapshot: Option<T>) -> Self {
        Self::new(ActionKind::DeleteById, snapshot, Some(id))
    }

    /// Records a delete of every entity.
    pub fn delete_all() -> Self {
        Self::new(ActionKind::DeleteAll, None, None)
    }

    /// Returns the key this entry refers to.
    pub fn target_key(&self) -> Option<i64> {
        match self.action {
            ActionKind::DeleteById => self.id,
            _ => self.entity.as_ref().map(Entity::key),
        }
    }

    /// Rewrites every reference to `offline_key` into `server_key`.
    ///
    /// Only the key changes; the rest of the payload is kept. Entries that
    /// were already remapped are left alone. Returns whether anything changed.
    pub fn remap_key(&mut self, offline_key: i64, server_key: i64) -> bool {
        if self.reconciled || offline_key == server_key {
            return false;
        }

        let mut changed = false;
        if let Some(entity) = self.entity.as_mut() {
            if entity.key() == offline_key {
                entity.set_key(server_key);
                changed = true;
            }
        }
        if self.id == Some(offline_key) {
            self.id = Some(server_key);
            changed = true;
        }

        self.reconciled = changed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_entity::Account;
    use serde_json::json;

    #[test]
    fn action_name_mirrors_action() {
        let tx = LocalTransaction::insert(Account::new(1, "a", 0));
        assert_eq!(tx.action_name, "Insert");

        let tx = LocalTransaction::<Account>::delete_all();
        assert_eq!(tx.action_name, "DeleteAll");
        assert!(tx.entity.is_none());
        assert!(tx.id.is_none());
    }

    #[test]
    fn serialized_layout() {
        let tx = LocalTransaction::delete_by_id(4, Some(Account::new(4, "a", 1)));
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 4,
                "entity": {"id": 4, "name": "a", "balance": 1},
                "action": "DeleteById",
                "action_name": "DeleteById",
                "reconciled": false
            })
        );

        let back: LocalTransaction<Account> = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn row_without_entity_reads_back() {
        let back: LocalTransaction<Account> = serde_json::from_value(json!({
            "seq": 3,
            "action": "DeleteAll",
            "action_name": "DeleteAll",
        }))
        .unwrap();

        assert_eq!(back, LocalTransaction::delete_all());
    }

    #[test]
    fn target_key_per_action() {
        assert_eq!(
            LocalTransaction::update_by_id(Account::new(3, "a", 0)).target_key(),
            Some(3)
        );
        assert_eq!(
            LocalTransaction::<Account>::delete_by_id(9, None).target_key(),
            Some(9)
        );
        assert_eq!(LocalTransaction::<Account>::delete_all().target_key(), None);
    }

    #[test]
    fn remap_key_changes_only_the_key() {
        let mut tx = LocalTransaction::update_by_id(Account::new(1, "renamed", 50));

        assert!(tx.remap_key(1, 57));
        assert_eq!(tx.entity, Some(Account::new(57, "renamed", 50)));
        assert!(tx.reconciled);

        // A second remap must not move an already reconciled entry
        assert!(!tx.remap_key(57, 90));
        assert_eq!(tx.target_key(), Some(57));
    }

    #[test]
    fn remap_key_rewrites_delete_target() {
        let mut tx = LocalTransaction::delete_by_id(2, Some(Account::new(2, "a", 0)));
        assert!(tx.remap_key(2, 40));
        assert_eq!(tx.id, Some(40));
        assert_eq!(tx.entity.as_ref().map(Entity::key), Some(40));
    }

    #[test]
    fn remap_key_ignores_other_keys() {
        let mut tx = LocalTransaction::update_by_id(Account::new(5, "a", 0));
        assert!(!tx.remap_key(1, 57));
        assert!(!tx.reconciled);

        let mut tx = LocalTransaction::<Account>::delete_all();
        assert!(!tx.remap_key(1, 57));
    }
}
