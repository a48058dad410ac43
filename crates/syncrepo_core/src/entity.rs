//! Entity capability and record conversion.

use crate::error::RepositoryResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use syncrepo_store::Record;

/// Key value of an entity whose key has not been assigned yet.
pub const UNASSIGNED_KEY: i64 = 0;

/// A record type managed by a repository.
///
/// The key accessors are resolved at compile time; nothing looks the
/// primary key up by name at runtime except the local store, which reads
/// the serialized field named [`Entity::KEY_FIELD`].
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use syncrepo_core::Entity;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Customer {
///     id: i64,
///     name: String,
/// }
///
/// impl Entity for Customer {
///     const NAME: &'static str = "Customer";
///     const KEY_FIELD: &'static str = "id";
///
///     fn key(&self) -> i64 {
///         self.id
///     }
///
///     fn set_key(&mut self, key: i64) {
///         self.id = key;
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Entity type name; also the name of its local table.
    const NAME: &'static str;

    /// Name of the primary-key field in the serialized form.
    const KEY_FIELD: &'static str;

    /// Returns the primary key.
    fn key(&self) -> i64;

    /// Replaces the primary key.
    fn set_key(&mut self, key: i64);
}

pub(crate) fn to_record<T: Entity>(entity: &T) -> RepositoryResult<Record> {
    Ok(serde_json::to_value(entity)?)
}

pub(crate) fn from_record<T: Entity>(record: Record) -> RepositoryResult<T> {
    Ok(serde_json::from_value(record)?)
}

#[cfg(test)]
pub(crate) mod test_entity {
    use super::Entity;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Account {
        pub id: i64,
        pub name: String,
        pub balance: i64,
    }

    impl Account {
        pub fn new(id: i64, name: &str, balance: i64) -> Self {
            Self {
                id,
                name: name.to_string(),
                balance,
            }
        }
    }

    impl Entity for Account {
        const NAME: &'static str = "Account";
        const KEY_FIELD: &'static str = "id";

        fn key(&self) -> i64 {
            self.id
        }

        fn set_key(&mut self, key: i64) {
            self.id = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_entity::Account;
    use super::*;
    use serde_json::json;

    #[test]
    fn record_round_trip_keeps_key_field() {
        let account = Account::new(7, "ops", 100);
        let record = to_record(&account).unwrap();
        assert_eq!(record, json!({"id": 7, "name": "ops", "balance": 100}));

        let back: Account = from_record(record).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn from_record_rejects_foreign_shape() {
        let result: RepositoryResult<Account> = from_record(json!({"id": "x"}));
        assert!(result.is_err());
    }
}
