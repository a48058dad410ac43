//! Dump log command implementation.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use syncrepo_core::{LocalTransaction, LOG_KEY_FIELD};
use syncrepo_store::LocalStore;

/// Log entry representation for output.
#[derive(Debug, Serialize)]
pub struct LogEntryInfo {
    /// Position in the log.
    pub seq: i64,
    /// Recorded action.
    pub action: String,
    /// Target key of a `DeleteById`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Whether the entry's key was remapped to a server key.
    pub reconciled: bool,
    /// Entity payload, as stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
}

/// Runs the dump-log command.
pub fn run(
    root: &Path,
    db: &str,
    entity: &str,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(root, db)?;
    let table = super::log_table(entity);
    let entries = read_entries(&store, &table, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            print_text_output(&table, &entries);
        }
    }

    Ok(())
}

/// Reads up to `limit` entries of the log `table` in replay order.
pub fn read_entries(
    store: &dyn LocalStore,
    table: &str,
    limit: Option<usize>,
) -> Result<Vec<LogEntryInfo>, Box<dyn std::error::Error>> {
    let max_entries = limit.unwrap_or(usize::MAX);

    store
        .scan_all(table)?
        .into_iter()
        .take(max_entries)
        .map(|row| {
            let seq = row
                .get(LOG_KEY_FIELD)
                .and_then(Value::as_i64)
                .ok_or_else(|| format!("log row without {}", LOG_KEY_FIELD))?;
            let transaction: LocalTransaction<Value> = serde_json::from_value(row)?;
            Ok(LogEntryInfo {
                seq,
                action: transaction.action_name,
                id: transaction.id,
                reconciled: transaction.reconciled,
                entity: transaction.entity,
            })
        })
        .collect()
}

fn print_text_output(table: &str, entries: &[LogEntryInfo]) {
    println!("Log: {}", table);
    println!("Entries: {}", entries.len());
    println!();

    for entry in entries {
        let mut line = format!("#{:<6} {:<14}", entry.seq, entry.action);
        if let Some(id) = entry.id {
            line.push_str(&format!(" id={}", id));
        }
        if entry.reconciled {
            line.push_str(" [reconciled]");
        }
        if let Some(entity) = &entry.entity {
            line.push_str(&format!(" {}", entity));
        }
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use syncrepo_core::log_table_schema;
    use syncrepo_store::MemoryStore;

    const LOG: &str = "Customer_LocalTransactions";

    fn store_with_log() -> MemoryStore {
        let store = MemoryStore::with_tables([log_table_schema(LOG)]);
        store
            .insert(
                LOG,
                json!({
                    "seq": 0,
                    "entity": {"Id": 1, "Name": "Acme"},
                    "action": "Insert",
                    "action_name": "Insert",
                }),
            )
            .unwrap();
        store
            .insert(
                LOG,
                json!({
                    "seq": 0,
                    "id": 57,
                    "entity": null,
                    "action": "DeleteById",
                    "action_name": "DeleteById",
                    "reconciled": true,
                }),
            )
            .unwrap();
        store
    }

    #[test]
    fn entries_in_replay_order() {
        let entries = read_entries(&store_with_log(), LOG, None).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].seq, 1);
        assert_eq!(entries[0].action, "Insert");
        assert_eq!(entries[0].entity, Some(json!({"Id": 1, "Name": "Acme"})));
        assert_eq!(entries[1].id, Some(57));
        assert!(entries[1].reconciled);
        assert!(entries[1].entity.is_none());
    }

    #[test]
    fn limit_truncates() {
        let entries = read_entries(&store_with_log(), LOG, Some(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "Insert");
    }

    #[test]
    fn unknown_table_is_an_error() {
        assert!(read_entries(&MemoryStore::new(), LOG, None).is_err());
    }
}
