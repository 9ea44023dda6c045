use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::predicate::{ChangeType, FieldChange};
use crate::store::migrations::BASE_MIGRATION;
use crate::store::{ChangeRecord, StoredScheme};

pub struct SchemeStore {
    conn: Connection,
}

impl SchemeStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening database {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn upsert(&self, stored: &StoredScheme) -> Result<()> {
        upsert_scheme(&self.conn, stored)
    }

    /// Writes the scheme and its field changes in one transaction; nothing is
    /// written if either part fails.
    pub fn commit_extraction(&self, stored: &StoredScheme, changes: &[FieldChange]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        upsert_scheme(&tx, stored)?;
        insert_changes(
            &tx,
            &stored.key,
            &stored.rules_version,
            changes,
            &stored.updated_at.to_rfc3339(),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<StoredScheme>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT scheme_key, name, text_hash, rules_version, scheme_json, updated_at
FROM schemes
WHERE scheme_key = ?1
"#,
        )?;
        match stmt.query_row(params![key], row_to_stored_scheme) {
            Ok(stored) => Ok(Some(stored)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_all(&self) -> Result<Vec<StoredScheme>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT scheme_key, name, text_hash, rules_version, scheme_json, updated_at
FROM schemes
ORDER BY id ASC
"#,
        )?;
        let rows = stmt
            .query_map([], row_to_stored_scheme)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM schemes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn changes_for(&self, scheme_key: &str, limit: usize) -> Result<Vec<ChangeRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT scheme_key, rules_version, field, change_type, old_value, new_value, recorded_at
FROM extraction_changes
WHERE scheme_key = ?1
ORDER BY recorded_at DESC, id DESC
LIMIT ?2
"#,
        )?;
        let rows = stmt
            .query_map(params![scheme_key, limit as i64], row_to_change_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn upsert_scheme(conn: &Connection, stored: &StoredScheme) -> Result<()> {
    let updated_at = stored.updated_at.to_rfc3339();
    conn.execute(
        r#"
INSERT INTO schemes(scheme_key, name, text_hash, rules_version, scheme_json, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
ON CONFLICT(scheme_key) DO UPDATE SET
    name = excluded.name,
    text_hash = excluded.text_hash,
    rules_version = excluded.rules_version,
    scheme_json = excluded.scheme_json,
    updated_at = excluded.updated_at
"#,
        params![
            stored.key,
            stored.name,
            stored.text_hash,
            stored.rules_version,
            serde_json::to_string(&stored.scheme)?,
            updated_at
        ],
    )?;
    Ok(())
}

fn insert_changes(
    conn: &Connection,
    scheme_key: &str,
    rules_version: &str,
    changes: &[FieldChange],
    recorded_at: &str,
) -> Result<()> {
    for change in changes {
        conn.execute(
            r#"
INSERT INTO extraction_changes(
    scheme_key, rules_version, field, change_type, old_value, new_value, recorded_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
            params![
                scheme_key,
                rules_version,
                change.field,
                change_type_slug(change.change_type),
                change.old_value,
                change.new_value,
                recorded_at
            ],
        )?;
    }
    Ok(())
}

fn change_type_slug(change_type: ChangeType) -> &'static str {
    match change_type {
        ChangeType::Added => "added",
        ChangeType::Removed => "removed",
        ChangeType::Changed => "changed",
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_stored_scheme(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredScheme> {
    let scheme_json: String = row.get(4)?;
    let scheme = serde_json::from_str(&scheme_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let updated_at: String = row.get(5)?;
    Ok(StoredScheme {
        key: row.get(0)?,
        name: row.get(1)?,
        text_hash: row.get(2)?,
        rules_version: row.get(3)?,
        scheme,
        updated_at: parse_timestamp(&updated_at),
    })
}

fn row_to_change_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChangeRecord> {
    let change_type = match row.get::<_, String>(3)?.as_str() {
        "added" => ChangeType::Added,
        "removed" => ChangeType::Removed,
        _ => ChangeType::Changed,
    };
    let recorded_at: String = row.get(6)?;
    Ok(ChangeRecord {
        scheme_key: row.get(0)?,
        rules_version: row.get(1)?,
        change: FieldChange {
            field: row.get(2)?,
            change_type,
            old_value: row.get(4)?,
            new_value: row.get(5)?,
        },
        recorded_at: parse_timestamp(&recorded_at),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::SchemeStore;
    use crate::predicate::{ChangeType, FieldChange, Predicate};
    use crate::scheme::Scheme;
    use crate::store::StoredScheme;

    fn stored(key: &str, hash: &str) -> StoredScheme {
        StoredScheme {
            key: key.to_string(),
            name: format!("Scheme {key}"),
            text_hash: hash.to_string(),
            rules_version: "builtin-1".to_string(),
            scheme: Scheme::with_predicates(
                format!("Scheme {key}"),
                vec![Predicate {
                    min_age: Some(18),
                    ..Predicate::default()
                }],
            ),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let store = SchemeStore::in_memory().expect("open store");
        store.upsert(&stored("a", "h1")).expect("insert");
        store.upsert(&stored("b", "h1")).expect("insert");
        store.upsert(&stored("a", "h2")).expect("update");

        assert_eq!(store.count().expect("count"), 2);
        let a = store.get("a").expect("get").expect("present");
        assert_eq!(a.text_hash, "h2");
        assert_eq!(a.scheme.predicates().count(), 1);

        let keys: Vec<_> = store
            .load_all()
            .expect("load")
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(store.get("missing").expect("get").is_none());
    }

    #[test]
    fn commit_extraction_writes_scheme_and_changes_together() {
        let store = SchemeStore::in_memory().expect("open store");
        let change = FieldChange {
            field: "minAge".to_string(),
            change_type: ChangeType::Added,
            old_value: None,
            new_value: Some("18".to_string()),
        };
        store
            .commit_extraction(&stored("a", "h1"), &[change.clone()])
            .expect("commit");

        assert_eq!(store.get("a").expect("get").expect("present").text_hash, "h1");
        let changes = store.changes_for("a", 10).expect("changes");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change, change);
    }

    #[test]
    fn failed_change_insert_rolls_back_the_scheme() {
        let store = SchemeStore::in_memory().expect("open store");
        store
            .conn
            .execute_batch("DROP TABLE extraction_changes")
            .expect("drop table");
        let change = FieldChange {
            field: "gender".to_string(),
            change_type: ChangeType::Removed,
            old_value: Some("female".to_string()),
            new_value: None,
        };

        assert!(store.commit_extraction(&stored("a", "h1"), &[change]).is_err());
        assert!(store.get("a").expect("get").is_none());
        assert_eq!(store.count().expect("count"), 0);
    }
}
