use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::extract::Extractor;
use crate::predicate::{diff_predicate_lists, FieldChange, Predicate};
use crate::scheme::Scheme;
use crate::store::{SchemeStore, StoredScheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Inserted,
    Updated,
    Unchanged,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestEntry {
    pub key: Option<String>,
    pub name: String,
    pub status: IngestStatus,
    pub predicates: usize,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub rules_version: String,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub entries: Vec<IngestEntry>,
}

impl IngestReport {
    fn new(rules_version: &str) -> Self {
        Self {
            rules_version: rules_version.to_string(),
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: IngestEntry) {
        match entry.status {
            IngestStatus::Inserted => self.inserted += 1,
            IngestStatus::Updated => self.updated += 1,
            IngestStatus::Unchanged => self.unchanged += 1,
            IngestStatus::Skipped => self.skipped += 1,
        }
        self.entries.push(entry);
    }
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extracts and stores each scheme. A scheme whose record hash and rule-book
/// version both match the stored copy is left alone; otherwise it is
/// re-extracted and the field-level predicate changes are recorded.
pub fn ingest(
    store: &SchemeStore,
    schemes: &[Scheme],
    extractor: &Extractor,
) -> Result<IngestReport> {
    let rules_version = extractor.rules().version.clone();
    let mut report = IngestReport::new(&rules_version);

    for scheme in schemes {
        let name = scheme.display_name();
        let Some(key) = scheme.key() else {
            warn!(%name, "skipping scheme without id, link or name");
            report.push(IngestEntry {
                key: None,
                name,
                status: IngestStatus::Skipped,
                predicates: 0,
                changes: Vec::new(),
            });
            continue;
        };

        let text_hash = sha256_hex(&serde_json::to_string(scheme)?);
        let existing = store.get(&key)?;
        if let Some(current) = existing
            .as_ref()
            .filter(|s| s.text_hash == text_hash && s.rules_version == rules_version)
        {
            debug!(%key, "scheme unchanged");
            report.push(IngestEntry {
                key: Some(key),
                name,
                status: IngestStatus::Unchanged,
                predicates: current.scheme.predicates().count(),
                changes: Vec::new(),
            });
            continue;
        }

        let resolved = scheme.resolve(extractor);
        let new_predicates: Vec<Predicate> = resolved.predicates().cloned().collect();
        let (status, changes) = match &existing {
            Some(previous) => {
                let old_predicates: Vec<Predicate> =
                    previous.scheme.predicates().cloned().collect();
                (
                    IngestStatus::Updated,
                    diff_predicate_lists(&old_predicates, &new_predicates),
                )
            }
            None => (IngestStatus::Inserted, Vec::new()),
        };

        store.commit_extraction(
            &StoredScheme {
                key: key.clone(),
                name: name.clone(),
                text_hash,
                rules_version: rules_version.clone(),
                scheme: resolved,
                updated_at: Utc::now(),
            },
            &changes,
        )?;

        report.push(IngestEntry {
            key: Some(key),
            name,
            status,
            predicates: new_predicates.len(),
            changes,
        });
    }

    info!(
        rules_version = %report.rules_version,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        skipped = report.skipped,
        "ingest complete"
    );
    Ok(report)
}
