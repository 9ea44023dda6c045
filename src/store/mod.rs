pub mod ingest;
pub mod migrations;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predicate::FieldChange;
use crate::scheme::Scheme;

pub use ingest::{ingest, sha256_hex, IngestEntry, IngestReport, IngestStatus};
pub use store::SchemeStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScheme {
    pub key: String,
    pub name: String,
    pub text_hash: String,
    pub rules_version: String,
    pub scheme: Scheme,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub scheme_key: String,
    pub rules_version: String,
    #[serde(flatten)]
    pub change: FieldChange,
    pub recorded_at: DateTime<Utc>,
}
