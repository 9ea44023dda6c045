pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS schemes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scheme_key TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    text_hash TEXT NOT NULL,
    rules_version TEXT NOT NULL,
    scheme_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS extraction_changes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scheme_key TEXT NOT NULL,
    rules_version TEXT NOT NULL,
    field TEXT NOT NULL,
    change_type TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_changes_scheme_recorded
    ON extraction_changes(scheme_key, recorded_at DESC);
"#;
