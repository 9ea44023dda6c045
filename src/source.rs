use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::scheme::Scheme;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("scheme-eligibility/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("payload holds no scheme array (expected a top-level array or a `schemes`/`data` field)")]
    NoSchemeArray,
    #[error("scheme record {index} is malformed: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait SchemeSource: Send + Sync {
    fn location(&self) -> String;
    async fn fetch(&self) -> Result<Vec<Scheme>>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SchemeSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<Scheme>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed reading schemes from {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", self.path.display()))?;
        let schemes = parse_schemes(value)
            .with_context(|| format!("unexpected scheme payload in {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = schemes.len(), "loaded schemes");
        Ok(schemes)
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SchemeSource for HttpSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<Scheme>> {
        let value = fetch_json(&self.url).await?;
        let schemes = parse_schemes(value)
            .with_context(|| format!("unexpected scheme payload from {}", self.url))?;
        debug!(url = %self.url, count = schemes.len(), "fetched schemes");
        Ok(schemes)
    }
}

pub fn source_for(location: &str) -> Box<dyn SchemeSource> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Box::new(HttpSource::new(trimmed))
    } else {
        Box::new(FileSource::new(trimmed))
    }
}

pub async fn fetch_json(url: &str) -> Result<Value> {
    let response = HTTP_CLIENT
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed GET request: {url}"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed reading response body: {url}"))?;
    if !status.is_success() {
        let preview: String = body.chars().take(180).collect();
        return Err(anyhow!("GET {url} returned {status}: {preview}"));
    }
    serde_json::from_str(&body).with_context(|| format!("invalid JSON response: {url}"))
}

pub fn parse_schemes(value: Value) -> Result<Vec<Scheme>, SourceError> {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut object) => take_array(&mut object, "schemes")
            .or_else(|| take_array(&mut object, "data"))
            .ok_or(SourceError::NoSchemeArray)?,
        _ => return Err(SourceError::NoSchemeArray),
    };

    let mut schemes = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if !record.is_object() {
            warn!(index, "skipping non-object scheme record");
            continue;
        }
        let scheme = serde_json::from_value(record)
            .map_err(|source| SourceError::Record { index, source })?;
        schemes.push(scheme);
    }
    Ok(schemes)
}

fn take_array(object: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    let actual = object
        .keys()
        .find(|k| k.eq_ignore_ascii_case(key))
        .cloned()?;
    match object.remove(&actual)? {
        Value::Array(records) => Some(records),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_schemes, source_for, FileSource, SchemeSource, SourceError};

    #[test]
    fn accepts_bare_array_and_wrapped_payloads() {
        let bare = parse_schemes(json!([{"name": "A"}, {"name": "B"}])).expect("bare array");
        assert_eq!(bare.len(), 2);

        let wrapped = parse_schemes(json!({"Schemes": [{"name": "A"}]})).expect("wrapped");
        assert_eq!(wrapped[0].name.as_deref(), Some("A"));

        let data = parse_schemes(json!({"data": [{"name": "A"}, "noise"]})).expect("data");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn rejects_payload_without_array() {
        assert!(matches!(
            parse_schemes(json!({"items": []})),
            Err(SourceError::NoSchemeArray)
        ));
        assert!(matches!(
            parse_schemes(json!("schemes")),
            Err(SourceError::NoSchemeArray)
        ));
        assert!(matches!(
            parse_schemes(json!([{"name": 7}])),
            Err(SourceError::Record { index: 0, .. })
        ));
    }

    #[test]
    fn selects_source_by_location() {
        assert_eq!(
            source_for("https://example.gov/schemes.json").location(),
            "https://example.gov/schemes.json"
        );
        assert_eq!(source_for(" data/schemes.json ").location(), "data/schemes.json");
    }

    #[test]
    fn file_source_reads_schemes() {
        let path = std::env::temp_dir().join(format!(
            "scheme-eligibility-source-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"schemes": [{"name": "Farm Support", "eligible": []}]}"#)
            .expect("write fixture");

        let schemes = tokio_test::block_on(FileSource::new(&path).fetch()).expect("fetch");
        std::fs::remove_file(&path).ok();
        assert_eq!(schemes.len(), 1);
        assert_eq!(schemes[0].name.as_deref(), Some("Farm Support"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = FileSource::new("/nonexistent/scheme-eligibility/schemes.json");
        assert!(tokio_test::block_on(missing.fetch()).is_err());
    }
}
