use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::Extractor;
use crate::ranking::DEFAULT_LIMIT;
use crate::rules::{CompiledRules, RuleBook};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_schemes")]
    pub schemes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub rules_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub schemes: Option<String>,
    pub rules_path: Option<String>,
    pub db_path: Option<String>,
    pub limit: Option<usize>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/scheme-eligibility/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(schemes) = overrides.schemes {
            self.source.schemes = schemes;
        }
        if let Some(rules_path) = overrides.rules_path {
            self.extraction.rules_path = rules_path;
        }
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
        if let Some(limit) = overrides.limit {
            self.ranking.limit = limit;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_schemes(&self) -> String {
        let location = self.source.schemes.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            expand_tilde(location).display().to_string()
        }
    }

    pub fn resolved_rules_path(&self) -> Option<PathBuf> {
        let path = self.extraction.rules_path.trim();
        (!path.is_empty()).then(|| expand_tilde(path))
    }

    pub fn load_rules(&self) -> Result<Arc<CompiledRules>> {
        let Some(path) = self.resolved_rules_path() else {
            return Ok(CompiledRules::builtin());
        };
        let book = RuleBook::load(&path)?;
        let compiled = book
            .compile()
            .with_context(|| format!("invalid rule book: {}", path.display()))?;
        info!(path = %path.display(), version = %compiled.version, "loaded rule book");
        Ok(Arc::new(compiled))
    }

    pub fn extractor(&self) -> Result<Extractor> {
        Ok(Extractor::new(self.load_rules()?))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn default_template() -> String {
        let template = r#"[source]
# JSON file or http(s) URL; an array of schemes or {"schemes": [...]}
schemes = "~/.local/share/scheme-eligibility/schemes.json"

[storage]
db_path = "~/.local/share/scheme-eligibility/schemes.db"

[extraction]
# Leave empty for the built-in rules; `scheme-eligibility rules --dump` prints them.
rules_path = ""

[ranking]
limit = 5

[server]
host = "127.0.0.1"
port = 8080
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            schemes: default_schemes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_schemes() -> String {
    "~/.local/share/scheme-eligibility/schemes.json".to_string()
}

fn default_db_path() -> String {
    "~/.local/share/scheme-eligibility/schemes.db".to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides};

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("parse template");
        let defaults = Config::default();
        assert_eq!(parsed.source.schemes, defaults.source.schemes);
        assert_eq!(parsed.storage.db_path, defaults.storage.db_path);
        assert_eq!(parsed.ranking.limit, 5);
        assert_eq!(parsed.bind_address(), "127.0.0.1:8080");
        assert!(parsed.resolved_rules_path().is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[ranking]\nlimit = 3\n").expect("parse");
        assert_eq!(parsed.ranking.limit, 3);
        assert_eq!(parsed.server.port, 8080);
    }

    #[test]
    fn overrides_replace_configured_values() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            schemes: Some("https://example.gov/schemes.json".to_string()),
            limit: Some(10),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.resolved_schemes(), "https://example.gov/schemes.json");
        assert_eq!(config.ranking.limit, 10);
    }

    #[test]
    fn missing_rule_book_is_an_error() {
        let mut config = Config::default();
        config.extraction.rules_path = "/nonexistent/rules.toml".to_string();
        assert!(config.load_rules().is_err());
        assert!(Config::default().load_rules().is_ok());
    }
}
