pub mod compiled;
pub mod defaults;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use compiled::{CompiledRules, CompiledTable};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern for {field} needs at least {expected} capture group(s)")]
    MissingCapture { field: String, expected: usize },
    #[error("rule table {table} has an entry without patterns: {value}")]
    EmptyEntry { table: String, value: String },
    #[error("failed reading rule file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing rule file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    First,
    All,
    Last,
    Any,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Substring,
    Word,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleEntry {
    pub value: String,
    pub patterns: Vec<String>,
}

impl RuleEntry {
    pub fn new(value: &str, patterns: &[&str]) -> Self {
        Self {
            value: value.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleTable {
    pub selection: Selection,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub entries: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternSet {
    #[serde(default = "defaults::age_range_pattern")]
    pub age_range: String,
    #[serde(default = "defaults::age_min_pattern")]
    pub age_min: String,
    #[serde(default = "defaults::income_pattern")]
    pub income: String,
    #[serde(default = "defaults::residency_pattern")]
    pub residency: String,
    #[serde(default = "defaults::ministry_pattern")]
    pub ministry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleBook {
    #[serde(default = "defaults::version")]
    pub version: String,
    #[serde(default = "defaults::gender")]
    pub gender: RuleTable,
    #[serde(default = "defaults::occupation")]
    pub occupation: RuleTable,
    #[serde(default = "defaults::education")]
    pub education: RuleTable,
    #[serde(default = "defaults::caste_category")]
    pub caste_category: RuleTable,
    #[serde(default = "defaults::marital_status")]
    pub marital_status: RuleTable,
    #[serde(default = "defaults::disability")]
    pub disability: RuleTable,
    #[serde(default = "defaults::minority")]
    pub minority: RuleTable,
    #[serde(default)]
    pub patterns: PatternSet,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            version: defaults::version(),
            gender: defaults::gender(),
            occupation: defaults::occupation(),
            education: defaults::education(),
            caste_category: defaults::caste_category(),
            marital_status: defaults::marital_status(),
            disability: defaults::disability(),
            minority: defaults::minority(),
            patterns: PatternSet::default(),
        }
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            age_range: defaults::age_range_pattern(),
            age_min: defaults::age_min_pattern(),
            income: defaults::income_pattern(),
            residency: defaults::residency_pattern(),
            ministry: defaults::ministry_pattern(),
        }
    }
}

impl RuleBook {
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let data = fs::read_to_string(path).map_err(|source| RuleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&data).map_err(|source| RuleError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn compile(&self) -> Result<CompiledRules, RuleError> {
        CompiledRules::compile(self)
    }

    pub fn tables(&self) -> [(&'static str, &RuleTable); 7] {
        [
            ("gender", &self.gender),
            ("occupation", &self.occupation),
            ("education", &self.education),
            ("casteCategory", &self.caste_category),
            ("maritalStatus", &self.marital_status),
            ("disability", &self.disability),
            ("minority", &self.minority),
        ]
    }
}
