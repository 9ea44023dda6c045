use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::extract::Extractor;
use crate::predicate::Predicate;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredicateEntry {
    Structured(Predicate),
    Raw(String),
    Unrecognized(Value),
}

// Objects are always structured predicates; their malformed fields degrade to
// unconstrained instead of demoting the whole entry.
impl<'de> Deserialize<'de> for PredicateEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => Self::Raw(text),
            Value::Object(_) => match Predicate::deserialize(&value) {
                Ok(predicate) => Self::Structured(predicate),
                Err(_) => Self::Unrecognized(value),
            },
            other => Self::Unrecognized(other),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ministry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::vec_or_null")]
    pub eligible: Vec<PredicateEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scheme {
    pub fn with_predicates(name: impl Into<String>, predicates: Vec<Predicate>) -> Self {
        Self {
            name: Some(name.into()),
            eligible: predicates.into_iter().map(PredicateEntry::Structured).collect(),
            ..Self::default()
        }
    }

    // `id`, then `link`, then `name`.
    pub fn key(&self) -> Option<String> {
        let id = self.extra.get("id").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        id.or_else(|| self.link.clone())
            .or_else(|| self.name.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.key())
            .unwrap_or_else(|| "(unnamed scheme)".to_string())
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.eligible.iter().filter_map(|entry| match entry {
            PredicateEntry::Structured(p) => Some(p),
            _ => None,
        })
    }

    pub fn needs_extraction(&self) -> bool {
        let has_raw = self
            .eligible
            .iter()
            .any(|e| matches!(e, PredicateEntry::Raw(_)));
        has_raw || (self.eligible.is_empty() && self.has_eligibility_text())
    }

    pub fn extraction_input(&self) -> Vec<&str> {
        let raw: Vec<&str> = self
            .eligible
            .iter()
            .filter_map(|e| match e {
                PredicateEntry::Raw(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if !raw.is_empty() || !self.eligible.is_empty() {
            return raw;
        }
        self.eligibility
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .into_iter()
            .collect()
    }

    pub fn resolve(&self, extractor: &Extractor) -> Scheme {
        if !self.needs_extraction() {
            return self.clone();
        }
        let region = self.state.as_deref();
        let ministry = self.ministry.as_deref();
        let mut resolved = self.clone();
        resolved.eligible = if self.eligible.is_empty() {
            self.extraction_input()
                .into_iter()
                .map(|text| PredicateEntry::Structured(extractor.extract(text, region, ministry)))
                .collect()
        } else {
            self.eligible
                .iter()
                .map(|entry| match entry {
                    PredicateEntry::Raw(text) => {
                        PredicateEntry::Structured(extractor.extract(text, region, ministry))
                    }
                    other => other.clone(),
                })
                .collect()
        };
        resolved
    }

    fn has_eligibility_text(&self) -> bool {
        self.eligibility
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}
