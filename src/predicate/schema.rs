use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct ValueSet(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Empty,
    One(String),
    Many(Vec<Value>),
    Other(Value),
}

impl From<OneOrMany> for ValueSet {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Empty | OneOrMany::Other(_) => Self::default(),
            OneOrMany::One(single) => Self(vec![single]),
            OneOrMany::Many(values) => Self(
                values
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }
}

impl ValueSet {
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.0.push(value.into());
    }

    pub fn contains_folded(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        self.0.iter().any(|v| v.trim().to_lowercase() == needle)
    }

    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl Display for ValueSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.join(", "))
    }
}

impl From<Vec<String>> for ValueSet {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ValueSet {
    fn from(values: [S; N]) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<String> for ValueSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Predicate {
    #[serde(deserialize_with = "crate::lenient::opt_u32")]
    pub min_age: Option<u32>,
    #[serde(deserialize_with = "crate::lenient::opt_u32")]
    pub max_age: Option<u32>,
    #[serde(deserialize_with = "deserialize_optional_set")]
    pub gender: Option<ValueSet>,
    pub occupation: ValueSet,
    #[serde(deserialize_with = "deserialize_optional_set")]
    pub education: Option<ValueSet>,
    #[serde(alias = "castecategory", deserialize_with = "deserialize_optional_set")]
    pub caste_category: Option<ValueSet>,
    #[serde(deserialize_with = "crate::lenient::opt_u64")]
    pub income: Option<u64>,
    #[serde(deserialize_with = "deserialize_optional_set")]
    pub marital_status: Option<ValueSet>,
    #[serde(deserialize_with = "crate::lenient::opt_bool")]
    pub disability: Option<bool>,
    #[serde(deserialize_with = "crate::lenient::opt_bool")]
    pub minority: Option<bool>,
    #[serde(deserialize_with = "deserialize_region_set")]
    pub state: ValueSet,
    pub other: ValueSet,
    #[serde(deserialize_with = "crate::lenient::opt_string")]
    pub ministry: Option<String>,
}

impl Predicate {
    pub fn is_untyped(&self) -> bool {
        self.min_age.is_none()
            && self.max_age.is_none()
            && is_unset(&self.gender)
            && self.occupation.is_empty()
            && is_unset(&self.education)
            && is_unset(&self.caste_category)
            && self.income.is_none()
            && is_unset(&self.marital_status)
            && !self.disability.unwrap_or(false)
            && !self.minority.unwrap_or(false)
    }

    pub fn rendered_fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("minAge", self.min_age.map(|v| v.to_string())),
            ("maxAge", self.max_age.map(|v| v.to_string())),
            ("gender", render_set(self.gender.as_ref())),
            ("occupation", render_set(Some(&self.occupation))),
            ("education", render_set(self.education.as_ref())),
            ("casteCategory", render_set(self.caste_category.as_ref())),
            ("income", self.income.map(|v| v.to_string())),
            ("maritalStatus", render_set(self.marital_status.as_ref())),
            ("disability", self.disability.map(|v| v.to_string())),
            ("minority", self.minority.map(|v| v.to_string())),
            ("state", render_set(Some(&self.state))),
            ("other", render_set(Some(&self.other))),
            ("ministry", self.ministry.clone()),
        ]
    }
}

fn is_unset(set: &Option<ValueSet>) -> bool {
    set.as_ref().map_or(true, ValueSet::is_empty)
}

fn render_set(set: Option<&ValueSet>) -> Option<String> {
    set.filter(|s| !s.is_empty()).map(ValueSet::to_string)
}

// Null, empty and malformed sets all mean "unconstrained".
fn deserialize_optional_set<'de, D>(deserializer: D) -> Result<Option<ValueSet>, D::Error>
where
    D: Deserializer<'de>,
{
    let set = ValueSet::deserialize(deserializer)?;
    Ok((!set.is_empty()).then_some(set))
}

// Only a single string is split; array elements are kept whole.
fn deserialize_region_set<'de, D>(deserializer: D) -> Result<ValueSet, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = OneOrMany::deserialize(deserializer)?;
    Ok(match raw {
        OneOrMany::One(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        other => ValueSet::from(other),
    })
}
