use std::sync::Arc;

use tracing::trace;

use crate::predicate::{Predicate, ValueSet};
use crate::rules::CompiledRules;

const MAX_MINISTRY_WORDS: usize = 6;

#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Arc<CompiledRules>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Extractor {
    pub fn new(rules: Arc<CompiledRules>) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self::new(CompiledRules::builtin())
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    pub fn extract(
        &self,
        text: &str,
        fallback_region: Option<&str>,
        fallback_ministry: Option<&str>,
    ) -> Predicate {
        let fallback_region = non_blank(fallback_region);
        let fallback_ministry = non_blank(fallback_ministry);

        let mut predicate = Predicate {
            ministry: fallback_ministry.map(str::to_string),
            ..Predicate::default()
        };

        if text.trim().is_empty() {
            if let Some(region) = fallback_region {
                predicate.state = ValueSet::single(region);
            }
            return predicate;
        }

        let lower = text.to_lowercase();
        let rules = &self.rules;

        let (min_age, max_age) = self.age_bounds(&lower);
        predicate.min_age = min_age;
        predicate.max_age = max_age;

        predicate.gender = rules.gender.first(&lower).map(ValueSet::single);
        predicate.occupation = rules
            .occupation
            .apply(&lower)
            .into_iter()
            .map(str::to_string)
            .collect();
        predicate.education = rules.education.first(&lower).map(ValueSet::single);
        predicate.caste_category = rules.caste_category.first(&lower).map(ValueSet::single);
        predicate.income = self.income_ceiling(&lower);
        predicate.marital_status = rules.marital_status.first(&lower).map(ValueSet::single);
        predicate.disability = rules.disability.matches(&lower).then_some(true);
        predicate.minority = rules.minority.matches(&lower).then_some(true);

        let regions = self.residency(&lower);
        predicate.state = if !regions.is_empty() {
            regions
        } else if let Some(region) = fallback_region {
            ValueSet::single(region)
        } else {
            ValueSet::default()
        };

        if let Some(ministry) = self.ministry(&lower) {
            predicate.ministry = Some(ministry);
        }

        if predicate.is_untyped() {
            predicate.other.push(text.trim());
        }

        trace!(rules = %rules.version, untyped = predicate.is_untyped(), "extracted predicate");
        predicate
    }

    pub fn extract_all<S: AsRef<str>>(
        &self,
        clauses: &[S],
        fallback_region: Option<&str>,
        fallback_ministry: Option<&str>,
    ) -> Vec<Predicate> {
        clauses
            .iter()
            .map(|clause| self.extract(clause.as_ref(), fallback_region, fallback_ministry))
            .collect()
    }

    // A range match suppresses the single-bound pattern entirely.
    fn age_bounds(&self, lower: &str) -> (Option<u32>, Option<u32>) {
        if let Some(caps) = self.rules.age_range.captures(lower) {
            let min = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let max = caps.get(2).and_then(|m| m.as_str().parse().ok());
            return (min, max);
        }
        let min = self
            .rules
            .age_min
            .captures(lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        (min, None)
    }

    fn income_ceiling(&self, lower: &str) -> Option<u64> {
        let caps = self.rules.income.captures(lower)?;
        caps.get(1)?.as_str().replace(',', "").parse().ok()
    }

    fn residency(&self, lower: &str) -> ValueSet {
        self.rules
            .residency
            .captures_iter(lower)
            .filter_map(|caps| caps.get(1))
            .map(|m| title_case(m.as_str().trim()))
            .filter(|name| !name.is_empty())
            .collect()
    }

    fn ministry(&self, lower: &str) -> Option<String> {
        let caps = self.rules.ministry.as_ref()?.captures(lower)?;
        let name = caps.get(1)?.as_str().trim();
        let words = name.split_whitespace().count();
        if words == 0 || words > MAX_MINISTRY_WORDS {
            return None;
        }
        Some(format!("Ministry of {}", title_case(name)))
    }
}

pub fn extract(
    text: &str,
    fallback_region: Option<&str>,
    fallback_ministry: Option<&str>,
) -> Predicate {
    Extractor::builtin().extract(text, fallback_region, fallback_ministry)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() && !prev_alpha {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_alpha = ch.is_alphabetic();
    }
    out
}
