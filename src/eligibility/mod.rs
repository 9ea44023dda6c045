pub mod evaluator;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::predicate::ValueSet;

pub use evaluator::{evaluate, evaluate_predicate, evaluate_scheme, explain};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl Verdict {
    pub fn eligible() -> Self {
        Self {
            eligible: true,
            reasons: Vec::new(),
        }
    }

    pub fn ineligible(reasons: Vec<String>) -> Self {
        Self {
            eligible: false,
            reasons,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeVerdict {
    pub scheme: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "required", rename_all = "snake_case")]
pub enum Reason {
    MinAge(u32),
    MaxAge(u32),
    Gender(ValueSet),
    Occupation(ValueSet),
    Education(ValueSet),
    CasteCategory(ValueSet),
    Income(u64),
    MaritalStatus(ValueSet),
    State(ValueSet),
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::MinAge(min) => write!(f, "Minimum age required: {min}"),
            Reason::MaxAge(max) => write!(f, "Maximum age allowed: {max}"),
            Reason::Gender(allowed) => write!(f, "Applicable only for gender: {allowed}"),
            Reason::Occupation(allowed) => {
                write!(f, "Applicable only for occupations: {allowed}")
            }
            Reason::Education(allowed) => write!(f, "Required education: {allowed}"),
            Reason::CasteCategory(allowed) => {
                write!(f, "Applicable only for caste category: {allowed}")
            }
            Reason::Income(ceiling) => {
                write!(f, "Income must be less than or equal to {ceiling}")
            }
            Reason::MaritalStatus(allowed) => {
                write!(f, "Applicable only for marital status: {allowed}")
            }
            Reason::State(allowed) => write!(f, "Applicable only for states: {allowed}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateOutcome {
    pub index: usize,
    pub passed: bool,
    pub reasons: Vec<Reason>,
}

impl PredicateOutcome {
    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}
