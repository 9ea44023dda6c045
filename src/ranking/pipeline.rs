use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::predicate::Predicate;
use crate::profile::{declared, UserProfile};
use crate::region::region_matches;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Award(u32),
    Skip,
    Abandon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Region,
    EducationOrOccupation,
    Age,
    Gender,
}

pub const PIPELINE: [Gate; 4] = [
    Gate::Region,
    Gate::EducationOrOccupation,
    Gate::Age,
    Gate::Gender,
];

#[derive(Debug, Clone, Default)]
pub struct RankingProfile {
    state: Option<String>,
    education: Option<String>,
    occupation: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
}

impl From<&UserProfile> for RankingProfile {
    fn from(user: &UserProfile) -> Self {
        Self {
            state: declared(&user.state),
            education: declared(&user.education),
            occupation: declared(&user.occupation),
            age: user.age,
            gender: declared(&user.gender),
        }
    }
}

impl Gate {
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Region => "region",
            Gate::EducationOrOccupation => "education_or_occupation",
            Gate::Age => "age",
            Gate::Gender => "gender",
        }
    }

    pub fn check(&self, user: &RankingProfile, predicate: &Predicate) -> GateOutcome {
        match self {
            Gate::Region => {
                if region_matches(user.state.as_deref(), predicate.state.as_slice()) {
                    GateOutcome::Award(1)
                } else {
                    GateOutcome::Abandon
                }
            }
            Gate::EducationOrOccupation => {
                let education_hit = match (&user.education, &predicate.education) {
                    (Some(edu), Some(allowed)) => allowed.contains_folded(edu),
                    _ => false,
                };
                let occupation_hit = user
                    .occupation
                    .as_deref()
                    .is_some_and(|occ| predicate.occupation.contains_folded(occ));
                if education_hit || occupation_hit {
                    GateOutcome::Award(1)
                } else {
                    GateOutcome::Abandon
                }
            }
            Gate::Age => {
                let Some(age) = user.age else {
                    return GateOutcome::Skip;
                };
                let above_min = predicate.min_age.map_or(true, |min| age >= min);
                let below_max = predicate.max_age.map_or(true, |max| age <= max);
                if above_min && below_max {
                    GateOutcome::Award(1)
                } else {
                    GateOutcome::Abandon
                }
            }
            Gate::Gender => match &predicate.gender {
                Some(allowed) if !allowed.is_empty() => {
                    let hit = user
                        .gender
                        .as_deref()
                        .is_some_and(|g| allowed.contains_folded(g));
                    if hit {
                        GateOutcome::Award(1)
                    } else {
                        GateOutcome::Abandon
                    }
                }
                _ => GateOutcome::Skip,
            },
        }
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{Gate, GateOutcome, RankingProfile};
    use crate::predicate::{Predicate, ValueSet};
    use crate::profile::UserProfile;

    fn user(age: Option<u32>, gender: Option<&str>) -> RankingProfile {
        RankingProfile::from(&UserProfile {
            age,
            gender: gender.map(str::to_string),
            state: Some("Goa".to_string()),
            occupation: Some("Farmer".to_string()),
            ..UserProfile::default()
        })
    }

    #[test]
    fn age_gate_skips_without_user_age() {
        let p = Predicate {
            min_age: Some(18),
            ..Predicate::default()
        };
        assert_eq!(Gate::Age.check(&user(None, None), &p), GateOutcome::Skip);
        assert_eq!(Gate::Age.check(&user(Some(18), None), &p), GateOutcome::Award(1));
        assert_eq!(Gate::Age.check(&user(Some(17), None), &p), GateOutcome::Abandon);
    }

    #[test]
    fn gender_gate_skips_when_predicate_is_open() {
        let open = Predicate::default();
        assert_eq!(Gate::Gender.check(&user(None, None), &open), GateOutcome::Skip);

        let women = Predicate {
            gender: Some(ValueSet::from(["female"])),
            ..Predicate::default()
        };
        assert_eq!(
            Gate::Gender.check(&user(None, Some("Female")), &women),
            GateOutcome::Award(1)
        );
        assert_eq!(Gate::Gender.check(&user(None, None), &women), GateOutcome::Abandon);
    }

    #[test]
    fn occupation_alone_passes_education_gate() {
        let p = Predicate {
            occupation: ValueSet::from(["farmer"]),
            ..Predicate::default()
        };
        assert_eq!(
            Gate::EducationOrOccupation.check(&user(None, None), &p),
            GateOutcome::Award(1)
        );
        assert_eq!(
            Gate::EducationOrOccupation.check(&user(None, None), &Predicate::default()),
            GateOutcome::Abandon
        );
    }
}
