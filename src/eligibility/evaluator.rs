use tracing::debug;

use crate::eligibility::{PredicateOutcome, Reason, Verdict};
use crate::predicate::{Predicate, ValueSet};
use crate::profile::{declared, UserProfile};
use crate::region::region_matches;
use crate::scheme::Scheme;

/// OR across predicates, AND within each. Stops at the first predicate that
/// passes every applicable check; otherwise returns every reason collected,
/// in predicate order.
pub fn evaluate<'a, I>(user: &UserProfile, predicates: I) -> Verdict
where
    I: IntoIterator<Item = &'a Predicate>,
{
    let mut reasons = Vec::new();
    for (index, predicate) in predicates.into_iter().enumerate() {
        let failures = evaluate_predicate(user, predicate);
        if failures.is_empty() {
            debug!(index, "predicate satisfied");
            return Verdict::eligible();
        }
        debug!(index, failed = failures.len(), "predicate rejected");
        reasons.extend(failures.iter().map(ToString::to_string));
    }
    Verdict::ineligible(reasons)
}

pub fn evaluate_scheme(user: &UserProfile, scheme: &Scheme) -> Verdict {
    evaluate(user, scheme.predicates())
}

pub fn evaluate_predicate(user: &UserProfile, predicate: &Predicate) -> Vec<Reason> {
    let mut reasons = Vec::new();

    if let Some(age) = user.age {
        if let Some(min) = predicate.min_age.filter(|min| age < *min) {
            reasons.push(Reason::MinAge(min));
        }
        if let Some(max) = predicate.max_age.filter(|max| age > *max) {
            reasons.push(Reason::MaxAge(max));
        }
    }

    if let Some(allowed) = rejects(&user.gender, predicate.gender.as_ref()) {
        reasons.push(Reason::Gender(allowed));
    }
    if let Some(allowed) = rejects(&user.occupation, Some(&predicate.occupation)) {
        reasons.push(Reason::Occupation(allowed));
    }
    if let Some(allowed) = rejects(&user.education, predicate.education.as_ref()) {
        reasons.push(Reason::Education(allowed));
    }
    if let Some(allowed) = rejects(&user.caste_category, predicate.caste_category.as_ref()) {
        reasons.push(Reason::CasteCategory(allowed));
    }
    if let (Some(income), Some(ceiling)) = (user.income, predicate.income) {
        if income > ceiling {
            reasons.push(Reason::Income(ceiling));
        }
    }
    if let Some(allowed) = rejects(&user.marital_status, predicate.marital_status.as_ref()) {
        reasons.push(Reason::MaritalStatus(allowed));
    }

    let state = declared(&user.state);
    if state.is_some()
        && !predicate.state.is_empty()
        && !region_matches(state.as_deref(), predicate.state.as_slice())
    {
        reasons.push(Reason::State(predicate.state.clone()));
    }

    reasons
}

pub fn explain<'a, I>(user: &UserProfile, predicates: I) -> Vec<PredicateOutcome>
where
    I: IntoIterator<Item = &'a Predicate>,
{
    predicates
        .into_iter()
        .enumerate()
        .map(|(index, predicate)| {
            let reasons = evaluate_predicate(user, predicate);
            PredicateOutcome {
                index,
                passed: reasons.is_empty(),
                reasons,
            }
        })
        .collect()
}

fn rejects(value: &Option<String>, allowed: Option<&ValueSet>) -> Option<ValueSet> {
    let allowed = allowed.filter(|set| !set.is_empty())?;
    let value = declared(value)?;
    (!allowed.contains_folded(&value)).then(|| allowed.clone())
}

#[cfg(test)]
mod tests {
    use super::{evaluate, evaluate_predicate, evaluate_scheme, explain};
    use crate::eligibility::{Reason, Verdict};
    use crate::predicate::{Predicate, ValueSet};
    use crate::profile::UserProfile;
    use crate::scheme::Scheme;

    fn kerala_graduate() -> UserProfile {
        UserProfile {
            age: Some(22),
            gender: Some("female".to_string()),
            state: Some("Kerala".to_string()),
            education: Some("graduate".to_string()),
            ..UserProfile::default()
        }
    }

    fn scholarship() -> Predicate {
        Predicate {
            min_age: Some(18),
            max_age: Some(30),
            gender: Some(ValueSet::from(["female"])),
            state: ValueSet::from(["Kerala", "Goa"]),
            education: Some(ValueSet::from(["graduate"])),
            ..Predicate::default()
        }
    }

    #[test]
    fn full_match_is_eligible() {
        let verdict = evaluate(&kerala_graduate(), &[scholarship()]);
        assert_eq!(verdict, Verdict::eligible());
    }

    #[test]
    fn first_passing_predicate_discards_earlier_reasons() {
        let too_old = Predicate {
            min_age: Some(40),
            ..Predicate::default()
        };
        let verdict = evaluate(&kerala_graduate(), &[too_old, scholarship()]);
        assert!(verdict.eligible);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn failures_accumulate_in_predicate_order() {
        let too_old = Predicate {
            min_age: Some(40),
            ..Predicate::default()
        };
        let men_only = Predicate {
            gender: Some(ValueSet::from(["male"])),
            ..Predicate::default()
        };
        let verdict = evaluate(&kerala_graduate(), &[too_old.clone(), men_only, too_old]);
        assert!(!verdict.eligible);
        assert_eq!(
            verdict.reasons,
            vec![
                "Minimum age required: 40",
                "Applicable only for gender: male",
                "Minimum age required: 40",
            ]
        );
    }

    #[test]
    fn every_failing_field_is_reported() {
        let strict = Predicate {
            max_age: Some(20),
            occupation: ValueSet::from(["farmer", "weaver"]),
            caste_category: Some(ValueSet::from(["SC", "ST"])),
            income: Some(100000),
            marital_status: Some(ValueSet::from(["widow"])),
            education: Some(ValueSet::from(["12th"])),
            state: ValueSet::from(["Goa"]),
            ..Predicate::default()
        };
        let user = UserProfile {
            occupation: Some("student".to_string()),
            caste_category: Some("OBC".to_string()),
            income: Some(250000),
            marital_status: Some("single".to_string()),
            ..kerala_graduate()
        };
        let messages: Vec<String> = evaluate_predicate(&user, &strict)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Maximum age allowed: 20",
                "Applicable only for occupations: farmer, weaver",
                "Required education: 12th",
                "Applicable only for caste category: SC, ST",
                "Income must be less than or equal to 100000",
                "Applicable only for marital status: widow",
                "Applicable only for states: Goa",
            ]
        );
    }

    #[test]
    fn absent_attributes_are_not_applicable() {
        let strict = Predicate {
            income: Some(1),
            caste_category: Some(ValueSet::from(["ST"])),
            occupation: ValueSet::from(["farmer"]),
            ..scholarship()
        };
        let anonymous = UserProfile::default();
        assert!(evaluate_predicate(&anonymous, &strict).is_empty());
        assert!(evaluate_predicate(&kerala_graduate(), &Predicate::default()).is_empty());
    }

    #[test]
    fn comparisons_ignore_case_and_honour_all_regions() {
        let user = UserProfile {
            gender: Some("FEMALE".to_string()),
            state: Some(" goa ".to_string()),
            ..kerala_graduate()
        };
        assert!(evaluate_predicate(&user, &scholarship()).is_empty());

        let nationwide = Predicate {
            state: ValueSet::from(["All"]),
            ..Predicate::default()
        };
        assert!(evaluate_predicate(&user, &nationwide).is_empty());
    }

    #[test]
    fn income_at_ceiling_passes() {
        let capped = Predicate {
            income: Some(250000),
            ..Predicate::default()
        };
        let user = UserProfile {
            income: Some(250000),
            ..UserProfile::default()
        };
        assert!(evaluate_predicate(&user, &capped).is_empty());
        let over = UserProfile {
            income: Some(250001),
            ..UserProfile::default()
        };
        assert_eq!(evaluate_predicate(&over, &capped), vec![Reason::Income(250000)]);
    }

    #[test]
    fn scheme_without_predicates_is_ineligible_without_reasons() {
        let verdict = evaluate_scheme(&kerala_graduate(), &Scheme::default());
        assert_eq!(verdict, Verdict::ineligible(Vec::new()));
    }

    #[test]
    fn explain_reports_every_predicate() {
        let men_only = Predicate {
            gender: Some(ValueSet::from(["male"])),
            ..Predicate::default()
        };
        let outcomes = explain(&kerala_graduate(), &[scholarship(), men_only]);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].passed);
        assert!(!outcomes[1].passed);
        assert_eq!(outcomes[1].messages(), vec!["Applicable only for gender: male"]);
    }
}
