use tracing::debug;

use crate::predicate::Predicate;
use crate::profile::UserProfile;
use crate::ranking::pipeline::{GateOutcome, RankingProfile, PIPELINE};
use crate::ranking::MatchResult;
use crate::scheme::Scheme;

pub const DEFAULT_LIMIT: usize = 5;

pub fn score_predicate(user: &UserProfile, predicate: &Predicate) -> u32 {
    score_with(&RankingProfile::from(user), predicate)
}

fn score_with(user: &RankingProfile, predicate: &Predicate) -> u32 {
    let mut score = 0;
    for gate in PIPELINE {
        match gate.check(user, predicate) {
            GateOutcome::Award(points) => score += points,
            GateOutcome::Skip => {}
            GateOutcome::Abandon => return 0,
        }
    }
    score
}

pub fn score_scheme(user: &UserProfile, scheme: &Scheme) -> u32 {
    best_score(&RankingProfile::from(user), scheme)
}

fn best_score(user: &RankingProfile, scheme: &Scheme) -> u32 {
    scheme
        .predicates()
        .map(|p| score_with(user, p))
        .max()
        .unwrap_or(0)
}

/// Schemes with a positive score, highest first. Equal scores keep input
/// order.
pub fn rank(user: &UserProfile, schemes: &[Scheme], limit: usize) -> Vec<MatchResult> {
    let folded = RankingProfile::from(user);
    let mut results: Vec<MatchResult> = schemes
        .iter()
        .filter_map(|scheme| {
            let score = best_score(&folded, scheme);
            (score > 0).then(|| MatchResult {
                scheme: scheme.clone(),
                score,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    debug!(
        candidates = schemes.len(),
        matched = results.len(),
        limit,
        "ranked schemes"
    );
    results.truncate(limit);
    results
}

pub fn recommend(user: &UserProfile, schemes: &[Scheme], limit: usize) -> Vec<Scheme> {
    rank(user, schemes, limit)
        .into_iter()
        .map(|m| m.scheme)
        .collect()
}
