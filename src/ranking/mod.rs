pub mod pipeline;
pub mod ranker;

use serde::{Deserialize, Serialize};

use crate::scheme::Scheme;

pub use pipeline::{Gate, GateOutcome, PIPELINE};
pub use ranker::{rank, recommend, score_predicate, score_scheme, DEFAULT_LIMIT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub scheme: Scheme,
    pub score: u32,
}
