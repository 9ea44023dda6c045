pub mod differ;
pub mod schema;

pub use differ::{diff_predicate_lists, diff_predicates, ChangeType, FieldChange};
pub use schema::{Predicate, ValueSet};
