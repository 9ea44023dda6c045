use serde::{Deserialize, Serialize};

use crate::predicate::schema::Predicate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub change_type: ChangeType,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Changed,
}

pub fn diff_predicates(old: &Predicate, new: &Predicate) -> Vec<FieldChange> {
    old.rendered_fields()
        .into_iter()
        .zip(new.rendered_fields())
        .filter_map(|((field, old_value), (_, new_value))| {
            let change_type = match (&old_value, &new_value) {
                (None, Some(_)) => ChangeType::Added,
                (Some(_), None) => ChangeType::Removed,
                (Some(a), Some(b)) if a != b => ChangeType::Changed,
                _ => return None,
            };
            Some(FieldChange {
                field: field.to_string(),
                change_type,
                old_value,
                new_value,
            })
        })
        .collect()
}

pub fn diff_predicate_lists(old: &[Predicate], new: &[Predicate]) -> Vec<FieldChange> {
    let empty = Predicate::default();
    let len = old.len().max(new.len());
    let mut changes = Vec::new();
    for idx in 0..len {
        let before = old.get(idx).unwrap_or(&empty);
        let after = new.get(idx).unwrap_or(&empty);
        changes.extend(diff_predicates(before, after).into_iter().map(|mut change| {
            if len > 1 {
                change.field = format!("[{idx}].{}", change.field);
            }
            change
        }));
    }
    changes
}
