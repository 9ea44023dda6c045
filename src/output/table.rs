use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::eligibility::{PredicateOutcome, SchemeVerdict};
use crate::predicate::Predicate;
use crate::ranking::MatchResult;
use crate::rules::RuleBook;
use crate::store::IngestReport;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

fn verdict_cell(eligible: bool) -> Cell {
    if eligible {
        Cell::new("YES").fg(Color::Green)
    } else {
        Cell::new("NO").fg(Color::Red)
    }
}

pub fn render_predicates_table(predicates: &[Predicate]) -> String {
    let mut table = new_table();
    let mut header = vec!["Field".to_string()];
    if predicates.len() == 1 {
        header.push("Value".to_string());
    } else {
        header.extend((0..predicates.len()).map(|i| format!("Clause {}", i + 1)));
    }
    table.set_header(header);

    let rendered: Vec<_> = predicates.iter().map(Predicate::rendered_fields).collect();
    let Some(first) = rendered.first() else {
        return table.to_string();
    };
    for (row_idx, (field, _)) in first.iter().enumerate() {
        let mut row = vec![Cell::new(*field)];
        for fields in &rendered {
            row.push(Cell::new(or_dash(fields[row_idx].1.as_deref())));
        }
        table.add_row(Row::from(row));
    }
    table.to_string()
}

pub fn render_rankings_table(results: &[MatchResult]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Rank", "Scheme", "Score", "Ministry", "State"]);
    for (idx, result) in results.iter().enumerate() {
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(result.scheme.display_name()),
            Cell::new(result.score),
            Cell::new(or_dash(result.scheme.ministry.as_deref())),
            Cell::new(or_dash(result.scheme.state.as_deref())),
        ]));
    }
    table.to_string()
}

pub fn render_verdicts_table(verdicts: &[SchemeVerdict]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Scheme", "Eligible", "Reasons"]);
    for v in verdicts {
        table.add_row(Row::from(vec![
            Cell::new(&v.scheme),
            verdict_cell(v.verdict.eligible),
            Cell::new(if v.verdict.reasons.is_empty() {
                "-".to_string()
            } else {
                v.verdict.reasons.join("\n")
            }),
        ]));
    }
    table.to_string()
}

pub fn render_explain_table(scheme: &str, outcomes: &[PredicateOutcome]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Scheme", "Clause", "Passed", "Failed checks"]);
    for outcome in outcomes {
        let messages = outcome.messages();
        table.add_row(Row::from(vec![
            Cell::new(scheme),
            Cell::new(outcome.index + 1),
            verdict_cell(outcome.passed),
            Cell::new(if messages.is_empty() {
                "-".to_string()
            } else {
                messages.join("\n")
            }),
        ]));
    }
    table.to_string()
}

pub fn render_ingest_table(report: &IngestReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Key", "Scheme", "Status", "Predicates", "Changes"]);
    for entry in &report.entries {
        let changes = entry
            .changes
            .iter()
            .map(|c| {
                format!(
                    "{}: {} -> {}",
                    c.field,
                    c.old_value.as_deref().unwrap_or("-"),
                    c.new_value.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>();
        table.add_row(Row::from(vec![
            Cell::new(or_dash(entry.key.as_deref())),
            Cell::new(&entry.name),
            Cell::new(format!("{:?}", entry.status).to_lowercase()),
            Cell::new(entry.predicates),
            Cell::new(if changes.is_empty() {
                "-".to_string()
            } else {
                changes.join("\n")
            }),
        ]));
    }
    format!(
        "{table}\nrules {}: {} inserted, {} updated, {} unchanged, {} skipped",
        report.rules_version, report.inserted, report.updated, report.unchanged, report.skipped
    )
}

pub fn render_rules_table(book: &RuleBook) -> String {
    let mut table = new_table();
    table.set_header(vec!["Field", "Selection", "Mode", "Value", "Patterns"]);
    for (field, rule_table) in book.tables() {
        for entry in &rule_table.entries {
            table.add_row(Row::from(vec![
                Cell::new(field),
                Cell::new(format!("{:?}", rule_table.selection).to_lowercase()),
                Cell::new(format!("{:?}", rule_table.mode).to_lowercase()),
                Cell::new(&entry.value),
                Cell::new(entry.patterns.join(", ")),
            ]));
        }
    }
    let patterns = &book.patterns;
    let mut pattern_rows = vec![
        ("age_range", patterns.age_range.as_str()),
        ("age_min", patterns.age_min.as_str()),
        ("income", patterns.income.as_str()),
        ("residency", patterns.residency.as_str()),
    ];
    if let Some(ministry) = patterns.ministry.as_deref() {
        pattern_rows.push(("ministry", ministry));
    }
    for (name, pattern) in pattern_rows {
        table.add_row(Row::from(vec![
            Cell::new(format!("patterns.{name}")),
            Cell::new("regex"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(pattern),
        ]));
    }
    format!("rule book {}\n{table}", book.version)
}

#[cfg(test)]
mod tests {
    use super::{render_predicates_table, render_rankings_table, render_rules_table};
    use crate::predicate::{Predicate, ValueSet};
    use crate::ranking::MatchResult;
    use crate::rules::RuleBook;
    use crate::scheme::Scheme;

    #[test]
    fn predicate_table_lists_every_field() {
        let rendered = render_predicates_table(&[Predicate {
            min_age: Some(18),
            occupation: ValueSet::from(["farmer"]),
            ..Predicate::default()
        }]);
        assert!(rendered.contains("minAge"));
        assert!(rendered.contains("ministry"));
        assert!(rendered.contains("farmer"));
    }

    #[test]
    fn rankings_table_shows_scheme_and_score() {
        let rendered = render_rankings_table(&[MatchResult {
            scheme: Scheme::with_predicates("Farm Support", vec![]),
            score: 3,
        }]);
        assert!(rendered.contains("Farm Support"));
        assert!(rendered.contains('3'));
    }

    #[test]
    fn rules_table_names_version() {
        let rendered = render_rules_table(&RuleBook::default());
        assert!(rendered.starts_with("rule book builtin-1"));
        assert!(rendered.contains("patterns.income"));
    }
}
