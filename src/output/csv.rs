use anyhow::Result;

use crate::eligibility::SchemeVerdict;
use crate::predicate::Predicate;
use crate::ranking::MatchResult;
use crate::store::IngestReport;

pub fn rankings_to_csv(results: &[MatchResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["rank", "scheme", "score", "ministry", "state", "link"])?;
    for (idx, result) in results.iter().enumerate() {
        let scheme = &result.scheme;
        writer.write_record([
            (idx + 1).to_string(),
            scheme.display_name(),
            result.score.to_string(),
            scheme.ministry.clone().unwrap_or_default(),
            scheme.state.clone().unwrap_or_default(),
            scheme.link.clone().unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn verdicts_to_csv(verdicts: &[SchemeVerdict]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["scheme", "eligible", "reasons"])?;
    for v in verdicts {
        writer.write_record([
            v.scheme.clone(),
            v.verdict.eligible.to_string(),
            v.verdict.reasons.join("; "),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn predicates_to_csv(predicates: &[Predicate]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let header: Vec<&str> = Predicate::default()
        .rendered_fields()
        .into_iter()
        .map(|(field, _)| field)
        .collect();
    writer.write_record(&header)?;
    for predicate in predicates {
        writer.write_record(
            predicate
                .rendered_fields()
                .into_iter()
                .map(|(_, value)| value.unwrap_or_default()),
        )?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn ingest_to_csv(report: &IngestReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["key", "scheme", "status", "predicates", "changes", "rules_version"])?;
    for entry in &report.entries {
        writer.write_record([
            entry.key.clone().unwrap_or_default(),
            entry.name.clone(),
            format!("{:?}", entry.status).to_lowercase(),
            entry.predicates.to_string(),
            entry.changes.len().to_string(),
            report.rules_version.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::{predicates_to_csv, verdicts_to_csv};
    use crate::eligibility::{SchemeVerdict, Verdict};
    use crate::predicate::{Predicate, ValueSet};

    #[test]
    fn verdict_rows_join_reasons() {
        let csv = verdicts_to_csv(&[SchemeVerdict {
            scheme: "Farm Support".to_string(),
            verdict: Verdict::ineligible(vec![
                "Minimum age required: 18".to_string(),
                "Applicable only for states: Goa".to_string(),
            ]),
        }])
        .expect("csv");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("scheme,eligible,reasons"));
        assert_eq!(
            lines.next(),
            Some("Farm Support,false,Minimum age required: 18; Applicable only for states: Goa")
        );
    }

    #[test]
    fn predicate_rows_follow_field_order() {
        let csv = predicates_to_csv(&[Predicate {
            min_age: Some(18),
            state: ValueSet::from(["Kerala"]),
            ..Predicate::default()
        }])
        .expect("csv");
        let mut lines = csv.lines();
        assert!(lines.next().is_some_and(|h| h.starts_with("minAge,maxAge,gender")));
        assert_eq!(lines.next(), Some("18,,,,,,,,,,Kerala,,"));
    }
}
