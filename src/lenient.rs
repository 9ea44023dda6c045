// Malformed values become absent instead of failing the enclosing record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .and_then(|n| u32::try_from(n).ok()))
}

pub(crate) fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

pub(crate) fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "super::opt_u32")]
        age: Option<u32>,
        #[serde(default, deserialize_with = "super::opt_u64")]
        income: Option<u64>,
        #[serde(default, deserialize_with = "super::opt_bool")]
        disabled: Option<bool>,
        #[serde(default, deserialize_with = "super::opt_string")]
        label: Option<String>,
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let record: Record = serde_json::from_value(json!({"age": "22", "income": "2,50,000"}))
            .expect("record should parse");
        assert_eq!(record.age, Some(22));
        assert_eq!(record.income, Some(250_000));

        let record: Record =
            serde_json::from_value(json!({"age": 30.0, "income": 100})).expect("record parse");
        assert_eq!(record.age, Some(30));
        assert_eq!(record.income, Some(100));
    }

    #[test]
    fn malformed_values_become_absent() {
        let record: Record = serde_json::from_value(json!({"age": "twenty", "income": [1]}))
            .expect("record should parse");
        assert_eq!(record.age, None);
        assert_eq!(record.income, None);

        let record: Record = serde_json::from_value(json!({"age": -4})).expect("record parse");
        assert_eq!(record.age, None);
    }

    #[test]
    fn booleans_and_strings_tolerate_wrong_types() {
        let record: Record =
            serde_json::from_value(json!({"disabled": "TRUE", "label": "Ministry of Labour"}))
                .expect("record should parse");
        assert_eq!(record.disabled, Some(true));
        assert_eq!(record.label.as_deref(), Some("Ministry of Labour"));

        let record: Record = serde_json::from_value(json!({"disabled": "yes", "label": 7}))
            .expect("record should parse");
        assert_eq!(record.disabled, None);
        assert_eq!(record.label, None);

        let record: Record =
            serde_json::from_value(json!({"disabled": {"value": true}, "label": ["a"]}))
                .expect("record should parse");
        assert_eq!(record.disabled, None);
        assert_eq!(record.label, None);
    }
}
