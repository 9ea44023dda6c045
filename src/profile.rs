use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "crate::lenient::opt_u32")]
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    #[serde(alias = "castecategory")]
    pub caste_category: Option<String>,
    #[serde(deserialize_with = "crate::lenient::opt_u64")]
    pub income: Option<u64>,
    pub marital_status: Option<String>,
    pub state: Option<String>,
}

impl UserProfile {
    pub fn merge(mut self, other: UserProfile) -> Self {
        self.age = other.age.or(self.age);
        self.gender = other.gender.or(self.gender);
        self.occupation = other.occupation.or(self.occupation);
        self.education = other.education.or(self.education);
        self.caste_category = other.caste_category.or(self.caste_category);
        self.income = other.income.or(self.income);
        self.marital_status = other.marital_status.or(self.marital_status);
        self.state = other.state.or(self.state);
        self
    }
}

// Blank counts as absent.
pub(crate) fn declared(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{declared, UserProfile};

    #[test]
    fn parses_legacy_field_names_and_numeric_strings() {
        let profile: UserProfile = serde_json::from_value(json!({
            "age": "22",
            "gender": "Female",
            "castecategory": "OBC",
            "income": 180000,
            "maritalStatus": "single",
            "state": "Kerala",
            "email": "ignored@example.com"
        }))
        .expect("parse profile");

        assert_eq!(profile.age, Some(22));
        assert_eq!(profile.caste_category.as_deref(), Some("OBC"));
        assert_eq!(profile.income, Some(180_000));
        assert_eq!(profile.occupation, None);
    }

    #[test]
    fn merge_prefers_overlay_values() {
        let base = UserProfile {
            age: Some(30),
            state: Some("Goa".to_string()),
            ..UserProfile::default()
        };
        let overlay = UserProfile {
            state: Some("Kerala".to_string()),
            ..UserProfile::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.age, Some(30));
        assert_eq!(merged.state.as_deref(), Some("Kerala"));
    }

    #[test]
    fn declared_folds_and_drops_blank_values() {
        assert_eq!(declared(&Some(" Graduate ".to_string())).as_deref(), Some("graduate"));
        assert_eq!(declared(&Some("  ".to_string())), None);
        assert_eq!(declared(&None), None);
    }
}
