use std::collections::BTreeSet;

pub const ALL_REGIONS: &str = "all";

// Elements are taken whole; splitting a single comma-separated string
// happens when the predicate is deserialized.
pub fn normalize_regions<S: AsRef<str>>(regions: &[S]) -> BTreeSet<String> {
    regions
        .iter()
        .map(|r| r.as_ref().trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect()
}

/// A user without a declared region never matches. An empty region set or
/// the `all` sentinel matches everyone else.
pub fn region_matches<S: AsRef<str>>(user_region: Option<&str>, regions: &[S]) -> bool {
    let Some(user) = user_region
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
    else {
        return false;
    };

    let allowed = normalize_regions(regions);
    if allowed.is_empty() || allowed.contains(ALL_REGIONS) {
        return true;
    }
    allowed.contains(&user)
}

#[cfg(test)]
mod tests {
    use super::{normalize_regions, region_matches};

    const NONE: [&str; 0] = [];

    #[test]
    fn unrestricted_sets_match_any_declared_region() {
        assert!(region_matches(Some("Goa"), &NONE));
        assert!(region_matches(Some("Goa"), &["all"]));
        assert!(region_matches(Some("Goa"), &["Kerala", "ALL"]));
        assert!(region_matches(Some("Goa"), &["  ", ""]));
    }

    #[test]
    fn undeclared_region_never_matches() {
        assert!(!region_matches(Some(""), &["all"]));
        assert!(!region_matches(Some("   "), &NONE));
        assert!(!region_matches(None, &["Goa"]));
    }

    #[test]
    fn exact_case_insensitive_match_only() {
        assert!(region_matches(Some("goa"), &["Goa"]));
        assert!(region_matches(Some("  Tamil Nadu "), &["tamil nadu"]));
        assert!(!region_matches(Some("Goa"), &["Kerala"]));
        assert!(!region_matches(Some("Pradesh"), &["Andhra Pradesh"]));
        assert!(!region_matches(Some("Andhra Pradesh"), &["Andhra"]));
    }

    #[test]
    fn set_elements_are_not_split_on_commas() {
        assert!(!region_matches(Some("Goa"), &["Kerala, Goa"]));
        assert!(!region_matches(Some("Kerala"), &["Kerala, Goa"]));
        assert_eq!(
            normalize_regions(&["Kerala, Goa", " kerala "]).into_iter().collect::<Vec<_>>(),
            vec!["kerala".to_string(), "kerala, goa".to_string()]
        );
    }
}
