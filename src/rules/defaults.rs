use crate::rules::{MatchMode, RuleEntry, RuleTable, Selection};

pub const BUILTIN_VERSION: &str = "builtin-1";

pub fn version() -> String {
    BUILTIN_VERSION.to_string()
}

// Female terms are checked before male ones: "women" contains "men".
pub fn gender() -> RuleTable {
    RuleTable {
        selection: Selection::First,
        mode: MatchMode::Substring,
        entries: vec![
            RuleEntry::new("female", &["women", "female", "girl"]),
            RuleEntry::new("male", &["men", "male", "boy"]),
            RuleEntry::new("other", &["transgender", "third gender"]),
        ],
    }
}

pub fn occupation() -> RuleTable {
    let terms = [
        "farmer",
        "student",
        "worker",
        "entrepreneur",
        "teacher",
        "doctor",
        "artisan",
        "weaver",
        "fisherman",
        "self-employed",
    ];
    RuleTable {
        selection: Selection::All,
        mode: MatchMode::Word,
        entries: terms.iter().map(|t| RuleEntry::new(t, &[t])).collect(),
    }
}

pub fn education() -> RuleTable {
    RuleTable {
        selection: Selection::First,
        mode: MatchMode::Substring,
        entries: vec![
            RuleEntry::new("graduate", &["graduate"]),
            RuleEntry::new("postgraduate", &["postgraduate", "pg"]),
            RuleEntry::new("10th", &["matric", "10th"]),
            RuleEntry::new("12th", &["12th", "intermediate"]),
            RuleEntry::new("none", &["illiterate"]),
        ],
    }
}

pub fn caste_category() -> RuleTable {
    RuleTable {
        selection: Selection::Last,
        mode: MatchMode::Word,
        entries: vec![
            RuleEntry::new("SC", &["sc"]),
            RuleEntry::new("ST", &["st"]),
            RuleEntry::new("OBC", &["obc"]),
            RuleEntry::new("EWS", &["ews"]),
            RuleEntry::new("General", &["general"]),
        ],
    }
}

pub fn marital_status() -> RuleTable {
    RuleTable {
        selection: Selection::First,
        mode: MatchMode::Substring,
        entries: vec![
            RuleEntry::new("widow", &["widow"]),
            RuleEntry::new("single", &["unmarried", "single"]),
            RuleEntry::new("married", &["married"]),
        ],
    }
}

pub fn disability() -> RuleTable {
    RuleTable {
        selection: Selection::Any,
        mode: MatchMode::Substring,
        entries: vec![RuleEntry::new(
            "true",
            &["disability", "handicapped", "divyang"],
        )],
    }
}

pub fn minority() -> RuleTable {
    RuleTable {
        selection: Selection::Any,
        mode: MatchMode::Substring,
        entries: vec![RuleEntry::new(
            "true",
            &["muslim", "christian", "sikh", "buddhist", "parsi", "minority"],
        )],
    }
}

pub fn age_range_pattern() -> String {
    r"(\d{1,2})\s*(?:-|to|–)\s*(\d{1,2})\s*years?".to_string()
}

pub fn age_min_pattern() -> String {
    r"(\d{1,2})\s*\+?\s*years?\s*(?:and above|or more)?".to_string()
}

pub fn income_pattern() -> String {
    r"family income (?:less than|upto|up to|not exceeding)\s*₹?\s?([\d,]+)".to_string()
}

pub fn residency_pattern() -> String {
    r"resident of ([a-z\s]+)".to_string()
}

pub fn ministry_pattern() -> Option<String> {
    Some(
        r"\bministry of ([a-z&\s]+?)\s*(?:[,.;:(]|\b(?:scheme|schemes|for|who|under|and the|is|are|with|to|in)\b|$)"
            .to_string(),
    )
}
